#![allow(clippy::len_without_is_empty)]

/// A fixed-capacity FIFO ringbuffer
///
/// Grows until `capacity` is reached, after which every push overwrites the oldest element.
#[derive(Debug, Default, Clone)]
pub struct RingBuffer<T> {
    buffer: Vec<T>,
    ix: usize,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// **Panics** if `capacity` is zero
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be positive");
        Self {
            buffer: Vec::<T>::with_capacity(capacity),
            ix: 0,
            capacity,
        }
    }

    /// Returns the buffer length
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.capacity
    }

    /// Insert an element into the buffer, overwriting the oldest element, and return the write index
    pub fn push(&mut self, item: T) -> usize {
        let ix = self.ix;
        if ix >= self.len() {
            self.buffer.push(item);
        } else {
            self.buffer[ix] = item;
        }
        self.ix = (ix + 1) % self.capacity;
        ix
    }

    /// Get a slice view of the internal buffer in storage order
    pub fn view(&self) -> &[T] {
        &self.buffer
    }

    /// Iterate from the oldest to the newest element
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let split = if self.is_full() { self.ix } else { 0 };
        let (newer, older) = self.buffer.split_at(split);
        older.iter().chain(newer.iter())
    }

    /// The oldest element still stored
    pub fn oldest(&self) -> Option<&T> {
        self.iter().next()
    }
}
