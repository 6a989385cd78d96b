use rand::{seq::SliceRandom, Rng};

use crate::{ds::RingBuffer, env::Environment};

use super::{Exp, ExpBatch};

/// A fixed-size memory storage for reinforcement learning experiences
///
/// This structure uses a ring buffer to store experiences. Once it reaches its capacity,
/// every new experience evicts the oldest one.
pub struct ReplayMemory<E: Environment> {
    memory: RingBuffer<Exp<E>>,
}

impl<E: Environment> ReplayMemory<E>
where
    E::State: Clone,
    E::Action: Clone,
{
    /// **Panics** if `capacity` is zero
    pub fn new(capacity: usize) -> Self {
        Self {
            memory: RingBuffer::new(capacity),
        }
    }

    /// Add a new experience to the memory
    pub fn push(&mut self, exp: Exp<E>) {
        self.memory.push(exp);
    }

    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.memory.capacity()
    }

    /// Stored experiences from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &Exp<E>> {
        self.memory.iter()
    }

    /// Sample up to `batch_size` distinct experiences uniformly at random
    ///
    /// Returns the whole memory (in random order) when it holds fewer than `batch_size` experiences.
    pub fn sample(&self, batch_size: usize, rng: &mut impl Rng) -> Vec<&Exp<E>> {
        self.memory
            .view()
            .choose_multiple(rng, batch_size)
            .collect()
    }

    /// Sample a random batch of experiences and zip the vector of tuples into a tuple of vectors
    ///
    /// ### Returns
    /// - `None` if the memory is empty
    /// - `Some(batch)` otherwise, of at most `batch_size` experiences
    pub fn sample_zipped(&self, batch_size: usize, rng: &mut impl Rng) -> Option<ExpBatch<E>> {
        if self.is_empty() {
            return None;
        }
        let experiences = self.sample(batch_size, rng);
        Some(ExpBatch::from_iter(experiences, batch_size))
    }
}
