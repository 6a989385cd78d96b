use strum::{EnumIter, FromRepr, VariantArray};

/// Grid position as `(col, row)`, with rows growing downwards
pub type Pos = (i32, i32);

/// Absolute heading of the snake
///
/// Variants are declared in clockwise order (on a screen whose rows grow downwards),
/// which the rotation helpers rely on.
#[derive(EnumIter, VariantArray, FromRepr, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Right = 0,
    Down = 1,
    Left = 2,
    Up = 3,
}

impl Direction {
    /// Unit step `(dx, dy)` for this heading
    pub const fn delta(self) -> Pos {
        match self {
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Up => (0, -1),
        }
    }

    /// The heading 90° clockwise from this one
    pub fn clockwise(self) -> Self {
        Self::VARIANTS[(self as usize + 1) % 4]
    }

    /// The heading 90° counter-clockwise from this one
    pub fn counter_clockwise(self) -> Self {
        Self::VARIANTS[(self as usize + 3) % 4]
    }

    /// Apply a relative action to this heading
    pub fn turn(self, action: Action) -> Self {
        match action {
            Action::Straight => self,
            Action::Right => self.clockwise(),
            Action::Left => self.counter_clockwise(),
        }
    }

    /// Position one step from `pos` in this heading
    pub fn advance(self, pos: Pos) -> Pos {
        let (dx, dy) = self.delta();
        (pos.0 + dx, pos.1 + dy)
    }
}

/// Moves relative to the current heading
///
/// Reversing into the snake's own neck is not representable.
#[derive(EnumIter, VariantArray, FromRepr, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// Keep the current heading
    Straight = 0,
    /// Rotate the heading 90° clockwise
    Right = 1,
    /// Rotate the heading 90° counter-clockwise
    Left = 2,
}

/// Number of actions, and the width of the value model's output layer
pub const NUM_ACTIONS: usize = Action::VARIANTS.len();

impl From<usize> for Action {
    /// **Panics** on indices outside `0..NUM_ACTIONS`, which are a programming error
    fn from(value: usize) -> Self {
        Self::from_repr(value).expect("Action::from is only called with valid values [0, 1, 2]")
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn rotations() {
        assert_eq!(Direction::Right.clockwise(), Direction::Down);
        assert_eq!(Direction::Down.clockwise(), Direction::Left);
        assert_eq!(Direction::Left.clockwise(), Direction::Up);
        assert_eq!(Direction::Up.clockwise(), Direction::Right);
        assert_eq!(Direction::Right.counter_clockwise(), Direction::Up);

        for dir in Direction::iter() {
            assert_eq!(dir.clockwise().counter_clockwise(), dir, "rotations invert");
            assert_eq!(dir.turn(Action::Straight), dir, "straight keeps heading");
            let (dx, dy) = dir.delta();
            let (rx, ry) = dir.turn(Action::Right).turn(Action::Right).delta();
            assert_eq!((dx, dy), (-rx, -ry), "two right turns reverse");
        }
    }

    #[test]
    fn advance_functional() {
        assert_eq!(Direction::Right.advance((10, 10)), (11, 10));
        assert_eq!(Direction::Up.advance((10, 10)), (10, 9), "rows grow downwards");
    }

    #[test]
    fn action_from_index() {
        assert_eq!(Action::from(0), Action::Straight);
        assert_eq!(Action::from(1), Action::Right);
        assert_eq!(Action::from(2), Action::Left);
        assert_eq!(NUM_ACTIONS, 3);
    }

    #[test]
    #[should_panic]
    fn illegal_action_panics() {
        let _ = Action::from(3);
    }
}
