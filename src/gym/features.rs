//! Compact feature encoding of the snake game state.
//!
//! Layout of the [`Observation`] vector, every entry `0.0` or `1.0`:
//!
//! | index | meaning                                   |
//! |-------|-------------------------------------------|
//! | 0     | danger straight ahead                     |
//! | 1     | danger after a clockwise turn             |
//! | 2     | danger after a counter-clockwise turn     |
//! | 3..7  | heading one-hot: left, right, up, down    |
//! | 7..11 | food strictly left, right, above, below   |

use super::heading::{Direction, Pos};

/// Length of the observation vector
pub const OBSERVATION_SIZE: usize = 11;

/// Feature vector consumed by the agent
pub type Observation = [f32; OBSERVATION_SIZE];

fn flag(b: bool) -> f32 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Encode the situation around `head`
///
/// `danger` reports whether moving onto a cell one step away would be fatal.
pub fn encode(head: Pos, heading: Direction, food: Pos, danger: impl Fn(Pos) -> bool) -> Observation {
    [
        flag(danger(heading.advance(head))),
        flag(danger(heading.clockwise().advance(head))),
        flag(danger(heading.counter_clockwise().advance(head))),
        flag(heading == Direction::Left),
        flag(heading == Direction::Right),
        flag(heading == Direction::Up),
        flag(heading == Direction::Down),
        flag(food.0 < head.0),
        flag(food.0 > head.0),
        flag(food.1 < head.1),
        flag(food.1 > head.1),
    ]
}
