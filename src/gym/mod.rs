pub mod features;
pub mod heading;
pub mod snake;

pub use features::{Observation, OBSERVATION_SIZE};
pub use heading::{Action, Direction, Pos, NUM_ACTIONS};
pub use snake::{GameConfig, SnakeEnv, Snapshot};
