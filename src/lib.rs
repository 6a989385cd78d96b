/// Learning algorithms
pub mod algo;

/// Numeric backend used for training
pub mod backend;

/// Saving and restoring model parameters
pub mod checkpoint;

/// Run configuration
pub mod config;

/// Strategies for time-decaying hyperparameters
pub mod decay;

/// Data structures
pub mod ds;

/// Environment
pub mod env;

pub mod error;

/// Exploration policies
pub mod exploration;

/// The snake game
pub mod gym;

/// Experience replay
pub mod memory;

/// The value network
pub mod model;

/// The training loop
pub mod train;

/// Tensor conversions
pub mod traits;

/// Terminal visualization
#[cfg(feature = "viz")]
pub mod viz;
