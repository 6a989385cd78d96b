pub mod dqn;

pub use dqn::{AgentConfig, DQNAgent, ValueModel};
