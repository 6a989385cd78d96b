use std::path::PathBuf;

/// Errors raised when hyperparameters or game settings are unusable
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that can occur while writing a model checkpoint
///
/// Reading a checkpoint never fails: an unreadable file is treated as absent.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("failed to create checkpoint directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to save model to {path}: {reason}")]
    Save { path: PathBuf, reason: String },
}

/// Errors that can occur during training
#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    #[error("training requires at least one episode")]
    NoEpisodes,

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}
