//! Value model checkpoints.
//!
//! A checkpoint holds only the learnable parameters, written with burn's named MessagePack
//! recorder. The recorder forces the `.mpk` extension onto whatever path it is given.

use std::path::Path;

use burn::{
    module::Module,
    record::{FullPrecisionSettings, NamedMpkFileRecorder},
    tensor::backend::Backend,
};
use log::{debug, warn};

use crate::error::CheckpointError;

/// Default checkpoint location
pub const DEFAULT_PATH: &str = "models/snake_dqn.mpk";

fn recorder() -> NamedMpkFileRecorder<FullPrecisionSettings> {
    NamedMpkFileRecorder::<FullPrecisionSettings>::new()
}

/// Write the parameters of `model` to `path`, creating parent directories as needed
pub fn save<B: Backend, M: Module<B>>(model: &M, path: &Path) -> Result<(), CheckpointError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| CheckpointError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    model
        .clone()
        .save_file(path, &recorder())
        .map_err(|err| CheckpointError::Save {
            path: path.to_path_buf(),
            reason: format!("{err:?}"),
        })
}

/// Load parameters from `path` into a copy of `model`
///
/// Returns `None` when the checkpoint is missing or unreadable, leaving the caller's model as is.
pub fn load<B: Backend, M: Module<B>>(model: &M, path: &Path, device: &B::Device) -> Option<M> {
    if !path.with_extension("mpk").exists() {
        debug!("no checkpoint at {}", path.display());
        return None;
    }

    match model.clone().load_file(path, &recorder(), device) {
        Ok(model) => Some(model),
        Err(err) => {
            warn!(
                "ignoring unreadable checkpoint {}: {err:?}",
                path.display()
            );
            None
        }
    }
}
