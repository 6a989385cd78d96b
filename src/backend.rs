use burn::backend::Autodiff;

#[cfg(not(feature = "wgpu"))]
mod inner {
    pub use burn::backend::{ndarray::NdArrayDevice as Device, NdArray as Backend};
}

#[cfg(feature = "wgpu")]
mod inner {
    pub use burn::backend::{wgpu::WgpuDevice as Device, Wgpu as Backend};
}

/// Backend the `train` binary learns on
pub type TrainingBackend = Autodiff<inner::Backend>;

pub type TrainingDevice = inner::Device;

pub fn default_device() -> TrainingDevice {
    TrainingDevice::default()
}
