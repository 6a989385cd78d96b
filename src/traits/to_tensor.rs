use burn::{prelude::*, tensor::BasicOps};

use crate::gym::{Action, Observation, OBSERVATION_SIZE};

/// A trait for converting items to tensors
///
/// Implemented for `Vec<T>` to convert batches of `T` to a tensor of dimension `D`
pub trait ToTensor<B: Backend, const D: usize, K: BasicOps<B>> {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, D, K>;
}

/// Batch of observations as a `[batch, OBSERVATION_SIZE]` tensor
impl<B: Backend> ToTensor<B, 2, Float> for Vec<Observation> {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 2> {
        let len = self.len();
        let data = Data::new(
            self.into_iter().flatten().collect::<Vec<_>>(),
            [len, OBSERVATION_SIZE].into(),
        );
        Tensor::from_floats(data, device)
    }
}

/// Batch of actions as a `[batch, 1]` index tensor, ready for `gather`
impl<B: Backend> ToTensor<B, 2, Int> for Vec<Action> {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 2, Int> {
        let len = self.len();
        let data = Data::new(
            self.into_iter().map(|a| a as i32).collect::<Vec<_>>(),
            [len, 1].into(),
        );
        Tensor::from_ints(data, device)
    }
}

impl<B: Backend> ToTensor<B, 1, Float> for Vec<f32> {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 1> {
        let len = self.len();
        Tensor::from_floats(Data::new(self, [len].into()), device)
    }
}
