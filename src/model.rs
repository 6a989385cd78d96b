use burn::{prelude::*, tensor::activation::relu};
use nn::{Linear, LinearConfig};

use crate::{
    algo::dqn::ValueModel,
    gym::{NUM_ACTIONS, OBSERVATION_SIZE},
};

/// Feed-forward Q network: observation in, one value per action out
///
/// ```text
/// Linear(input → hidden_1) + ReLU
/// Linear(hidden_1 → hidden_2) + ReLU
/// Linear(hidden_2 → output)
/// ```
#[derive(Module, Debug)]
pub struct ValueNet<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    fc3: Linear<B>,
}

#[derive(Config, Debug)]
pub struct ValueNetConfig {
    #[config(default = "OBSERVATION_SIZE")]
    pub input: usize,
    #[config(default = 256)]
    pub hidden_1: usize,
    #[config(default = 128)]
    pub hidden_2: usize,
    #[config(default = "NUM_ACTIONS")]
    pub output: usize,
}

impl ValueNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ValueNet<B> {
        ValueNet {
            fc1: LinearConfig::new(self.input, self.hidden_1).init(device),
            fc2: LinearConfig::new(self.hidden_1, self.hidden_2).init(device),
            fc3: LinearConfig::new(self.hidden_2, self.output).init(device),
        }
    }
}

impl<B: Backend> ValueModel<B> for ValueNet<B> {
    /// In shape: `[batch, input]`
    ///
    /// Out shape: `[batch, output]`
    fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.fc1.forward(input));
        let x = relu(self.fc2.forward(x));
        self.fc3.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;

    use super::*;
    use crate::gym::Observation;

    type B = NdArray;

    #[test]
    fn forward_shape() {
        let device = Default::default();
        let model = ValueNetConfig::new().init::<B>(&device);
        let output = model.forward(Tensor::zeros([5, OBSERVATION_SIZE], &device));
        assert_eq!(output.dims(), [5, NUM_ACTIONS], "one value per action");
    }

    #[test]
    fn predict_is_deterministic() {
        let device = Default::default();
        let model = ValueNetConfig::new()
            .with_hidden_1(8)
            .with_hidden_2(8)
            .init::<B>(&device);
        let obs: Observation = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let first = model.predict(&obs, &device);
        assert_eq!(first, model.predict(&obs, &device), "no hidden state");
        assert!(first.iter().all(|v| v.is_finite()));
    }
}
