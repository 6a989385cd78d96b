use std::path::Path;

use burn::{
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::{backend::AutodiffBackend, ElementConversion},
};
use log::debug;
use nn::loss::{MseLoss, Reduction};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    checkpoint,
    decay,
    error::{CheckpointError, ConfigError},
    exploration::{Choice, EpsilonGreedy},
    gym::{Action, Observation, SnakeEnv, NUM_ACTIONS},
    memory::{Exp, ExpBatch, ReplayMemory},
    traits::ToTensor,
};

/// A burn module mapping a batch of observations to one value per action
pub trait ValueModel<B: Backend>: Module<B> {
    /// Forward pass through the model
    ///
    /// In shape: `[batch, OBSERVATION_SIZE]`, out shape: `[batch, NUM_ACTIONS]`
    fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2>;

    /// Predicted value of every action for a single observation
    fn predict(&self, state: &Observation, device: &B::Device) -> [f32; NUM_ACTIONS] {
        let input = vec![*state].to_tensor(device);
        let values = self.forward(input).into_data().convert::<f32>().value;

        let mut out = [0.0; NUM_ACTIONS];
        out.copy_from_slice(&values);
        out
    }
}

/// Hyperparameters for the [`DQNAgent`]
#[derive(Config, Debug)]
pub struct AgentConfig {
    /// The discount factor
    #[config(default = 0.9)]
    pub gamma: f32,
    /// The learning rate for the optimizer
    #[config(default = 1e-3)]
    pub lr: f64,
    #[config(default = 1.0)]
    pub epsilon_start: f32,
    /// Exploration never decays below this
    #[config(default = 0.01)]
    pub epsilon_min: f32,
    /// Factor applied to epsilon after every episode
    #[config(default = 0.995)]
    pub epsilon_decay: f32,
    /// Experiences per replay update at the end of an episode
    #[config(default = 1000)]
    pub batch_size: usize,
    /// Capacity of the experience buffer
    #[config(default = 100_000)]
    pub memory_capacity: usize,
    pub seed: Option<u64>,
}

impl AgentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(ConfigError::Invalid("gamma must be in [0, 1]".into()));
        }
        if self.lr <= 0.0 {
            return Err(ConfigError::Invalid("lr must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.epsilon_start) {
            return Err(ConfigError::Invalid("epsilon_start must be in [0, 1]".into()));
        }
        if !(self.epsilon_min > 0.0 && self.epsilon_min <= 1.0) {
            return Err(ConfigError::Invalid("epsilon_min must be in (0, 1]".into()));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be > 0".into()));
        }
        if self.memory_capacity == 0 {
            return Err(ConfigError::Invalid("memory_capacity must be > 0".into()));
        }
        Ok(())
    }
}

/// A Deep Q Network agent for the snake environment
///
/// Learns online from every transition and replays a random batch of past transitions at the
/// end of each episode. Targets are computed with the current parameters; there is no separate
/// target network.
///
/// ### Generics
/// - `B`: A burn autodiff backend
/// - `M`: The [`ValueModel`] being trained
/// - `O`: The [`Optimizer`] stepping the model's parameters
pub struct DQNAgent<B, M, O>
where
    B: AutodiffBackend,
    M: ValueModel<B> + AutodiffModule<B>,
    O: Optimizer<M, B>,
{
    model: M,
    device: B::Device,
    memory: ReplayMemory<SnakeEnv>,
    optimizer: O,
    loss: MseLoss<B>,
    exploration: EpsilonGreedy<decay::Geometric>,
    gamma: f32,
    lr: f64,
    batch_size: usize,
    episodes: u32,
    rng: StdRng,
}

impl<B, M, O> DQNAgent<B, M, O>
where
    B: AutodiffBackend,
    M: ValueModel<B> + AutodiffModule<B>,
    O: Optimizer<M, B>,
{
    /// Initialize a new `DQNAgent`
    ///
    /// ### Arguments
    /// - `model` A freshly initialized [`ValueModel`]
    /// - `optimizer` The optimizer to train `model` with, e.g. `AdamConfig::new().init()`
    /// - `config` Hyperparameters for the agent
    /// - `device` The device the `model` lives on
    pub fn new(
        model: M,
        optimizer: O,
        config: &AgentConfig,
        device: B::Device,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let decay = decay::Geometric::new(
            config.epsilon_decay,
            config.epsilon_start,
            config.epsilon_min,
        )?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            model,
            device,
            memory: ReplayMemory::new(config.memory_capacity),
            optimizer,
            loss: MseLoss::new(),
            exploration: EpsilonGreedy::new(decay),
            gamma: config.gamma,
            lr: config.lr,
            batch_size: config.batch_size,
            episodes: 0,
            rng,
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn memory(&self) -> &ReplayMemory<SnakeEnv> {
        &self.memory
    }

    /// Current exploration rate
    pub fn epsilon(&self) -> f32 {
        self.exploration.epsilon(self.episodes)
    }

    /// Episodes completed, as counted by [`decay_exploration`](Self::decay_exploration)
    pub fn episodes(&self) -> u32 {
        self.episodes
    }

    /// Predicted value of every action in `state`
    pub fn predict(&self, state: &Observation) -> [f32; NUM_ACTIONS] {
        self.model.predict(state, &self.device)
    }

    /// The best action according to the model, ties going to the lowest index
    pub fn greedy_action(&self, state: &Observation) -> Action {
        let values = self.predict(state);
        let best = values
            .iter()
            .enumerate()
            .fold(0, |best, (i, v)| if *v > values[best] { i } else { best });
        Action::from(best)
    }

    /// Invoke the agent's policy along with the exploration strategy to choose an action
    pub fn select_action(&mut self, state: &Observation) -> Action {
        match self.exploration.choose(self.episodes, &mut self.rng) {
            Choice::Explore => Action::from(self.rng.gen_range(0..NUM_ACTIONS)),
            Choice::Exploit => self.greedy_action(state),
        }
    }

    /// Record a transition in the experience buffer
    pub fn remember(&mut self, exp: Exp<SnakeEnv>) {
        self.memory.push(exp);
    }

    /// Perform one gradient step on the given transitions
    ///
    /// **Returns** the loss before the update, or `None` for an empty slice
    pub fn train_step(&mut self, experiences: &[Exp<SnakeEnv>]) -> Option<f32> {
        if experiences.is_empty() {
            return None;
        }
        let batch = ExpBatch::from_iter(experiences, experiences.len());
        Some(self.learn(batch))
    }

    /// Perform one gradient step on a random batch from the experience buffer
    ///
    /// Uses the whole buffer when it holds fewer experiences than the batch size.
    pub fn train_batch(&mut self) -> Option<f32> {
        let batch = self.memory.sample_zipped(self.batch_size, &mut self.rng)?;
        let loss = self.learn(batch);
        debug!("replay loss {loss:.4}");
        Some(loss)
    }

    /// Mark an episode as complete, decaying the exploration rate
    pub fn decay_exploration(&mut self) {
        self.episodes += 1;
    }

    /// Perform one DQN learning step
    fn learn(&mut self, batch: ExpBatch<SnakeEnv>) -> f32 {
        let device = &self.device;

        let not_done = batch
            .dones
            .iter()
            .map(|&done| if done { 0.0 } else { 1.0 })
            .collect::<Vec<f32>>()
            .to_tensor(device);
        let states = batch.states.to_tensor(device);
        let actions = batch.actions.to_tensor(device);
        let next_states = batch.next_states.to_tensor(device);
        let rewards = batch.rewards.to_tensor(device);

        // Q values of the chosen actions in each state
        let q_values: Tensor<B, 1> = self.model.forward(states).gather(1, actions).squeeze(1);

        // Best value obtainable from each next state, zero past a terminal transition
        let max_next_q_values: Tensor<B, 1> = self
            .model
            .forward(next_states)
            .max_dim(1)
            .squeeze(1)
            .detach();

        let targets = rewards + max_next_q_values * not_done * self.gamma;

        let loss = self.loss.forward(q_values, targets, Reduction::Mean);
        let grads = GradientsParams::from_grads(loss.backward(), &self.model);
        self.model = self.optimizer.step(self.lr, self.model.clone(), grads);

        loss.into_scalar().elem::<f32>()
    }

    /// Save the model parameters to `path`
    pub fn save(&self, path: &Path) -> Result<(), CheckpointError> {
        checkpoint::save::<B, M>(&self.model, path)
    }

    /// Restore the model parameters from `path`
    ///
    /// **Returns** whether a checkpoint was loaded; the model is left untouched otherwise
    pub fn load(&mut self, path: &Path) -> bool {
        match checkpoint::load(&self.model, path, &self.device) {
            Some(model) => {
                self.model = model;
                true
            }
            None => false,
        }
    }
}
