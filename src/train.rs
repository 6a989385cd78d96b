use std::{ops::ControlFlow, path::Path};

use burn::{
    module::AutodiffModule,
    optim::{AdamConfig, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use log::info;

use crate::{
    algo::dqn::{DQNAgent, ValueModel},
    config::SnakeConfig,
    env::Environment,
    error::{ConfigError, TrainError},
    gym::SnakeEnv,
    memory::Exp,
    model::ValueNet,
};

#[derive(Config, Debug)]
pub struct TrainerConfig {
    /// Episodes to run when none are given explicitly
    #[config(default = 500)]
    pub episodes: u32,
    /// Episodes between progress lines
    #[config(default = 10)]
    pub log_interval: u32,
}

/// A view of the game after one step, handed to a [`Monitor`]
pub struct Frame<'a> {
    pub env: &'a SnakeEnv,
    pub episode: u32,
    pub epsilon: f32,
    pub record: u32,
}

/// Summary of one finished episode, handed to a [`Monitor`]
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeReport {
    pub episode: u32,
    pub score: u32,
    pub mean_score: f64,
    pub record: u32,
    pub epsilon: f32,
    /// Per-episode totals in the order of the simulator's report keys
    pub data: Vec<(&'static str, f64)>,
}

/// Observer of a training run
///
/// Returning [`ControlFlow::Break`] from either hook ends training before the next step.
/// Monitors only ever see shared references, so they cannot disturb learning.
pub trait Monitor {
    /// Whether [`on_step`](Monitor::on_step) should be called after every step
    fn wants_frames(&self) -> bool {
        false
    }

    fn on_step(&mut self, _frame: Frame<'_>) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    fn on_episode(&mut self, _report: &EpisodeReport) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

/// A monitor that observes nothing
pub struct Headless;

impl Monitor for Headless {}

/// Running statistics of a training run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingStats {
    /// Score of every completed episode
    pub scores: Vec<u32>,
    /// Mean score over all completed episodes, after each one
    pub mean_scores: Vec<f64>,
    /// Best score of this run
    pub record: u32,
    pub total_steps: u64,
    total_score: u64,
}

impl TrainingStats {
    /// Record a finished episode
    ///
    /// **Returns** whether `score` beat the previous record
    pub fn push(&mut self, score: u32) -> bool {
        self.scores.push(score);
        self.total_score += u64::from(score);
        self.mean_scores
            .push(self.total_score as f64 / self.scores.len() as f64);

        let new_record = score > self.record;
        if new_record {
            self.record = score;
        }
        new_record
    }

    pub fn episodes(&self) -> usize {
        self.scores.len()
    }

    /// Mean score so far, zero before the first episode
    pub fn mean_score(&self) -> f64 {
        self.mean_scores.last().copied().unwrap_or(0.0)
    }
}

/// Drives episodes of the snake game through a [`DQNAgent`]
pub struct Trainer<B, M, O>
where
    B: AutodiffBackend,
    M: ValueModel<B> + AutodiffModule<B>,
    O: Optimizer<M, B>,
{
    pub env: SnakeEnv,
    pub agent: DQNAgent<B, M, O>,
    config: TrainerConfig,
}

/// Build the environment, model, Adam optimizer and agent described by `config`
pub fn from_config<B: AutodiffBackend>(
    config: &SnakeConfig,
    device: B::Device,
) -> Result<Trainer<B, ValueNet<B>, impl Optimizer<ValueNet<B>, B>>, ConfigError> {
    let env = SnakeEnv::new(config.game.clone())?;
    let model = config.model.init::<B>(&device);
    let optimizer = AdamConfig::new().init::<B, ValueNet<B>>();
    let agent = DQNAgent::new(model, optimizer, &config.agent, device)?;
    Ok(Trainer::new(env, agent, config.trainer.clone()))
}

impl<B, M, O> Trainer<B, M, O>
where
    B: AutodiffBackend,
    M: ValueModel<B> + AutodiffModule<B>,
    O: Optimizer<M, B>,
{
    pub fn new(env: SnakeEnv, agent: DQNAgent<B, M, O>, config: TrainerConfig) -> Self {
        Self { env, agent, config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Run up to `episodes` episodes, saving the model to `checkpoint` on every new record
    ///
    /// An existing checkpoint is loaded first so repeated runs keep improving the same model.
    /// Stops early if `monitor` asks to.
    pub fn train(
        &mut self,
        episodes: u32,
        checkpoint: &Path,
        monitor: &mut impl Monitor,
    ) -> Result<TrainingStats, TrainError> {
        if episodes == 0 {
            return Err(TrainError::NoEpisodes);
        }
        if self.agent.load(checkpoint) {
            info!("resuming from checkpoint {}", checkpoint.display());
        }

        let mut stats = TrainingStats::default();

        for episode in 1..=episodes {
            let mut state = self.env.reset();

            loop {
                let action = self.agent.select_action(&state);
                let step = self.env.step(action);
                let exp = Exp {
                    state,
                    action,
                    reward: step.reward,
                    next_state: step.state,
                    done: step.done,
                };
                self.agent.train_step(std::slice::from_ref(&exp));
                self.agent.remember(exp);
                stats.total_steps += 1;
                state = step.state;

                if monitor.wants_frames() {
                    let frame = Frame {
                        env: &self.env,
                        episode,
                        epsilon: self.agent.epsilon(),
                        record: stats.record,
                    };
                    if monitor.on_step(frame).is_break() {
                        info!("training stopped during episode {episode}");
                        return Ok(stats);
                    }
                }

                if step.done {
                    break;
                }
            }

            self.agent.train_batch();
            self.agent.decay_exploration();

            let score = self.env.score();
            let data = self
                .env
                .report
                .keys()
                .into_iter()
                .zip(self.env.report.take())
                .collect();

            if stats.push(score) {
                self.agent.save(checkpoint)?;
            }

            let report = EpisodeReport {
                episode,
                score,
                mean_score: stats.mean_score(),
                record: stats.record,
                epsilon: self.agent.epsilon(),
                data,
            };

            if episode == 1 || episode % self.config.log_interval.max(1) == 0 {
                info!(
                    "Ep {} | Score {} | Record {} | Mean {:.1} | eps {:.3}",
                    report.episode, report.score, report.record, report.mean_score, report.epsilon
                );
            }

            if monitor.on_episode(&report).is_break() {
                info!("training stopped after episode {episode}");
                return Ok(stats);
            }
        }

        info!(
            "finished {} episodes: record {}, mean score {:.2}, {} steps",
            stats.episodes(),
            stats.record,
            stats.mean_score(),
            stats.total_steps
        );

        Ok(stats)
    }
}
