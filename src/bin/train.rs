use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use burn::{config::Config, optim::Optimizer, tensor::backend::Backend};
use clap::Parser;
use snake_dqn::{
    backend::{default_device, TrainingBackend},
    checkpoint,
    config::SnakeConfig,
    model::ValueNet,
    train::{self, Headless, Trainer, TrainingStats},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "train")]
#[command(version, about = "Train a deep Q-learning agent to play snake")]
struct Cli {
    /// Episodes to train for [default: 500, or the value in --config]
    #[arg(long)]
    episodes: Option<u32>,

    /// Draw the board live while training
    #[arg(long)]
    render: bool,

    /// Do not plot scores live
    #[arg(long)]
    no_plot: bool,

    /// Where the best model is saved and resumed from
    #[arg(long, default_value = checkpoint::DEFAULT_PATH)]
    checkpoint: PathBuf,

    /// JSON file with game, agent, model and trainer settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed the game, the agent and the backend for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Wrap around the grid edges instead of dying on them
    #[arg(long)]
    wrap: bool,
}

type Net = ValueNet<TrainingBackend>;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SnakeConfig::load(path)
            .map_err(|err| anyhow!("failed to load config {}: {err}", path.display()))?,
        None => SnakeConfig::new(),
    };
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    if cli.wrap {
        config.game.wall_kill = false;
    }
    if let Some(episodes) = cli.episodes {
        config.trainer.episodes = episodes;
    }

    if let Some(seed) = config.agent.seed {
        TrainingBackend::seed(seed);
    }
    let mut trainer = train::from_config::<TrainingBackend>(&config, default_device())
        .context("invalid configuration")?;
    let episodes = config.trainer.episodes;

    #[cfg(feature = "viz")]
    if cli.render || !cli.no_plot {
        return train_with_tui(&mut trainer, episodes, &cli);
    }

    train_headless(&mut trainer, episodes, &cli.checkpoint)
}

fn train_headless<O: Optimizer<Net, TrainingBackend>>(
    trainer: &mut Trainer<TrainingBackend, Net, O>,
    episodes: u32,
    checkpoint: &Path,
) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let stats = trainer.train(episodes, checkpoint, &mut Headless)?;
    summarize(&stats);
    Ok(())
}

/// Final line on stdout, which outlives the TUI's alternate screen
fn summarize(stats: &TrainingStats) {
    println!(
        "trained {} episodes: record {}, mean score {:.2}, {} steps",
        stats.episodes(),
        stats.record,
        stats.mean_score(),
        stats.total_steps
    );
}

#[cfg(feature = "viz")]
fn train_with_tui<O: Optimizer<Net, TrainingBackend>>(
    trainer: &mut Trainer<TrainingBackend, Net, O>,
    episodes: u32,
    cli: &Cli,
) -> Result<()> {
    use log::LevelFilter;
    use snake_dqn::viz::{self, Tab};

    viz::init_logger(LevelFilter::Info)?;

    let mut tabs = Vec::new();
    if cli.render {
        tabs.push(Tab::Game);
    }
    if !cli.no_plot {
        tabs.push(Tab::Plots);
    }
    tabs.push(Tab::Logs);

    let (handle, mut monitor) = viz::init(episodes, tabs, cli.render);
    let result = trainer.train(episodes, &cli.checkpoint, &mut monitor);
    drop(monitor);

    match handle.join() {
        Ok(Ok(())) => {}
        Ok(Err(err)) => eprintln!("warning: TUI failed: {err}"),
        Err(_) => eprintln!("warning: TUI thread panicked"),
    }
    summarize(&result?);
    Ok(())
}
