//! Live terminal view of a training run.
//!
//! The TUI runs on its own thread and is fed through a channel by [`VizMonitor`], so the
//! training loop never blocks on drawing. Pressing `q` raises a shared quit flag and closes
//! the channel, which the monitor turns into a request to stop training. A channel that
//! closes without the flag means the TUI failed; training then carries on headless.

use std::{
    io,
    ops::ControlFlow,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
};

use log::{warn, LevelFilter, SetLoggerError};

use crate::train::{EpisodeReport, Frame, Monitor};

mod app;
mod components;
mod tui;
mod util;

pub use app::{App, Tab, Update};

/// Metrics plotted per episode
pub const PLOTS: [&str; 4] = ["score", "mean score", "reward", "steps"];

/// Route `log` records into the TUI's log pane
pub fn init_logger(level: LevelFilter) -> Result<(), SetLoggerError> {
    tui_logger::init_logger(level)?;
    tui_logger::set_default_level(level);
    Ok(())
}

/// Spawn the TUI thread
///
/// `frames` enables a board update after every step.
///
/// **Returns** the thread handle and a monitor feeding the TUI
pub fn init(
    episodes: u32,
    tabs: Vec<Tab>,
    frames: bool,
) -> (JoinHandle<io::Result<()>>, VizMonitor) {
    let (tx, rx) = mpsc::channel();
    let quit = Arc::new(AtomicBool::new(false));
    let app_quit = quit.clone();
    let handle = thread::spawn(move || App::new(&PLOTS, episodes, tabs, app_quit).run(rx));
    (handle, VizMonitor::new(tx, quit, frames))
}

/// [`Monitor`] that forwards frames and episode metrics to the TUI
pub struct VizMonitor {
    tx: Sender<Update>,
    quit: Arc<AtomicBool>,
    frames: bool,
    detached: bool,
}

impl VizMonitor {
    /// `quit` is the flag the TUI raises when the user quits
    pub fn new(tx: Sender<Update>, quit: Arc<AtomicBool>, frames: bool) -> Self {
        Self {
            tx,
            quit,
            frames,
            detached: false,
        }
    }

    /// Whether the TUI went away without the user quitting
    pub fn detached(&self) -> bool {
        self.detached
    }

    fn send(&mut self, update: Update) -> ControlFlow<()> {
        if self.detached || self.tx.send(update).is_ok() {
            return ControlFlow::Continue(());
        }
        if self.quit.load(Ordering::Acquire) {
            return ControlFlow::Break(());
        }
        warn!("the TUI stopped unexpectedly, training continues without it");
        self.detached = true;
        ControlFlow::Continue(())
    }
}

impl Monitor for VizMonitor {
    fn wants_frames(&self) -> bool {
        self.frames && !self.detached
    }

    fn on_step(&mut self, frame: Frame<'_>) -> ControlFlow<()> {
        self.send(Update::Frame {
            snapshot: frame.env.snapshot(),
            episode: frame.episode,
            epsilon: frame.epsilon,
            record: frame.record,
        })
    }

    fn on_episode(&mut self, report: &EpisodeReport) -> ControlFlow<()> {
        let total = |key: &str| {
            report
                .data
                .iter()
                .find(|(k, _)| *k == key)
                .map_or(0.0, |(_, v)| *v)
        };
        self.send(Update::Episode {
            episode: report.episode,
            data: vec![
                f64::from(report.score),
                report.mean_score,
                total("reward"),
                total("steps"),
            ],
        })
    }
}
