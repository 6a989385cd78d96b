use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{Receiver, TryRecvError},
        Arc,
    },
    time::Duration,
};

use crossterm::event::{self, KeyCode};
use ratatui::{prelude::*, widgets::*};

use super::{
    components::{Component, Game, GameFrame, Logs, Plots},
    tui,
    util::pressed_key,
};
use crate::gym::Snapshot;

/// Messages from the training loop to the TUI
pub enum Update {
    /// Metrics of a finished episode, in the order of the plot names given to [`App::new`]
    Episode { episode: u32, data: Vec<f64> },
    /// The game after one step
    Frame {
        snapshot: Snapshot,
        episode: u32,
        epsilon: f32,
        record: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Game,
    Plots,
    Logs,
}

impl Tab {
    fn title(self) -> &'static str {
        match self {
            Tab::Game => "Game",
            Tab::Plots => "Plots",
            Tab::Logs => "Logs",
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum State {
    #[default]
    Train,
    /// The training loop hung up
    Done,
    /// The user asked to stop training
    Quit,
}

/// The root TUI component which holds the main app state and runs the render loop
pub struct App {
    state: State,
    tabs: Vec<Tab>,
    selected_tab: usize,
    episode: u32,
    total_episodes: u32,
    game: Game,
    plots: Plots,
    logs: Logs,
    quit: Arc<AtomicBool>,
}

impl App {
    /// `quit` is raised when the user quits, before the update channel is dropped
    ///
    /// **Panics** if `tabs` is empty
    pub fn new(
        plots: &[&'static str],
        episodes: u32,
        tabs: Vec<Tab>,
        quit: Arc<AtomicBool>,
    ) -> Self {
        assert!(!tabs.is_empty(), "the TUI needs at least one tab");
        Self {
            state: State::default(),
            tabs,
            selected_tab: 0,
            episode: 0,
            total_episodes: episodes.max(1),
            game: Game::default(),
            plots: Plots::new(plots, episodes),
            logs: Logs::default(),
            quit,
        }
    }

    fn tab(&self) -> Tab {
        self.tabs[self.selected_tab]
    }

    pub fn update(&mut self, update: Update) {
        match update {
            Update::Episode { episode, data } => {
                self.episode = episode;
                self.plots.push(episode, &data);
            }
            Update::Frame {
                snapshot,
                episode,
                epsilon,
                record,
            } => self.game.update(GameFrame {
                snapshot,
                episode,
                epsilon,
                record,
            }),
        }
    }

    /// Drain pending updates without blocking
    fn receive(&mut self, rx: &Receiver<Update>) {
        while self.state == State::Train {
            match rx.try_recv() {
                Ok(update) => self.update(update),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => self.state = State::Done,
            }
        }
    }

    fn handle_event(&mut self, event: &event::Event) {
        match pressed_key(event) {
            Some(KeyCode::Char('q')) => {
                self.quit.store(true, Ordering::Release);
                self.state = State::Quit;
            }
            Some(KeyCode::Tab) => self.selected_tab = (self.selected_tab + 1) % self.tabs.len(),
            Some(KeyCode::BackTab) => {
                let len = self.tabs.len();
                self.selected_tab = (self.selected_tab + len - 1) % len;
            }
            _ => {
                match self.tab() {
                    Tab::Plots => self.plots.handle_ui_event(event),
                    Tab::Logs => self.logs.handle_ui_event(event),
                    Tab::Game => false,
                };
            }
        }
    }

    /// Initialize the terminal and run the main loop until the user quits or training ends
    ///
    /// Restores the terminal on exit.
    pub fn run(&mut self, rx: Receiver<Update>) -> io::Result<()> {
        let mut terminal = tui::init()?;

        while self.state == State::Train {
            self.receive(&rx);
            terminal.draw(|frame| frame.render_widget(&*self, frame.size()))?;

            if event::poll(Duration::from_millis(16))? {
                self.handle_event(&event::read()?);
            }
        }

        drop(rx);
        tui::restore()
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [menu_area, main_area, progress_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(3),
        ])
        .areas(area);

        Tabs::new(self.tabs.iter().map(|t| t.title()))
            .white()
            .bold()
            .highlight_style(Style::default().light_green())
            .select(self.selected_tab)
            .render(menu_area, buf);

        match self.tab() {
            Tab::Game => self.game.render_ref(main_area, buf),
            Tab::Plots => self.plots.render_ref(main_area, buf),
            Tab::Logs => self.logs.render_ref(main_area, buf),
        }

        Gauge::default()
            .block(
                Block::bordered()
                    .border_type(BorderType::Rounded)
                    .title("Progress (q to quit)"),
            )
            .gauge_style(Color::Cyan)
            .label(format!("{}/{}", self.episode, self.total_episodes))
            .ratio((f64::from(self.episode) / f64::from(self.total_episodes)).clamp(0.0, 1.0))
            .render(progress_area, buf);
    }
}
