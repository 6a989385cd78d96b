use crossterm::event::{Event, KeyCode};
use ratatui::{prelude::*, widgets::*};

use super::Component;
use crate::viz::util::pressed_key;

/// Scatter plot of one metric against the episode index
pub struct Plot {
    title: &'static str,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    data: Vec<(f64, f64)>,
}

impl Plot {
    pub fn new(title: &'static str, episodes: u32) -> Self {
        Self {
            title,
            x_bounds: [0.0, f64::from(episodes.max(1))],
            y_bounds: [0.0, 1.0],
            data: Vec::new(),
        }
    }

    pub fn push(&mut self, point: (f64, f64)) {
        let (x, y) = point;
        self.x_bounds = [self.x_bounds[0].min(x), self.x_bounds[1].max(x)];
        self.y_bounds = [self.y_bounds[0].min(y), self.y_bounds[1].max(y)];
        self.data.push(point);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    fn labels(bounds: [f64; 2]) -> Vec<Span<'static>> {
        let mid = (bounds[0] + bounds[1]) / 2.0;
        [bounds[0], mid, bounds[1]]
            .iter()
            .map(|v| format!("{v:.1}").bold())
            .collect()
    }
}

impl WidgetRef for Plot {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let dataset = Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Scatter)
            .cyan()
            .data(&self.data);

        let x_axis = Axis::default()
            .title("Episode")
            .dark_gray()
            .labels(Self::labels(self.x_bounds))
            .bounds(self.x_bounds);

        let y_axis = Axis::default()
            .title(self.title)
            .dark_gray()
            .labels(Self::labels(self.y_bounds))
            .bounds(self.y_bounds);

        Chart::new(vec![dataset])
            .block(
                Block::bordered()
                    .border_type(BorderType::Rounded)
                    .title(self.title),
            )
            .x_axis(x_axis)
            .y_axis(y_axis)
            .render(area, buf);
    }
}

/// One [`Plot`] per metric, with a selector to flip between them
pub struct Plots {
    plots: Vec<Plot>,
    selected: usize,
}

impl Plots {
    pub fn new(names: &[&'static str], episodes: u32) -> Self {
        Self {
            plots: names.iter().map(|name| Plot::new(*name, episodes)).collect(),
            selected: 0,
        }
    }

    pub fn next(&mut self) {
        if !self.plots.is_empty() {
            self.selected = (self.selected + 1) % self.plots.len();
        }
    }

    pub fn prev(&mut self) {
        if !self.plots.is_empty() {
            let len = self.plots.len();
            self.selected = (self.selected + len - 1) % len;
        }
    }

    /// Add one episode's metrics, in the order the plots were named
    pub fn push(&mut self, episode: u32, data: &[f64]) {
        for (plot, value) in self.plots.iter_mut().zip(data) {
            plot.push((f64::from(episode), *value));
        }
    }

    pub fn selected(&self) -> Option<&Plot> {
        self.plots.get(self.selected)
    }
}

impl WidgetRef for Plots {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let [tabs_area, plot_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(area);

        Tabs::new(self.plots.iter().map(|p| p.title))
            .white()
            .highlight_style(Style::default().light_green())
            .select(self.selected)
            .render(tabs_area, buf);

        if let Some(plot) = self.selected() {
            plot.render_ref(plot_area, buf);
        }
    }
}

impl Component for Plots {
    fn handle_ui_event(&mut self, event: &Event) -> bool {
        match pressed_key(event) {
            Some(KeyCode::Left) => self.prev(),
            Some(KeyCode::Right) => self.next(),
            _ => return false,
        }
        true
    }
}
