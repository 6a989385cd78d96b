use crossterm::event::{Event, KeyCode};
use log::LevelFilter;
use ratatui::{prelude::*, widgets::*};
use tui_logger::{TuiLoggerSmartWidget, TuiWidgetEvent, TuiWidgetState};

use super::Component;
use crate::viz::util::pressed_key;

/// Log pane fed by `tui_logger`
pub struct Logs {
    state: TuiWidgetState,
}

impl Default for Logs {
    fn default() -> Self {
        Self {
            state: TuiWidgetState::new().set_default_display_level(LevelFilter::Info),
        }
    }
}

impl WidgetRef for Logs {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        TuiLoggerSmartWidget::default()
            .style(Style::default().white())
            .style_error(Style::default().light_red())
            .style_warn(Style::default().light_yellow())
            .style_info(Style::default().light_green())
            .style_debug(Style::default().dark_gray())
            .output_separator('|')
            .output_timestamp(Some("%H:%M:%S".to_string()))
            .state(&self.state)
            .render(area, buf);
    }
}

impl Component for Logs {
    fn handle_ui_event(&mut self, event: &Event) -> bool {
        let event = match pressed_key(event) {
            Some(KeyCode::Up) => TuiWidgetEvent::UpKey,
            Some(KeyCode::Down) => TuiWidgetEvent::DownKey,
            Some(KeyCode::Left) => TuiWidgetEvent::LeftKey,
            Some(KeyCode::Right) => TuiWidgetEvent::RightKey,
            Some(KeyCode::PageUp) => TuiWidgetEvent::PrevPageKey,
            Some(KeyCode::PageDown) => TuiWidgetEvent::NextPageKey,
            Some(KeyCode::Esc) => TuiWidgetEvent::EscapeKey,
            Some(KeyCode::Char(' ')) => TuiWidgetEvent::SpaceKey,
            Some(KeyCode::Char('+')) => TuiWidgetEvent::PlusKey,
            Some(KeyCode::Char('-')) => TuiWidgetEvent::MinusKey,
            Some(KeyCode::Char('h')) => TuiWidgetEvent::HideKey,
            Some(KeyCode::Char('f')) => TuiWidgetEvent::FocusKey,
            _ => return false,
        };
        self.state.transition(event);
        true
    }
}
