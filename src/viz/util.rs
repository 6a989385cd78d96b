use crossterm::event::{Event, KeyCode, KeyEventKind};

/// The key behind a press event, ignoring releases and non-key events
pub(super) fn pressed_key(event: &Event) -> Option<KeyCode> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(key.code),
        _ => None,
    }
}
