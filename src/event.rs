//! The events driving the main loop.

use crossterm::event::{Event as CrosstermEvent, KeyEvent, MouseEvent};

/// One iteration's worth of input for the application.
#[derive(Debug, Clone)]
pub enum Event {
    /// Periodic tick, used to drain background channels and redraw.
    Tick,
    Key(KeyEvent),
    Mouse(MouseEvent),
    Paste(String),
    Resize,
}

impl Event {
    /// Maps a raw terminal event, dropping the kinds the app ignores.
    pub fn from_crossterm(event: CrosstermEvent) -> Option<Self> {
        match event {
            CrosstermEvent::Key(key) => Some(Event::Key(key)),
            CrosstermEvent::Mouse(mouse) => Some(Event::Mouse(mouse)),
            CrosstermEvent::Paste(text) => Some(Event::Paste(text)),
            CrosstermEvent::Resize(_, _) => Some(Event::Resize),
            _ => None,
        }
    }
}
