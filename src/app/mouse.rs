use crossterm::event::{MouseEvent, MouseEventKind};

use super::state::App;

impl App {
    /// Mouse input is only used to scroll the message thread; everything
    /// else is keyboard-driven.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.overlay.is_some() {
            return;
        }
        match mouse.kind {
            MouseEventKind::ScrollUp => self.scroll_thread(3),
            MouseEventKind::ScrollDown => self.scroll_thread(-3),
            _ => {}
        }
    }
}
