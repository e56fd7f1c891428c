use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::state::{App, FocusArea, OverlayState};

impl App {
    /// The main entry point for handling keyboard events.
    ///
    /// Routing order: an open overlay captures everything, then the global
    /// shortcuts, then the focused surface.
    pub async fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.overlay.is_some() {
            self.handle_overlay_key(key).await;
            return;
        }

        if self.handle_global_shortcuts(key) {
            return;
        }

        match self.focus {
            FocusArea::Input => self.handle_input_key(key).await,
            FocusArea::Thread => self.handle_thread_key(key),
        }
    }

    /// Shortcuts that work regardless of focus. Returns true when handled.
    fn handle_global_shortcuts(&mut self, key: KeyEvent) -> bool {
        if !key.modifiers.contains(KeyModifiers::CONTROL) {
            return false;
        }
        match key.code {
            KeyCode::Char('q') => {
                self.running = false;
            }
            KeyCode::Char('e') => {
                self.open_credentials_panel();
            }
            KeyCode::Char('p') => {
                self.open_model_picker();
            }
            KeyCode::Char('t') => {
                self.focus = match self.focus {
                    FocusArea::Input => FocusArea::Thread,
                    FocusArea::Thread => FocusArea::Input,
                };
            }
            _ => return false,
        }
        true
    }

    /// Keys for the query input line.
    async fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                let query = self.input.take();
                self.submit_query(query).await;
            }
            KeyCode::Char(digit @ '1'..='4')
                if self.input.is_empty()
                    && !self.input_disabled()
                    && !key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                // Bare digits on an empty input pick a suggested question.
                let index = digit as usize - '1' as usize;
                self.select_follow_up(index).await;
            }
            // Unhandled Ctrl chords must not type as plain letters.
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.insert_char(ch)
            }
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Delete => self.input.delete(),
            KeyCode::Left => self.input.move_left(),
            KeyCode::Right => self.input.move_right(),
            KeyCode::Home => self.input.move_to_start(),
            KeyCode::End => self.input.move_to_end(),
            KeyCode::Up => self.input.history_previous(),
            KeyCode::Down => self.input.history_next(),
            KeyCode::PageUp => self.scroll_thread(5),
            KeyCode::PageDown => self.scroll_thread(-5),
            _ => {}
        }
    }

    /// Keys for the thread surface: scrolling only.
    fn handle_thread_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.scroll_thread(1),
            KeyCode::Down => self.scroll_thread(-1),
            KeyCode::PageUp => self.scroll_thread(10),
            KeyCode::PageDown => self.scroll_thread(-10),
            KeyCode::Home => self.thread_scroll = u16::MAX,
            KeyCode::End | KeyCode::Esc => self.thread_scroll = 0,
            _ => {}
        }
    }

    /// Keys while an overlay is open.
    async fn handle_overlay_key(&mut self, key: KeyEvent) {
        match self.overlay.as_mut() {
            Some(OverlayState::Credentials(form)) => match key.code {
                KeyCode::Esc => {
                    self.overlay = None;
                    self.status_message = String::from("Credentials unchanged");
                }
                KeyCode::Enter => self.submit_credentials_form(),
                KeyCode::Tab | KeyCode::Down => form.focus_next(),
                KeyCode::BackTab | KeyCode::Up => form.focus_previous(),
                KeyCode::Backspace => {
                    form.field_mut(form.focused).pop();
                }
                KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    form.field_mut(form.focused).clear();
                }
                KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    form.field_mut(form.focused).push(ch)
                }
                _ => {}
            },
            Some(OverlayState::ModelPicker(picker)) => match key.code {
                KeyCode::Esc => {
                    self.overlay = None;
                }
                KeyCode::Up => picker.move_selection(-1),
                KeyCode::Down => picker.move_selection(1),
                KeyCode::PageUp => picker.move_selection(-5),
                KeyCode::PageDown => picker.move_selection(5),
                KeyCode::Enter => self.choose_selected_model(),
                KeyCode::Char('r') => {
                    self.refresh_models();
                    self.status_message = String::from("Reloading model list...");
                }
                _ => {}
            },
            None => {}
        }
    }

    /// Bracketed paste goes into whichever text surface accepts typing.
    pub fn handle_paste(&mut self, text: &str) {
        match self.overlay.as_mut() {
            Some(OverlayState::Credentials(form)) => {
                form.field_mut(form.focused).push_str(text);
            }
            Some(OverlayState::ModelPicker(_)) => {}
            None => {
                if self.focus == FocusArea::Input {
                    self.input.insert_str(text);
                }
            }
        }
    }

    /// Positive deltas scroll up (into history), negative back down.
    pub(crate) fn scroll_thread(&mut self, delta: i32) {
        let next = i32::from(self.thread_scroll) + delta;
        self.thread_scroll = next.clamp(0, i32::from(u16::MAX)) as u16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatConfig;
    use crossterm::event::KeyEvent;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    #[tokio::test]
    async fn ctrl_q_stops_the_main_loop() {
        let mut app = App::new(ChatConfig::default()).expect("app state");
        app.handle_key(ctrl('q')).await;
        assert!(!app.running);
    }

    #[tokio::test]
    async fn typed_characters_land_in_the_composer() {
        let mut app = App::new(ChatConfig::default()).expect("app state");
        for ch in "hi".chars() {
            app.handle_key(key(KeyCode::Char(ch))).await;
        }
        assert_eq!(app.input.buffer(), "hi");
    }

    #[tokio::test]
    async fn overlay_captures_typing() {
        let mut app = App::new(ChatConfig::default()).expect("app state");
        app.handle_key(ctrl('e')).await;
        app.handle_key(key(KeyCode::Char('A'))).await;
        app.handle_key(key(KeyCode::Tab)).await;
        app.handle_key(key(KeyCode::Char('s'))).await;

        let Some(OverlayState::Credentials(form)) = app.overlay.as_ref() else {
            panic!("credentials form should be open");
        };
        assert_eq!(form.access_key_id, "A");
        assert_eq!(form.secret_access_key, "s");
        assert!(app.input.is_empty());
    }

    #[tokio::test]
    async fn escape_closes_the_credentials_form_without_saving() {
        let mut app = App::new(ChatConfig::default()).expect("app state");
        app.credentials.clear();
        app.handle_key(ctrl('e')).await;
        app.handle_key(key(KeyCode::Char('x'))).await;
        app.handle_key(key(KeyCode::Esc)).await;
        assert!(app.overlay.is_none());
        assert!(!app.credentials_configured());
    }

    #[tokio::test]
    async fn unhandled_ctrl_chords_do_not_type_into_the_composer() {
        let mut app = App::new(ChatConfig::default()).expect("app state");
        app.handle_key(ctrl('a')).await;
        app.handle_key(ctrl('1')).await;
        assert!(app.input.is_empty());
    }

    #[tokio::test]
    async fn digits_type_normally_when_the_composer_is_not_empty() {
        let mut app = App::new(ChatConfig::default()).expect("app state");
        app.handle_key(key(KeyCode::Char('v'))).await;
        app.handle_key(key(KeyCode::Char('1'))).await;
        assert_eq!(app.input.buffer(), "v1");
    }
}
