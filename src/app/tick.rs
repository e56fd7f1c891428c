use super::state::App;

impl App {
    /// Called on every tick of the main loop, which owns the interval.
    ///
    /// Drains the agent and directory channels in arrival order. The draw
    /// that follows each tick is what makes accumulator updates visible as
    /// streaming.
    pub fn on_tick(&mut self) {
        while let Some(event) = self.backend.poll_event() {
            self.handle_agent_event(event);
        }
        while let Some(event) = self.directory.poll_event() {
            self.handle_directory_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatConfig;

    #[tokio::test]
    async fn tick_with_no_pending_events_changes_nothing() {
        let mut app = App::new(ChatConfig::default()).expect("app state");
        app.credentials.clear();
        let status = app.status_message.clone();
        app.on_tick();
        assert_eq!(app.status_message, status);
        assert!(app.conversation.messages().is_empty());
    }
}
