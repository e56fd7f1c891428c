//! Conversation flow: submitting queries and consuming agent events.

use log::{debug, error, info, warn};

use super::state::{App, CredentialsFormState, OverlayState};
use crate::chat::config::DEFAULT_REGION;
use crate::chat::{AgentEvent, AgentRequest, ContentDelta};

impl App {
    /// Submits a query as a new conversation turn.
    ///
    /// Without a stored credential record the message list is left
    /// untouched and the credentials form opens instead. While a turn is
    /// in flight the submission is rejected. The credential record is read
    /// from the store here, at submission time, so edits made between
    /// turns always take effect.
    pub(crate) async fn submit_query(&mut self, query: String) {
        if query.trim().is_empty() {
            self.status_message = String::from("Nothing to send");
            return;
        }
        if self.input_disabled() {
            self.status_message = String::from("Waiting for the current response");
            return;
        }

        let Some(credentials) = self.credentials.retrieve().cloned() else {
            info!("Submission without credentials, opening the credentials form");
            self.open_credentials_form(CredentialsFormState::default());
            self.status_message = String::from("Configure AWS credentials first");
            return;
        };

        let Some(placeholder) = self.conversation.begin_turn(&query) else {
            return;
        };

        let region = credentials
            .region
            .clone()
            .or_else(|| self.config.region.clone())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        let request = AgentRequest {
            query: query.trim().to_string(),
            model_id: self.selected_model_id.clone(),
            region,
            credentials,
            system_prompt: self.config.system_prompt().to_string(),
            streaming: self.config.streaming,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        info!(
            "Submitting turn {placeholder} to {} ({})",
            self.backend.name(),
            request.model_id
        );
        if let Err(err) = self.backend.send(request).await {
            error!("Failed to dispatch agent request: {err:#}");
            self.conversation.fail(Some(&err.to_string()));
            self.status_message = format!("Request failed: {err}");
            return;
        }
        self.thread_scroll = 0;
        self.status_message = String::from("Waiting for response...");
    }

    /// Submits the follow-up question at `index` (0-based) from the last
    /// assistant message. Identical to typing and submitting it.
    pub(crate) async fn select_follow_up(&mut self, index: usize) {
        let Some(question) = self
            .conversation
            .last_follow_ups()
            .and_then(|questions| questions.get(index))
            .cloned()
        else {
            return;
        };
        self.submit_query(question).await;
    }

    /// Applies one agent event to the conversation.
    ///
    /// Only text deltas mutate the placeholder; tool and reasoning events
    /// are logged for diagnostic visibility and otherwise ignored.
    pub(crate) fn handle_agent_event(&mut self, event: AgentEvent) {
        match event {
            AgentEvent::BlockStart { tool_use } => {
                if let Some(start) = tool_use {
                    debug!("Tool use started: {} ({})", start.name, start.tool_use_id);
                }
            }
            AgentEvent::Delta(ContentDelta::Text(text)) => {
                self.conversation.apply_text_delta(&text);
                self.status_message = String::from("Streaming response...");
            }
            AgentEvent::Delta(ContentDelta::ToolInput(input)) => {
                debug!("Tool input delta: {input}");
            }
            AgentEvent::Delta(ContentDelta::Reasoning(text)) => {
                debug!("Reasoning delta: {text}");
            }
            AgentEvent::MessageStop { stop_reason } => {
                debug!("Message stopped, reason: {stop_reason}");
                self.conversation.finalize();
                self.status_message = String::from("Response complete");
            }
            AgentEvent::Completed(text) => {
                self.conversation.finalize_with(&text);
                self.status_message = String::from("Response complete");
            }
            AgentEvent::Error(description) => {
                warn!("Agent invocation failed: {description}");
                self.conversation.fail(Some(&description));
                self.status_message = String::from("Request failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ChatConfig, Role};

    fn app() -> App {
        let mut app = App::new(ChatConfig::default()).expect("app state");
        // Tests must not depend on ambient AWS environment variables.
        app.credentials.clear();
        app
    }

    fn app_with_credentials() -> App {
        let mut app = app();
        app.credentials
            .store(crate::chat::AwsCredentials {
                access_key_id: "AKIDEXAMPLE".to_string(),
                secret_access_key: "secret".to_string(),
                session_token: None,
                region: None,
            })
            .expect("store credentials");
        app
    }

    #[tokio::test]
    async fn submit_without_credentials_opens_the_form_and_keeps_the_thread() {
        let mut app = app();
        app.submit_query("hello".to_string()).await;

        assert!(app.conversation.messages().is_empty());
        assert!(matches!(app.overlay, Some(OverlayState::Credentials(_))));
    }

    #[tokio::test]
    async fn submit_appends_user_message_and_placeholder() {
        let mut app = app_with_credentials();
        app.submit_query("  hello  ".to_string()).await;

        let messages = app.conversation.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "hello");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "");
        assert!(app.input_disabled());
    }

    #[tokio::test]
    async fn submission_is_rejected_while_a_turn_is_in_flight() {
        let mut app = app_with_credentials();
        app.submit_query("first".to_string()).await;
        app.submit_query("second".to_string()).await;
        assert_eq!(app.conversation.messages().len(), 2);
    }

    #[tokio::test]
    async fn streamed_events_drive_the_placeholder_to_finalization() {
        let mut app = app_with_credentials();
        app.submit_query("hi".to_string()).await;

        app.handle_agent_event(AgentEvent::Delta(ContentDelta::Text("Hel".to_string())));
        assert_eq!(app.conversation.messages()[1].content, "Hel");
        app.handle_agent_event(AgentEvent::Delta(ContentDelta::Text("lo".to_string())));
        assert_eq!(app.conversation.messages()[1].content, "Hello");
        app.handle_agent_event(AgentEvent::MessageStop {
            stop_reason: "end_turn".to_string(),
        });

        assert_eq!(app.conversation.messages()[1].content, "Hello");
        assert!(!app.input_disabled());
    }

    #[tokio::test]
    async fn non_text_deltas_do_not_mutate_the_placeholder() {
        let mut app = app_with_credentials();
        app.submit_query("hi".to_string()).await;

        app.handle_agent_event(AgentEvent::Delta(ContentDelta::Reasoning(
            "thinking".to_string(),
        )));
        app.handle_agent_event(AgentEvent::Delta(ContentDelta::ToolInput(
            "{\"q\":1}".to_string(),
        )));
        assert_eq!(app.conversation.messages()[1].content, "");
    }

    #[tokio::test]
    async fn error_event_replaces_the_placeholder() {
        let mut app = app_with_credentials();
        app.submit_query("hi".to_string()).await;
        let placeholder_id = app.conversation.messages()[1].id;

        app.handle_agent_event(AgentEvent::Error("connection reset".to_string()));

        let assistant: Vec<_> = app
            .conversation
            .messages()
            .iter()
            .filter(|msg| msg.role == Role::Assistant)
            .collect();
        assert_eq!(assistant.len(), 1);
        assert_eq!(assistant[0].id, placeholder_id);
        assert!(assistant[0].content.starts_with("Error: "));
    }

    #[tokio::test]
    async fn selecting_a_follow_up_submits_it_verbatim() {
        let mut app = app_with_credentials();
        app.submit_query("hi".to_string()).await;
        app.handle_agent_event(AgentEvent::Completed(
            "A\n---FOLLOW_UP_QUESTIONS---\nWhat next?\nWhy?".to_string(),
        ));

        app.select_follow_up(1).await;
        let messages = app.conversation.messages();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[2].content, "Why?");
    }

    #[tokio::test]
    async fn credentials_are_read_fresh_for_every_turn() {
        let mut app = app_with_credentials();
        app.submit_query("hi".to_string()).await;
        app.handle_agent_event(AgentEvent::Completed("ok".to_string()));

        // A record rewritten between turns must be honored by the next one.
        app.credentials.clear();
        app.submit_query("again".to_string()).await;
        assert_eq!(app.conversation.messages().len(), 2);
        assert!(matches!(app.overlay, Some(OverlayState::Credentials(_))));
    }
}
