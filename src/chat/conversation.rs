//! The per-session conversation state machine.
//!
//! A conversation owns the ordered message list and the streaming
//! accumulator for the single turn that may be in flight. The UI layer
//! drives it from agent events and re-renders after every mutation, which
//! is what makes streaming visible to the user.

use log::debug;
use uuid::Uuid;

use super::assemble::assemble;
use super::message::Message;

/// Phase of the turn currently in flight, if any.
///
/// A turn moves `Idle -> Pending -> Streaming -> Idle`; the streaming step
/// is skipped for batch responses. Completion and failure both return to
/// `Idle`, with the outcome recorded in the message list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnPhase {
    #[default]
    Idle,
    /// A user message and placeholder were appended, nothing arrived yet.
    Pending,
    /// At least one text delta has been applied to the placeholder.
    Streaming,
}

/// Ordered message history plus the state of the in-flight turn.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    phase: TurnPhase,
    /// Text buffer for the in-flight turn, discarded at finalization.
    accumulator: String,
    /// Id of the assistant placeholder being streamed into.
    active_turn: Option<Uuid>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// True while an agent invocation is in flight. The input surface must
    /// reject submissions while this holds.
    pub fn is_busy(&self) -> bool {
        self.phase != TurnPhase::Idle
    }

    /// Starts a new turn: appends the trimmed user message and an empty
    /// assistant placeholder, and returns the placeholder id.
    ///
    /// Returns `None` without touching the message list when the query is
    /// blank or another turn is still in flight.
    pub fn begin_turn(&mut self, query: &str) -> Option<Uuid> {
        let trimmed = query.trim();
        if trimmed.is_empty() || self.is_busy() {
            return None;
        }

        self.messages.push(Message::user(trimmed));
        let placeholder = Message::assistant_placeholder();
        let id = placeholder.id;
        self.messages.push(placeholder);

        self.accumulator.clear();
        self.active_turn = Some(id);
        self.phase = TurnPhase::Pending;
        debug!("Turn started, placeholder {id}");
        Some(id)
    }

    /// Appends a streamed text fragment to the accumulator and mirrors the
    /// accumulated text into the placeholder so partial progress renders.
    pub fn apply_text_delta(&mut self, delta: &str) {
        let Some(id) = self.active_turn else {
            debug!("Dropped text delta with no turn in flight");
            return;
        };
        self.phase = TurnPhase::Streaming;
        self.accumulator.push_str(delta);
        let snapshot = self.accumulator.clone();
        if let Some(placeholder) = self.messages.iter_mut().find(|msg| msg.id == id) {
            placeholder.content = snapshot;
        }
    }

    /// Finalizes the in-flight turn from the accumulated text.
    ///
    /// The assembler runs exactly once per turn, here. The placeholder is
    /// rewritten in place with the answer and any follow-up questions, and
    /// the accumulator is discarded.
    pub fn finalize(&mut self) {
        let Some(id) = self.active_turn.take() else {
            return;
        };
        let assembled = assemble(&self.accumulator);
        self.accumulator.clear();
        if let Some(placeholder) = self.messages.iter_mut().find(|msg| msg.id == id) {
            placeholder.content = assembled.answer;
            placeholder.follow_up_questions = assembled.follow_ups;
        }
        self.phase = TurnPhase::Idle;
        debug!("Turn finalized, placeholder {id}");
    }

    /// Finalizes the in-flight turn from a complete response string, the
    /// batch-mode counterpart of the delta/stop sequence.
    pub fn finalize_with(&mut self, complete: &str) {
        if self.active_turn.is_none() {
            return;
        }
        self.accumulator.clear();
        self.accumulator.push_str(complete);
        self.finalize();
    }

    /// Replaces the in-flight placeholder with an error message that keeps
    /// the placeholder's id, so the thread never ends up with a duplicate
    /// or dangling entry for the failed turn.
    pub fn fail(&mut self, description: Option<&str>) {
        let Some(id) = self.active_turn.take() else {
            return;
        };
        self.accumulator.clear();
        let detail = description
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .unwrap_or("Failed to get response");
        if let Some(slot) = self.messages.iter_mut().find(|msg| msg.id == id) {
            *slot = Message::assistant_error(id, detail);
        }
        self.phase = TurnPhase::Idle;
        debug!("Turn failed, placeholder {id} replaced");
    }

    /// Follow-up questions attached to the most recent message, shown as
    /// the suggestion row under the thread.
    pub fn last_follow_ups(&self) -> Option<&[String]> {
        self.messages
            .last()
            .and_then(|msg| msg.follow_up_questions.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::Role;

    #[test]
    fn begin_turn_appends_user_and_empty_placeholder() {
        let mut convo = Conversation::new();
        let id = convo.begin_turn("  hello there  ").expect("turn starts");

        assert_eq!(convo.messages().len(), 2);
        assert_eq!(convo.messages()[0].role, Role::User);
        assert_eq!(convo.messages()[0].content, "hello there");
        assert_eq!(convo.messages()[1].role, Role::Assistant);
        assert_eq!(convo.messages()[1].content, "");
        assert_eq!(convo.messages()[1].id, id);
        assert_eq!(convo.phase(), TurnPhase::Pending);
    }

    #[test]
    fn blank_query_is_rejected_without_mutation() {
        let mut convo = Conversation::new();
        assert!(convo.begin_turn("   \n  ").is_none());
        assert!(convo.messages().is_empty());
        assert_eq!(convo.phase(), TurnPhase::Idle);
    }

    #[test]
    fn second_submission_is_rejected_while_busy() {
        let mut convo = Conversation::new();
        convo.begin_turn("first").expect("turn starts");
        assert!(convo.begin_turn("second").is_none());
        assert_eq!(convo.messages().len(), 2);
    }

    #[test]
    fn deltas_accumulate_into_the_placeholder() {
        let mut convo = Conversation::new();
        let id = convo.begin_turn("hi").expect("turn starts");

        convo.apply_text_delta("Hel");
        assert_eq!(convo.messages()[1].content, "Hel");
        assert_eq!(convo.phase(), TurnPhase::Streaming);

        convo.apply_text_delta("lo");
        assert_eq!(convo.messages()[1].content, "Hello");

        convo.finalize();
        let finalized = &convo.messages()[1];
        assert_eq!(finalized.id, id);
        assert_eq!(finalized.content, "Hello");
        assert_eq!(finalized.follow_up_questions, None);
        assert_eq!(convo.phase(), TurnPhase::Idle);
    }

    #[test]
    fn finalize_extracts_follow_up_questions() {
        let mut convo = Conversation::new();
        convo.begin_turn("hi").expect("turn starts");
        convo.apply_text_delta("The answer.\n---FOLLOW_UP_QUESTIONS---\nQ1\nQ2\n");
        convo.finalize();

        let finalized = &convo.messages()[1];
        assert_eq!(finalized.content, "The answer.");
        assert_eq!(
            finalized.follow_up_questions,
            Some(vec!["Q1".to_string(), "Q2".to_string()])
        );
        assert_eq!(convo.last_follow_ups(), Some(&["Q1".to_string(), "Q2".to_string()][..]));
    }

    #[test]
    fn follow_up_list_never_exceeds_four() {
        let mut convo = Conversation::new();
        convo.begin_turn("hi").expect("turn starts");
        convo.finalize_with("A\n---FOLLOW_UP_QUESTIONS---\nQ1\nQ2\nQ3\nQ4\nQ5\nQ6");
        let follow_ups = convo.messages()[1]
            .follow_up_questions
            .as_ref()
            .expect("follow-ups present");
        assert_eq!(follow_ups.len(), 4);
    }

    #[test]
    fn batch_finalization_matches_streamed_finalization() {
        let mut streamed = Conversation::new();
        streamed.begin_turn("hi").expect("turn starts");
        streamed.apply_text_delta("Hel");
        streamed.apply_text_delta("lo");
        streamed.finalize();

        let mut batch = Conversation::new();
        batch.begin_turn("hi").expect("turn starts");
        batch.finalize_with("Hello");

        assert_eq!(streamed.messages()[1].content, batch.messages()[1].content);
    }

    #[test]
    fn failure_replaces_the_placeholder_in_place() {
        let mut convo = Conversation::new();
        let id = convo.begin_turn("hi").expect("turn starts");
        convo.apply_text_delta("partial");
        convo.fail(Some("connection reset"));

        let assistant: Vec<_> = convo
            .messages()
            .iter()
            .filter(|msg| msg.role == Role::Assistant)
            .collect();
        assert_eq!(assistant.len(), 1);
        assert_eq!(assistant[0].id, id);
        assert_eq!(assistant[0].content, "Error: connection reset");
        assert!(assistant[0].is_error());
        assert_eq!(convo.phase(), TurnPhase::Idle);
    }

    #[test]
    fn failure_without_description_uses_the_fallback_text() {
        let mut convo = Conversation::new();
        convo.begin_turn("hi").expect("turn starts");
        convo.fail(None);
        assert_eq!(convo.messages()[1].content, "Error: Failed to get response");

        let mut convo = Conversation::new();
        convo.begin_turn("hi").expect("turn starts");
        convo.fail(Some("   "));
        assert_eq!(convo.messages()[1].content, "Error: Failed to get response");
    }

    #[test]
    fn new_turn_is_accepted_after_a_failure() {
        let mut convo = Conversation::new();
        convo.begin_turn("hi").expect("turn starts");
        convo.fail(Some("boom"));
        assert!(convo.begin_turn("again").is_some());
        assert_eq!(convo.messages().len(), 4);
    }
}
