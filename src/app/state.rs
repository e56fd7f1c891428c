//! The `App` struct and the state types behind the UI.

use crate::chat::{
    AgentBackend, ChatConfig, Conversation, CredentialErrors, CredentialStore, ModelDescriptor,
    ModelDirectory,
};

/// Which surface receives plain keystrokes when no overlay is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusArea {
    /// The query input line at the bottom.
    Input,
    /// The message thread, for scrolling.
    Thread,
}

/// The whole application state.
pub struct App {
    /// Main loop flag; cleared by the quit shortcut.
    pub running: bool,
    pub focus: FocusArea,
    /// The conversation core driven by agent events.
    pub conversation: Conversation,
    /// The query composer at the bottom of the screen.
    pub input: InputComposer,
    /// One-line hint shown in the status bar.
    pub status_message: String,
    /// Modal overlay capturing all input while open.
    pub overlay: Option<OverlayState>,

    // --- Collaborators ---
    pub(crate) credentials: CredentialStore,
    pub(crate) backend: Box<dyn AgentBackend>,
    pub(crate) directory: ModelDirectory,

    // --- Configuration and model selection ---
    pub config: ChatConfig,
    /// Inference profile used for the next submission.
    pub selected_model_id: String,
    /// Directory results, kept between picker openings.
    pub models: Vec<ModelDescriptor>,
    pub directory_loading: bool,
    pub directory_error: Option<String>,

    /// Lines scrolled up from the bottom of the thread.
    pub thread_scroll: u16,
}

impl App {
    /// True while the input surface must reject submissions.
    pub fn input_disabled(&self) -> bool {
        self.conversation.is_busy()
    }

    pub fn credentials_configured(&self) -> bool {
        self.credentials.is_configured()
    }
}

/// The modal overlays. At most one is open at a time.
pub enum OverlayState {
    Credentials(CredentialsFormState),
    ModelPicker(ModelPickerState),
}

/// The four fields of the credentials form, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialField {
    #[default]
    AccessKeyId,
    SecretAccessKey,
    SessionToken,
    Region,
}

impl CredentialField {
    pub const ALL: [CredentialField; 4] = [
        CredentialField::AccessKeyId,
        CredentialField::SecretAccessKey,
        CredentialField::SessionToken,
        CredentialField::Region,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CredentialField::AccessKeyId => "Access Key ID",
            CredentialField::SecretAccessKey => "Secret Access Key",
            CredentialField::SessionToken => "Session Token (optional)",
            CredentialField::Region => "Region (optional)",
        }
    }

    /// Secret fields render masked.
    pub fn is_secret(self) -> bool {
        matches!(
            self,
            CredentialField::SecretAccessKey | CredentialField::SessionToken
        )
    }

    pub fn next(self) -> Self {
        match self {
            CredentialField::AccessKeyId => CredentialField::SecretAccessKey,
            CredentialField::SecretAccessKey => CredentialField::SessionToken,
            CredentialField::SessionToken => CredentialField::Region,
            CredentialField::Region => CredentialField::AccessKeyId,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            CredentialField::AccessKeyId => CredentialField::Region,
            CredentialField::SecretAccessKey => CredentialField::AccessKeyId,
            CredentialField::SessionToken => CredentialField::SecretAccessKey,
            CredentialField::Region => CredentialField::SessionToken,
        }
    }
}

/// State of the credentials form overlay.
#[derive(Debug, Clone, Default)]
pub struct CredentialsFormState {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub region: String,
    pub focused: CredentialField,
    /// Per-field validation failures from the last submit attempt.
    pub errors: CredentialErrors,
}

impl CredentialsFormState {
    pub fn field(&self, field: CredentialField) -> &str {
        match field {
            CredentialField::AccessKeyId => &self.access_key_id,
            CredentialField::SecretAccessKey => &self.secret_access_key,
            CredentialField::SessionToken => &self.session_token,
            CredentialField::Region => &self.region,
        }
    }

    pub fn field_mut(&mut self, field: CredentialField) -> &mut String {
        match field {
            CredentialField::AccessKeyId => &mut self.access_key_id,
            CredentialField::SecretAccessKey => &mut self.secret_access_key,
            CredentialField::SessionToken => &mut self.session_token,
            CredentialField::Region => &mut self.region,
        }
    }

    pub fn focus_next(&mut self) {
        self.focused = self.focused.next();
    }

    pub fn focus_previous(&mut self) {
        self.focused = self.focused.previous();
    }
}

/// State of the model picker overlay. The rows are the flattened,
/// provider-grouped directory results; provider headers are rendered
/// between groups but only model rows are selectable.
#[derive(Debug, Clone, Default)]
pub struct ModelPickerState {
    pub rows: Vec<ModelDescriptor>,
    pub selected: usize,
}

impl ModelPickerState {
    pub fn new(rows: Vec<ModelDescriptor>, current_model_id: &str) -> Self {
        let selected = rows
            .iter()
            .position(|model| model.model_id == current_model_id)
            .unwrap_or(0);
        Self { rows, selected }
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.rows.is_empty() {
            return;
        }
        let len = self.rows.len() as isize;
        self.selected = (self.selected as isize + delta).clamp(0, len - 1) as usize;
    }

    pub fn selected_model(&self) -> Option<&ModelDescriptor> {
        self.rows.get(self.selected)
    }
}

/// State for the query input line: text buffer, cursor and submit history.
#[derive(Clone, Default)]
pub struct InputComposer {
    buffer: String,
    cursor: usize,
    history: Vec<String>,
    history_index: Option<usize>,
}

impl InputComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Inserts a character at the current cursor position.
    pub fn insert_char(&mut self, ch: char) {
        self.buffer.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
        self.history_index = None;
    }

    pub fn insert_str(&mut self, text: &str) {
        self.buffer.insert_str(self.cursor, text);
        self.cursor += text.len();
        self.history_index = None;
    }

    /// Deletes the character before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        if let Some((idx, _)) = self.buffer[..self.cursor].char_indices().next_back() {
            self.buffer.drain(idx..self.cursor);
            self.cursor = idx;
            self.history_index = None;
        }
    }

    /// Deletes the character at the cursor.
    pub fn delete(&mut self) {
        if self.cursor >= self.buffer.len() {
            return;
        }
        if let Some((_, ch)) = self.buffer[self.cursor..].char_indices().next() {
            let end = self.cursor + ch.len_utf8();
            self.buffer.drain(self.cursor..end);
            self.history_index = None;
        }
    }

    pub fn move_left(&mut self) {
        if let Some((idx, _)) = self.buffer[..self.cursor].char_indices().next_back() {
            self.cursor = idx;
        }
    }

    pub fn move_right(&mut self) {
        if let Some((offset, ch)) = self.buffer[self.cursor..].char_indices().next() {
            self.cursor += offset + ch.len_utf8();
        }
    }

    pub fn move_to_start(&mut self) {
        self.cursor = 0;
    }

    pub fn move_to_end(&mut self) {
        self.cursor = self.buffer.len();
    }

    /// Takes the buffer for submission, recording it in the history.
    pub fn take(&mut self) -> String {
        let text = std::mem::take(&mut self.buffer);
        self.cursor = 0;
        self.history_index = None;
        if !text.trim().is_empty() {
            self.history.push(text.clone());
        }
        text
    }

    /// Replaces the buffer with the previous history entry.
    pub fn history_previous(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let next_index = match self.history_index {
            None => self.history.len() - 1,
            Some(0) => 0,
            Some(idx) => idx - 1,
        };
        self.history_index = Some(next_index);
        self.buffer = self.history[next_index].clone();
        self.cursor = self.buffer.len();
    }

    /// Replaces the buffer with the next history entry, or clears it when
    /// walking past the newest one.
    pub fn history_next(&mut self) {
        let Some(idx) = self.history_index else {
            return;
        };
        if idx + 1 < self.history.len() {
            self.history_index = Some(idx + 1);
            self.buffer = self.history[idx + 1].clone();
        } else {
            self.history_index = None;
            self.buffer.clear();
        }
        self.cursor = self.buffer.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ModelDescriptor;

    fn descriptor(id: &str) -> ModelDescriptor {
        ModelDescriptor {
            model_id: id.to_string(),
            model_name: id.to_uppercase(),
            provider_name: "Provider".to_string(),
            description: None,
            status: "ACTIVE".to_string(),
            profile_type: "SYSTEM_DEFINED".to_string(),
        }
    }

    #[test]
    fn composer_edits_respect_utf8_boundaries() {
        let mut composer = InputComposer::new();
        composer.insert_char('é');
        composer.insert_char('x');
        composer.move_left();
        composer.backspace();
        assert_eq!(composer.buffer(), "x");
    }

    #[test]
    fn take_records_history_and_clears_the_buffer() {
        let mut composer = InputComposer::new();
        composer.insert_str("first question");
        assert_eq!(composer.take(), "first question");
        assert!(composer.is_empty());

        composer.history_previous();
        assert_eq!(composer.buffer(), "first question");
        composer.history_next();
        assert!(composer.is_empty());
    }

    #[test]
    fn credential_fields_cycle_in_tab_order() {
        let mut field = CredentialField::AccessKeyId;
        for expected in CredentialField::ALL {
            assert_eq!(field, expected);
            field = field.next();
        }
        assert_eq!(field, CredentialField::AccessKeyId);
        assert_eq!(field.previous(), CredentialField::Region);
    }

    #[test]
    fn picker_selection_clamps_to_the_row_range() {
        let mut empty = ModelPickerState::default();
        empty.move_selection(1);
        assert_eq!(empty.selected, 0);

        let mut picker =
            ModelPickerState::new(vec![descriptor("a"), descriptor("b")], "b");
        assert_eq!(picker.selected, 1);
        picker.move_selection(5);
        assert_eq!(picker.selected, 1);
        picker.move_selection(-5);
        assert_eq!(picker.selected, 0);
        assert_eq!(picker.selected_model().map(|m| m.model_id.as_str()), Some("a"));
    }
}
