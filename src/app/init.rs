use anyhow::Result;
use log::debug;

use super::state::{App, FocusArea, InputComposer};
use crate::chat::{BedrockBackend, ChatConfig, Conversation, CredentialStore, ModelDirectory};

impl App {
    /// Creates the application state.
    ///
    /// Credentials are seeded from the AWS environment variables when
    /// present; otherwise the user configures them through the form. A
    /// model directory refresh is started right away when credentials are
    /// available so the picker has data by the time it is opened.
    pub fn new(config: ChatConfig) -> Result<Self> {
        let credentials = CredentialStore::from_env();
        let directory = ModelDirectory::new();

        let status_message = if credentials.is_configured() {
            String::from("Enter to send, Ctrl+E credentials, Ctrl+P models, Ctrl+Q to quit")
        } else {
            String::from("No AWS credentials configured, press Ctrl+E to set them up")
        };
        debug!(
            "Initializing app, credentials configured: {}",
            credentials.is_configured()
        );

        let directory_loading = credentials.is_configured();
        if let Some(record) = credentials.retrieve() {
            directory.refresh(record.clone());
        }

        Ok(Self {
            running: true,
            focus: FocusArea::Input,
            conversation: Conversation::new(),
            input: InputComposer::new(),
            status_message,
            overlay: None,
            credentials,
            backend: Box::new(BedrockBackend::new()),
            directory,
            selected_model_id: config.model_id.clone(),
            config,
            models: Vec::new(),
            directory_loading,
            directory_error: None,
            thread_scroll: 0,
        })
    }
}
