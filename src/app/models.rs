//! Model picker flow: listing, retrying and selecting inference profiles.

use log::{debug, info};

use super::state::{App, ModelPickerState, OverlayState};
use crate::chat::models::{categorize, model_display_name};
use crate::chat::DirectoryEvent;

impl App {
    /// Opens the model picker over whatever the directory has produced so
    /// far. With no data and no error it shows the loading state; listing
    /// failures keep the picker usable with a retry hint and the default
    /// model still selected.
    pub(crate) fn open_model_picker(&mut self) {
        if self.models.is_empty() && self.directory_error.is_none() && !self.directory_loading {
            self.refresh_models();
        }
        let rows = flatten_by_provider(&self.models);
        self.overlay = Some(OverlayState::ModelPicker(ModelPickerState::new(
            rows,
            &self.selected_model_id,
        )));
    }

    /// Starts a background listing attempt, also used as the retry action.
    pub(crate) fn refresh_models(&mut self) {
        let Some(record) = self.credentials.retrieve().cloned() else {
            debug!("Skipping model listing, no credentials configured");
            return;
        };
        self.directory_loading = true;
        self.directory_error = None;
        self.directory.refresh(record);
    }

    /// Applies one directory event. A failure leaves the previous results
    /// in place; the chat keeps working against the selected model.
    pub(crate) fn handle_directory_event(&mut self, event: DirectoryEvent) {
        match event {
            DirectoryEvent::Loaded(models) => {
                info!("Model directory loaded {} profiles", models.len());
                self.models = models;
                self.directory_loading = false;
                self.directory_error = None;
                if let Some(OverlayState::ModelPicker(picker)) = self.overlay.as_mut() {
                    *picker =
                        ModelPickerState::new(flatten_by_provider(&self.models), &self.selected_model_id);
                }
            }
            DirectoryEvent::Failed(description) => {
                self.directory_loading = false;
                self.directory_error = Some(description);
            }
        }
    }

    /// Makes the picker's highlighted model the one used for new turns.
    pub(crate) fn choose_selected_model(&mut self) {
        let Some(OverlayState::ModelPicker(picker)) = self.overlay.as_ref() else {
            return;
        };
        let Some(model) = picker.selected_model().cloned() else {
            return;
        };
        info!("Model selected: {}", model.model_id);
        self.selected_model_id = model.model_id;
        self.overlay = None;
        self.status_message = format!("Model set to {}", model.model_name);
    }

    /// Label for the status bar: the directory name when known, otherwise
    /// the friendly form of the bare id (the default-model fallback).
    pub fn selected_model_label(&self) -> String {
        self.models
            .iter()
            .find(|model| model.model_id == self.selected_model_id)
            .map(|model| model.model_name.clone())
            .unwrap_or_else(|| model_display_name(&self.selected_model_id))
    }
}

/// Flattens the provider categories into selectable picker rows, keeping
/// the provider grouping order.
fn flatten_by_provider(models: &[crate::chat::ModelDescriptor]) -> Vec<crate::chat::ModelDescriptor> {
    categorize(models)
        .into_iter()
        .flat_map(|category| category.models)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ChatConfig, ModelDescriptor};

    fn descriptor(id: &str, name: &str, provider: &str) -> ModelDescriptor {
        ModelDescriptor {
            model_id: id.to_string(),
            model_name: name.to_string(),
            provider_name: provider.to_string(),
            description: None,
            status: "ACTIVE".to_string(),
            profile_type: "SYSTEM_DEFINED".to_string(),
        }
    }

    #[tokio::test]
    async fn directory_failure_surfaces_retry_state_and_default_model() {
        let mut app = App::new(ChatConfig::default()).expect("app state");
        app.handle_directory_event(DirectoryEvent::Failed("HTTP 403".to_string()));

        assert_eq!(app.directory_error.as_deref(), Some("HTTP 403"));
        assert!(!app.directory_loading);
        // The default model is still usable for display.
        assert_eq!(app.selected_model_label(), "Claude Sonnet 4");
    }

    #[tokio::test]
    async fn loaded_models_replace_the_error_and_feed_the_picker() {
        let mut app = App::new(ChatConfig::default()).expect("app state");
        app.handle_directory_event(DirectoryEvent::Failed("HTTP 500".to_string()));
        app.open_model_picker();
        app.handle_directory_event(DirectoryEvent::Loaded(vec![
            descriptor("us.amazon.nova-pro-v1:0", "Amazon Nova Pro", "Amazon"),
            descriptor("us.meta.llama3-3-70b-instruct-v1:0", "Meta Llama 3.3", "Meta"),
        ]));

        assert_eq!(app.directory_error, None);
        let Some(OverlayState::ModelPicker(picker)) = app.overlay.as_ref() else {
            panic!("picker should be open");
        };
        assert_eq!(picker.rows.len(), 2);

        app.choose_selected_model();
        assert!(app.overlay.is_none());
        assert_eq!(app.selected_model_id, "us.amazon.nova-pro-v1:0");
        assert_eq!(app.selected_model_label(), "Amazon Nova Pro");
    }
}
