//! Credentials form flow: opening, editing and persisting the record.

use log::{info, warn};

use super::state::{App, CredentialsFormState, OverlayState};
use crate::chat::AwsCredentials;

impl App {
    /// Opens the credentials form, prefilled from the stored record so the
    /// user can edit rather than retype.
    pub(crate) fn open_credentials_panel(&mut self) {
        let mut form = CredentialsFormState::default();
        if let Some(record) = self.credentials.retrieve() {
            form.access_key_id = record.access_key_id.clone();
            form.secret_access_key = record.secret_access_key.clone();
            form.session_token = record.session_token.clone().unwrap_or_default();
            form.region = record.region.clone().unwrap_or_default();
        }
        self.open_credentials_form(form);
    }

    pub(crate) fn open_credentials_form(&mut self, form: CredentialsFormState) {
        self.overlay = Some(OverlayState::Credentials(form));
    }

    /// Validates and stores the form contents. On validation failure the
    /// form stays open with per-field errors and nothing is persisted.
    pub(crate) fn submit_credentials_form(&mut self) {
        let Some(OverlayState::Credentials(form)) = self.overlay.as_mut() else {
            return;
        };
        let candidate = AwsCredentials {
            access_key_id: form.access_key_id.trim().to_string(),
            secret_access_key: form.secret_access_key.trim().to_string(),
            session_token: non_empty(&form.session_token),
            region: non_empty(&form.region),
        };

        match self.credentials.store(candidate) {
            Ok(()) => {
                info!("Credential record updated");
                self.overlay = None;
                self.status_message = String::from("Credentials saved");
                // The directory may have failed or never run without
                // credentials; retry with the fresh record.
                self.refresh_models();
            }
            Err(errors) => {
                warn!("Credentials form rejected by validation");
                form.errors = errors;
                self.status_message = String::from("Fix the highlighted fields");
            }
        }
    }

    /// Clears the stored record.
    pub(crate) fn clear_credentials(&mut self) {
        self.credentials.clear();
        self.status_message = String::from("Credentials cleared");
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatConfig;

    #[tokio::test]
    async fn invalid_form_keeps_the_overlay_open_with_field_errors() {
        let mut app = App::new(ChatConfig::default()).expect("app state");
        app.credentials.clear();
        app.open_credentials_panel();
        if let Some(OverlayState::Credentials(form)) = app.overlay.as_mut() {
            form.access_key_id = "AKIDEXAMPLE".to_string();
            // secret key left empty
        }
        app.submit_credentials_form();

        let Some(OverlayState::Credentials(form)) = app.overlay.as_ref() else {
            panic!("form should remain open");
        };
        assert!(form.errors.secret_access_key.is_some());
        assert!(form.errors.access_key_id.is_none());
        assert!(!app.credentials_configured());
    }

    #[tokio::test]
    async fn valid_form_persists_and_closes() {
        let mut app = App::new(ChatConfig::default()).expect("app state");
        app.credentials.clear();
        app.open_credentials_panel();
        if let Some(OverlayState::Credentials(form)) = app.overlay.as_mut() {
            form.access_key_id = " AKIDEXAMPLE ".to_string();
            form.secret_access_key = "secret".to_string();
            form.region = "eu-central-1".to_string();
        }
        app.submit_credentials_form();

        assert!(app.overlay.is_none());
        let record = app.credentials.retrieve().expect("record stored");
        assert_eq!(record.access_key_id, "AKIDEXAMPLE");
        assert_eq!(record.session_token, None);
        assert_eq!(record.region.as_deref(), Some("eu-central-1"));
    }
}
