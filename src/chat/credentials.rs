//! In-memory AWS credential record and its validation rules.
//!
//! The record lives for the lifetime of the process. It is rewritten only
//! by the credentials form and read fresh before every agent invocation,
//! never cached by the conversation flow.

use std::env;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// The credential record handed to the Bedrock request signer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

/// Per-field validation failures for the credentials form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialErrors {
    pub access_key_id: Option<&'static str>,
    pub secret_access_key: Option<&'static str>,
}

impl CredentialErrors {
    pub fn is_empty(&self) -> bool {
        self.access_key_id.is_none() && self.secret_access_key.is_none()
    }
}

impl AwsCredentials {
    /// Checks the required-field rule: access key id and secret key must be
    /// non-empty; session token and region are optional.
    pub fn validate(&self) -> Result<(), CredentialErrors> {
        let mut errors = CredentialErrors::default();
        if self.access_key_id.trim().is_empty() {
            errors.access_key_id = Some("Access Key ID is required");
        }
        if self.secret_access_key.trim().is_empty() {
            errors.secret_access_key = Some("Secret Access Key is required");
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Holds the single credential record for this session.
#[derive(Debug, Default)]
pub struct CredentialStore {
    record: Option<AwsCredentials>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store from the standard AWS environment variables when
    /// both key fields are present, so a pre-configured shell needs no
    /// form interaction.
    pub fn from_env() -> Self {
        let access_key_id = env::var("AWS_ACCESS_KEY_ID").unwrap_or_default();
        let secret_access_key = env::var("AWS_SECRET_ACCESS_KEY").unwrap_or_default();
        if access_key_id.trim().is_empty() || secret_access_key.trim().is_empty() {
            return Self::new();
        }
        let record = AwsCredentials {
            access_key_id,
            secret_access_key,
            session_token: env::var("AWS_SESSION_TOKEN").ok().filter(|t| !t.is_empty()),
            region: env::var("AWS_REGION").ok().filter(|r| !r.is_empty()),
        };
        debug!("Loaded AWS credentials from environment");
        Self {
            record: Some(record),
        }
    }

    /// Validates and stores a record. Nothing is persisted when validation
    /// fails, so a half-filled form never becomes the active record.
    pub fn store(&mut self, candidate: AwsCredentials) -> Result<(), CredentialErrors> {
        if let Err(errors) = candidate.validate() {
            warn!("Rejected credential record with missing required fields");
            return Err(errors);
        }
        self.record = Some(candidate);
        Ok(())
    }

    pub fn retrieve(&self) -> Option<&AwsCredentials> {
        self.record.as_ref()
    }

    pub fn clear(&mut self) {
        self.record = None;
    }

    pub fn is_configured(&self) -> bool {
        self.record.is_some()
    }
}
