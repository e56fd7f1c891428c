//! The model directory: lists selectable Bedrock inference profiles.
//!
//! Listing runs in a background task and reports back over a channel, so a
//! slow or failing control-plane call never blocks the UI. A failure is
//! surfaced with a retry affordance; the chat keeps working against the
//! default model either way.

use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use url::Url;

use super::config::DEFAULT_REGION;
use super::credentials::AwsCredentials;
use super::sign::sign_request;

/// One selectable remote model, derived from an inference profile summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    pub model_id: String,
    pub model_name: String,
    pub provider_name: String,
    pub description: Option<String>,
    pub status: String,
    pub profile_type: String,
}

/// Models grouped under one provider heading for the picker.
#[derive(Debug, Clone)]
pub struct ModelCategory {
    pub name: String,
    pub models: Vec<ModelDescriptor>,
}

/// Outcome of one listing attempt.
#[derive(Debug)]
pub enum DirectoryEvent {
    Loaded(Vec<ModelDescriptor>),
    Failed(String),
}

/// Client for the Bedrock control-plane inference-profile listing.
pub struct ModelDirectory {
    client: Client,
    events_tx: UnboundedSender<DirectoryEvent>,
    events_rx: UnboundedReceiver<DirectoryEvent>,
}

impl ModelDirectory {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            client: Client::new(),
            events_tx: tx,
            events_rx: rx,
        }
    }

    /// Kicks off a listing in the background. The result arrives through
    /// [`ModelDirectory::poll_event`].
    pub fn refresh(&self, credentials: AwsCredentials) {
        let tx = self.events_tx.clone();
        let client = self.client.clone();
        tokio::spawn(async move {
            match list_models(&client, &credentials).await {
                Ok(models) => {
                    debug!("Model directory loaded {} profiles", models.len());
                    let _ = tx.send(DirectoryEvent::Loaded(models));
                }
                Err(err) => {
                    warn!("Model listing failed: {err:#}");
                    let _ = tx.send(DirectoryEvent::Failed(format!(
                        "Failed to fetch available models: {err}"
                    )));
                }
            }
        });
    }

    pub fn poll_event(&mut self) -> Option<DirectoryEvent> {
        self.events_rx.try_recv().ok()
    }
}

impl Default for ModelDirectory {
    fn default() -> Self {
        Self::new()
    }
}

async fn list_models(client: &Client, credentials: &AwsCredentials) -> Result<Vec<ModelDescriptor>> {
    let region = credentials.region.as_deref().unwrap_or(DEFAULT_REGION);
    let url = Url::parse(&format!(
        "https://bedrock.{region}.amazonaws.com/inference-profiles?maxResults=100"
    ))
    .with_context(|| format!("Invalid region: {region}"))?;

    let signed = sign_request("GET", &url, b"", credentials, region, Utc::now())?;
    let mut http = client
        .get(url.as_str())
        .header("Content-Type", "application/json")
        .header("Accept", "application/json")
        .header("Authorization", signed.authorization)
        .header("x-amz-date", signed.amz_date)
        .header("x-amz-content-sha256", signed.content_sha256);
    if let Some(token) = signed.security_token {
        http = http.header("x-amz-security-token", token);
    }

    let response = http
        .send()
        .await
        .context("Inference profile listing call failed")?;
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    if !status.is_success() {
        anyhow::bail!("HTTP {status}: {text}");
    }

    let listing: ProfileListing =
        serde_json::from_str(&text).context("Failed to parse inference profile listing")?;
    Ok(descriptors_from_listing(listing))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileListing {
    #[serde(default)]
    inference_profile_summaries: Vec<ProfileSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileSummary {
    #[serde(default)]
    inference_profile_id: Option<String>,
    #[serde(default)]
    inference_profile_name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, rename = "type")]
    profile_type: Option<String>,
}

/// Keeps active system-defined profiles and sorts them for display, by
/// provider first and model name second.
fn descriptors_from_listing(listing: ProfileListing) -> Vec<ModelDescriptor> {
    let mut models: Vec<ModelDescriptor> = listing
        .inference_profile_summaries
        .into_iter()
        .filter(|summary| {
            summary.status.as_deref() == Some("ACTIVE")
                && summary.profile_type.as_deref() == Some("SYSTEM_DEFINED")
        })
        .map(|summary| {
            let model_id = summary.inference_profile_id.unwrap_or_default();
            let model_name = summary
                .inference_profile_name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| model_id.clone());
            ModelDescriptor {
                provider_name: provider_from_id(&model_id),
                model_id,
                model_name,
                description: summary.description,
                status: summary.status.unwrap_or_else(|| "UNKNOWN".to_string()),
                profile_type: summary.profile_type.unwrap_or_else(|| "UNKNOWN".to_string()),
            }
        })
        .collect();

    models.sort_by(|a, b| {
        a.provider_name
            .cmp(&b.provider_name)
            .then_with(|| a.model_name.cmp(&b.model_name))
    });
    models
}

/// Second dot-separated segment of an inference profile id, capitalized.
/// `us.anthropic.claude-...` yields `Anthropic`.
pub fn provider_from_id(inference_profile_id: &str) -> String {
    let mut parts = inference_profile_id.split('.');
    let (first, second) = (parts.next(), parts.next());
    match (first, second) {
        (Some(_), Some(provider)) if !provider.is_empty() => capitalize(provider),
        _ => "Unknown".to_string(),
    }
}

/// Groups text models per provider for the picker. Image, embedding and
/// canvas models are not usable in a chat and are dropped.
pub fn categorize(models: &[ModelDescriptor]) -> Vec<ModelCategory> {
    let mut categories: Vec<ModelCategory> = Vec::new();
    for model in models {
        let lowered = model.model_name.to_lowercase();
        if lowered.contains("image") || lowered.contains("embed") || lowered.contains("canvas") {
            continue;
        }
        match categories
            .iter_mut()
            .find(|category| category.name == model.provider_name)
        {
            Some(category) => category.models.push(model.clone()),
            None => categories.push(ModelCategory {
                name: model.provider_name.clone(),
                models: vec![model.clone()],
            }),
        }
    }
    for category in &mut categories {
        category
            .models
            .sort_by(|a, b| a.model_name.cmp(&b.model_name));
    }
    categories
}

/// Display name for a descriptor, with the redundant provider prefix
/// stripped from the model name.
pub fn display_name(model: &ModelDescriptor) -> String {
    let name = model.model_name.as_str();
    let provider_chars = model.provider_name.chars().count();
    // Case-insensitive prefix match per character; slicing by the byte
    // length of a lowercased string is not boundary-safe.
    let prefix_matches = name.chars().count() >= provider_chars
        && name
            .chars()
            .zip(model.provider_name.chars())
            .all(|(have, want)| have.to_lowercase().eq(want.to_lowercase()));
    if prefix_matches {
        let rest = name
            .char_indices()
            .nth(provider_chars)
            .map_or("", |(offset, _)| &name[offset..]);
        return capitalize(rest.trim());
    }
    capitalize(name)
}

pub fn description(model: &ModelDescriptor) -> String {
    model
        .description
        .clone()
        .unwrap_or_else(|| format!("{} inference model", model.provider_name))
}

/// Friendly name for a bare model id, used when the directory has not
/// loaded (or failed) and only the default model id is known.
pub fn model_display_name(model_id: &str) -> String {
    const KNOWN: &[(&str, &str)] = &[
        ("claude-sonnet-4", "Claude Sonnet 4"),
        ("claude-3-5-sonnet", "Claude 3.5 Sonnet"),
        ("claude-3-5-haiku", "Claude 3.5 Haiku"),
        ("claude-3-opus", "Claude 3 Opus"),
        ("claude-3-sonnet", "Claude 3 Sonnet"),
        ("claude-3-haiku", "Claude 3 Haiku"),
        ("nova-pro", "Amazon Nova Pro"),
        ("nova-lite", "Amazon Nova Lite"),
        ("nova-micro", "Amazon Nova Micro"),
    ];
    for (needle, name) in KNOWN {
        if model_id.contains(needle) {
            return (*name).to_string();
        }
    }

    // Fallback: third dotted segment with dashes spaced and words cased.
    let parts: Vec<&str> = model_id.split('.').collect();
    if parts.len() > 2 {
        return parts[2]
            .split('-')
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" ");
    }
    "Custom Model".to_string()
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
