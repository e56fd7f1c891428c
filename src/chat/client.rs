//! The agent client: turns one user query into an ordered event sequence.
//!
//! The Bedrock implementation posts a Converse request signed with SigV4
//! from a background task and pushes the outcome through an unbounded
//! channel. The UI thread drains the channel on every tick, so event order
//! is exactly production order with no reordering or buffering.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use url::Url;

use super::credentials::AwsCredentials;
use super::sign::sign_request;

/// Everything one invocation needs. Credentials are read from the store at
/// submission time and moved in here, never cached across turns.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    pub query: String,
    pub model_id: String,
    pub region: String,
    pub credentials: AwsCredentials,
    pub system_prompt: String,
    /// When true the response is delivered as a delta sequence ending in
    /// [`AgentEvent::MessageStop`]; otherwise as one [`AgentEvent::Completed`].
    pub streaming: bool,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Marker carried by a content-block-start event when the model begins a
/// tool invocation. Diagnostic only; tools are not executed here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolUseStart {
    pub tool_use_id: String,
    pub name: String,
}

/// An incremental content fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentDelta {
    /// Text to append to the streaming accumulator.
    Text(String),
    /// Partial tool input JSON. Observed, never applied to the placeholder.
    ToolInput(String),
    /// Model reasoning text. Observed, never applied to the placeholder.
    Reasoning(String),
}

/// Ordered events emitted for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    BlockStart { tool_use: Option<ToolUseStart> },
    Delta(ContentDelta),
    /// Terminal event of a streamed response.
    MessageStop { stop_reason: String },
    /// Full response text of a non-streaming invocation. Terminal.
    Completed(String),
    /// The invocation failed. Terminal; no retry is attempted.
    Error(String),
}

/// Typed failures surfaced by the Bedrock transport.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Bedrock API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Interface between the conversation flow and whatever produces model
/// responses. `send` must not block the UI thread; results come back
/// through `poll_event`.
#[async_trait]
pub trait AgentBackend: Send {
    fn name(&self) -> &str;

    /// Dispatches one invocation. Failures after this returns are reported
    /// as an [`AgentEvent::Error`] rather than an `Err`.
    async fn send(&mut self, request: AgentRequest) -> Result<()>;

    /// Non-blocking poll for the next event, in arrival order.
    fn poll_event(&mut self) -> Option<AgentEvent>;
}

/// [`AgentBackend`] over the Bedrock Converse HTTP API.
///
/// The non-streaming Converse response is mapped into the same ordered
/// event sequence a streamed response would produce, so the conversation
/// state machine has a single consumption path.
pub struct BedrockBackend {
    client: Client,
    events_tx: UnboundedSender<AgentEvent>,
    events_rx: UnboundedReceiver<AgentEvent>,
}

impl BedrockBackend {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            client: Client::new(),
            events_tx: tx,
            events_rx: rx,
        }
    }
}

impl Default for BedrockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentBackend for BedrockBackend {
    fn name(&self) -> &str {
        "Amazon Bedrock"
    }

    async fn send(&mut self, request: AgentRequest) -> Result<()> {
        let tx = self.events_tx.clone();
        let client = self.client.clone();
        tokio::spawn(async move {
            if let Err(err) = dispatch(client, request, tx.clone()).await {
                let _ = tx.send(AgentEvent::Error(err.to_string()));
            }
        });
        Ok(())
    }

    fn poll_event(&mut self) -> Option<AgentEvent> {
        self.events_rx.try_recv().ok()
    }
}

/// Performs the signed Converse call and emits the resulting events.
async fn dispatch(
    client: Client,
    request: AgentRequest,
    tx: UnboundedSender<AgentEvent>,
) -> Result<(), ClientError> {
    let url = converse_url(&request.region, &request.model_id)?;
    let payload = build_converse_request(&request);
    let body = serde_json::to_vec(&payload).context("Failed to serialize Converse request")?;

    let signed = sign_request(
        "POST",
        &url,
        &body,
        &request.credentials,
        &request.region,
        Utc::now(),
    )?;

    let mut http = client
        .post(url.as_str())
        .header("Content-Type", "application/json")
        .header("Accept", "application/json")
        .header("Authorization", signed.authorization)
        .header("x-amz-date", signed.amz_date)
        .header("x-amz-content-sha256", signed.content_sha256);
    if let Some(token) = signed.security_token {
        http = http.header("x-amz-security-token", token);
    }

    debug!("Invoking Converse for model {}", request.model_id);
    let response = http
        .body(body)
        .send()
        .await
        .context("Bedrock Converse call failed")?;

    let status = response.status();
    let text = response
        .text()
        .await
        .unwrap_or_else(|err| format!("<failed to read body: {err}>"));
    if !status.is_success() {
        return Err(ClientError::Api {
            status: status.as_u16(),
            body: text,
        });
    }

    let parsed: ConverseResponse =
        serde_json::from_str(&text).context("Failed to parse Converse response")?;

    if request.streaming {
        for event in response_events(parsed) {
            let _ = tx.send(event);
        }
    } else {
        let _ = tx.send(AgentEvent::Completed(complete_text(&parsed)));
    }
    Ok(())
}

/// Builds `https://bedrock-runtime.{region}.amazonaws.com/model/{id}/converse`.
/// The model id goes through `Url`'s path-segment encoding, which handles
/// the `:` every inference profile id contains.
pub fn converse_url(region: &str, model_id: &str) -> Result<Url> {
    let mut url = Url::parse(&format!("https://bedrock-runtime.{region}.amazonaws.com"))
        .with_context(|| format!("Invalid region: {region}"))?;
    url.path_segments_mut()
        .map_err(|()| anyhow!("Endpoint URL cannot hold a path"))?
        .push("model")
        .push(model_id)
        .push("converse");
    Ok(url)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    system: Vec<SystemContent>,
    messages: Vec<ConverseMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inference_config: Option<InferenceConfig>,
}

#[derive(Debug, Serialize)]
struct SystemContent {
    text: String,
}

#[derive(Debug, Serialize)]
struct ConverseMessage {
    role: &'static str,
    content: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestContent {
    Text { text: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InferenceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

pub fn build_converse_request(request: &AgentRequest) -> ConverseRequest {
    let inference_config = if request.max_tokens.is_some() || request.temperature.is_some() {
        Some(InferenceConfig {
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        })
    } else {
        None
    };
    ConverseRequest {
        system: vec![SystemContent {
            text: request.system_prompt.clone(),
        }],
        messages: vec![ConverseMessage {
            role: "user",
            content: vec![RequestContent::Text {
                text: request.query.clone(),
            }],
        }],
        inference_config,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseResponse {
    output: Option<ConverseOutput>,
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConverseOutput {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Vec<ResponseContent>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResponseContent {
    Text {
        text: String,
    },
    ToolUse {
        #[serde(rename = "toolUse")]
        tool_use: ToolUseBlock,
    },
    Reasoning {
        #[serde(rename = "reasoningContent")]
        reasoning_content: ReasoningBlock,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolUseBlock {
    tool_use_id: String,
    name: String,
    input: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReasoningBlock {
    reasoning_text: Option<ReasoningText>,
}

#[derive(Debug, Deserialize)]
struct ReasoningText {
    text: String,
}

/// Maps a Converse response into the ordered event sequence: a block start
/// and delta per content block, then the terminal message stop.
pub fn response_events(response: ConverseResponse) -> Vec<AgentEvent> {
    let mut events = Vec::new();
    if let Some(output) = response.output {
        for block in output.message.content {
            match block {
                ResponseContent::Text { text } => {
                    if text.is_empty() {
                        continue;
                    }
                    events.push(AgentEvent::BlockStart { tool_use: None });
                    events.push(AgentEvent::Delta(ContentDelta::Text(text)));
                }
                ResponseContent::ToolUse { tool_use } => {
                    events.push(AgentEvent::BlockStart {
                        tool_use: Some(ToolUseStart {
                            tool_use_id: tool_use.tool_use_id,
                            name: tool_use.name,
                        }),
                    });
                    let input = serde_json::to_string(&tool_use.input)
                        .unwrap_or_else(|_| "{}".to_string());
                    events.push(AgentEvent::Delta(ContentDelta::ToolInput(input)));
                }
                ResponseContent::Reasoning { reasoning_content } => {
                    if let Some(reasoning) = reasoning_content.reasoning_text {
                        events.push(AgentEvent::BlockStart { tool_use: None });
                        events.push(AgentEvent::Delta(ContentDelta::Reasoning(reasoning.text)));
                    }
                }
            }
        }
    }
    events.push(AgentEvent::MessageStop {
        stop_reason: response
            .stop_reason
            .unwrap_or_else(|| "end_turn".to_string()),
    });
    events
}

/// Concatenated text blocks, the batch-mode response shape.
fn complete_text(response: &ConverseResponse) -> String {
    let Some(output) = response.output.as_ref() else {
        return String::new();
    };
    let mut text = String::new();
    for block in &output.message.content {
        if let ResponseContent::Text { text: fragment } = block {
            text.push_str(fragment);
        }
    }
    text
}
