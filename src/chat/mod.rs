//! Conversation core and Bedrock collaborators.
//!
//! This module owns everything that is not rendering: the message list and
//! its state machine, the response assembler, the credential record, the
//! Converse client and the model directory.

/// `assemble` module: splits raw model output into an answer plus at most
/// four follow-up questions.
pub mod assemble;
/// `client` module: the `AgentBackend` trait and the Bedrock Converse
/// implementation behind it.
pub mod client;
/// `config` module: `chat.toml` parsing plus the default model, region and
/// system prompt.
pub mod config;
/// `conversation` module: the ordered message list and the per-turn state
/// machine driven by agent events.
pub mod conversation;
/// `credentials` module: the in-memory AWS credential record, its
/// validation rules and the session store.
pub mod credentials;
/// `message` module: the `Message` type shared by the conversation and the
/// renderer.
pub mod message;
/// `models` module: inference-profile listing, filtering and grouping for
/// the model picker.
pub mod models;
/// `sign` module: AWS SigV4 request signing shared by the runtime and
/// control-plane calls.
pub mod sign;

pub use client::{AgentBackend, AgentEvent, AgentRequest, BedrockBackend, ContentDelta};
pub use config::ChatConfig;
pub use conversation::{Conversation, TurnPhase};
pub use credentials::{AwsCredentials, CredentialErrors, CredentialStore};
pub use message::{Message, Role};
pub use models::{DirectoryEvent, ModelCategory, ModelDescriptor, ModelDirectory};
