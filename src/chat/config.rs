//! Client configuration, loaded from an optional `chat.toml` next to the
//! working directory. Every key has a sensible default so the binary runs
//! with no configuration at all.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

/// Region used when neither the credential record nor the config names one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Inference profile used until the user picks another model.
pub const DEFAULT_MODEL: &str = "us.anthropic.claude-sonnet-4-20250514-v1:0";

/// System prompt that teaches the model the follow-up question protocol the
/// assembler depends on.
pub const SYSTEM_PROMPT: &str = "\
You are a helpful AI assistant. After answering the user's question, always suggest 4 relevant follow-up questions that the user might want to ask next.

Format your response as follows:
1. First, provide your detailed answer to the user's question
2. Then, add a separator line: ---FOLLOW_UP_QUESTIONS---
3. Finally, list exactly 4 follow-up questions, one per line
4. Do NOT repeat the original question.
5. Do NOT ask yes/no questions, follow-up questions should encourage deeper exploration.

Example format:
[Your detailed answer here]

---FOLLOW_UP_QUESTIONS---
What are the main benefits of this approach?
How does this compare to alternatives?
Can you provide a practical example?
What are the potential challenges?";

/// Settings parsed from `chat.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Inference profile id sent to the Converse API.
    pub model_id: String,
    /// Region override; the credential record's region wins when set.
    pub region: Option<String>,
    /// When false the response is delivered as one completed event instead
    /// of a delta sequence.
    pub streaming: bool,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// Replaces the built-in system prompt. Responses formatted without the
    /// follow-up separator simply carry no suggestions.
    pub system_prompt: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL.to_string(),
            region: None,
            streaming: true,
            max_tokens: None,
            temperature: None,
            system_prompt: None,
        }
    }
}

impl ChatConfig {
    /// Reads `chat.toml` from the working directory, falling back to the
    /// defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("chat.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let parsed: ChatConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(parsed)
    }

    pub fn system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(SYSTEM_PROMPT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_keys_are_missing() {
        let config: ChatConfig = toml::from_str("").expect("parse empty config");
        assert_eq!(config.model_id, DEFAULT_MODEL);
        assert!(config.streaming);
        assert_eq!(config.region, None);
        assert_eq!(config.system_prompt(), SYSTEM_PROMPT);
    }

    #[test]
    fn explicit_keys_override_defaults() {
        let raw = r#"
model_id = "us.amazon.nova-pro-v1:0"
region = "us-west-2"
streaming = false
max_tokens = 2048
temperature = 0.3
"#;
        let config: ChatConfig = toml::from_str(raw).expect("parse config");
        assert_eq!(config.model_id, "us.amazon.nova-pro-v1:0");
        assert_eq!(config.region.as_deref(), Some("us-west-2"));
        assert!(!config.streaming);
        assert_eq!(config.max_tokens, Some(2048));
        assert_eq!(config.temperature, Some(0.3));
    }

    #[test]
    fn system_prompt_mentions_the_separator() {
        // The assembler and the prompt must agree on the literal.
        assert!(SYSTEM_PROMPT.contains(super::super::assemble::FOLLOW_UP_SEPARATOR));
    }
}
