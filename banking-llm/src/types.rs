//! Request/response types for provider calls.
//!
//! These are the internal lingua franca — every worker that talks to an
//! LLM (the router C6, the entity extractor C2, the scenario engine C4,
//! the QA worker C5, the synthesizer C9) builds a [`ProviderRequest`]
//! and reads a [`ProviderResponse`]; provider crates convert to/from
//! their own wire format.

use serde::{Deserialize, Serialize};

/// Role in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message (instructions).
    System,
    /// User message.
    User,
    /// Assistant (model) message.
    Assistant,
}

/// One message in a provider conversation. Text-only — this system
/// never sends multimodal content or native tool-use blocks to a
/// provider; a worker's "tool calling" is the turn driver's own plan
/// dispatch, not a provider-side ReAct loop (§9 "ambient LLM
/// orchestration ⇒ explicit plans").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMessage {
    /// The role of the message author.
    pub role: Role,
    /// The text content.
    pub content: String,
}

impl ProviderMessage {
    /// Construct a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Construct an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// What shape of output a call expects back, distinguishing the two
/// provider roles named in §6: a `Json` call (the router's action
/// plan, the extractor's entity map) must get back parseable JSON; a
/// `Text` call (the synthesizer, the QA worker's answer) gets back
/// free-form Korean prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Plain text completion.
    Text,
    /// The provider should constrain output to valid JSON.
    Json,
}

/// Request sent to a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// Model to use (`None` = provider default).
    pub model: Option<String>,
    /// Conversation messages, oldest first.
    pub messages: Vec<ProviderMessage>,
    /// System prompt.
    pub system: Option<String>,
    /// Maximum output tokens.
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f64>,
    /// Expected output shape.
    pub response_format: ResponseFormat,
}

impl ProviderRequest {
    /// A plain text completion request with no system prompt or
    /// model/token overrides.
    pub fn text(messages: Vec<ProviderMessage>) -> Self {
        Self {
            model: None,
            messages,
            system: None,
            max_tokens: None,
            temperature: None,
            response_format: ResponseFormat::Text,
        }
    }

    /// A JSON-constrained completion request.
    pub fn json(messages: Vec<ProviderMessage>) -> Self {
        Self {
            model: None,
            messages,
            system: None,
            max_tokens: None,
            temperature: None,
            response_format: ResponseFormat::Json,
        }
    }

    /// Set the system prompt, builder-style.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the model, builder-style.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set max_tokens, builder-style.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set temperature, builder-style.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Why the provider stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Model produced a final response.
    EndTurn,
    /// Hit the max_tokens limit.
    MaxTokens,
    /// Content was filtered by safety.
    ContentFilter,
}

/// Token usage from a single provider call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input tokens consumed.
    pub input_tokens: u64,
    /// Output tokens generated.
    pub output_tokens: u64,
}

/// Response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The completion text. For `ResponseFormat::Json` requests this is
    /// a JSON document as a string; the caller parses it.
    pub text: String,
    /// Why the provider stopped.
    pub stop_reason: StopReason,
    /// Token usage.
    pub usage: TokenUsage,
    /// Actual model used.
    pub model: String,
}
