#![deny(missing_docs)]
//! Anthropic API provider for the banking dialogue engine.
//!
//! Implements [`banking_llm::Provider`] for Anthropic's Messages API.
//! Both provider roles (§6 `json_llm`/`generative_llm`) go through the
//! same HTTP call — for the `json_llm` role, the caller's system prompt
//! is expected to already instruct the model to answer with JSON only;
//! this client does not use Anthropic's tool-calling machinery to force
//! JSON output, since no worker in this system needs multi-step tool
//! use from the model itself (§9 "ambient LLM orchestration ⇒ explicit
//! plans" — the turn driver is the only dispatcher).

mod types;

use banking_llm::provider::{Provider, ProviderError};
use banking_llm::types::{ProviderRequest, ProviderResponse, Role, StopReason, TokenUsage};
use types::*;

/// Default model used when a request doesn't specify one.
const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";

/// Anthropic Messages API client.
pub struct Anthropic {
    api_key: String,
    client: reqwest::Client,
    api_url: String,
    api_version: String,
    default_model: String,
}

impl Anthropic {
    /// Create a new client with the given API key and sensible
    /// defaults (model `claude-haiku-4-5-20251001`, the production
    /// Anthropic API URL).
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: reqwest::Client::new(),
            api_url: "https://api.anthropic.com/v1/messages".into(),
            api_version: "2023-06-01".into(),
            default_model: DEFAULT_MODEL.into(),
        }
    }

    /// Override the API URL (for testing or proxies).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Override the default model used when a request doesn't specify
    /// one.
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    fn build_request(&self, request: &ProviderRequest) -> AnthropicRequest {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());
        let max_tokens = request.max_tokens.unwrap_or(4096);

        let messages = request
            .messages
            .iter()
            .map(|m| AnthropicMessage {
                role: match m.role {
                    Role::User => "user".into(),
                    Role::Assistant => "assistant".into(),
                    // Anthropic has no "system" conversation role; a
                    // mid-conversation system-flavored message (there
                    // are none in this engine's own prompts, but a
                    // future caller might pass one) folds into user.
                    Role::System => "user".into(),
                },
                content: m.content.clone(),
            })
            .collect();

        AnthropicRequest {
            model,
            max_tokens,
            messages,
            system: request.system.clone(),
            temperature: request.temperature,
        }
    }

    fn parse_response(&self, response: AnthropicResponse) -> ProviderResponse {
        let text = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicContentBlock::Text { text } => Some(text),
                AnthropicContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        let stop_reason = match response.stop_reason.as_str() {
            "max_tokens" => StopReason::MaxTokens,
            _ => StopReason::EndTurn,
        };

        ProviderResponse {
            text,
            stop_reason,
            usage: TokenUsage {
                input_tokens: response.usage.input_tokens,
                output_tokens: response.usage.output_tokens,
            },
            model: response.model,
        }
    }
}

impl Provider for Anthropic {
    fn complete(
        &self,
        request: ProviderRequest,
    ) -> impl std::future::Future<Output = Result<ProviderResponse, ProviderError>> + Send {
        let api_request = self.build_request(&request);
        let http_request = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .header("content-type", "application/json")
            .json(&api_request);

        async move {
            let http_response = http_request.send().await.map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::RequestFailed(e.to_string())
                }
            })?;

            let status = http_response.status();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(ProviderError::RateLimited);
            }
            if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
            {
                let body = http_response.text().await.unwrap_or_default();
                return Err(ProviderError::AuthFailed(body));
            }
            if !status.is_success() {
                let body = http_response.text().await.unwrap_or_default();
                return Err(ProviderError::RequestFailed(format!(
                    "HTTP {status}: {body}"
                )));
            }

            let api_response: AnthropicResponse = http_response
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

            tracing::debug!(
                model = %api_response.model,
                input_tokens = api_response.usage.input_tokens,
                output_tokens = api_response.usage.output_tokens,
                "received completion response"
            );

            Ok(self.parse_response(api_response))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banking_llm::types::ProviderMessage;

    #[test]
    fn default_model_is_set() {
        let provider = Anthropic::new("test-key");
        assert_eq!(provider.default_model, DEFAULT_MODEL);
    }

    #[test]
    fn builder_overrides_url_and_model() {
        let provider = Anthropic::new("test-key")
            .with_url("http://localhost:9999/v1/messages")
            .with_default_model("claude-opus-4-5");
        assert_eq!(provider.api_url, "http://localhost:9999/v1/messages");
        assert_eq!(provider.default_model, "claude-opus-4-5");
    }

    #[test]
    fn build_request_uses_default_model_when_unset() {
        let provider = Anthropic::new("test-key");
        let request = ProviderRequest::text(vec![ProviderMessage::user("hello")])
            .with_max_tokens(256)
            .with_system("Be helpful.");

        let api_request = provider.build_request(&request);
        assert_eq!(api_request.model, DEFAULT_MODEL);
        assert_eq!(api_request.max_tokens, 256);
        assert_eq!(api_request.messages.len(), 1);
        assert_eq!(api_request.messages[0].role, "user");
        assert_eq!(api_request.system.as_deref(), Some("Be helpful."));
    }

    #[test]
    fn build_request_honors_explicit_model() {
        let provider = Anthropic::new("test-key");
        let request =
            ProviderRequest::json(vec![ProviderMessage::user("hi")]).with_model("claude-opus-4-5");
        let api_request = provider.build_request(&request);
        assert_eq!(api_request.model, "claude-opus-4-5");
    }

    #[test]
    fn parse_response_joins_text_blocks_and_skips_others() {
        let provider = Anthropic::new("test-key");
        let response = AnthropicResponse {
            content: vec![
                AnthropicContentBlock::Text {
                    text: "안녕".into(),
                },
                AnthropicContentBlock::Other,
                AnthropicContentBlock::Text {
                    text: "하세요".into(),
                },
            ],
            model: "claude-haiku-4-5-20251001".into(),
            stop_reason: "end_turn".into(),
            usage: AnthropicUsage {
                input_tokens: 10,
                output_tokens: 5,
            },
        };

        let parsed = provider.parse_response(response);
        assert_eq!(parsed.text, "안녕하세요");
        assert_eq!(parsed.stop_reason, StopReason::EndTurn);
        assert_eq!(parsed.usage.input_tokens, 10);
        assert_eq!(parsed.usage.output_tokens, 5);
    }

    #[test]
    fn parse_response_maps_max_tokens_stop_reason() {
        let provider = Anthropic::new("test-key");
        let response = AnthropicResponse {
            content: vec![],
            model: "claude-haiku-4-5-20251001".into(),
            stop_reason: "max_tokens".into(),
            usage: AnthropicUsage {
                input_tokens: 1,
                output_tokens: 1,
            },
        };
        let parsed = provider.parse_response(response);
        assert_eq!(parsed.stop_reason, StopReason::MaxTokens);
    }
}
