//! Provider trait for LLM backends.
//!
//! The [`Provider`] trait uses RPITIT (return-position `impl Trait` in
//! traits) and is intentionally NOT object-safe. Every crate that needs
//! a provider is generic over `P: Provider`; nothing stores a `dyn
//! Provider`, so erasure is never needed.

use crate::types::{ProviderRequest, ProviderResponse, ResponseFormat};
use std::future::Future;
use thiserror::Error;

/// Errors from LLM providers.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP or network request failed.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// Provider rate-limited the request.
    #[error("rate limited")]
    RateLimited,

    /// Authentication/authorization failed.
    #[error("auth failed: {0}")]
    AuthFailed(String),

    /// Could not parse the provider's response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The provider did not respond within its deadline (§5: 8s per
    /// call, 30s total per turn).
    #[error("request timed out")]
    Timeout,

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ProviderError {
    /// Whether retrying this request might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited | ProviderError::RequestFailed(_)
        )
    }
}

/// LLM provider interface.
///
/// A provider plays one of two roles in a given call, distinguished by
/// `ProviderRequest::response_format` (§6 "two LLM provider roles"):
/// a `json_llm` role for the router's action plan and the extractor's
/// entity map, and a `generative_llm` role for the synthesizer's reply
/// and the QA worker's answer. Both roles go through the same
/// `complete` method — [`Provider::json_llm`] and
/// [`Provider::generative_llm`] are thin, self-documenting wrappers
/// around it.
pub trait Provider: Send + Sync {
    /// Send a completion request to the provider.
    fn complete(
        &self,
        request: ProviderRequest,
    ) -> impl Future<Output = Result<ProviderResponse, ProviderError>> + Send;

    /// Call in the `json_llm` role: the request is expected to already
    /// carry `ResponseFormat::Json`; this only asserts that expectation
    /// rather than silently overriding a caller's mistake.
    fn json_llm(
        &self,
        request: ProviderRequest,
    ) -> impl Future<Output = Result<ProviderResponse, ProviderError>> + Send {
        async move {
            debug_assert_eq!(request.response_format, ResponseFormat::Json);
            self.complete(request).await
        }
    }

    /// Call in the `generative_llm` role: the request is expected to
    /// already carry `ResponseFormat::Text`.
    fn generative_llm(
        &self,
        request: ProviderRequest,
    ) -> impl Future<Output = Result<ProviderResponse, ProviderError>> + Send {
        async move {
            debug_assert_eq!(request.response_format, ResponseFormat::Text);
            self.complete(request).await
        }
    }
}

/// A provider stub for tests: returns a fixed, pre-recorded response
/// regardless of the request, or an error if one was configured.
#[cfg(any(test, feature = "test-util"))]
pub struct MockProvider {
    /// The response to return on every call, if any.
    pub response: std::sync::Mutex<Option<Result<ProviderResponse, String>>>,
}

#[cfg(any(test, feature = "test-util"))]
impl MockProvider {
    /// Build a mock that always returns `text` as an `EndTurn` response.
    pub fn with_text(text: impl Into<String>) -> Self {
        use crate::types::{StopReason, TokenUsage};
        Self {
            response: std::sync::Mutex::new(Some(Ok(ProviderResponse {
                text: text.into(),
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage::default(),
                model: "mock".into(),
            }))),
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
impl Provider for MockProvider {
    fn complete(
        &self,
        _request: ProviderRequest,
    ) -> impl Future<Output = Result<ProviderResponse, ProviderError>> + Send {
        let stored = self.response.lock().unwrap().clone();
        async move {
            match stored {
                Some(Ok(resp)) => Ok(resp),
                Some(Err(e)) => Err(ProviderError::RequestFailed(e)),
                None => Err(ProviderError::RequestFailed("no mock response set".into())),
            }
        }
    }
}

/// An `Arc<P>` is a provider whenever `P` is, forwarding every call
/// through the shared reference. Lets callers that need a single
/// provider instance shared across several owned workers (e.g. the
/// turn driver) satisfy a `Clone` bound without requiring `P` itself
/// to implement `Clone`.
impl<P: Provider> Provider for std::sync::Arc<P> {
    fn complete(
        &self,
        request: ProviderRequest,
    ) -> impl Future<Output = Result<ProviderResponse, ProviderError>> + Send {
        P::complete(self, request)
    }

    fn json_llm(
        &self,
        request: ProviderRequest,
    ) -> impl Future<Output = Result<ProviderResponse, ProviderError>> + Send {
        P::json_llm(self, request)
    }

    fn generative_llm(
        &self,
        request: ProviderRequest,
    ) -> impl Future<Output = Result<ProviderResponse, ProviderError>> + Send {
        P::generative_llm(self, request)
    }
}
