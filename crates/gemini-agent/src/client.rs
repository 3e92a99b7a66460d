use futures::future::BoxFuture;

use crate::types::{GenerateRequest, GenerateResponse};
use crate::{AgentError, Result};

// ─── Transport ────────────────────────────────────────────────────────────

/// One remote `generateContent` call. Returns the first candidate's text.
///
/// The bridge only depends on this trait so tests can script replies and
/// delays without a network.
pub trait Transport: Send + Sync {
    fn generate<'a>(
        &'a self,
        api_key: &'a str,
        request: &'a GenerateRequest,
    ) -> BoxFuture<'a, Result<String>>;
}

// ─── GeminiClient ─────────────────────────────────────────────────────────

/// [`Transport`] over HTTPS to the Google Generative Language API.
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
}

impl GeminiClient {
    /// `endpoint` is the API base URL, e.g.
    /// `https://generativelanguage.googleapis.com`.
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        GeminiClient {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    pub fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }

    async fn send(&self, api_key: &str, request: &GenerateRequest) -> Result<String> {
        let response = self
            .http
            .post(self.url())
            .query(&[("key", api_key)])
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(status = status.as_u16(), bytes = body.len(), "gemini response");

        match GenerateResponse::parse_body(&body) {
            Err(AgentError::MalformedAiResponse(_)) if !status.is_success() => {
                Err(AgentError::ProviderError {
                    code: status.as_u16(),
                    message: status
                        .canonical_reason()
                        .unwrap_or("unexpected status")
                        .to_owned(),
                })
            }
            other => other,
        }
    }
}

impl Transport for GeminiClient {
    fn generate<'a>(
        &'a self,
        api_key: &'a str,
        request: &'a GenerateRequest,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.send(api_key, request))
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
