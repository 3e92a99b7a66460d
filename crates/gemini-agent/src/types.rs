use serde::{Deserialize, Serialize};

use crate::AgentError;

// ─── Request ──────────────────────────────────────────────────────────────

/// Body of `POST /v1beta/models/{model}:generateContent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
}

/// One turn. `role` is `"user"` or `"model"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

impl Content {
    pub fn text(role: &str, text: impl Into<String>) -> Self {
        Content {
            role: role.to_owned(),
            parts: vec![Part { text: text.into() }],
        }
    }
}

// ─── Response ─────────────────────────────────────────────────────────────

/// Either `candidates` or `error` is present. Everything else is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// `{"error": {"code": 400, "message": "...", "status": "INVALID_ARGUMENT"}}`
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

impl GenerateResponse {
    /// `candidates[0].content.parts[0].text`, if present.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .map(|p| p.text.as_str())
    }

    /// Parse a raw response body into the reply text.
    ///
    /// A provider error object becomes [`AgentError::ProviderError`]; a body
    /// that is not JSON or has no candidate text becomes
    /// [`AgentError::MalformedAiResponse`].
    pub fn parse_body(body: &str) -> Result<String, AgentError> {
        let parsed: GenerateResponse = serde_json::from_str(body)
            .map_err(|e| AgentError::MalformedAiResponse(e.to_string()))?;
        if let Some(err) = parsed.error {
            let message = if err.status.is_empty() {
                err.message
            } else {
                format!("{} ({})", err.message, err.status)
            };
            return Err(AgentError::ProviderError {
                code: err.code,
                message,
            });
        }
        parsed
            .first_text()
            .map(str::to_owned)
            .ok_or_else(|| AgentError::MalformedAiResponse("no candidate text".into()))
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_in_wire_shape() {
        let req = GenerateRequest {
            contents: vec![Content::text("user", "hi"), Content::text("model", "hello")],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "hi"}]},
                    {"role": "model", "parts": [{"text": "hello"}]}
                ]
            })
        );
    }

    #[test]
    fn parse_body_extracts_first_text() {
        let body = r#"{
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "first"}, {"text": "second"}]},
                 "finishReason": "STOP"}
            ],
            "usageMetadata": {"totalTokenCount": 12}
        }"#;
        assert_eq!(GenerateResponse::parse_body(body).unwrap(), "first");
    }

    #[test]
    fn parse_body_maps_provider_error() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        let err = GenerateResponse::parse_body(body).unwrap_err();
        let AgentError::ProviderError { code, message } = err else {
            panic!("expected ProviderError")
        };
        assert_eq!(code, 400);
        assert_eq!(message, "API key not valid (INVALID_ARGUMENT)");
    }

    #[test]
    fn parse_body_rejects_missing_text_and_garbage() {
        assert!(matches!(
            GenerateResponse::parse_body(r#"{"candidates": []}"#),
            Err(AgentError::MalformedAiResponse(_))
        ));
        assert!(matches!(
            GenerateResponse::parse_body(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#),
            Err(AgentError::MalformedAiResponse(_))
        ));
        assert!(matches!(
            GenerateResponse::parse_body("<html>bad gateway</html>"),
            Err(AgentError::MalformedAiResponse(_))
        ));
    }
}
