use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("no Gemini API key configured")]
    NoApiKey,

    #[error("cycm is disabled")]
    ModDisabled,

    #[error("the AI did not answer within {0} seconds")]
    GenerationTimeout(u64),

    #[error("request to the AI failed: {0}")]
    TransportFailure(String),

    #[error("malformed AI response: {0}")]
    MalformedAiResponse(String),

    #[error("AI provider error {code}: {message}")]
    ProviderError { code: u16, message: String },

    #[error("AI command must start with '/': '{0}'")]
    InvalidCommandFormat(String),

    #[error("AI tried to run blocked command /{0}")]
    CommandBlocked(String),

    #[error(transparent)]
    Core(#[from] cycm_core::CycmError),
}

impl From<reqwest::Error> for AgentError {
    fn from(e: reqwest::Error) -> Self {
        AgentError::TransportFailure(e.to_string())
    }
}
