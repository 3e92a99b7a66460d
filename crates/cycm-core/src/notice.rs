use crate::error::CycmError;
use serde::Serialize;
use std::fmt;

/// Category of a user-visible message. Hosts map tones to colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Error,
    Success,
    Info,
    /// "already in that state" and "not found" style messages.
    Warning,
    Plain,
}

/// One message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub tone: Tone,
    pub text: String,
}

impl Notice {
    pub fn new(tone: Tone, text: impl Into<String>) -> Self {
        Self {
            tone,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Tone::Error, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(Tone::Success, text)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(Tone::Info, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(Tone::Warning, text)
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(Tone::Plain, text)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&CycmError> for Notice {
    fn from(err: &CycmError) -> Self {
        match err {
            CycmError::AlreadyBlocked(_) | CycmError::NotBlocked(_) => {
                Notice::warning(err.to_string())
            }
            _ => Notice::error(err.to_string()),
        }
    }
}

impl From<CycmError> for Notice {
    fn from(err: CycmError) -> Self {
        Notice::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_errors_are_warnings() {
        let n = Notice::from(CycmError::AlreadyBlocked("kill".into()));
        assert_eq!(n.tone, Tone::Warning);
        assert_eq!(n.text, "/kill is already blocked");
        assert_eq!(Notice::from(CycmError::NotBlocked("x".into())).tone, Tone::Warning);
    }

    #[test]
    fn other_errors_are_errors() {
        let n = Notice::from(CycmError::CommandBlocked("op".into()));
        assert_eq!(n.tone, Tone::Error);
        assert_eq!(n.to_string(), "command /op is blocked");
    }
}
