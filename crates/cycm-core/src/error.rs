use thiserror::Error;

#[derive(Debug, Error)]
pub enum CycmError {
    #[error("malformed record: '{0}'")]
    MalformedRecord(String),

    #[error("command must start with '/': '{0}'")]
    MissingPrefix(String),

    #[error("invalid repeat count in '{0}'")]
    InvalidRepeatCount(String),

    #[error("repeat count {requested} exceeds the maximum of {max}")]
    RepeatCountExceeded { requested: u64, max: u32 },

    #[error("invalid delay in '{0}'")]
    InvalidDelay(String),

    #[error("delay of {requested}s exceeds the maximum of {max}s")]
    DelayExceeded { requested: u64, max: u32 },

    #[error("command /{0} is blocked")]
    CommandBlocked(String),

    #[error("/{0} is a cycm command and cannot be blocked or unblocked")]
    ProtectedCommand(String),

    #[error("/{0} is already blocked")]
    AlreadyBlocked(String),

    #[error("/{0} is not blocked")]
    NotBlocked(String),

    #[error("invalid limit: {0}")]
    InvalidLimit(String),

    #[error("unknown file: {0}")]
    UnknownFile(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, CycmError>;
