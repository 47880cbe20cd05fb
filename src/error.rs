use serde_json::Value;
use thiserror::Error;

/// Failures that can end a single check.
///
/// None of these ever crosses the `Checker::check` boundary; the checker folds
/// them into the `error` field of the result via [`CheckError::caller_message`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    /// Host is missing or cannot form a URI.
    #[error("input-data-incorrect")]
    InvalidInput,

    /// Response status is not in the accepted set.
    #[error("http-code-incorrect")]
    UnexpectedStatus(u16),

    /// Network, TLS, DNS or timeout failure reported by the HTTP client.
    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    Unknown(String),
}

impl CheckError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }

    /// Text stored in `CheckResult::error`.
    ///
    /// Transport failures surface the client's message verbatim; every other
    /// kind is wrapped as `Error code: {msg} object_id: {id}`.
    pub fn caller_message(&self, monitor_id: &Value) -> String {
        match self {
            Self::Transport(msg) => msg.clone(),
            other => format!(
                "Error code: {} object_id: {}",
                other,
                object_id(monitor_id)
            ),
        }
    }
}

/// Render a pass-through identifier without JSON quoting.
pub fn object_id(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Join an error with its `source()` chain, outermost first.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read config: {0}")]
    ConfigRead(std::io::Error),

    #[error("Failed to write config: {0}")]
    ConfigWrite(std::io::Error),

    #[error("Invalid config format: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid config value: {0}")]
    ConfigInvalid(String),

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Failed to read check request: {0}")]
    InputRead(std::io::Error),

    #[error("Invalid check request: {0}")]
    InputParse(serde_json::Error),

    #[error("{0}")]
    Other(String),
}
