/// Error types for the classification flow and settings loading
///
/// Flow errors never escape the flow: each one is caught where it happens
/// and stored as the session's failure outcome, so they must be `Clone`
/// to travel inside UI messages.
use thiserror::Error;

/// Everything that can end a selection or classification attempt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// The host refused media-library access
    #[error("Permission to access media library is required")]
    PermissionDenied,

    /// No API key configured, the request is never sent
    #[error("missing credential")]
    MissingCredential,

    /// The service answered with a status other than 200
    #[error("{service} error: {status}")]
    Service { service: &'static str, status: u16 },

    /// Network fault, timeout, or the picked file could not be read
    #[error("{0}")]
    Transport(String),

    /// The response body was not valid JSON
    #[error("{0}")]
    Parse(String),
}

impl From<reqwest::Error> for FlowError {
    fn from(err: reqwest::Error) -> Self {
        // Drop the URL so the api_key query parameter never reaches the UI
        FlowError::Transport(err.without_url().to_string())
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        FlowError::Parse(err.to_string())
    }
}

/// Problems loading settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config file {path}: {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}
