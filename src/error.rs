use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a remote call. Every variant is a "request error" from the
/// controllers' point of view; none of them carry a server error body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {0}")]
    Status(StatusCode),
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid endpoint: {0}")]
    Url(#[from] url::ParseError),
}

/// Why a send intent was dropped. These are never shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendRejected {
    #[error("message text is blank")]
    EmptyInput,
    #[error("a send is already in flight")]
    InFlight,
    #[error("thread is not ready")]
    NotReady,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("no backend URL configured")]
    MissingBaseUrl,
    #[error("no config directory available")]
    NoConfigDir,
}

/// A user-visible message produced when a reconciliation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
}

impl Notice {
    pub fn failure(action: &str, err: &ApiError) -> Self {
        Self {
            message: format!("Failed to {action}: {err}"),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
