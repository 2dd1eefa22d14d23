use thiserror::Error;

/// MiniMax `base_resp.status_code` values that clear up on their own:
/// request timeout, RPM rate limit, internal service error, TPM rate limit.
const TRANSIENT_API_CODES: &[i64] = &[1001, 1002, 1013, 1039];

#[derive(Debug, Error)]
pub enum AvatarError {
    #[error("{0}")]
    Validation(String),

    #[error("{message}")]
    Upstream {
        status: u16,
        api_code: Option<i64>,
        message: String,
    },

    #[error("{0}")]
    MalformedResponse(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A relay error whose transience was decided by the relay itself.
    #[error("{message}")]
    Relay {
        status: u16,
        message: String,
        retryable: bool,
    },

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AvatarError {
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        AvatarError::Upstream {
            status,
            api_code: None,
            message: message.into(),
        }
    }

    /// Whether a bounded retry of the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            AvatarError::Network(_) | AvatarError::Timeout(_) => true,
            AvatarError::Upstream {
                status, api_code, ..
            } => {
                matches!(status, 408 | 429 | 500..=599)
                    || api_code.map_or(false, |code| TRANSIENT_API_CODES.contains(&code))
            }
            AvatarError::Relay { retryable, .. } => *retryable,
            _ => false,
        }
    }

    /// The relay could not be reached or does not exist, so the caller
    /// should go to the upstream API directly.
    pub fn is_endpoint_unavailable(&self) -> bool {
        matches!(self, AvatarError::Network(_) | AvatarError::NotFound(_))
    }
}

impl From<reqwest::Error> for AvatarError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AvatarError::Timeout(e.to_string())
        } else if e.is_decode() {
            AvatarError::Serialization(e.to_string())
        } else if let Some(status) = e.status() {
            AvatarError::upstream(status.as_u16(), format!("HTTP {}", status.as_u16()))
        } else {
            AvatarError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for AvatarError {
    fn from(e: serde_json::Error) -> Self {
        AvatarError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AvatarError>;
