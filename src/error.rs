//! Client error types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport-level failure (connect, timeout, protocol)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Authentication was rejected by the auth endpoint
    #[error("authentication failed: {status} {reason}")]
    AuthFailed {
        status: u16,
        reason: String,
    },

    /// The auth endpoint answered 200 but the session headers were unusable
    #[error("invalid auth response: {0}")]
    InvalidAuthResponse(String),

    /// A typed helper could not produce a value from this status
    #[error("unexpected status: {status} {reason}")]
    UnexpectedStatus {
        status: u16,
        reason: String,
    },

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// URL could not be parsed
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// Header value could not be encoded
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// Listing body could not be parsed
    #[error("list parse error: {0}")]
    ListParse(#[from] serde_json::Error),
}

impl ClientError {
    /// Check if this is an authentication failure
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthFailed { .. })
    }

    /// Status code carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthFailed { status, .. } | Self::UnexpectedStatus { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}
