//! Authenticated session descriptor

use std::fmt;

use chrono::{DateTime, Utc};
use url::Url;

/// An immutable session issued by the auth endpoint.
///
/// Storage URL, token and expiry always travel together; a client either
/// holds a complete `Session` or none at all. Re-authentication replaces the
/// descriptor wholesale instead of mutating individual fields.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    storage_url: Url,
    token: String,
    expires_at: DateTime<Utc>,
}

impl Session {
    /// Create a session descriptor
    pub fn new(storage_url: Url, token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            storage_url,
            token: token.into(),
            expires_at,
        }
    }

    /// Storage endpoint all resource paths are built from
    pub fn storage_url(&self) -> &Url {
        &self.storage_url
    }

    /// Bearer token sent as `X-Auth-Token`
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Absolute expiry of the token
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// True when the token is still usable at `horizon`
    pub fn is_valid_at(&self, horizon: DateTime<Utc>) -> bool {
        horizon <= self.expires_at
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("storage_url", &self.storage_url.as_str())
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session_expiring_at(expires_at: DateTime<Utc>) -> Session {
        let url = Url::parse("https://ssproxy.ucloudbiz.olleh.com/v1/AUTH_test").unwrap();
        Session::new(url, "tok", expires_at)
    }

    #[test]
    fn test_validity_boundary() {
        let expires_at = Utc::now() + Duration::seconds(3600);
        let session = session_expiring_at(expires_at);

        assert!(session.is_valid_at(expires_at - Duration::seconds(1)));
        assert!(session.is_valid_at(expires_at));
        assert!(!session.is_valid_at(expires_at + Duration::seconds(1)));
    }

    #[test]
    fn test_expired_session_is_invalid_now() {
        let session = session_expiring_at(Utc::now() - Duration::seconds(1));
        assert!(!session.is_valid_at(Utc::now()));
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = session_expiring_at(Utc::now());
        let rendered = format!("{:?}", session);
        assert!(!rendered.contains("\"tok\""));
        assert!(rendered.contains("<redacted>"));
    }
}
