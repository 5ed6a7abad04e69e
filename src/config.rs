//! Client configuration

use std::fmt;
use std::time::Duration;

/// Client configuration
#[derive(Clone)]
pub struct Config {
    /// Auth endpoint URL
    pub auth_url: String,
    /// Account user name
    pub username: String,
    /// Account API key
    pub api_key: String,
    /// Reseller account to operate on instead of the issued one
    pub account: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Re-authenticate when the token expires within this window
    pub refresh_lookahead: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Config {
    /// Create a new config with the given credentials
    pub fn new(
        auth_url: impl Into<String>,
        username: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            auth_url: auth_url.into(),
            username: username.into(),
            api_key: api_key.into(),
            account: None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            refresh_lookahead: Duration::from_secs(600),
            user_agent: format!("ucloud-storage/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Operate on another account (reseller mode)
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the token refresh lookahead window
    pub fn with_refresh_lookahead(mut self, lookahead: Duration) -> Self {
        self.refresh_lookahead = lookahead;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("auth_url", &self.auth_url)
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .field("account", &self.account)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("refresh_lookahead", &self.refresh_lookahead)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
