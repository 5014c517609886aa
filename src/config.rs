//! Minter configuration
//!
//! All inputs of one minting run, passed explicitly into [`crate::TokenMinter`].

use std::fmt;
use std::time::Duration;

use reqwest::Url;

use crate::error::MintError;

/// App ID used when none is supplied
pub const DEFAULT_APP_ID: &str = "6";

/// Per-request timeout applied to both the meta probe and the exchange
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent sent with every request (GitHub rejects requests without one)
pub const DEFAULT_USER_AGENT: &str = concat!("ghe-app-token/", env!("CARGO_PKG_VERSION"));

/// Inputs for minting one installation access token
#[derive(Clone)]
pub struct MinterConfig {
    /// RSA private key in PEM format (PKCS#1 or PKCS#8)
    pub private_key_pem: String,
    /// GitHub App installation ID
    pub installation_id: String,
    /// GitHub Enterprise base URL (e.g. https://github.example.com)
    pub enterprise_url: String,
    /// GitHub App ID, used as the `iss` claim
    pub app_id: String,
    /// Probe `api/v3/meta` and warn when the server clock is skewed
    pub check_clock_skew: bool,
    /// Timeout for each HTTP request
    pub timeout: Duration,
    /// User-Agent header value
    pub user_agent: String,
}

impl MinterConfig {
    /// Create a config with the default app ID, no clock probe and a 30s timeout
    pub fn new(
        private_key_pem: impl Into<String>,
        installation_id: impl Into<String>,
        enterprise_url: impl Into<String>,
    ) -> Self {
        Self {
            private_key_pem: private_key_pem.into(),
            installation_id: installation_id.into(),
            enterprise_url: enterprise_url.into(),
            app_id: DEFAULT_APP_ID.to_string(),
            check_clock_skew: false,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Override the GitHub App ID
    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    /// Enable or disable the clock-skew probe
    pub fn check_clock_skew(mut self, enabled: bool) -> Self {
        self.check_clock_skew = enabled;
        self
    }

    /// Set the per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header value
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Check the inputs that can be rejected without touching the network.
    ///
    /// The key itself is checked when it is loaded for signing.
    pub fn validate(&self) -> Result<(), MintError> {
        let installation_id = self.installation_id.trim();
        if installation_id.is_empty() {
            return Err(MintError::InvalidConfig(
                "installation ID must not be empty".to_string(),
            ));
        }
        if !installation_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MintError::InvalidConfig(format!(
                "installation ID must be numeric, got '{}'",
                installation_id
            )));
        }
        if self.app_id.trim().is_empty() {
            return Err(MintError::InvalidConfig("app ID must not be empty".to_string()));
        }
        normalize_base_url(&self.enterprise_url)?;
        Ok(())
    }
}

impl fmt::Debug for MinterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinterConfig")
            .field("private_key_pem", &"<redacted>")
            .field("installation_id", &self.installation_id)
            .field("enterprise_url", &self.enterprise_url)
            .field("app_id", &self.app_id)
            .field("check_clock_skew", &self.check_clock_skew)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Normalize a base URL so it ends with exactly one `/`.
///
/// Rejects empty input and anything that is not an http(s) URL.
pub fn normalize_base_url(raw: &str) -> Result<String, MintError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(MintError::InvalidConfig(
            "enterprise URL must not be empty".to_string(),
        ));
    }

    let base = format!("{}/", trimmed);
    let parsed = Url::parse(&base)
        .map_err(|e| MintError::InvalidConfig(format!("invalid enterprise URL '{}': {}", raw, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(base),
        other => Err(MintError::InvalidConfig(format!(
            "enterprise URL must use http or https, got '{}'",
            other
        ))),
    }
}
