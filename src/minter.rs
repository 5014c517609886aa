//! Token Minter
//!
//! Signs the app JWT, optionally probes the server clock, then exchanges the
//! JWT for an installation access token. The key is loaded and the JWT signed
//! before any request is sent, so bad input never reaches the network.

use chrono::Utc;
use tracing::{info, warn};

use crate::auth::generate_jwt;
use crate::client::{GitHubAppClient, InstallationToken};
use crate::clock::ClockSkew;
use crate::config::MinterConfig;
use crate::error::MintError;

/// Mints installation access tokens for one GitHub App installation
pub struct TokenMinter {
    config: MinterConfig,
    client: GitHubAppClient,
}

impl TokenMinter {
    /// Validate the config and build the HTTP client
    pub fn new(config: MinterConfig) -> Result<Self, MintError> {
        config.validate()?;
        let client = GitHubAppClient::new(&config)?;
        Ok(Self { config, client })
    }

    fn installation_id(&self) -> &str {
        self.config.installation_id.trim()
    }

    /// URL the exchange request is sent to
    pub fn exchange_url(&self) -> String {
        self.client.access_tokens_url(self.installation_id())
    }

    /// Sign a fresh app JWT (`iat` = now, `exp` = now + 600)
    pub fn sign_assertion(&self) -> Result<String, MintError> {
        generate_jwt(
            self.config.app_id.trim(),
            self.config.private_key_pem.as_bytes(),
        )
    }

    /// Compare the server's clock with ours and log the result.
    ///
    /// Never fails: probe errors are logged and `None` is returned.
    pub async fn check_clock_skew(&self) -> Option<ClockSkew> {
        match self.client.server_time().await {
            Ok(server) => {
                let skew = ClockSkew::new(server, Utc::now());
                skew.report();
                Some(skew)
            }
            Err(e) => {
                warn!("⚠️  Clock skew check failed, continuing: {}", e);
                None
            }
        }
    }

    /// Run the full pipeline and return the installation token
    pub async fn mint(&self) -> Result<InstallationToken, MintError> {
        info!("🔐 Generating JWT for GitHub App {}...", self.config.app_id.trim());
        let jwt = self.sign_assertion()?;

        if self.config.check_clock_skew {
            self.check_clock_skew().await;
        }

        info!(
            "🔑 Exchanging JWT for installation token (installation: {})...",
            self.installation_id()
        );
        let token = self
            .client
            .create_installation_token(&jwt, self.installation_id())
            .await?;

        info!("✅ Installation token issued");
        Ok(token)
    }
}

/// Convenience wrapper: build a [`TokenMinter`] and mint one token
pub async fn mint_installation_token(config: MinterConfig) -> Result<InstallationToken, MintError> {
    TokenMinter::new(config)?.mint().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::GitHubAppClaims;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use mockito::Matcher;

    const PRIVATE_KEY: &str = include_str!("../test_data/test_rsa_private.pem");
    const TOKENS_PATH: &str = "/api/v3/app/installations/11/access_tokens";
    const JWT_BEARER: &str = r"^Bearer [A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+$";

    #[test]
    fn test_exchange_url_scenario() {
        let minter = TokenMinter::new(
            MinterConfig::new(PRIVATE_KEY, "11", "https://example.test").app_id("6"),
        )
        .unwrap();

        assert_eq!(
            minter.exchange_url(),
            "https://example.test/api/v3/app/installations/11/access_tokens"
        );
    }

    #[test]
    fn test_sign_assertion_uses_configured_app_id() {
        let minter = TokenMinter::new(
            MinterConfig::new(PRIVATE_KEY, "11", "https://example.test").app_id("4242"),
        )
        .unwrap();

        let jwt = minter.sign_assertion().unwrap();
        let payload = jwt.split('.').nth(1).unwrap();
        let claims: GitHubAppClaims =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();

        assert_eq!(claims.iss, "4242");
        assert_eq!(claims.exp - claims.iat, 600);
    }

    #[test]
    fn test_invalid_config_is_rejected_up_front() {
        let result = TokenMinter::new(MinterConfig::new(PRIVATE_KEY, "", "https://example.test"));
        assert!(matches!(result, Err(MintError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_mint_returns_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", TOKENS_PATH)
            .match_header("authorization", Matcher::Regex(JWT_BEARER.to_string()))
            .match_header("accept", "application/vnd.github+json")
            .with_status(201)
            .with_body(r#"{"token":"abc123"}"#)
            .create_async()
            .await;

        let token = mint_installation_token(MinterConfig::new(PRIVATE_KEY, "11", server.url()))
            .await
            .unwrap();

        assert_eq!(token.token, "abc123");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_key_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let meta = server
            .mock("GET", "/api/v3/meta")
            .expect(0)
            .create_async()
            .await;
        let exchange = server
            .mock("POST", TOKENS_PATH)
            .expect(0)
            .create_async()
            .await;

        let config = MinterConfig::new("-----BEGIN garbage", "11", server.url()).check_clock_skew(true);
        let err = mint_installation_token(config).await.unwrap_err();

        assert!(matches!(err, MintError::KeyLoad(_)));
        assert!(err.is_local());
        meta.assert_async().await;
        exchange.assert_async().await;
    }

    #[tokio::test]
    async fn test_bad_credentials_surface_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", TOKENS_PATH)
            .with_status(401)
            .with_body(r#"{"message":"Bad credentials"}"#)
            .create_async()
            .await;

        let err = mint_installation_token(MinterConfig::new(PRIVATE_KEY, "11", server.url()))
            .await
            .unwrap_err();

        assert!(matches!(err, MintError::TokenExchange { status: 401, .. }));
        assert!(err.to_string().contains("Bad credentials"));
    }

    #[tokio::test]
    async fn test_skewed_server_clock_is_advisory() {
        let mut server = mockito::Server::new_async().await;
        let meta = server
            .mock("GET", "/api/v3/meta")
            .with_status(200)
            .with_header("date", "Sun, 06 Nov 1994 08:49:37 GMT")
            .with_body("{}")
            .expect(2)
            .create_async()
            .await;
        let exchange = server
            .mock("POST", TOKENS_PATH)
            .with_status(201)
            .with_body(r#"{"token":"abc123"}"#)
            .create_async()
            .await;

        let minter = TokenMinter::new(
            MinterConfig::new(PRIVATE_KEY, "11", server.url()).check_clock_skew(true),
        )
        .unwrap();

        let skew = minter.check_clock_skew().await.unwrap();
        assert!(skew.is_significant());
        assert!(skew.seconds() < 0);

        let token = minter.mint().await.unwrap();
        assert_eq!(token.token, "abc123");

        meta.assert_async().await;
        exchange.assert_async().await;
    }

    #[tokio::test]
    async fn test_clock_probe_failure_is_swallowed() {
        let minter = TokenMinter::new(
            MinterConfig::new(PRIVATE_KEY, "11", "http://127.0.0.1:9").check_clock_skew(true),
        )
        .unwrap();

        assert!(minter.check_clock_skew().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_clock_check_still_mints() {
        let mut server = mockito::Server::new_async().await;
        let meta = server
            .mock("GET", "/api/v3/meta")
            .with_status(500)
            .with_header("date", "not-a-date")
            .create_async()
            .await;
        let exchange = server
            .mock("POST", TOKENS_PATH)
            .with_status(201)
            .with_body(r#"{"token":"abc123"}"#)
            .create_async()
            .await;

        let minter = TokenMinter::new(
            MinterConfig::new(PRIVATE_KEY, "11", server.url()).check_clock_skew(true),
        )
        .unwrap();

        let token = minter.mint().await.unwrap();

        assert_eq!(token.token, "abc123");
        meta.assert_async().await;
        exchange.assert_async().await;
    }
}
