//! GitHub Enterprise API Client
//!
//! The two REST calls a token run makes: the optional `api/v3/meta` probe
//! and the installation token exchange.

use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION, DATE};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::clock::parse_http_date;
use crate::config::{normalize_base_url, MinterConfig};
use crate::error::MintError;

const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Installation access token issued by the exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationToken {
    pub token: String,
    pub expires_at: Option<String>,
}

/// Body of a 201 from the installation token endpoint
#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    expires_at: Option<String>,
}

/// Client bound to one GitHub Enterprise instance
pub struct GitHubAppClient {
    client: Client,
    base_url: String,
}

impl GitHubAppClient {
    /// Create a client for the config's enterprise URL
    pub fn new(config: &MinterConfig) -> Result<Self, MintError> {
        let base_url = normalize_base_url(&config.enterprise_url)?;

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|e| MintError::network(&base_url, e))?;

        Ok(Self { client, base_url })
    }

    /// URL of the installation token endpoint
    pub fn access_tokens_url(&self, installation_id: &str) -> String {
        format!(
            "{}api/v3/app/installations/{}/access_tokens",
            self.base_url, installation_id
        )
    }

    /// URL of the meta endpoint used for the clock probe
    pub fn meta_url(&self) -> String {
        format!("{}api/v3/meta", self.base_url)
    }

    /// Fetch the server's current time from the `Date` header of `api/v3/meta`
    pub async fn server_time(&self) -> Result<DateTime<Utc>, MintError> {
        let url = self.meta_url();
        debug!("Probing server clock: {}", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, GITHUB_ACCEPT)
            .send()
            .await
            .map_err(|e| MintError::network(&url, e))?;

        let date = response
            .headers()
            .get(DATE)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                MintError::MalformedResponse(format!("{} returned no Date header", url))
            })?;

        parse_http_date(date).ok_or_else(|| {
            MintError::MalformedResponse(format!("unparsable Date header: {}", date))
        })
    }

    /// Exchange an app JWT for an installation access token
    pub async fn create_installation_token(
        &self,
        jwt: &str,
        installation_id: &str,
    ) -> Result<InstallationToken, MintError> {
        let url = self.access_tokens_url(installation_id);
        debug!("Requesting installation token: {}", url);

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", jwt))
            .header(ACCEPT, GITHUB_ACCEPT)
            .send()
            .await
            .map_err(|e| MintError::network(&url, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MintError::network(&url, e))?;

        if status != StatusCode::CREATED {
            return Err(MintError::TokenExchange {
                status: status.as_u16(),
                body,
            });
        }

        parse_token_response(&body)
    }
}

/// Extract the token from a 201 response body
fn parse_token_response(body: &str) -> Result<InstallationToken, MintError> {
    let response: TokenResponse = serde_json::from_str(body).map_err(|e| {
        MintError::MalformedResponse(format!("failed to parse token response: {}", e))
    })?;

    let token = response
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| MintError::MalformedResponse("response has no 'token' field".to_string()))?;

    Ok(InstallationToken {
        token,
        expires_at: response.expires_at,
    })
}
