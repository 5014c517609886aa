//! Errors produced while minting an installation token.

use thiserror::Error;

/// Errors that can occur between loading the key and receiving the token
#[derive(Debug, Error)]
pub enum MintError {
    /// The private key is not valid PEM or is not an RSA key
    #[error("Failed to load private key: {0}")]
    KeyLoad(String),

    /// An input was rejected before any request was made
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Signing failed for a reason unrelated to the key's shape
    #[error("Failed to sign JWT: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// Transport failure (connect, timeout, body read)
    #[error("Request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The exchange endpoint answered with something other than 201 Created
    #[error("Failed to get installation access token. Status code: {status}\n{body}")]
    TokenExchange { status: u16, body: String },

    /// The exchange endpoint answered 201 but the body has no usable token
    #[error("Malformed token response: {0}")]
    MalformedResponse(String),
}

impl MintError {
    /// Build a network error for the given URL
    pub(crate) fn network(url: &str, source: reqwest::Error) -> Self {
        MintError::Network {
            url: url.to_string(),
            source,
        }
    }

    /// Whether the failure happened before any request was sent
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            MintError::KeyLoad(_) | MintError::InvalidConfig(_) | MintError::Signing(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_exchange_message_carries_status_and_body() {
        let err = MintError::TokenExchange {
            status: 401,
            body: r#"{"message":"Bad credentials"}"#.to_string(),
        };
        let message = err.to_string();

        assert!(message.contains("401"));
        assert!(message.contains("Bad credentials"));
        assert!(!err.is_local());
    }

    #[test]
    fn test_key_errors_are_local() {
        assert!(MintError::KeyLoad("bad pem".into()).is_local());
        assert!(MintError::InvalidConfig("empty".into()).is_local());
        assert!(!MintError::MalformedResponse("no token".into()).is_local());
    }
}
