//! GitHub App Authentication
//!
//! Builds and signs the RS256 JWT a GitHub App presents when asking for an
//! installation access token.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MintError;

/// Lifetime of the app JWT in seconds (GitHub's maximum is 10 minutes)
pub const JWT_LIFETIME_SECS: u64 = 600;

/// JWT claims for GitHub App authentication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubAppClaims {
    /// Issued at time (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issuer (GitHub App ID)
    pub iss: String,
}

impl GitHubAppClaims {
    /// Claims issued at `iat`, expiring [`JWT_LIFETIME_SECS`] later
    pub fn issued_at(app_id: &str, iat: u64) -> Self {
        Self {
            iat,
            exp: iat + JWT_LIFETIME_SECS,
            iss: app_id.to_string(),
        }
    }

    /// Claims issued at the current local time
    pub fn now(app_id: &str) -> Self {
        let now = Utc::now().timestamp().max(0) as u64;
        Self::issued_at(app_id, now)
    }
}

/// Parse an RSA private key from PEM (PKCS#1 or PKCS#8)
pub fn load_signing_key(private_key_pem: &[u8]) -> Result<EncodingKey, MintError> {
    EncodingKey::from_rsa_pem(private_key_pem).map_err(|e| MintError::KeyLoad(e.to_string()))
}

/// Sign `claims` with RS256, producing `header.payload.signature`
pub fn sign_claims(claims: &GitHubAppClaims, key: &EncodingKey) -> Result<String, MintError> {
    let header = Header::new(Algorithm::RS256);

    encode(&header, claims, key).map_err(|e| match e.kind() {
        // ring only parses the DER body at signing time
        ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
            MintError::KeyLoad(e.to_string())
        }
        _ => MintError::Signing(e),
    })
}

/// Generate a JWT for GitHub App authentication
///
/// # Arguments
/// * `app_id` - The GitHub App ID
/// * `private_key_pem` - The private key in PEM format
///
/// # Returns
/// A JWT string valid for 10 minutes
pub fn generate_jwt(app_id: &str, private_key_pem: &[u8]) -> Result<String, MintError> {
    let key = load_signing_key(private_key_pem)?;
    let claims = GitHubAppClaims::now(app_id);

    debug!(iss = %claims.iss, iat = claims.iat, exp = claims.exp, "Signing app JWT");

    sign_claims(&claims, &key)
}
