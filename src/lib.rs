//! GitHub Enterprise App Token Library
//!
//! Mints a short-lived installation access token for a GitHub App installed
//! on a GitHub Enterprise Server instance.
//!
//! ## Flow
//!
//! 1. Load the app's RSA private key
//! 2. Sign an RS256 JWT with `iat = now`, `exp = now + 600`, `iss = app ID`
//! 3. Optionally compare the server clock (`api/v3/meta`) with local time
//! 4. `POST api/v3/app/installations/{id}/access_tokens` and return `token`
//!
//! ## Example
//!
//! ```bash
//! GITHUB_TOKEN=$(get-token \
//!   --private-key-path /path/to/key.pem \
//!   --installation-id 11 \
//!   --enterprise-url https://github.example.com \
//!   --app-id 6)
//! ```

pub mod auth;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod minter;

pub use client::InstallationToken;
pub use config::MinterConfig;
pub use error::MintError;
pub use minter::{mint_installation_token, TokenMinter};
