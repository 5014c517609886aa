//! GitHub Enterprise App Installation Token Generator
//!
//! Generates a short-lived installation access token from GitHub App credentials.
//! Signs an RS256 JWT as the GitHub App, then exchanges it for an installation
//! token on a GitHub Enterprise Server instance.
//!
//! Only the token is written to stdout; progress and errors go to stderr.
//!
//! ## Usage
//! ```bash
//! # With command line arguments
//! get-token \
//!   --private-key-path ./key.pem \
//!   --installation-id 11 \
//!   --enterprise-url https://github.example.com \
//!   --app-id 6
//!
//! # With environment variables
//! GITHUB_APP_PRIVATE_KEY="$(cat key.pem)" \
//! GITHUB_APP_INSTALLATION_ID=11 \
//! GITHUB_APP_URL=https://github.example.com \
//! get-token --check-clock-skew
//! ```

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, ValueEnum};
use ghe_app_token::config::DEFAULT_APP_ID;
use ghe_app_token::{MinterConfig, TokenMinter};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// GitHub Enterprise App Installation Token Generator
#[derive(Parser, Debug)]
#[command(name = "get-token")]
#[command(about = "Generate GitHub Enterprise App installation access tokens")]
#[command(version)]
#[command(group(
    ArgGroup::new("key")
        .required(true)
        .args(["private_key", "private_key_path"])
))]
struct Args {
    /// PEM formatted private key string
    #[arg(
        long,
        env = "GITHUB_APP_PRIVATE_KEY",
        hide_env_values = true,
        allow_hyphen_values = true
    )]
    private_key: Option<String>,

    /// Path to the private key PEM file
    #[arg(long, env = "GITHUB_APP_PRIVATE_KEY_PATH")]
    private_key_path: Option<String>,

    /// GitHub App Installation ID
    #[arg(long, env = "GITHUB_APP_INSTALLATION_ID")]
    installation_id: String,

    /// GitHub Enterprise URL (e.g., https://github.example.com)
    #[arg(long, env = "GITHUB_APP_URL")]
    enterprise_url: String,

    /// GitHub App ID
    #[arg(long, env = "GITHUB_APP_ID", default_value = DEFAULT_APP_ID)]
    app_id: String,

    /// Compare the server clock with local time before the exchange
    #[arg(long)]
    check_clock_skew: bool,

    /// Timeout in seconds for each HTTP request
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: u64,

    /// Output file path (optional, prints to stdout if not specified)
    #[arg(long, short)]
    output: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Token)]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// The bare token
    Token,
    /// JSON with token, installation ID and expiry
    Json,
}

#[derive(Serialize)]
struct TokenOutput {
    token: String,
    installation_id: String,
    expires_at: Option<String>,
}

impl Args {
    fn private_key_pem(&self) -> Result<String> {
        match (&self.private_key, &self.private_key_path) {
            (Some(pem), _) => Ok(pem.clone()),
            (None, Some(path)) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read private key: {}", path)),
            (None, None) => anyhow::bail!("Either --private-key or --private-key-path is required"),
        }
    }

    fn minter_config(&self) -> Result<MinterConfig> {
        Ok(MinterConfig::new(
            self.private_key_pem()?,
            self.installation_id.clone(),
            self.enterprise_url.clone(),
        )
        .app_id(self.app_id.clone())
        .check_clock_skew(self.check_clock_skew)
        .timeout(Duration::from_secs(self.timeout_secs)))
    }
}

/// Log to stderr so stdout carries nothing but the token; RUST_LOG overrides the level
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Write the token so that it is never readable by other users, even briefly
fn write_token_file(path: &str, contents: &str) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    // mode() only applies to new files; tighten a pre-existing one before writing
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents.as_bytes())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let minter = TokenMinter::new(args.minter_config()?)?;
    let token_response = minter.mint().await?;

    let output = match args.format {
        OutputFormat::Json => {
            let output = TokenOutput {
                token: token_response.token.clone(),
                installation_id: args.installation_id.trim().to_string(),
                expires_at: token_response.expires_at.clone(),
            };
            serde_json::to_string_pretty(&output)?
        }
        OutputFormat::Token => token_response.token.clone(),
    };

    if let Some(output_path) = args.output {
        write_token_file(&output_path, &output)
            .with_context(|| format!("Failed to write token to {}", output_path))?;
        info!("✅ Token saved to {}", output_path);
    } else {
        println!("{}", output);
        if let Some(expires_at) = &token_response.expires_at {
            info!("Token expires at {}", expires_at);
        }
    }

    Ok(())
}
