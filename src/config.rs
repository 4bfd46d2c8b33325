use anyhow::{Context, Result};
use clap::Parser;
use std::{env, time::Duration};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Base URL of the identity service, e.g. `http://keystone:5000`.
    pub identity_url: String,
    /// Base URL of the storage backend, e.g. `http://swift:8080`.
    pub storage_url: String,
    /// Default user domain used for password logins.
    pub user_domain: String,
    /// Deadline applied to every outbound backend call.
    pub backend_timeout: Duration,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Authenticated gateway for a Swift-style object store")]
pub struct Args {
    /// Host to bind to (overrides GATEWAY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides GATEWAY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Identity service base URL (overrides GATEWAY_IDENTITY_URL)
    #[arg(long)]
    pub identity_url: Option<String>,

    /// Storage backend base URL (overrides GATEWAY_STORAGE_URL)
    #[arg(long)]
    pub storage_url: Option<String>,

    /// Default login user domain (overrides GATEWAY_USER_DOMAIN)
    #[arg(long)]
    pub user_domain: Option<String>,

    /// Outbound call timeout in seconds (overrides GATEWAY_BACKEND_TIMEOUT_SECS)
    #[arg(long)]
    pub backend_timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        // Parse CLI once
        let args = Args::parse();
        Self::merge(args)
    }

    fn merge(args: Args) -> Result<Self> {
        // --- Environment fallback ---
        let env_host = env::var("GATEWAY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("GATEWAY_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing GATEWAY_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 5000,
            Err(err) => return Err(err).context("reading GATEWAY_PORT"),
        };
        let env_identity =
            env::var("GATEWAY_IDENTITY_URL").unwrap_or_else(|_| "http://127.0.0.1:5001".into());
        let env_storage =
            env::var("GATEWAY_STORAGE_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".into());
        let env_domain = env::var("GATEWAY_USER_DOMAIN").unwrap_or_else(|_| "Default".into());
        let env_timeout = match env::var("GATEWAY_BACKEND_TIMEOUT_SECS") {
            Ok(value) => value
                .parse::<u64>()
                .with_context(|| format!("parsing GATEWAY_BACKEND_TIMEOUT_SECS value `{}`", value))?,
            Err(env::VarError::NotPresent) => 15,
            Err(err) => return Err(err).context("reading GATEWAY_BACKEND_TIMEOUT_SECS"),
        };

        // --- Merge ---
        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            identity_url: args.identity_url.unwrap_or(env_identity),
            storage_url: args.storage_url.unwrap_or(env_storage),
            user_domain: args.user_domain.unwrap_or(env_domain),
            backend_timeout: Duration::from_secs(args.backend_timeout_secs.unwrap_or(env_timeout)),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
