// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command line interface of the `mech` binary.

use crate::client::auth::Credentials;
use crate::client::ClientConfig;
use crate::constants::{
    DNS_API_BASE_URL, ENV_API_KEY, ENV_DNS_API_URL, ENV_SECRET_KEY, ENV_SONAR_API_URL,
    SONAR_API_BASE_URL,
};
use crate::resource::ResourceKind;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Constellix DNS and Sonar configuration as code
#[derive(Debug, Parser)]
#[command(name = "mech", author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log at trace level, including every field comparison
    #[arg(long, global = true)]
    pub debug: bool,

    /// Disable colors in tables
    #[arg(long, global = true)]
    pub no_color: bool,
}

impl GlobalArgs {
    /// Default log filter when `RUST_LOG` is not set.
    #[must_use]
    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "trace"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Dump remote resources as YAML
    Discover(DiscoverArgs),

    /// Drive remote resources toward the configuration
    Sync(SyncArgs),

    /// Show runtime status of health checks
    Status(StatusArgs),

    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

/// Credentials and endpoints of the Constellix APIs.
#[derive(Debug, Clone, Args)]
pub struct ApiArgs {
    /// Constellix API key
    #[arg(long, env = ENV_API_KEY, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Constellix secret key
    #[arg(long, env = ENV_SECRET_KEY, hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Base URL of the DNS v4 API
    #[arg(long, env = ENV_DNS_API_URL, default_value = DNS_API_BASE_URL)]
    pub dns_api_url: String,

    /// Base URL of the Sonar API
    #[arg(long, env = ENV_SONAR_API_URL, default_value = SONAR_API_BASE_URL)]
    pub sonar_api_url: String,
}

impl ApiArgs {
    /// Client settings from the arguments.
    ///
    /// # Errors
    ///
    /// Fails when a credential is missing.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let api_key = self
            .api_key
            .clone()
            .with_context(|| format!("missing API key, pass --api-key or set {ENV_API_KEY}"))?;
        let secret_key = self.secret_key.clone().with_context(|| {
            format!("missing secret key, pass --secret-key or set {ENV_SECRET_KEY}")
        })?;

        Ok(ClientConfig::new(Credentials::new(api_key, secret_key))
            .with_dns_base_url(&self.dns_api_url)
            .with_sonar_base_url(&self.sonar_api_url))
    }
}

/// Remote collections `discover` can dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DiscoverTarget {
    HttpChecks,
    TcpChecks,
    Geoproximities,
    /// DNS records of the domain given with --domain
    Records,
    /// Domains of the account, as a table
    Domains,
}

#[derive(Debug, Clone, Args)]
pub struct DiscoverArgs {
    /// Collection to dump
    #[arg(value_enum)]
    pub target: DiscoverTarget,

    /// Domain whose records are dumped
    #[arg(long, required_if_eq("target", "records"))]
    pub domain: Option<String>,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub api: ApiArgs,
}

#[derive(Debug, Clone, Args)]
pub struct SyncArgs {
    /// Main configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Send changes; without it the run only reports
    #[arg(long)]
    pub doit: bool,

    /// Allow deleting remote resources missing from the configuration
    #[arg(long)]
    pub remove: bool,

    /// Restrict the run to these kinds (http-check, tcp-check, geoproximity, dns-record)
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub only: Vec<ResourceKind>,

    #[command(flatten)]
    pub api: ApiArgs,
}

/// Health check kinds with a runtime status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CheckKind {
    HttpCheck,
    TcpCheck,
}

impl From<CheckKind> for ResourceKind {
    fn from(kind: CheckKind) -> Self {
        match kind {
            CheckKind::HttpCheck => ResourceKind::HttpCheck,
            CheckKind::TcpCheck => ResourceKind::TcpCheck,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct StatusArgs {
    /// Only checks of this kind; both kinds by default
    #[arg(long, value_enum)]
    pub kind: Option<CheckKind>,

    #[command(flatten)]
    pub api: ApiArgs,
}

#[derive(Debug, Clone, Args)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
