// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # Mech - Constellix DNS and Sonar configuration as code
//!
//! Mech reads YAML descriptions of Sonar health checks, geoproximity locations
//! and DNS records, compares them with what the Constellix APIs report, and
//! sends the creations, updates and deletions needed to converge.
//!
//! ## Overview
//!
//! A run has two stages. Planning fetches every observed collection, pairs
//! desired and observed records by identity and builds a [`reconciler::Plan`]
//! with one report row per record. Execution then sends deletions (dependents
//! first), updates and creations (dependencies first), stopping at the first
//! failure. Without `--doit` only the report is printed.
//!
//! ## Modules
//!
//! - [`resource`] - Resource kinds, field tables and the [`resource::Resource`] trait
//! - [`sonar`], [`geoproximity`], [`dns`] - The managed resource types
//! - [`references`] - Symbolic `@sonar,...` and `@geoproximity:...` references
//! - [`tracker`] - Desired and observed records, identity pairing
//! - [`diff`] - Field comparison and immutable field conflicts
//! - [`payload`] - JSON bodies sent on create and update
//! - [`reconciler`] - Planning, ordering and execution
//! - [`remote`] - The [`remote::RemoteApi`] seam
//! - [`client`] - HTTP client for the Constellix DNS v4 and Sonar APIs
//! - [`config`] - Main configuration file and resource file loading
//! - [`report`], [`status`] - Tables printed by the commands
//! - [`cli`], [`commands`] - Command line surface
//!
//! ## Example
//!
//! ```rust,no_run
//! use mech::client::{auth::Credentials, ClientConfig, ConstellixClient};
//! use mech::commands::{sync, SyncRequest};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ClientConfig::new(Credentials::new("api-key", "secret-key"));
//! let client = ConstellixClient::new(config)?;
//!
//! let request = SyncRequest {
//!     config: "mech.yaml".into(),
//!     ..SyncRequest::default()
//! };
//! let report = sync(&client, &request, &mut std::io::stdout()).await?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod constants;
pub mod diff;
pub mod dns;
pub mod errors;
pub mod geoproximity;
pub mod payload;
pub mod reconciler;
pub mod references;
pub mod remote;
pub mod report;
pub mod resource;
pub mod sonar;
pub mod status;
pub mod tracker;

#[cfg(test)]
pub(crate) mod testing;
