// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command handlers.
//!
//! Handlers take the remote API as a trait object and write to any
//! [`std::io::Write`], so they run the same against the real service, a mock
//! server or an in-memory fake.

use crate::cli::DiscoverTarget;
use crate::config::{desired_records, load_configuration, RawDocuments};
use crate::constants::{APPLIED_MESSAGE, DRY_RUN_HINT};
use crate::dns::{find_domain, DnsRecord};
use crate::errors::ReconcileError;
use crate::geoproximity::GeoProximity;
use crate::reconciler::{execute, Plan, ReconcileOptions, Report};
use crate::references::{ObservedCatalog, ReferenceCache, ReferenceResolver};
use crate::remote::{fetch_observed, RemoteApi};
use crate::report::{render_domains, render_report, render_statuses};
use crate::resource::{Resource, ResourceKind, Scope};
use crate::sonar::{HttpCheck, TcpCheck};
use crate::status::poll_statuses;
use crate::tracker::ObservedRecord;
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use serde_yaml::Value as YamlValue;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

/// Render a remote collection: YAML for resources, a table for domains.
///
/// # Errors
///
/// Fails when the collection cannot be fetched or decoded, or when the domain
/// of a record dump does not exist.
pub async fn discover(
    api: &dyn RemoteApi,
    target: DiscoverTarget,
    domain: Option<&str>,
) -> Result<String> {
    info!(?target, domain, "Discovering remote resources");
    match target {
        DiscoverTarget::HttpChecks => dump::<HttpCheck>(api, &Scope::Account).await,
        DiscoverTarget::TcpChecks => dump::<TcpCheck>(api, &Scope::Account).await,
        DiscoverTarget::Geoproximities => dump::<GeoProximity>(api, &Scope::Account).await,
        DiscoverTarget::Records => {
            let name = domain.context("--domain is required to discover records")?;
            let scope = domain_scope(api, name).await?;
            dump::<DnsRecord>(api, &scope).await
        }
        DiscoverTarget::Domains => {
            let domains = api.fetch_domains().await.context("unable to list domains")?;
            Ok(render_domains(&domains))
        }
    }
}

async fn dump<R: Resource>(api: &dyn RemoteApi, scope: &Scope) -> Result<String> {
    let catalog = ObservedCatalog::new();
    let mut cache = ReferenceCache::new();
    let mut resolver = ReferenceResolver::new(&mut cache, &catalog);

    let resources: Vec<R> = fetch_observed::<R>(api, scope, &mut resolver)
        .await
        .with_context(|| format!("unable to fetch {} collection", R::KIND))?
        .into_iter()
        .map(ObservedRecord::into_resource)
        .collect();

    to_yaml(&resources)
}

fn to_yaml<T: Serialize>(value: &T) -> Result<String> {
    serde_yaml::to_string(value).context("unable to render YAML")
}

async fn domain_scope(api: &dyn RemoteApi, name: &str) -> Result<Scope> {
    let domains = api.fetch_domains().await.context("unable to list domains")?;
    let domain = find_domain(&domains, name).ok_or_else(|| anyhow!("domain {name} not found"))?;
    Ok(Scope::Domain {
        id: domain.id,
        name: name.to_string(),
    })
}

/// Inputs of a sync run.
#[derive(Debug, Clone, Default)]
pub struct SyncRequest {
    /// Main configuration file
    pub config: PathBuf,
    /// Send changes instead of only reporting
    pub apply: bool,
    /// Allow deletions
    pub allow_delete: bool,
    /// Kinds to reconcile; every kind when empty
    pub only: Vec<ResourceKind>,
    /// Color actions in the report table
    pub color: bool,
}

impl SyncRequest {
    fn selects(&self, kind: ResourceKind) -> bool {
        self.only.is_empty() || self.only.contains(&kind)
    }
}

/// Observed collections every run needs, fetched up front so desired records
/// can reference them by name.
struct AccountState {
    http_checks: Vec<ObservedRecord<HttpCheck>>,
    tcp_checks: Vec<ObservedRecord<TcpCheck>>,
    geoproximities: Vec<ObservedRecord<GeoProximity>>,
}

impl AccountState {
    async fn fetch(api: &dyn RemoteApi, request: &SyncRequest) -> Result<Self> {
        let catalog = ObservedCatalog::new();
        let mut cache = ReferenceCache::new();
        let mut resolver = ReferenceResolver::new(&mut cache, &catalog);
        let records_selected = request.selects(ResourceKind::DnsRecord);

        let mut state = Self {
            http_checks: Vec::new(),
            tcp_checks: Vec::new(),
            geoproximities: Vec::new(),
        };
        if records_selected || request.selects(ResourceKind::HttpCheck) {
            state.http_checks = fetch_kind(api, &Scope::Account, &mut resolver).await?;
        }
        if records_selected || request.selects(ResourceKind::TcpCheck) {
            state.tcp_checks = fetch_kind(api, &Scope::Account, &mut resolver).await?;
        }
        if records_selected || request.selects(ResourceKind::GeoProximity) {
            state.geoproximities = fetch_kind(api, &Scope::Account, &mut resolver).await?;
        }
        Ok(state)
    }

    fn catalog(&self) -> ObservedCatalog {
        let mut catalog = ObservedCatalog::new();
        catalog.register(&self.http_checks);
        catalog.register(&self.tcp_checks);
        catalog.register(&self.geoproximities);
        catalog
    }
}

async fn fetch_kind<R: Resource>(
    api: &dyn RemoteApi,
    scope: &Scope,
    resolver: &mut ReferenceResolver<'_>,
) -> Result<Vec<ObservedRecord<R>>> {
    fetch_observed::<R>(api, scope, resolver)
        .await
        .with_context(|| format!("unable to fetch {} collection of {scope}", R::KIND))
}

fn plan_kind<R: Resource>(
    plan: &mut Plan,
    documents: &[YamlValue],
    observed: &[ObservedRecord<R>],
    scope: &Scope,
    resolver: &mut ReferenceResolver<'_>,
) -> Result<()> {
    let desired = desired_records::<R>(documents, resolver)
        .with_context(|| format!("invalid {} configuration", R::KIND))?;
    debug!(kind = %R::KIND, %scope, desired = desired.len(), observed = observed.len(), "Planning");
    plan.merge(Plan::build(&desired, observed, scope)?);
    Ok(())
}

/// Reconcile every selected kind of the configuration.
///
/// The report table and summary line are written to `out` before any change
/// is sent, followed by the closing message. On an immutable field conflict
/// the table ends with the conflict row and nothing is sent.
///
/// # Errors
///
/// Fails on configuration, decoding, fetch and reconciliation errors.
pub async fn sync(
    api: &dyn RemoteApi,
    request: &SyncRequest,
    out: &mut dyn Write,
) -> Result<Report> {
    let (_, documents) = load_configuration(&request.config)
        .with_context(|| format!("unable to load {}", request.config.display()))?;

    let state = AccountState::fetch(api, request).await?;
    let catalog = state.catalog();
    let mut cache = ReferenceCache::new();
    let mut resolver = ReferenceResolver::new(&mut cache, &catalog);

    let mut plan = Plan::default();
    let planned = plan_all(api, request, &documents, &state, &mut plan, &mut resolver).await;

    if let Err(err) = planned {
        if let Some(ReconcileError::ImmutableFieldConflict { report, .. }) =
            err.downcast_ref::<ReconcileError>()
        {
            let mut shown = plan.into_report();
            shown.extend((**report).clone());
            writeln!(out, "{}", render_report(&shown, request.color))?;
        }
        return Err(err);
    }

    writeln!(out, "{}", render_report(plan.report(), request.color))?;
    writeln!(out, "{}", plan.report().summary())?;

    let options = ReconcileOptions {
        apply: request.apply,
        allow_delete: request.allow_delete,
    };
    let report = execute(plan, api, options).await?;

    if report.is_applied() {
        writeln!(out, "{APPLIED_MESSAGE}")?;
    } else {
        writeln!(out, "{DRY_RUN_HINT}")?;
    }
    Ok(report)
}

async fn plan_all(
    api: &dyn RemoteApi,
    request: &SyncRequest,
    documents: &RawDocuments,
    state: &AccountState,
    plan: &mut Plan,
    resolver: &mut ReferenceResolver<'_>,
) -> Result<()> {
    let account = Scope::Account;

    if request.selects(ResourceKind::HttpCheck) {
        plan_kind(plan, &documents.http_checks, &state.http_checks, &account, resolver)?;
    }
    if request.selects(ResourceKind::TcpCheck) {
        plan_kind(plan, &documents.tcp_checks, &state.tcp_checks, &account, resolver)?;
    }
    if request.selects(ResourceKind::GeoProximity) {
        plan_kind(plan, &documents.geoproximities, &state.geoproximities, &account, resolver)?;
    }

    if request.selects(ResourceKind::DnsRecord) && !documents.dns.is_empty() {
        let domains = api.fetch_domains().await.context("unable to list domains")?;
        for (name, records) in &documents.dns {
            let domain =
                find_domain(&domains, name).ok_or_else(|| anyhow!("domain {name} not found"))?;
            let scope = Scope::Domain {
                id: domain.id,
                name: name.clone(),
            };
            let observed: Vec<ObservedRecord<DnsRecord>> =
                fetch_kind(api, &scope, resolver).await?;
            plan_kind(plan, records, &observed, &scope, resolver)?;
        }
    }

    Ok(())
}

/// Render the runtime status of every check of `kinds`.
///
/// # Errors
///
/// Fails when a check collection cannot be fetched.
pub async fn status(api: &dyn RemoteApi, kinds: &[ResourceKind], color: bool) -> Result<String> {
    let statuses = poll_statuses(api, kinds)
        .await
        .context("unable to poll check statuses")?;
    Ok(render_statuses(&statuses, color))
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod commands_tests;
