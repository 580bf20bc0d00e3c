// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation of a desired collection against an observed collection.
//!
//! A run has two steps:
//!
//! 1. [`Plan::build`] classifies every record. Observed records without a desired
//!    counterpart are deletions, desired records without an observed counterpart
//!    are creations, and matched pairs are compared field by field. An immutable
//!    field conflict aborts the run here, before anything is sent.
//! 2. [`execute`] applies the plan in three phases: deletions, then updates,
//!    then creations. Deletions run dependents first (DNS records before the
//!    health checks and geoproximities they point to) and creations run
//!    dependencies first. The first failing call stops the run.
//!
//! Plans of several kinds and domains can be merged so that ordering holds
//! across the whole run.

use crate::diff::{compare, Action};
use crate::errors::ReconcileError;
use crate::payload::{create_payload, update_payload};
use crate::remote::RemoteApi;
use crate::resource::{Resource, ResourceKind, Scope};
use crate::tracker::{pair_by_identity, DesiredRecord, ObservedRecord};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, error, info, warn};

/// Execution phase of a planned change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Delete,
    Update,
    Create,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Delete => "delete",
            Self::Update => "update",
            Self::Create => "create",
        })
    }
}

/// One classified record, as shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub kind: ResourceKind,
    pub scope: Scope,
    pub action: Action,
    pub identity: String,
    /// Field diffs for updates and creations, the reason for conflicts
    pub details: Vec<String>,
}

/// Counts of planned changes per action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub delete: usize,
    pub update: usize,
    pub create: usize,
    pub unchanged: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SUMMARY: {} to delete, {} to update, {} to create",
            self.delete, self.update, self.create
        )
    }
}

/// Classification of every record of a run.
///
/// Deletions come first, followed by desired records in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    rows: Vec<ReportRow>,
    applied: bool,
}

impl Report {
    #[must_use]
    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    /// Whether the changes were sent to the remote service.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        self.applied
    }

    #[must_use]
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for row in &self.rows {
            match row.action {
                Action::Delete => summary.delete += 1,
                Action::Update => summary.update += 1,
                Action::Create => summary.create += 1,
                Action::NoChange => summary.unchanged += 1,
                Action::Conflict => {}
            }
        }
        summary
    }

    /// True when at least one record is not [`Action::NoChange`].
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.rows.iter().any(|row| row.action != Action::NoChange)
    }

    fn push(&mut self, row: ReportRow) {
        self.rows.push(row);
    }

    /// Append the rows of another report.
    ///
    /// Deletion rows of `other` join the leading block of deletions; its other
    /// rows go last. Relative order inside each group is kept.
    pub fn extend(&mut self, other: Report) {
        let (deletions, rest): (Vec<ReportRow>, Vec<ReportRow>) = other
            .rows
            .into_iter()
            .partition(|row| row.action == Action::Delete);
        let leading = self
            .rows
            .iter()
            .take_while(|row| row.action == Action::Delete)
            .count();
        self.rows.splice(leading..leading, deletions);
        self.rows.extend(rest);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operation {
    Delete { id: i64 },
    Update { id: i64, payload: Vec<u8> },
    Create { payload: Vec<u8> },
}

/// A remote call waiting to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedChange {
    pub kind: ResourceKind,
    pub scope: Scope,
    pub identity: String,
    /// The record points at another resource (DNS records only)
    pub linked: bool,
    operation: Operation,
}

impl PlannedChange {
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self.operation {
            Operation::Delete { .. } => Phase::Delete,
            Operation::Update { .. } => Phase::Update,
            Operation::Create { .. } => Phase::Create,
        }
    }

    /// Remote identifier targeted by a deletion or update.
    #[must_use]
    pub fn remote_id(&self) -> Option<i64> {
        match self.operation {
            Operation::Delete { id } | Operation::Update { id, .. } => Some(id),
            Operation::Create { .. } => None,
        }
    }

    /// Request body of an update or creation.
    #[must_use]
    pub fn payload(&self) -> Option<&[u8]> {
        match &self.operation {
            Operation::Update { payload, .. } | Operation::Create { payload } => Some(payload),
            Operation::Delete { .. } => None,
        }
    }
}

/// Classified records plus the remote calls needed to converge.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    report: Report,
    deletions: Vec<PlannedChange>,
    updates: Vec<PlannedChange>,
    creations: Vec<PlannedChange>,
}

impl Plan {
    /// Classify `desired` against `observed` within one scope.
    ///
    /// Records are paired by identity key, one to one and in order. Observed
    /// records sharing a key beyond the ones paired are deleted.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::ImmutableFieldConflict`] for the first desired
    /// record changing an immutable field, and [`ReconcileError::Payload`] when a
    /// request body cannot be built.
    pub fn build<R: Resource>(
        desired: &[DesiredRecord<R>],
        observed: &[ObservedRecord<R>],
        scope: &Scope,
    ) -> Result<Self, ReconcileError> {
        warn_duplicates(R::KIND, scope, desired.iter().map(DesiredRecord::identity));

        let mut plan = Self::default();
        let pairs = pair_by_identity(desired, observed);

        let mut paired = vec![false; observed.len()];
        for index in pairs.iter().flatten() {
            paired[*index] = true;
        }

        for (record, _) in observed.iter().zip(&paired).filter(|(_, paired)| !**paired) {
            let identity = record.identity();
            debug!(kind = %R::KIND, %scope, %identity, id = record.remote_id(), "Planning deletion");
            plan.report.push(ReportRow {
                kind: R::KIND,
                scope: scope.clone(),
                action: Action::Delete,
                identity: identity.clone(),
                details: vec![format!("remote id {}", record.remote_id())],
            });
            plan.deletions.push(PlannedChange {
                kind: R::KIND,
                scope: scope.clone(),
                identity,
                linked: record.resource().has_linkage(),
                operation: Operation::Delete {
                    id: record.remote_id(),
                },
            });
        }

        for (record, pair) in desired.iter().zip(&pairs) {
            let identity = record.identity();
            let matched = pair.map(|index| &observed[index]);

            let comparison = match compare(record, matched) {
                Ok(comparison) => comparison,
                Err(conflict) => {
                    warn!(kind = %R::KIND, %scope, %identity, %conflict, "Immutable field conflict");
                    plan.report.push(ReportRow {
                        kind: R::KIND,
                        scope: scope.clone(),
                        action: Action::Conflict,
                        identity: identity.clone(),
                        details: vec![conflict.to_string()],
                    });
                    return Err(ReconcileError::ImmutableFieldConflict {
                        kind: R::KIND,
                        identity,
                        conflict,
                        report: Box::new(plan.report),
                    });
                }
            };

            let operation = match (comparison.action, matched) {
                (Action::Create, _) => Some(Operation::Create {
                    payload: create_payload(record)?,
                }),
                (Action::Update, Some(current)) => Some(Operation::Update {
                    id: current.remote_id(),
                    payload: update_payload(record)?,
                }),
                _ => None,
            };

            let details = comparison
                .diffs
                .iter()
                .map(|diff| match comparison.action {
                    Action::Create => format!("{}: {}", diff.field, diff.new_value),
                    _ => diff.to_string(),
                })
                .collect();

            debug!(kind = %R::KIND, %scope, %identity, action = %comparison.action, "Classified record");
            plan.report.push(ReportRow {
                kind: R::KIND,
                scope: scope.clone(),
                action: comparison.action,
                identity: identity.clone(),
                details,
            });

            if let Some(operation) = operation {
                let change = PlannedChange {
                    kind: R::KIND,
                    scope: scope.clone(),
                    identity,
                    linked: record.resource().has_linkage(),
                    operation,
                };
                match change.phase() {
                    Phase::Update => plan.updates.push(change),
                    _ => plan.creations.push(change),
                }
            }
        }

        Ok(plan)
    }

    /// Append another plan; its rows and changes follow this plan's.
    pub fn merge(&mut self, other: Plan) {
        self.report.extend(other.report);
        self.deletions.extend(other.deletions);
        self.updates.extend(other.updates);
        self.creations.extend(other.creations);
    }

    #[must_use]
    pub fn report(&self) -> &Report {
        &self.report
    }

    #[must_use]
    pub fn into_report(self) -> Report {
        self.report
    }

    /// True when no remote call is needed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deletions.is_empty() && self.updates.is_empty() && self.creations.is_empty()
    }

    /// Deletions in execution order.
    ///
    /// Kinds that depend on others go first, and within a kind records linked to
    /// another resource go before unlinked ones. Ties are broken by kind, scope
    /// and identity so the order is reproducible.
    #[must_use]
    pub fn ordered_deletions(&self) -> Vec<&PlannedChange> {
        let mut ordered: Vec<&PlannedChange> = self.deletions.iter().collect();
        ordered.sort_by(|a, b| {
            b.kind
                .dependency_rank()
                .cmp(&a.kind.dependency_rank())
                .then_with(|| b.linked.cmp(&a.linked))
                .then_with(|| a.kind.cmp(&b.kind))
                .then_with(|| a.scope.cmp(&b.scope))
                .then_with(|| a.identity.cmp(&b.identity))
        });
        ordered
    }

    /// Updates in configuration order.
    #[must_use]
    pub fn ordered_updates(&self) -> Vec<&PlannedChange> {
        self.updates.iter().collect()
    }

    /// Creations in execution order: dependencies first, then configuration order.
    #[must_use]
    pub fn ordered_creations(&self) -> Vec<&PlannedChange> {
        let mut ordered: Vec<&PlannedChange> = self.creations.iter().collect();
        ordered.sort_by_key(|change| change.kind.dependency_rank());
        ordered
    }
}

fn warn_duplicates(kind: ResourceKind, scope: &Scope, identities: impl Iterator<Item = String>) {
    let mut seen = HashSet::new();
    for identity in identities {
        if !seen.insert(identity.clone()) {
            warn!(%kind, %scope, %identity, "Duplicate identity in configuration");
        }
    }
}

/// How a plan is carried out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Send changes; when false the run only reports
    pub apply: bool,
    /// Allow planned deletions to be sent
    pub allow_delete: bool,
}

/// Carry out a plan against the remote service.
///
/// Without [`ReconcileOptions::apply`] this only logs the summary and returns
/// the report.
///
/// # Errors
///
/// Returns [`ReconcileError::DeletionNotAllowed`] before any call when
/// deletions are planned but not allowed, and [`ReconcileError::RemoteCall`]
/// for the first failing call. Calls sent before the failure are not undone.
pub async fn execute(
    plan: Plan,
    api: &dyn RemoteApi,
    options: ReconcileOptions,
) -> Result<Report, ReconcileError> {
    let summary = plan.report.summary();
    info!(
        to_delete = summary.delete,
        to_update = summary.update,
        to_create = summary.create,
        unchanged = summary.unchanged,
        "{summary}"
    );

    if !options.apply {
        info!("Dry run, no changes sent");
        return Ok(plan.report);
    }

    if !plan.deletions.is_empty() && !options.allow_delete {
        return Err(ReconcileError::DeletionNotAllowed {
            count: plan.deletions.len(),
        });
    }

    run_phase(api, Phase::Delete, &plan.ordered_deletions()).await?;
    run_phase(api, Phase::Update, &plan.ordered_updates()).await?;
    run_phase(api, Phase::Create, &plan.ordered_creations()).await?;

    let mut report = plan.report;
    report.applied = true;
    Ok(report)
}

async fn run_phase(
    api: &dyn RemoteApi,
    phase: Phase,
    changes: &[&PlannedChange],
) -> Result<(), ReconcileError> {
    for (completed, change) in changes.iter().enumerate() {
        info!(%phase, kind = %change.kind, scope = %change.scope, identity = %change.identity, "Sending change");

        let result = match &change.operation {
            Operation::Delete { id } => api.delete(change.kind, &change.scope, *id).await,
            Operation::Update { id, payload } => {
                api.update(change.kind, &change.scope, *id, payload).await
            }
            Operation::Create { payload } => api.create(change.kind, &change.scope, payload).await,
        };

        if let Err(source) = result {
            error!(%phase, kind = %change.kind, identity = %change.identity, completed, error = %source, "Remote call failed, stopping");
            return Err(ReconcileError::RemoteCall {
                phase,
                kind: change.kind,
                identity: change.identity.clone(),
                completed,
                source,
            });
        }
    }
    Ok(())
}

/// Plan and execute one collection in one step.
///
/// # Errors
///
/// See [`Plan::build`] and [`execute`].
pub async fn reconcile<R: Resource>(
    api: &dyn RemoteApi,
    desired: &[DesiredRecord<R>],
    observed: &[ObservedRecord<R>],
    scope: &Scope,
    options: ReconcileOptions,
) -> Result<Report, ReconcileError> {
    let plan = Plan::build(desired, observed, scope)?;
    execute(plan, api, options).await
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod reconciler_tests;
