// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Terminal tables for reconciliation reports, domains and check statuses.

use crate::diff::Action;
use crate::dns::DnsDomain;
use crate::reconciler::{Report, ReportRow};
use crate::resource::Scope;
use crate::sonar::RuntimeStatus;
use crate::status::CheckStatus;
use colored::Colorize;
use tabled::builder::Builder;
use tabled::settings::Style;

/// Render the classification of every record.
///
/// Columns are Kind, Action, Resource and Details. With `color` set, actions
/// are colored by severity.
#[must_use]
pub fn render_report(report: &Report, color: bool) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Kind", "Action", "Resource", "Details"]);
    for row in report.rows() {
        builder.push_record([
            row.kind.to_string(),
            paint_action(row.action, color),
            resource_label(row),
            row.details.join("\n"),
        ]);
    }
    builder.build().with(Style::rounded()).to_string()
}

fn resource_label(row: &ReportRow) -> String {
    match &row.scope {
        Scope::Account => row.identity.clone(),
        Scope::Domain { name, .. } => format!("{name}: {}", row.identity),
    }
}

fn paint_action(action: Action, color: bool) -> String {
    let label = action.as_str();
    if !color {
        return label.to_string();
    }
    match action {
        Action::Delete => label.red().to_string(),
        Action::Update => label.yellow().to_string(),
        Action::Create => label.green().to_string(),
        Action::Conflict => label.red().bold().to_string(),
        Action::NoChange => label.to_string(),
    }
}

/// Render the domains of the account.
#[must_use]
pub fn render_domains(domains: &[DnsDomain]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["ID", "Name", "Status", "Nameservers", "Note"]);
    for domain in domains {
        builder.push_record([
            domain.id.to_string(),
            domain.name.clone(),
            domain.status.clone(),
            domain.nameservers.join("\n"),
            domain.note.clone(),
        ]);
    }
    builder.build().with(Style::rounded()).to_string()
}

/// Render runtime statuses of health checks.
#[must_use]
pub fn render_statuses(statuses: &[CheckStatus], color: bool) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Kind", "ID", "Name", "Status"]);
    for status in statuses {
        let rendered = match &status.status {
            Ok(runtime) => paint_status(*runtime, color),
            Err(reason) => format!("error: {reason}"),
        };
        builder.push_record([
            status.kind.to_string(),
            status.id.to_string(),
            status.name.clone(),
            rendered,
        ]);
    }
    builder.build().with(Style::rounded()).to_string()
}

fn paint_status(status: RuntimeStatus, color: bool) -> String {
    let label = status.to_string();
    if !color {
        return label;
    }
    match status {
        RuntimeStatus::Up => label.green().to_string(),
        RuntimeStatus::Down => label.red().to_string(),
        RuntimeStatus::Unknown => label.yellow().to_string(),
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod report_tests;
