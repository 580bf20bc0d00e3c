// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Field-level comparison of a desired record against its observed counterpart.
//!
//! Only fields written in configuration are compared. Values are compared as
//! JSON, so sequences are equal only when their elements are equal and in the
//! same order.

use crate::errors::ImmutableFieldConflict;
use crate::resource::{render_value, Resource};
use crate::tracker::{DesiredRecord, ObservedRecord};
use std::fmt;
use tracing::trace;

/// Classification of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    NoChange,
    Create,
    Update,
    Delete,
    /// An immutable field differs; the run is aborted
    Conflict,
}

impl Action {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoChange => "ok",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Conflict => "conflict",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One differing field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDiff {
    /// Internal field identifier
    pub field: &'static str,
    /// Observed value as text, empty for creations
    pub old_value: String,
    /// Desired value as text
    pub new_value: String,
}

impl fmt::Display for FieldDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.field, self.old_value, self.new_value)
    }
}

/// Outcome of [`compare`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub action: Action,
    pub diffs: Vec<FieldDiff>,
}

/// Compare a desired record against its match, if any.
///
/// Without a match the record is a creation and every defined field is listed.
/// Otherwise each defined field is compared in field-table order; differences
/// raise the action to [`Action::Update`].
///
/// # Errors
///
/// Returns [`ImmutableFieldConflict`] at the first differing immutable field.
/// Fields after it are not compared.
pub fn compare<R: Resource>(
    desired: &DesiredRecord<R>,
    observed: Option<&ObservedRecord<R>>,
) -> Result<Comparison, ImmutableFieldConflict> {
    let Some(observed) = observed else {
        let diffs = desired
            .defined_fields()
            .map(|spec| FieldDiff {
                field: spec.id,
                old_value: String::new(),
                new_value: render_value(&spec.value(desired.resource())),
            })
            .collect();
        return Ok(Comparison {
            action: Action::Create,
            diffs,
        });
    };

    let mut comparison = Comparison {
        action: Action::NoChange,
        diffs: Vec::new(),
    };

    for spec in desired.defined_fields() {
        let wanted = spec.value(desired.resource());
        let current = spec.value(observed.resource());
        if wanted == current {
            continue;
        }

        let old_value = render_value(&current);
        let new_value = render_value(&wanted);

        if spec.is_immutable() {
            return Err(ImmutableFieldConflict {
                field: spec.id,
                observed: old_value,
                desired: new_value,
            });
        }

        trace!(
            identity = %desired.identity(),
            field = spec.id,
            old = %old_value,
            new = %new_value,
            "Field differs"
        );
        comparison.diffs.push(FieldDiff {
            field: spec.id,
            old_value,
            new_value,
        });
        comparison.action = Action::Update;
    }

    Ok(comparison)
}

#[cfg(test)]
#[path = "diff_tests.rs"]
mod diff_tests;
