// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Configuration files.
//!
//! The main file names, per kind, the resource files holding the desired state:
//!
//! ```yaml
//! sonar:
//!   http_checks: [checks/http/*.yaml]
//!   tcp_checks: [checks/tcp.yaml]
//! geoproximities: [geo/*.yaml]
//! dns:
//!   example.com: [dns/example.com/*.yaml]
//! ```
//!
//! Patterns are globs relative to the directory of the main file. Each resource
//! file holds a YAML sequence of records.

use crate::errors::{ConfigError, DecodeError};
use crate::references::ReferenceResolver;
use crate::resource::Resource;
use crate::tracker::DesiredRecord;
use serde::Deserialize;
use serde_yaml::Value as YamlValue;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Contents of the main configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    pub sonar: SonarFiles,
    pub geoproximities: Vec<String>,
    /// Domain name -> record file patterns
    pub dns: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SonarFiles {
    pub http_checks: Vec<String>,
    pub tcp_checks: Vec<String>,
}

/// Raw records of every resource file, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDocuments {
    pub http_checks: Vec<YamlValue>,
    pub tcp_checks: Vec<YamlValue>,
    pub geoproximities: Vec<YamlValue>,
    /// Domain name -> raw records
    pub dns: BTreeMap<String, Vec<YamlValue>>,
}

impl RawDocuments {
    /// Total number of raw records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.http_checks.len()
            + self.tcp_checks.len()
            + self.geoproximities.len()
            + self.dns.values().map(Vec::len).sum::<usize>()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse the main configuration file.
///
/// An empty file is an empty configuration.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file cannot be read or parsed.
pub fn read_config(path: &Path) -> Result<SyncConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if text.trim().is_empty() {
        return Ok(SyncConfig::default());
    }

    let config: Option<SyncConfig> =
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(config.unwrap_or_default())
}

/// Parse the main configuration file and read every resource file it names.
///
/// # Errors
///
/// Returns [`ConfigError`] when a file cannot be read or parsed, a pattern is
/// invalid or matches nothing, or a resource file is not a sequence.
pub fn load_configuration(path: &Path) -> Result<(SyncConfig, RawDocuments), ConfigError> {
    let config = read_config(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));

    let mut documents = RawDocuments {
        http_checks: read_documents(base, &config.sonar.http_checks)?,
        tcp_checks: read_documents(base, &config.sonar.tcp_checks)?,
        geoproximities: read_documents(base, &config.geoproximities)?,
        dns: BTreeMap::new(),
    };
    for (domain, patterns) in &config.dns {
        documents
            .dns
            .insert(domain.clone(), read_documents(base, patterns)?);
    }

    debug!(path = %path.display(), records = documents.len(), "Loaded configuration");
    Ok((config, documents))
}

/// Read the records of every file matched by `patterns`, in pattern order.
fn read_documents(base: &Path, patterns: &[String]) -> Result<Vec<YamlValue>, ConfigError> {
    let mut documents = Vec::new();
    for pattern in patterns {
        for file in expand_pattern(base, pattern)? {
            documents.extend(read_sequence(&file)?);
        }
    }
    Ok(documents)
}

/// Files matched by `pattern` relative to `base`, sorted.
///
/// # Errors
///
/// Returns [`ConfigError::NoMatch`] when nothing matches.
pub fn expand_pattern(base: &Path, pattern: &str) -> Result<Vec<PathBuf>, ConfigError> {
    let full = if Path::new(pattern).is_absolute() || base.as_os_str().is_empty() {
        pattern.to_string()
    } else {
        format!(
            "{}/{pattern}",
            glob::Pattern::escape(&base.to_string_lossy())
        )
    };

    let mut files = glob::glob(&full)
        .map_err(|source| ConfigError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| ConfigError::Expand {
            pattern: pattern.to_string(),
            source,
        })?;

    if files.is_empty() {
        return Err(ConfigError::NoMatch {
            pattern: pattern.to_string(),
        });
    }
    files.sort();
    Ok(files)
}

/// Records of one resource file. An empty file holds no records.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file cannot be read or parsed or is not a
/// sequence.
pub fn read_sequence(path: &Path) -> Result<Vec<YamlValue>, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: YamlValue = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        YamlValue::Null => Ok(Vec::new()),
        YamlValue::Sequence(items) => Ok(items),
        other => Err(ConfigError::NotASequence {
            path: path.to_path_buf(),
            found: yaml_type_name(&other),
        }),
    }
}

/// Decode and validate raw records of one kind.
///
/// # Errors
///
/// Returns the first [`DecodeError`], including missing mandatory fields.
pub fn desired_records<R: Resource>(
    documents: &[YamlValue],
    resolver: &mut ReferenceResolver<'_>,
) -> Result<Vec<DesiredRecord<R>>, DecodeError> {
    documents
        .iter()
        .map(|raw| {
            let record = DesiredRecord::from_yaml(raw, resolver)?;
            record.validate()?;
            Ok(record)
        })
        .collect()
}

fn yaml_type_name(value: &YamlValue) -> &'static str {
    match value {
        YamlValue::Null => "null",
        YamlValue::Bool(_) => "a boolean",
        YamlValue::Number(_) => "a number",
        YamlValue::String(_) => "a string",
        YamlValue::Sequence(_) => "a sequence",
        YamlValue::Mapping(_) => "a mapping",
        YamlValue::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
