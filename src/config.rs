// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Rule configuration: the policy knobs of the audit, with packaging-policy
//! defaults and an optional JSON override file.

use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::diagnostic::Severity;
use crate::parser::call_regex;

/// Errors that can occur while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse config file {path}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid pattern {pattern:?} in config file")]
    BadPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// One entry of the forbidden-call table.
#[derive(Debug, Clone)]
pub struct ForbiddenCall {
    /// Diagnostic code the finding is reported under.
    pub code: String,
    pub severity: Severity,
    /// Matcher for the function symbol, version-suffix tolerant.
    pub call: Regex,
    /// A match against the binary's embedded strings suppresses the finding.
    pub waiver: Option<Regex>,
}

/// The resolved audit policy.
#[derive(Debug, Clone)]
pub struct RuleConfig {
    /// Directories the dynamic loader searches by default; runpaths
    /// resolving into these are accepted.
    pub system_lib_paths: Vec<PathBuf>,
    /// Executables matching this pattern must be built as PIE.
    pub pie_executables: Option<Regex>,
    pub forbidden_calls: Vec<ForbiddenCall>,
    /// Compiler flags every compile unit's producer must carry. Empty
    /// disables the producer inspection entirely.
    pub mandatory_optflags: Vec<String>,
    /// Archive base names that are legitimately empty.
    pub empty_archives: HashSet<String>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            system_lib_paths: ["/lib", "/usr/lib", "/usr/X11R6/lib", "/lib64", "/usr/lib64", "/usr/X11R6/lib64"]
                .iter()
                .map(PathBuf::from)
                .collect(),
            pie_executables: None,
            forbidden_calls: vec![
                ForbiddenCall {
                    code: "call-to-mktemp".to_string(),
                    severity: Severity::Error,
                    call: call_regex("mktemp").expect("valid default pattern"),
                    waiver: None,
                },
                ForbiddenCall {
                    code: "binary-or-shlib-calls-gethostbyname".to_string(),
                    severity: Severity::Warning,
                    call: call_regex("gethostbyname").expect("valid default pattern"),
                    waiver: Some(Regex::new("nss").expect("valid default pattern")),
                },
            ],
            mandatory_optflags: Vec::new(),
            empty_archives: [
                "libieee.a",
                "libmcheck.a",
                "libg.a",
                "libmvec_nonshared.a",
                "libc_nonshared.a",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
        }
    }
}

impl RuleConfig {
    /// Load overrides from a JSON file on top of the defaults.
    ///
    /// # Errors
    /// Fails when the file cannot be read or parsed, or a pattern in it
    /// does not compile.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let file: RuleConfigFile =
            serde_json::from_str(&raw).map_err(|source| ConfigError::ParseFailed {
                path: path.to_path_buf(),
                source,
            })?;
        file.resolve()
    }
}

/// Serialized form of the configuration. Absent fields keep their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleConfigFile {
    system_lib_paths: Option<Vec<PathBuf>>,
    pie_executables: Option<String>,
    forbidden_calls: Option<Vec<ForbiddenCallFile>>,
    mandatory_optflags: Option<Vec<String>>,
    empty_archives: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ForbiddenCallFile {
    code: String,
    severity: Severity,
    call: String,
    waiver: Option<String>,
}

impl RuleConfigFile {
    fn resolve(self) -> ConfigResult<RuleConfig> {
        let defaults = RuleConfig::default();
        Ok(RuleConfig {
            system_lib_paths: self.system_lib_paths.unwrap_or(defaults.system_lib_paths),
            pie_executables: self
                .pie_executables
                .map(|pattern| compile(&pattern))
                .transpose()?,
            forbidden_calls: match self.forbidden_calls {
                Some(calls) => calls
                    .into_iter()
                    .map(ForbiddenCallFile::resolve)
                    .collect::<ConfigResult<_>>()?,
                None => defaults.forbidden_calls,
            },
            mandatory_optflags: self.mandatory_optflags.unwrap_or_default(),
            empty_archives: self
                .empty_archives
                .map_or(defaults.empty_archives, |names| names.into_iter().collect()),
        })
    }
}

impl ForbiddenCallFile {
    fn resolve(self) -> ConfigResult<ForbiddenCall> {
        Ok(ForbiddenCall {
            call: call_regex(&self.call).map_err(|source| ConfigError::BadPattern {
                pattern: self.call,
                source,
            })?,
            waiver: self.waiver.map(|pattern| compile(&pattern)).transpose()?,
            code: self.code,
            severity: self.severity,
        })
    }
}

fn compile(pattern: &str) -> ConfigResult<Regex> {
    Regex::new(pattern).map_err(|source| ConfigError::BadPattern {
        pattern: pattern.to_string(),
        source,
    })
}
