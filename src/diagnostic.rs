// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Diagnostic values emitted by the rule engine and the sink they flow to.
//!
//! The engine never buffers, filters, scores or formats diagnostics; that is
//! entirely the sink's responsibility.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "E"),
            Self::Warning => write!(f, "W"),
        }
    }
}

/// One finding against one file. Write-once; never mutated after emission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub target: PathBuf,
    pub details: Vec<String>,
}

impl Diagnostic {
    #[must_use]
    pub fn new(
        severity: Severity,
        code: impl Into<String>,
        target: impl Into<PathBuf>,
        details: Vec<String>,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            target: target.into(),
            details,
        }
    }

    #[must_use]
    pub fn error(code: impl Into<String>, target: impl Into<PathBuf>, details: Vec<String>) -> Self {
        Self::new(Severity::Error, code, target, details)
    }

    #[must_use]
    pub fn warning(
        code: impl Into<String>,
        target: impl Into<PathBuf>,
        details: Vec<String>,
    ) -> Self {
        Self::new(Severity::Warning, code, target, details)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.target.display(), self.code)?;
        for detail in &self.details {
            write!(f, " {detail}")?;
        }
        Ok(())
    }
}

/// Receives diagnostics as they are produced.
///
/// Implementations must be callable from several worker threads at once;
/// files are analyzed in parallel and each file's checks may also run in
/// parallel.
pub trait DiagnosticSink: Sync {
    fn add_info(&self, diagnostic: Diagnostic);
}

/// Sink that accumulates diagnostics in memory for reporting afterwards.
#[derive(Default)]
pub struct CollectingSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the sink, returning diagnostics ordered by target then code.
    ///
    /// # Panics
    /// Panics if a worker thread panicked while holding the lock.
    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        let mut diagnostics = self
            .diagnostics
            .into_inner()
            .expect("diagnostic sink lock poisoned");
        diagnostics.sort_by(|a, b| (&a.target, &a.code).cmp(&(&b.target, &b.code)));
        diagnostics
    }

    /// Whether any diagnostic was recorded for `code` against `target`.
    #[must_use]
    pub fn contains(&self, code: &str, target: &Path) -> bool {
        self.diagnostics
            .lock()
            .expect("diagnostic sink lock poisoned")
            .iter()
            .any(|d| d.code == code && d.target == target)
    }
}

impl DiagnosticSink for CollectingSink {
    fn add_info(&self, diagnostic: Diagnostic) {
        self.diagnostics
            .lock()
            .expect("diagnostic sink lock poisoned")
            .push(diagnostic);
    }
}
