// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Formats audit results: console summary and JSON report file.

use comfy_table::{Cell, Table};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::diagnostic::{Diagnostic, Severity};
use crate::package::PackageMeta;

/// Errors that can occur when writing a report file.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file {path}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to serialize report")]
    SerializeFailed {
        #[source]
        source: serde_json::Error,
    },
}

/// The full outcome of one package audit.
#[derive(Debug, Serialize)]
pub struct Report {
    pub package: String,
    pub arch: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    #[must_use]
    pub fn new(meta: &PackageMeta, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            package: meta.name.clone(),
            arch: meta.arch.clone(),
            diagnostics,
        }
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Write the full diagnostic list as pretty-printed JSON.
    ///
    /// # Errors
    /// Fails when serialization or the file write fails.
    pub fn write_json(&self, path: &Path) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|source| ReportError::SerializeFailed { source })?;
        fs::write(path, json).map_err(|source| ReportError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Summarize the report to the console: one table row per diagnostic code,
/// then the individual findings.
pub fn summarize_report(report: &Report) {
    println!("Package: {} ({})", report.package, report.arch);
    println!("Findings: {}\n", report.diagnostics.len());

    if report.diagnostics.is_empty() {
        return;
    }
    println!("{}\n", summary_table(report));
    for diagnostic in &report.diagnostics {
        println!("{diagnostic}");
    }
    println!(
        "\nTotal: {} error(s), {} warning(s)",
        report.error_count(),
        report.warning_count()
    );
}

/// Create a table with the default preset styling.
fn default_table_preset() -> Table {
    let mut table = Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_FULL_CONDENSED)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic);
    table
}

fn summary_table(report: &Report) -> Table {
    let mut by_code: BTreeMap<(&str, Severity), usize> = BTreeMap::new();
    for diagnostic in &report.diagnostics {
        *by_code
            .entry((diagnostic.code.as_str(), diagnostic.severity))
            .or_default() += 1;
    }

    let mut table = default_table_preset();
    table.set_header(vec![
        Cell::new("Code").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Severity").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Count").add_attribute(comfy_table::Attribute::Bold),
    ]);
    for ((code, severity), count) in by_code {
        table.add_row(vec![
            Cell::new(code),
            Cell::new(severity),
            Cell::new(count),
        ]);
    }
    table
}
