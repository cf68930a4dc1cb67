// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Parses `ldd -r` / `ldd -u -r` output: runtime resolution, undefined
//! symbols and unused direct dependencies.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use super::{ParseFailure, ParseResult};
use crate::tool::{Tool, ToolError, ToolRunner};

static DEPENDENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+(?P<name>\S+)( => (?P<path>\S+))? \(0x[0-9a-fA-F]+\)").expect("valid regex")
});

static UNDEFINED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^undefined symbol:\s+(?P<symbol>\S+)").expect("valid regex"));

/// One resolved (or unresolved) runtime dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedLibrary {
    pub name: String,
    /// Resolution target, absent for the vdso and for unresolved names.
    pub path: Option<String>,
}

/// What the dynamic loader reports about a binary.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DependencyInfo {
    pub libraries: Vec<LinkedLibrary>,
    /// Undefined non-weak symbols, demangled where possible.
    pub undefined_symbols: Vec<String>,
    /// `NEEDED` entries no symbol is actually imported from.
    pub unused_dependencies: Vec<String>,
}

impl DependencyInfo {
    /// Run `ldd -r` and `ldd -u -r` on `path` and combine the results.
    ///
    /// `ldd -u` exits non-zero exactly when unused dependencies exist and
    /// reports them on stdout, so that invocation's failure is data, not
    /// an error.
    ///
    /// # Errors
    /// Returns `ParseFailure::Tool` when `ldd -r` fails or when `ldd`
    /// itself cannot be spawned.
    pub fn parse(tools: &dyn ToolRunner, path: &Path) -> ParseResult<Self> {
        let resolution = tools
            .run(Tool::Ldd, &["-r"], path)
            .map_err(|e| ParseFailure::from_tool_error(&e))?;
        let mut info = Self::parse_resolution_output(&resolution);
        let demangled = info
            .undefined_symbols
            .iter()
            .map(|symbol| demangle(tools, symbol))
            .collect();
        info.undefined_symbols = demangled;

        match tools.run(Tool::Ldd, &["-u", "-r"], path) {
            Ok(_) => {}
            Err(ToolError::Failed { stdout, .. }) => {
                info.unused_dependencies = Self::parse_unused_output(&stdout);
            }
            Err(error) => return Err(ParseFailure::from_tool_error(&error)),
        }
        Ok(info)
    }

    /// Parse captured `ldd -r` output.
    #[must_use]
    pub fn parse_resolution_output(output: &str) -> Self {
        let mut info = Self::default();
        for line in output.lines() {
            if let Some(captures) = UNDEFINED_RE.captures(line) {
                info.undefined_symbols.push(captures["symbol"].to_string());
                continue;
            }
            if let Some(captures) = DEPENDENCY_RE.captures(line) {
                info.libraries.push(LinkedLibrary {
                    name: captures["name"].to_string(),
                    path: captures.name("path").map(|m| m.as_str().to_string()),
                });
            }
        }
        info
    }

    /// Parse captured `ldd -u -r` stdout, the unused dependency list.
    #[must_use]
    pub fn parse_unused_output(output: &str) -> Vec<String> {
        let mut unused = Vec::new();
        let mut in_block = false;
        for line in output.lines() {
            if line.starts_with("Unused direct dependencies:") {
                in_block = true;
                continue;
            }
            if !in_block {
                continue;
            }
            let entry = line.trim();
            if entry.is_empty() {
                break;
            }
            unused.push(entry.to_string());
        }
        unused
    }
}

/// Demangle one symbol name, best effort. The mangled name survives when
/// `c++filt` is unavailable or rejects it.
fn demangle(tools: &dyn ToolRunner, symbol: &str) -> String {
    match tools.run(Tool::CxxFilt, &[], Path::new(symbol)) {
        Ok(output) => {
            let demangled = output.lines().next().unwrap_or_default().trim();
            if demangled.is_empty() {
                symbol.to_string()
            } else {
                demangled.to_string()
            }
        }
        Err(_) => symbol.to_string(),
    }
}
