// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Parses `readelf -W -s` output into a symbol table model.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use super::{ParseFailure, ParseResult};
use crate::tool::{Tool, ToolRunner};

static SYMBOL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*\d+:\s+[0-9a-fA-F]+\s+\d+\s+(?P<kind>\w+)\s+(?P<bind>\w+)\s+(?P<visibility>\w+)\s+(?P<section>\S+)\s+(?P<name>\S+)",
    )
    .expect("valid regex")
});

/// Build the matcher for a library call name, tolerating a glibc version
/// suffix on the symbol (`mktemp@GLIBC_2.2.5`).
///
/// # Errors
/// Fails when `call` itself is not a valid pattern.
pub fn call_regex(call: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"({call}(?:@GLIBC\S+)?)(?:\s|$)"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Func,
    Object,
    NoType,
    Other,
}

impl SymbolKind {
    fn from_column(column: &str) -> Self {
        match column {
            "FUNC" | "IFUNC" => Self::Func,
            "OBJECT" => Self::Object,
            "NOTYPE" => Self::NoType,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolBinding {
    Local,
    Global,
    Weak,
    Other,
}

impl SymbolBinding {
    fn from_column(column: &str) -> Self {
        match column {
            "LOCAL" => Self::Local,
            "GLOBAL" => Self::Global,
            "WEAK" => Self::Weak,
            _ => Self::Other,
        }
    }
}

/// One symbol table entry. `section` is the index column as printed,
/// typically a number or `UND`/`ABS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub binding: SymbolBinding,
    pub visibility: String,
    pub section: String,
}

/// All symbols from `.symtab` and `.dynsym`, in print order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    pub symbols: Vec<Symbol>,
}

impl SymbolTable {
    /// Run `readelf -W -s` on `path` and parse the symbol tables.
    ///
    /// # Errors
    /// Returns `ParseFailure::NotElf` for non-ELF input and
    /// `ParseFailure::Tool` for any other tool failure.
    pub fn parse(tools: &dyn ToolRunner, path: &Path) -> ParseResult<Self> {
        let output = tools
            .run(Tool::Readelf, &["-W", "-s"], path)
            .map_err(|e| ParseFailure::from_tool_error(&e))?;
        Ok(Self::parse_output(&output))
    }

    /// Parse captured `readelf -W -s` output. Entries with an empty name
    /// column (the null symbol) are dropped.
    #[must_use]
    pub fn parse_output(output: &str) -> Self {
        let symbols = output
            .lines()
            .filter_map(|line| SYMBOL_RE.captures(line))
            .map(|captures| Symbol {
                name: captures["name"].to_string(),
                kind: SymbolKind::from_column(&captures["kind"]),
                binding: SymbolBinding::from_column(&captures["bind"]),
                visibility: captures["visibility"].to_string(),
                section: captures["section"].to_string(),
            })
            .collect();
        Self { symbols }
    }

    /// Names of all function symbols the matcher hits.
    #[must_use]
    pub fn functions_matching(&self, call: &Regex) -> Vec<&str> {
        self.symbols
            .iter()
            .filter(|s| s.kind == SymbolKind::Func && call.is_match(&s.name))
            .map(|s| s.name.as_str())
            .collect()
    }

    /// Whether any function symbol matches the call pattern.
    #[must_use]
    pub fn has_function_matching(&self, call: &Regex) -> bool {
        !self.functions_matching(call).is_empty()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
