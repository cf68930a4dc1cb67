// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Parses `objdump --dwarf=info --dwarf-depth=1` output into the
//! compile unit list, for producer (compiler flag) inspection.

use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use super::{ParseFailure, ParseResult};
use crate::tool::{Tool, ToolRunner};

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<.+><.+>: Abbrev Number.*\((?P<tag>.*)\)").expect("valid regex")
});

static ATTRIBUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+<.+>\s+(?P<attribute>DW_AT_\w+)\s*:\s(?P<value>.*)").expect("valid regex")
});

/// The attributes of one `DW_TAG_compile_unit` debug info entry.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CompileUnit {
    pub attributes: BTreeMap<String, String>,
}

impl CompileUnit {
    #[must_use]
    pub fn producer(&self) -> Option<&str> {
        self.attributes.get("DW_AT_producer").map(String::as_str)
    }

    /// The whitespace-separated tokens of the producer string, with the
    /// indirect-string prefix up to the last colon stripped.
    #[must_use]
    pub fn producer_tokens(&self) -> Vec<&str> {
        let Some(producer) = self.producer() else {
            return Vec::new();
        };
        producer
            .rsplit_once(':')
            .map_or(producer, |(_, tail)| tail)
            .split_whitespace()
            .collect()
    }
}

/// All compile units of the debug info, in dump order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CompileUnits {
    pub units: Vec<CompileUnit>,
}

impl CompileUnits {
    /// Run `objdump --dwarf=info --dwarf-depth=1` on `path` and parse
    /// the compile units.
    ///
    /// # Errors
    /// Returns `ParseFailure::Tool` when the tool fails.
    pub fn parse(tools: &dyn ToolRunner, path: &Path) -> ParseResult<Self> {
        let output = tools
            .run(Tool::Objdump, &["--dwarf=info", "--dwarf-depth=1"], path)
            .map_err(|e| ParseFailure::from_tool_error(&e))?;
        Ok(Self::parse_output(&output))
    }

    /// Parse captured objdump dwarf output. Attribute lines are collected
    /// into the most recent `DW_TAG_compile_unit` entry; any other tag
    /// closes it.
    #[must_use]
    pub fn parse_output(output: &str) -> Self {
        let mut units = Vec::new();
        let mut current: Option<CompileUnit> = None;
        for line in output.lines() {
            if let Some(captures) = TAG_RE.captures(line) {
                if let Some(unit) = current.take() {
                    units.push(unit);
                }
                if &captures["tag"] == "DW_TAG_compile_unit" {
                    current = Some(CompileUnit::default());
                }
                continue;
            }
            if let Some(unit) = current.as_mut() {
                if let Some(captures) = ATTRIBUTE_RE.captures(line) {
                    unit.attributes.insert(
                        captures["attribute"].to_string(),
                        captures["value"].trim().to_string(),
                    );
                }
            }
        }
        if let Some(unit) = current.take() {
            units.push(unit);
        }
        Self { units }
    }
}
