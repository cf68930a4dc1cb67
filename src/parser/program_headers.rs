// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Parses `readelf -W -l` output into program header entries.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use super::{ParseFailure, ParseResult};
use crate::tool::{Tool, ToolRunner};

static PROGRAM_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+(?P<name>\w+)(\s+\w+){5}\s+(?P<flags>[RWE ]{3})").expect("valid regex")
});

/// One program header: segment type name and its R/W/E flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElfProgramHeader {
    pub name: String,
    pub flags: String,
}

impl ElfProgramHeader {
    #[must_use]
    pub fn has_flag(&self, flag: char) -> bool {
        self.flags.contains(flag)
    }

    /// Run `readelf -W -l` on `path` and parse the program headers.
    ///
    /// # Errors
    /// Returns `ParseFailure::NotElf` for non-ELF input and
    /// `ParseFailure::Tool` for any other tool failure.
    pub fn parse(tools: &dyn ToolRunner, path: &Path) -> ParseResult<Vec<Self>> {
        let output = tools
            .run(Tool::Readelf, &["-W", "-l"], path)
            .map_err(|e| ParseFailure::from_tool_error(&e))?;
        Ok(Self::parse_output(&output))
    }

    /// Parse captured `readelf -W -l` output.
    #[must_use]
    pub fn parse_output(output: &str) -> Vec<Self> {
        let mut headers = Vec::new();
        let mut in_block = false;
        for line in output.lines() {
            if line.contains("Program Headers:") {
                in_block = true;
                continue;
            }
            if !in_block {
                continue;
            }
            if line.trim().is_empty() {
                break;
            }
            let Some(captures) = PROGRAM_HEADER_RE.captures(line) else {
                continue;
            };
            headers.push(Self {
                name: captures["name"].to_string(),
                flags: captures["flags"].trim_end().to_string(),
            });
        }
        headers
    }
}
