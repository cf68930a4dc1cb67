// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Parses `readelf -p .comment` output, the toolchain tag strings.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use super::{ParseFailure, ParseResult};
use crate::tool::{Tool, ToolRunner};

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+\[\s*[0-9a-fA-F]+\]\s+(?P<comment>.+)").expect("valid regex"));

/// The strings of the `.comment` section, one entry per dumped string.
///
/// A file without a `.comment` section parses to the empty model; `readelf`
/// only warns on stderr in that case.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Comments {
    pub entries: Vec<String>,
}

impl Comments {
    /// Run `readelf -p .comment` on `path` and parse the dump.
    ///
    /// # Errors
    /// Returns `ParseFailure::NotElf` for non-ELF input and
    /// `ParseFailure::Tool` for any other tool failure.
    pub fn parse(tools: &dyn ToolRunner, path: &Path) -> ParseResult<Self> {
        let output = tools
            .run(Tool::Readelf, &["-p", ".comment"], path)
            .map_err(|e| ParseFailure::from_tool_error(&e))?;
        Ok(Self::parse_output(&output))
    }

    /// Parse captured `readelf -p .comment` output.
    #[must_use]
    pub fn parse_output(output: &str) -> Self {
        let entries = output
            .lines()
            .filter_map(|line| COMMENT_RE.captures(line))
            .map(|captures| captures["comment"].trim().to_string())
            .collect();
        Self { entries }
    }
}
