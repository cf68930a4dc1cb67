// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Captures `strings` output for waiver scans.

use regex::Regex;
use std::path::Path;

use super::{ParseFailure, ParseResult};
use crate::tool::{Tool, ToolRunner};

/// The printable strings embedded in a binary, one per line of output.
///
/// Only extracted on demand: a waivered call finding needs the haystack,
/// nothing else does.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EmbeddedStrings {
    pub strings: Vec<String>,
}

impl EmbeddedStrings {
    /// Run `strings` on `path` and capture the output.
    ///
    /// # Errors
    /// Returns `ParseFailure::Tool` when the tool fails.
    pub fn parse(tools: &dyn ToolRunner, path: &Path) -> ParseResult<Self> {
        let output = tools
            .run(Tool::Strings, &[], path)
            .map_err(|e| ParseFailure::from_tool_error(&e))?;
        Ok(Self::parse_output(&output))
    }

    #[must_use]
    pub fn parse_output(output: &str) -> Self {
        Self {
            strings: output.lines().map(String::from).collect(),
        }
    }

    /// Whether any embedded string matches the waiver pattern.
    #[must_use]
    pub fn any_match(&self, pattern: &Regex) -> bool {
        self.strings.iter().any(|s| pattern.is_match(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waiver_scan() {
        let strings =
            EmbeddedStrings::parse_output("/etc/nsswitch.conf\nlibnss_files.so.2\nusage: demo\n");
        let nss = Regex::new("nss").unwrap();
        let curses = Regex::new("curses").unwrap();
        assert!(strings.any_match(&nss));
        assert!(!strings.any_match(&curses));
    }

    #[test]
    fn test_empty_output() {
        assert!(EmbeddedStrings::parse_output("").strings.is_empty());
    }
}
