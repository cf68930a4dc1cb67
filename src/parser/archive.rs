// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Parses `ar t` output, the member list of a static archive.

use std::path::Path;

use super::{ParseFailure, ParseResult};
use crate::tool::{Tool, ToolRunner};

/// Member names that mark an archive as produced by another language's
/// toolchain. Such archives are not ELF object collections and none of
/// the object-level rules apply to them.
const FOREIGN_MEMBERS: &[&str] = &["__.PKGDEF", "_go_.o", "lib.rmeta"];

/// The member names of a static archive, in storage order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArchiveMembers {
    pub members: Vec<String>,
}

impl ArchiveMembers {
    /// Run `ar t` on `path` and collect the member names.
    ///
    /// # Errors
    /// Returns `ParseFailure::Tool` when `ar` fails, typically on a
    /// truncated or corrupt archive.
    pub fn parse(tools: &dyn ToolRunner, path: &Path) -> ParseResult<Self> {
        let output = tools
            .run(Tool::Ar, &["t"], path)
            .map_err(|e| ParseFailure::from_tool_error(&e))?;
        Ok(Self::parse_output(&output))
    }

    /// Parse captured `ar t` output, one member name per line.
    #[must_use]
    pub fn parse_output(output: &str) -> Self {
        Self {
            members: output
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect(),
        }
    }

    /// Whether the archive comes from a Go or Rust toolchain.
    #[must_use]
    pub fn is_foreign(&self) -> bool {
        self.members
            .iter()
            .any(|member| FOREIGN_MEMBERS.iter().any(|marker| member.ends_with(marker)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_members_in_storage_order() {
        let archive = ArchiveMembers::parse_output("first.o\nsecond.o\nthird.o\n");
        assert_eq!(archive.members, vec!["first.o", "second.o", "third.o"]);
        assert!(!archive.is_foreign());
    }

    #[test]
    fn test_go_archive_is_foreign() {
        assert!(ArchiveMembers::parse_output("__.PKGDEF\n_go_.o\n").is_foreign());
    }

    #[test]
    fn test_rust_rlib_is_foreign() {
        let archive = ArchiveMembers::parse_output("demo.demo.f3a1c2.rcgu.o\nlib.rmeta\n");
        assert!(archive.is_foreign());
    }

    #[test]
    fn test_empty_archive() {
        assert!(ArchiveMembers::parse_output("").members.is_empty());
    }
}
