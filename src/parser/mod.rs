// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Parsers for the textual reports of the object-inspection tools, and the
//! `BinaryInfo` aggregate they populate.
//!
//! Each parser is line-oriented: it locates an anchor line in the tool
//! output and consumes subsequent lines through a per-field regular
//! expression until a terminating anchor or blank line. Lines that fail to
//! match inside an otherwise well-formed block are dropped; parsing is
//! best-effort against inherently loose, version-varying tool output.

mod archive;
mod comments;
mod compile_units;
mod dependencies;
mod disassembly;
mod dynamic;
mod program_headers;
mod sections;
mod strings;
mod symbols;

pub use archive::ArchiveMembers;
pub use comments::Comments;
pub use compile_units::{CompileUnit, CompileUnits};
pub use dependencies::{DependencyInfo, LinkedLibrary};
pub use disassembly::Disassembly;
pub use dynamic::{DynamicEntry, DynamicSection};
pub use program_headers::ElfProgramHeader;
pub use sections::{ElfSection, SectionInfo};
pub use strings::EmbeddedStrings;
pub use symbols::{call_regex, Symbol, SymbolBinding, SymbolKind, SymbolTable};

use thiserror::Error;

use crate::tool::ToolError;

/// Why a parser could not produce its result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    /// The tool reported wrong magic bytes; the file is simply not ELF.
    /// Not every binary format is, so this is skipped silently.
    #[error("not an ELF file")]
    NotElf,
    /// The tool is missing or exited non-zero for some other reason.
    #[error("{tool} failed: {message}")]
    Tool { tool: &'static str, message: String },
}

impl ParseFailure {
    /// Classify a tool invocation error. readelf's "Not an ELF file"
    /// complaint maps to the silent skip; everything else is a failure.
    #[must_use]
    pub fn from_tool_error(error: &ToolError) -> Self {
        if let ToolError::Failed { stderr, .. } = error {
            if stderr.contains("Not an ELF file") || stderr.contains("not an ELF file") {
                return Self::NotElf;
            }
        }
        Self::Tool {
            tool: match error {
                ToolError::NotFound { tool }
                | ToolError::Spawn { tool, .. }
                | ToolError::Failed { tool, .. } => tool,
            },
            message: error.summary(),
        }
    }

    /// The diagnostic code for the failing tool (`readelf-failed`, ...).
    #[must_use]
    pub fn code(&self) -> String {
        match self {
            Self::NotElf => "readelf-failed".to_string(),
            Self::Tool { tool, .. } => format!("{tool}-failed"),
        }
    }
}

/// Result type for the tool-output parsers.
pub type ParseResult<T> = std::result::Result<T, ParseFailure>;

/// Everything the checks read about one inspected file.
///
/// Created fresh per file and exclusively owned by the worker analyzing
/// that file; checks only ever borrow it immutably.
#[derive(Debug, Default, Clone)]
pub struct BinaryInfo {
    /// One section list per compilation unit; archives hold one per member.
    pub sections: SectionInfo,
    pub program_headers: Vec<ElfProgramHeader>,
    pub dynamic: DynamicSection,
    pub symbols: SymbolTable,
    pub comments: Comments,
    pub compile_units: CompileUnits,
    pub dependencies: DependencyInfo,
    /// Embedded strings, populated only when a waiver scan is required.
    pub strings: Option<EmbeddedStrings>,
    /// Call sequence, populated only when a call-proximity check needs it.
    pub disassembly: Option<Disassembly>,
    /// Set when a tool invocation failed after classification succeeded.
    pub parse_failure: Option<ParseFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ToolError;

    #[test]
    fn test_not_an_elf_is_recognized() {
        let error = ToolError::Failed {
            tool: "readelf",
            status: 1,
            stdout: String::new(),
            stderr: "readelf: Error: Not an ELF file - it has the wrong magic bytes at the start"
                .to_string(),
        };
        assert_eq!(ParseFailure::from_tool_error(&error), ParseFailure::NotElf);
    }

    #[test]
    fn test_other_failures_keep_the_tool_name() {
        let error = ToolError::NotFound { tool: "objdump" };
        let failure = ParseFailure::from_tool_error(&error);
        assert_eq!(failure.code(), "objdump-failed");
    }
}
