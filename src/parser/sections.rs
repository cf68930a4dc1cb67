// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Parses `readelf -W -S` output into per-member section lists.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use super::{ParseFailure, ParseResult};
use crate::tool::{Tool, ToolRunner};

static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\] (?P<name>\S*)\s*\S+\s*\S*\s*\S*\s*(?P<size_hex>\w*)").expect("valid regex")
});

static PIC_SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.rela?\.(data|text)").expect("valid regex"));

/// One ELF section header: name and size in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElfSection {
    pub name: String,
    pub size: u64,
}

/// Ordered section lists, one per compilation unit.
///
/// `readelf` prints the headers of each archive member back-to-back, so the
/// parser loops over repeated `Section Headers:` anchors and accumulates one
/// list per member. Plain objects yield a single list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SectionInfo {
    pub elf_files: Vec<Vec<ElfSection>>,
}

impl SectionInfo {
    /// Run `readelf -W -S` on `path` and parse the section headers.
    ///
    /// # Errors
    /// Returns `ParseFailure::NotElf` for non-ELF input and
    /// `ParseFailure::Tool` for any other tool failure.
    pub fn parse(tools: &dyn ToolRunner, path: &Path) -> ParseResult<Self> {
        let output = tools
            .run(Tool::Readelf, &["-W", "-S"], path)
            .map_err(|e| ParseFailure::from_tool_error(&e))?;
        Ok(Self::parse_output(&output))
    }

    /// Parse captured `readelf -W -S` output.
    #[must_use]
    pub fn parse_output(output: &str) -> Self {
        let mut elf_files = Vec::new();
        let mut current: Option<Vec<ElfSection>> = None;

        for line in output.lines() {
            if line.contains("Section Headers:") {
                if let Some(sections) = current.take() {
                    elf_files.push(sections);
                }
                current = Some(Vec::new());
                continue;
            }
            if line.contains("Key to Flags:") {
                if let Some(sections) = current.take() {
                    elf_files.push(sections);
                }
                continue;
            }
            let Some(sections) = current.as_mut() else {
                continue;
            };
            let Some(captures) = SECTION_RE.captures(line) else {
                // Malformed line inside the block; drop it and go on.
                continue;
            };
            let name = captures["name"].to_string();
            let Ok(size) = u64::from_str_radix(&captures["size_hex"], 16) else {
                continue;
            };
            sections.push(ElfSection { name, size });
        }
        if let Some(sections) = current.take() {
            elf_files.push(sections);
        }

        Self { elf_files }
    }

    /// Whether any member carries a section with exactly this name.
    #[must_use]
    pub fn has_section(&self, name: &str) -> bool {
        self.iter().any(|s| s.name == name)
    }

    /// Whether any member carries a section whose name starts with `prefix`.
    #[must_use]
    pub fn has_section_with_prefix(&self, prefix: &str) -> bool {
        self.iter().any(|s| s.name.starts_with(prefix))
    }

    /// Whether any member carries a non-empty section with this prefix.
    #[must_use]
    pub fn has_non_empty_section_with_prefix(&self, prefix: &str) -> bool {
        self.iter().any(|s| s.name.starts_with(prefix) && s.size > 0)
    }

    /// Position-independent code leaves `.rela.text`/`.rela.data`
    /// relocation sections behind.
    #[must_use]
    pub fn pic(&self) -> bool {
        self.iter().any(|s| PIC_SECTION_RE.is_match(&s.name))
    }

    fn iter(&self) -> impl Iterator<Item = &ElfSection> {
        self.elf_files.iter().flatten()
    }
}
