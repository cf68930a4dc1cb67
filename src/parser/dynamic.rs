// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Parses `readelf -W -d` output into the dynamic section model.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use super::{ParseFailure, ParseResult};
use crate::tool::{Tool, ToolRunner};

static ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+\w*\s+\((?P<key>[^)]+)\)\s+(?P<value>.*)").expect("valid regex")
});

static SONAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Library soname: \[(?P<soname>[^\]]+)\]").expect("valid regex"));

static NEEDED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Shared library: \[(?P<library>[^\]]+)\]").expect("valid regex"));

static RUNPATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Library runpath: \[(?P<path>[^\]]+)\]").expect("valid regex"));

static RPATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Library rpath: \[(?P<path>[^\]]+)\]").expect("valid regex"));

/// One raw dynamic section entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicEntry {
    pub key: String,
    pub value: String,
}

/// The dynamic section with its derived fields.
///
/// `runpaths` collects both `RPATH` and `RUNPATH` entries (each may hold a
/// colon-separated list) in the order they appear.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DynamicSection {
    pub entries: Vec<DynamicEntry>,
    pub soname: Option<String>,
    pub needed: Vec<String>,
    pub runpaths: Vec<String>,
}

impl DynamicSection {
    /// Run `readelf -W -d` on `path` and parse the dynamic section.
    ///
    /// A file without a dynamic section (static binaries, objects) parses
    /// to the empty model; `readelf` reports that case with exit code 0.
    ///
    /// # Errors
    /// Returns `ParseFailure::NotElf` for non-ELF input and
    /// `ParseFailure::Tool` for any other tool failure.
    pub fn parse(tools: &dyn ToolRunner, path: &Path) -> ParseResult<Self> {
        let output = tools
            .run(Tool::Readelf, &["-W", "-d"], path)
            .map_err(|e| ParseFailure::from_tool_error(&e))?;
        Ok(Self::parse_output(&output))
    }

    /// Parse captured `readelf -W -d` output.
    #[must_use]
    pub fn parse_output(output: &str) -> Self {
        let mut section = Self::default();
        let mut in_block = false;
        for line in output.lines() {
            if line.contains("Dynamic section at offset") {
                in_block = true;
                continue;
            }
            if !in_block {
                continue;
            }
            if line.trim().is_empty() {
                break;
            }
            let Some(captures) = ENTRY_RE.captures(line) else {
                continue;
            };
            let key = captures["key"].to_string();
            let value = captures["value"].trim().to_string();

            match key.as_str() {
                "SONAME" => {
                    if let Some(c) = SONAME_RE.captures(&value) {
                        section.soname = Some(c["soname"].to_string());
                    }
                }
                "NEEDED" => {
                    if let Some(c) = NEEDED_RE.captures(&value) {
                        section.needed.push(c["library"].to_string());
                    }
                }
                "RUNPATH" => {
                    if let Some(c) = RUNPATH_RE.captures(&value) {
                        section.push_runpaths(&c["path"]);
                    }
                }
                "RPATH" => {
                    if let Some(c) = RPATH_RE.captures(&value) {
                        section.push_runpaths(&c["path"]);
                    }
                }
                _ => {}
            }
            section.entries.push(DynamicEntry { key, value });
        }
        section
    }

    fn push_runpaths(&mut self, paths: &str) {
        self.runpaths
            .extend(paths.split(':').filter(|p| !p.is_empty()).map(String::from));
    }

    /// Boolean tag lookup, e.g. `has_tag("TEXTREL")`.
    #[must_use]
    pub fn has_tag(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUT: &str = "\
Dynamic section at offset 0x2dc8 contains 24 entries:
  Tag        Type                         Name/Value
 0x0000000000000001 (NEEDED)             Shared library: [libc.so.6]
 0x000000000000000e (SONAME)             Library soname: [libutil.so.1]
 0x000000000000001d (RUNPATH)            Library runpath: [$ORIGIN/../lib:/opt/util/lib]
 0x000000000000000c (INIT)               0x1000
 0x0000000000000019 (INIT_ARRAY)         0x3db8
 0x0000000000000000 (NULL)               0x0
";

    #[test]
    fn test_round_trip_needed_and_soname() {
        let dynamic = DynamicSection::parse_output(OUTPUT);
        assert_eq!(dynamic.needed, vec!["libc.so.6".to_string()]);
        assert_eq!(dynamic.soname.as_deref(), Some("libutil.so.1"));
    }

    #[test]
    fn test_runpath_entries_are_split() {
        let dynamic = DynamicSection::parse_output(OUTPUT);
        assert_eq!(
            dynamic.runpaths,
            vec!["$ORIGIN/../lib".to_string(), "/opt/util/lib".to_string()]
        );
    }

    #[test]
    fn test_rpath_is_collected_like_runpath() {
        let output = "\
Dynamic section at offset 0x1f50 contains 2 entries:
  Tag        Type                         Name/Value
 0x000000000000000f (RPATH)              Library rpath: [/usr/local/lib]
 0x0000000000000000 (NULL)               0x0
";
        let dynamic = DynamicSection::parse_output(output);
        assert_eq!(dynamic.runpaths, vec!["/usr/local/lib".to_string()]);
    }

    #[test]
    fn test_tag_lookup() {
        let output = "\
Dynamic section at offset 0x1f50 contains 2 entries:
  Tag        Type                         Name/Value
 0x0000000000000016 (TEXTREL)            0x0
 0x0000000000000000 (NULL)               0x0
";
        let dynamic = DynamicSection::parse_output(output);
        assert!(dynamic.has_tag("TEXTREL"));
        assert!(!dynamic.has_tag("SONAME"));
    }

    #[test]
    fn test_no_dynamic_section() {
        let dynamic = DynamicSection::parse_output("There is no dynamic section in this file.\n");
        assert!(dynamic.entries.is_empty());
        assert!(dynamic.needed.is_empty());
        assert!(dynamic.soname.is_none());
    }

    #[test]
    fn test_raw_entries_preserved_in_order() {
        let dynamic = DynamicSection::parse_output(OUTPUT);
        assert_eq!(dynamic.entries[0].key, "NEEDED");
        assert_eq!(dynamic.entries[1].key, "SONAME");
        assert_eq!(dynamic.entries.len(), 6);
    }
}
