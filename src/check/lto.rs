// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Object-code hygiene: static archive contents, stray LTO bytecode and
//! non-PIC code in shared libraries.

use super::{BinaryCheck, CheckContext};
use crate::diagnostic::Diagnostic;

pub struct ArchiveHygieneCheck;

impl BinaryCheck for ArchiveHygieneCheck {
    fn name(&self) -> &'static str {
        "archive-hygiene"
    }

    fn run(&self, ctx: &CheckContext) -> Vec<Diagnostic> {
        if !ctx.kind.is_archive {
            // GCC LTO bytecode is compiler-version specific and must never
            // ship outside static archives.
            if ctx.kind.is_elf && ctx.info.sections.has_section_with_prefix(".gnu.lto") {
                return vec![Diagnostic::error("lto-bytecode", ctx.path, vec![])];
            }
            return Vec::new();
        }

        let base = ctx
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if ctx.config.empty_archives.contains(&base) {
            return Vec::new();
        }

        let sections = &ctx.info.sections;
        let mut diagnostics = Vec::new();
        if !sections.has_non_empty_section_with_prefix(".text")
            && !sections.has_non_empty_section_with_prefix(".data")
            && !sections.has_non_empty_section_with_prefix(".gnu.lto")
        {
            diagnostics.push(Diagnostic::error("lto-no-text-in-archive", ctx.path, vec![]));
        }
        if !sections.has_section(".symtab") {
            diagnostics.push(Diagnostic::error(
                "static-library-without-symtab",
                ctx.path,
                vec![],
            ));
        }
        if !sections.has_section_with_prefix(".debug_") {
            diagnostics.push(Diagnostic::error(
                "static-library-without-debuginfo",
                ctx.path,
                vec![],
            ));
        }
        if sections.has_section("__patchable_function_entries") {
            diagnostics.push(Diagnostic::error(
                "patchable-function-entry-in-archive",
                ctx.path,
                vec![],
            ));
        }
        diagnostics
    }
}

pub struct NonPicCheck;

impl BinaryCheck for NonPicCheck {
    fn name(&self) -> &'static str {
        "non-pic"
    }

    fn run(&self, ctx: &CheckContext) -> Vec<Diagnostic> {
        // Text relocations without any relocation section for the object
        // code mean members compiled without -fPIC were linked in.
        if ctx.is_shared_lib()
            && ctx.info.dynamic.has_tag("TEXTREL")
            && !ctx.info.sections.pic()
        {
            return vec![Diagnostic::error("shlib-with-non-pic-code", ctx.path, vec![])];
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{codes, Fixture};
    use super::*;
    use crate::parser::SectionInfo;

    fn sections(listing: &[(&str, u64)]) -> SectionInfo {
        let body: String = listing
            .iter()
            .enumerate()
            .map(|(i, (name, size))| {
                format!(
                    "  [{:2}] {:17} PROGBITS        0000000000000000 000040 {:06x} 00      0   0  1\n",
                    i, name, size
                )
            })
            .collect();
        SectionInfo::parse_output(&format!("Section Headers:\n{body}Key to Flags:\n"))
    }

    #[test]
    fn test_healthy_archive() {
        let mut fixture = Fixture::archive("/usr/lib64/libdemo.a");
        fixture.info.sections =
            sections(&[(".text", 0x40), (".symtab", 0x80), (".debug_info", 0x20)]);
        assert!(ArchiveHygieneCheck.run(&fixture.context()).is_empty());
    }

    #[test]
    fn test_degenerate_archive_accumulates_findings() {
        let mut fixture = Fixture::archive("/usr/lib64/libdemo.a");
        fixture.info.sections = sections(&[(".note", 0x10)]);
        assert_eq!(
            codes(&ArchiveHygieneCheck.run(&fixture.context())),
            vec![
                "lto-no-text-in-archive",
                "static-library-without-symtab",
                "static-library-without-debuginfo",
            ]
        );
    }

    #[test]
    fn test_empty_text_does_not_count() {
        let mut fixture = Fixture::archive("/usr/lib64/libdemo.a");
        fixture.info.sections =
            sections(&[(".text", 0), (".symtab", 0x80), (".debug_info", 0x20)]);
        assert_eq!(
            codes(&ArchiveHygieneCheck.run(&fixture.context())),
            vec!["lto-no-text-in-archive"]
        );
    }

    #[test]
    fn test_known_empty_archives_are_exempt() {
        let mut fixture = Fixture::archive("/usr/lib64/libc_nonshared.a");
        fixture.info.sections = sections(&[(".note", 0x10)]);
        assert!(ArchiveHygieneCheck.run(&fixture.context()).is_empty());
    }

    #[test]
    fn test_patchable_function_entries() {
        let mut fixture = Fixture::archive("/usr/lib64/libdemo.a");
        fixture.info.sections = sections(&[
            (".text", 0x40),
            (".symtab", 0x80),
            (".debug_info", 0x20),
            ("__patchable_function_entries", 0x8),
        ]);
        assert_eq!(
            codes(&ArchiveHygieneCheck.run(&fixture.context())),
            vec!["patchable-function-entry-in-archive"]
        );
    }

    #[test]
    fn test_lto_bytecode_outside_archives() {
        let mut fixture = Fixture::shared_library("/usr/lib64/libfoo.so.1");
        fixture.info.sections = sections(&[(".text", 0x40), (".gnu.lto_.symtab", 0x100)]);
        assert_eq!(
            codes(&ArchiveHygieneCheck.run(&fixture.context())),
            vec!["lto-bytecode"]
        );
    }

    #[test]
    fn test_non_pic_shared_library() {
        let mut fixture = Fixture::shared_library("/usr/lib64/libfoo.so.1");
        fixture.info.sections = sections(&[(".text", 0x40)]);
        fixture.info.dynamic = crate::parser::DynamicSection::parse_output(
            "Dynamic section at offset 0x1f50 contains 2 entries:\n  Tag        Type                         Name/Value\n 0x0000000000000016 (TEXTREL)            0x0\n",
        );
        assert_eq!(
            codes(&NonPicCheck.run(&fixture.context())),
            vec!["shlib-with-non-pic-code"]
        );

        // Relocation sections for the object code clear the finding.
        fixture.info.sections = sections(&[(".text", 0x40), (".rela.text", 0x30)]);
        assert!(NonPicCheck.run(&fixture.context()).is_empty());
    }

    #[test]
    fn test_shared_library_without_textrel_is_fine() {
        let mut fixture = Fixture::shared_library("/usr/lib64/libfoo.so.1");
        fixture.info.sections = sections(&[(".text", 0x40)]);
        assert!(NonPicCheck.run(&fixture.context()).is_empty());
    }
}
