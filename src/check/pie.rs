// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Position-independent-executable policy.
//!
//! A file-type oracle reporting "shared object" for a program already
//! proves position independence, so only plain "executable" descriptors
//! are candidates here.

use super::{BinaryCheck, CheckContext};
use crate::diagnostic::Diagnostic;

pub struct PieCheck;

impl BinaryCheck for PieCheck {
    fn name(&self) -> &'static str {
        "pie"
    }

    fn run(&self, ctx: &CheckContext) -> Vec<Diagnostic> {
        if !ctx.kind.is_elf
            || !ctx.kind.is_executable
            || ctx.kind.is_pie
            || ctx.kind.is_shared_object
        {
            return Vec::new();
        }

        let mandatory = ctx
            .config
            .pie_executables
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(&ctx.path.to_string_lossy()));
        if mandatory {
            vec![Diagnostic::error(
                "non-position-independent-executable",
                ctx.path,
                vec![],
            )]
        } else {
            vec![Diagnostic::warning(
                "position-independent-executable-suggested",
                ctx.path,
                vec![],
            )]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{codes, Fixture};
    use super::*;
    use regex::Regex;

    #[test]
    fn test_non_pie_is_suggested_by_default() {
        let fixture = Fixture::executable("/usr/bin/foo");
        assert_eq!(
            codes(&PieCheck.run(&fixture.context())),
            vec!["position-independent-executable-suggested"]
        );
    }

    #[test]
    fn test_configured_pattern_makes_it_an_error() {
        let mut fixture = Fixture::executable("/usr/sbin/daemon");
        fixture.config.pie_executables = Some(Regex::new("^/usr/s?bin/").unwrap());
        assert_eq!(
            codes(&PieCheck.run(&fixture.context())),
            vec!["non-position-independent-executable"]
        );
    }

    #[test]
    fn test_pie_executable_passes() {
        let fixture = Fixture::new(
            "/usr/bin/foo",
            "ELF 64-bit LSB pie executable, x86-64, version 1 (SYSV), dynamically linked",
        );
        assert!(PieCheck.run(&fixture.context()).is_empty());
    }

    #[test]
    fn test_disambiguated_shared_object_program_passes() {
        // Old oracles describe PIEs as shared objects; the classifier marks
        // them executable by path, which must not trip this check.
        let fixture = Fixture::new(
            "/usr/bin/foo",
            "ELF 64-bit LSB shared object, x86-64, version 1 (SYSV), dynamically linked",
        );
        assert!(fixture.kind.is_executable);
        assert!(PieCheck.run(&fixture.context()).is_empty());
    }

    #[test]
    fn test_shared_library_is_out_of_scope() {
        let fixture = Fixture::shared_library("/usr/lib64/libfoo.so.1");
        assert!(PieCheck.run(&fixture.context()).is_empty());
    }
}
