// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Dynamic-linking hygiene: dependency records, libc linkage, undefined
//! symbols and unused dependencies.

use super::{BinaryCheck, CheckContext, LDSO_RE};
use crate::diagnostic::{Diagnostic, Severity};
use crate::magic::is_debug_file;

pub struct LinkageCheck;

impl BinaryCheck for LinkageCheck {
    fn name(&self) -> &'static str {
        "linkage"
    }

    fn run(&self, ctx: &CheckContext) -> Vec<Diagnostic> {
        if !ctx.kind.is_elf
            || ctx.kind.is_archive
            || !(ctx.kind.is_executable || ctx.kind.is_shared_object)
        {
            return Vec::new();
        }
        // The dynamic loader itself legitimately depends on nothing.
        let is_ldso = ctx
            .info
            .dynamic
            .soname
            .as_deref()
            .is_some_and(|soname| LDSO_RE.is_match(soname));

        if ctx.info.dynamic.needed.is_empty() && !is_ldso {
            if ctx.is_shared_lib() {
                return vec![Diagnostic::error(
                    "shared-lib-without-dependency-information",
                    ctx.path,
                    vec![],
                )];
            }
            if ctx.kind.is_executable {
                return vec![Diagnostic::error(
                    "statically-linked-binary",
                    ctx.path,
                    vec![],
                )];
            }
            return Vec::new();
        }
        libc_linkage(ctx).into_iter().collect()
    }
}

/// Everything dynamically linked is expected to record a libc dependency;
/// libc itself and the dynamic loader are the exceptions.
fn libc_linkage(ctx: &CheckContext) -> Option<Diagnostic> {
    if ctx.path.to_string_lossy().contains("libc.") {
        return None;
    }
    if ctx
        .info
        .dynamic
        .soname
        .as_deref()
        .is_some_and(|soname| soname.contains("libc.") || LDSO_RE.is_match(soname))
    {
        return None;
    }
    if ctx
        .info
        .dynamic
        .needed
        .iter()
        .any(|needed| needed.contains("libc."))
    {
        return None;
    }
    let code = if ctx.kind.is_shared_object {
        "library-not-linked-against-libc"
    } else {
        "program-not-linked-against-libc"
    };
    Some(Diagnostic::error(code, ctx.path, vec![]))
}

pub struct DependencyCheck;

impl BinaryCheck for DependencyCheck {
    fn name(&self) -> &'static str {
        "dependencies"
    }

    fn run(&self, ctx: &CheckContext) -> Vec<Diagnostic> {
        // Resolution data exists only for installed packages; detached
        // debug files resolve against nothing.
        if !ctx.package.is_installed
            || !ctx.kind.is_elf
            || ctx.kind.is_archive
            || is_debug_file(ctx.path)
        {
            return Vec::new();
        }
        let severity = if ctx.is_shared_lib() {
            Severity::Error
        } else {
            Severity::Warning
        };

        let mut diagnostics = Vec::new();
        for symbol in &ctx.info.dependencies.undefined_symbols {
            diagnostics.push(Diagnostic::new(
                severity,
                "undefined-non-weak-symbol",
                ctx.path,
                vec![symbol.clone()],
            ));
        }
        for dependency in &ctx.info.dependencies.unused_dependencies {
            diagnostics.push(Diagnostic::new(
                severity,
                "unused-direct-shlib-dependency",
                ctx.path,
                vec![dependency.clone()],
            ));
        }
        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{codes, Fixture};
    use super::*;
    use crate::diagnostic::Severity;
    use crate::parser::DynamicSection;

    fn with_needed(fixture: &mut Fixture, needed: &[&str]) {
        fixture.info.dynamic.needed = needed.iter().map(ToString::to_string).collect();
    }

    #[test]
    fn test_shared_lib_without_needed_entries() {
        let fixture = Fixture::shared_library("/usr/lib64/libfoo.so.1");
        assert_eq!(
            codes(&LinkageCheck.run(&fixture.context())),
            vec!["shared-lib-without-dependency-information"]
        );
    }

    #[test]
    fn test_needed_entries_satisfy_the_check() {
        let mut fixture = Fixture::shared_library("/usr/lib64/libfoo.so.1");
        with_needed(&mut fixture, &["libc.so.6"]);
        assert!(LinkageCheck.run(&fixture.context()).is_empty());
    }

    #[test]
    fn test_dynamic_loader_is_exempt() {
        let mut fixture = Fixture::shared_library("/lib64/ld-linux-x86-64.so.2");
        fixture.info.dynamic = DynamicSection {
            soname: Some("ld-linux-x86-64.so.2".to_string()),
            ..DynamicSection::default()
        };
        assert!(LinkageCheck.run(&fixture.context()).is_empty());
    }

    #[test]
    fn test_statically_linked_binary() {
        let fixture = Fixture::new(
            "/usr/bin/foo",
            "ELF 64-bit LSB executable, x86-64, version 1 (SYSV), statically linked, stripped",
        );
        assert_eq!(
            codes(&LinkageCheck.run(&fixture.context())),
            vec!["statically-linked-binary"]
        );
    }

    #[test]
    fn test_executable_without_needed_entries_is_reported() {
        // The descriptor claiming "dynamically linked" does not matter;
        // an executable recording no dependencies is effectively static.
        let fixture = Fixture::executable("/usr/bin/foo");
        assert_eq!(
            codes(&LinkageCheck.run(&fixture.context())),
            vec!["statically-linked-binary"]
        );
    }

    #[test]
    fn test_library_not_linked_against_libc() {
        let mut fixture = Fixture::shared_library("/usr/lib64/libfoo.so.1");
        with_needed(&mut fixture, &["libm.so.6"]);
        assert_eq!(
            codes(&LinkageCheck.run(&fixture.context())),
            vec!["library-not-linked-against-libc"]
        );
    }

    #[test]
    fn test_program_not_linked_against_libc() {
        let mut fixture = Fixture::executable("/usr/bin/foo");
        with_needed(&mut fixture, &["libm.so.6"]);
        assert_eq!(
            codes(&LinkageCheck.run(&fixture.context())),
            vec!["program-not-linked-against-libc"]
        );
    }

    #[test]
    fn test_libc_itself_is_exempt_from_the_libc_rule() {
        let mut fixture = Fixture::shared_library("/usr/lib64/libc.so.6");
        with_needed(&mut fixture, &["ld-linux-x86-64.so.2"]);
        assert!(LinkageCheck.run(&fixture.context()).is_empty());
    }

    fn installed_with_resolution(path: &str) -> Fixture {
        let mut fixture = Fixture::shared_library(path);
        fixture.package.is_installed = true;
        fixture.info.dependencies.undefined_symbols = vec!["missing_helper".to_string()];
        fixture.info.dependencies.unused_dependencies = vec!["/lib64/libm.so.6".to_string()];
        fixture
    }

    #[test]
    fn test_resolution_findings_for_installed_library() {
        let fixture = installed_with_resolution("/usr/lib64/libfoo.so.1");
        let diagnostics = DependencyCheck.run(&fixture.context());
        assert_eq!(
            codes(&diagnostics),
            vec!["undefined-non-weak-symbol", "unused-direct-shlib-dependency"]
        );
        assert!(diagnostics.iter().all(|d| d.severity == Severity::Error));
    }

    #[test]
    fn test_resolution_findings_downgrade_for_programs() {
        let mut fixture = installed_with_resolution("/usr/lib64/libfoo.so.1");
        fixture = {
            let mut exec = Fixture::executable("/usr/bin/foo");
            exec.package.is_installed = true;
            exec.info.dependencies = fixture.info.dependencies.clone();
            exec
        };
        let diagnostics = DependencyCheck.run(&fixture.context());
        assert!(diagnostics.iter().all(|d| d.severity == Severity::Warning));
    }

    #[test]
    fn test_uninstalled_packages_have_no_resolution_findings() {
        let mut fixture = installed_with_resolution("/usr/lib64/libfoo.so.1");
        fixture.package.is_installed = false;
        assert!(DependencyCheck.run(&fixture.context()).is_empty());
    }
}
