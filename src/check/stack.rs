// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Executable-stack policy, driven by the `GNU_STACK` program header.

use super::{BinaryCheck, CheckContext};
use crate::diagnostic::Diagnostic;
use crate::magic::is_kernel_module;

/// Architectures on which the kernel honors an executable-stack request by
/// default, making a missing or executable `GNU_STACK` header a real hole.
fn stack_policy_applies(arch: &str) -> bool {
    arch.ends_with("86") || arch.starts_with("pentium") || arch.starts_with("athlon") || arch == "x86_64"
}

pub struct StackCheck;

impl BinaryCheck for StackCheck {
    fn name(&self) -> &'static str {
        "stack"
    }

    fn run(&self, ctx: &CheckContext) -> Vec<Diagnostic> {
        if !ctx.kind.is_elf
            || ctx.kind.is_archive
            || !(ctx.kind.is_executable || ctx.kind.is_shared_object)
            || is_kernel_module(ctx.path)
            || !stack_policy_applies(&ctx.package.arch)
        {
            return Vec::new();
        }

        let Some(stack) = ctx
            .info
            .program_headers
            .iter()
            .find(|h| h.name == "GNU_STACK")
        else {
            return vec![Diagnostic::error(
                "missing-PT_GNU_STACK-section",
                ctx.path,
                vec![],
            )];
        };
        if stack.has_flag('E') {
            return vec![Diagnostic::warning("executable-stack", ctx.path, vec![])];
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{codes, Fixture};
    use super::*;
    use crate::parser::ElfProgramHeader;

    fn with_stack_flags(fixture: &mut Fixture, flags: &str) {
        fixture.info.program_headers = vec![
            ElfProgramHeader {
                name: "LOAD".to_string(),
                flags: "R".to_string(),
            },
            ElfProgramHeader {
                name: "GNU_STACK".to_string(),
                flags: flags.to_string(),
            },
        ];
    }

    #[test]
    fn test_missing_gnu_stack_header() {
        let fixture = Fixture::executable("/usr/bin/foo");
        let diagnostics = StackCheck.run(&fixture.context());
        assert_eq!(codes(&diagnostics), vec!["missing-PT_GNU_STACK-section"]);
    }

    #[test]
    fn test_executable_stack() {
        let mut fixture = Fixture::executable("/usr/bin/foo");
        with_stack_flags(&mut fixture, "RWE");
        let diagnostics = StackCheck.run(&fixture.context());
        assert_eq!(codes(&diagnostics), vec!["executable-stack"]);
    }

    #[test]
    fn test_the_two_codes_are_mutually_exclusive() {
        let mut fixture = Fixture::executable("/usr/bin/foo");
        with_stack_flags(&mut fixture, "RW");
        assert!(StackCheck.run(&fixture.context()).is_empty());
    }

    #[test]
    fn test_foreign_arch_is_exempt() {
        let mut fixture = Fixture::executable("/usr/bin/foo");
        fixture.package.arch = "aarch64".to_string();
        assert!(StackCheck.run(&fixture.context()).is_empty());
    }

    #[test]
    fn test_kernel_module_is_exempt() {
        let fixture = Fixture::shared_library("/lib/modules/6.1.0/kernel/demo.ko");
        assert!(StackCheck.run(&fixture.context()).is_empty());
    }

    #[test]
    fn test_archive_is_exempt() {
        let fixture = Fixture::archive("/usr/lib64/libdemo.a");
        assert!(StackCheck.run(&fixture.context()).is_empty());
    }
}
