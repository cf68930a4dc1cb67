// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Forbidden library calls and unsafe call combinations: the configured
//! forbidden-call table, setgroups-before-setuid, exit from shared
//! libraries, and chroot without a nearby chdir.

use regex::Regex;
use std::sync::LazyLock;

use super::{BinaryCheck, CheckContext};
use crate::diagnostic::Diagnostic;
use crate::parser::call_regex;

static SETUID_RE: LazyLock<Regex> =
    LazyLock::new(|| call_regex(r"set(?:res|e)?uid").expect("valid regex"));
static SETGID_RE: LazyLock<Regex> =
    LazyLock::new(|| call_regex(r"set(?:res|e)?gid").expect("valid regex"));
static SETGROUPS_RE: LazyLock<Regex> =
    LazyLock::new(|| call_regex(r"(?:ini|se)tgroups").expect("valid regex"));
// Anchored so atexit and friends do not count as exit calls.
static EXIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^_?exit(?:@GLIBC\S+)?$").expect("valid regex"));
static FORK_RE: LazyLock<Regex> = LazyLock::new(|| call_regex("fork").expect("valid regex"));
pub(crate) static CHROOT_RE: LazyLock<Regex> =
    LazyLock::new(|| call_regex("chroot").expect("valid regex"));
pub(crate) static CHDIR_RE: LazyLock<Regex> =
    LazyLock::new(|| call_regex("chdir").expect("valid regex"));

pub struct CallsCheck;

impl BinaryCheck for CallsCheck {
    fn name(&self) -> &'static str {
        "calls"
    }

    fn run(&self, ctx: &CheckContext) -> Vec<Diagnostic> {
        if !ctx.kind.is_elf && !ctx.kind.is_archive {
            return Vec::new();
        }
        let mut diagnostics = Vec::new();

        for forbidden in &ctx.config.forbidden_calls {
            if !ctx.info.symbols.has_function_matching(&forbidden.call) {
                continue;
            }
            // A waiver hit in the embedded strings vouches for the call.
            let waived = forbidden.waiver.as_ref().is_some_and(|waiver| {
                ctx.info
                    .strings
                    .as_ref()
                    .is_some_and(|strings| strings.any_match(waiver))
            });
            if !waived {
                diagnostics.push(Diagnostic::new(
                    forbidden.severity,
                    forbidden.code.clone(),
                    ctx.path,
                    vec![],
                ));
            }
        }

        // Dropping uid and gid without resetting the supplementary groups
        // leaves the process in the old group set.
        if ctx.kind.is_executable
            && ctx.info.symbols.has_function_matching(&SETUID_RE)
            && ctx.info.symbols.has_function_matching(&SETGID_RE)
            && !ctx.info.symbols.has_function_matching(&SETGROUPS_RE)
        {
            diagnostics.push(Diagnostic::error(
                "missing-call-to-setgroups-before-setuid",
                ctx.path,
                vec![],
            ));
        }

        // Terminating the host process is the application's decision, not a
        // library's. Anything that forks gets a pass: the exit calls then
        // belong to the child branches.
        if ctx.is_shared_lib() && !ctx.info.symbols.has_function_matching(&FORK_RE) {
            for name in ctx.info.symbols.functions_matching(&EXIT_RE) {
                diagnostics.push(Diagnostic::warning(
                    "shared-lib-calls-exit",
                    ctx.path,
                    vec![name.to_string()],
                ));
            }
        }

        // chroot without chdir("/") next to it leaves the old working
        // directory as an escape hatch out of the jail.
        if ctx.info.symbols.has_function_matching(&CHROOT_RE) {
            let chdir_called = ctx.info.symbols.has_function_matching(&CHDIR_RE);
            let chdir_nearby = ctx
                .info
                .disassembly
                .as_ref()
                .is_some_and(|d| d.calls_nearby("chroot@plt", "chdir@plt"));
            if !chdir_called || !chdir_nearby {
                diagnostics.push(Diagnostic::error(
                    "missing-call-to-chdir-with-chroot",
                    ctx.path,
                    vec![],
                ));
            }
        }
        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{codes, Fixture};
    use super::*;
    use crate::parser::{Disassembly, EmbeddedStrings, SymbolTable};

    fn with_functions(fixture: &mut Fixture, names: &[&str]) {
        let lines: String = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                format!(
                    "     {}: 0000000000000000     0 FUNC    GLOBAL DEFAULT  UND {name}\n",
                    i + 1
                )
            })
            .collect();
        fixture.info.symbols = SymbolTable::parse_output(&format!(
            "Symbol table '.dynsym' contains entries:\n   Num:    Value          Size Type    Bind   Vis      Ndx Name\n{lines}"
        ));
    }

    #[test]
    fn test_forbidden_call_without_waiver() {
        let mut fixture = Fixture::executable("/usr/bin/foo");
        with_functions(&mut fixture, &["mktemp@GLIBC_2.2.5"]);
        assert_eq!(codes(&CallsCheck.run(&fixture.context())), vec!["call-to-mktemp"]);
    }

    #[test]
    fn test_waiver_suppresses_the_finding() {
        let mut fixture = Fixture::shared_library("/usr/lib64/libfoo.so.1");
        with_functions(&mut fixture, &["gethostbyname@GLIBC_2.2.5"]);

        fixture.info.strings = Some(EmbeddedStrings::parse_output("libnss_files.so.2\n"));
        assert!(CallsCheck.run(&fixture.context()).is_empty());

        fixture.info.strings = Some(EmbeddedStrings::parse_output("usage: foo\n"));
        assert_eq!(
            codes(&CallsCheck.run(&fixture.context())),
            vec!["binary-or-shlib-calls-gethostbyname"]
        );
    }

    #[test]
    fn test_unscanned_strings_do_not_waive() {
        let mut fixture = Fixture::shared_library("/usr/lib64/libfoo.so.1");
        with_functions(&mut fixture, &["gethostbyname"]);
        assert_eq!(
            codes(&CallsCheck.run(&fixture.context())),
            vec!["binary-or-shlib-calls-gethostbyname"]
        );
    }

    #[test]
    fn test_privilege_drop_without_setgroups() {
        let mut fixture = Fixture::executable("/usr/bin/daemon");
        with_functions(&mut fixture, &["setuid@GLIBC_2.2.5", "setgid@GLIBC_2.2.5"]);
        assert_eq!(
            codes(&CallsCheck.run(&fixture.context())),
            vec!["missing-call-to-setgroups-before-setuid"]
        );

        with_functions(
            &mut fixture,
            &["setuid@GLIBC_2.2.5", "setgid@GLIBC_2.2.5", "setgroups@GLIBC_2.2.5"],
        );
        assert!(CallsCheck.run(&fixture.context()).is_empty());
    }

    #[test]
    fn test_privilege_drop_rule_is_for_programs_only() {
        let mut fixture = Fixture::shared_library("/usr/lib64/libpriv.so.1");
        with_functions(&mut fixture, &["setuid", "setgid"]);
        assert!(CallsCheck.run(&fixture.context()).is_empty());
    }

    #[test]
    fn test_shared_lib_calling_exit() {
        let mut fixture = Fixture::shared_library("/usr/lib64/libfoo.so.1");
        with_functions(&mut fixture, &["exit@GLIBC_2.2.5", "_exit@GLIBC_2.2.5"]);
        let diagnostics = CallsCheck.run(&fixture.context());
        assert_eq!(
            codes(&diagnostics),
            vec!["shared-lib-calls-exit", "shared-lib-calls-exit"]
        );
        assert_eq!(diagnostics[0].details, vec!["exit@GLIBC_2.2.5"]);
    }

    #[test]
    fn test_atexit_is_not_an_exit_call() {
        let mut fixture = Fixture::shared_library("/usr/lib64/libfoo.so.1");
        with_functions(&mut fixture, &["atexit@GLIBC_2.2.5", "on_exit@GLIBC_2.2.5"]);
        assert!(CallsCheck.run(&fixture.context()).is_empty());
    }

    #[test]
    fn test_forking_library_may_exit() {
        let mut fixture = Fixture::shared_library("/usr/lib64/libfoo.so.1");
        with_functions(&mut fixture, &["exit@GLIBC_2.2.5", "fork@GLIBC_2.2.5"]);
        assert!(CallsCheck.run(&fixture.context()).is_empty());
    }

    #[test]
    fn test_exit_rule_is_for_shared_libraries_only() {
        let mut fixture = Fixture::executable("/usr/bin/foo");
        with_functions(&mut fixture, &["exit@GLIBC_2.2.5"]);
        assert!(CallsCheck.run(&fixture.context()).is_empty());
    }

    #[test]
    fn test_chroot_without_chdir() {
        let mut fixture = Fixture::executable("/usr/bin/jail");
        with_functions(&mut fixture, &["chroot@GLIBC_2.2.5"]);
        assert_eq!(
            codes(&CallsCheck.run(&fixture.context())),
            vec!["missing-call-to-chdir-with-chroot"]
        );
    }

    #[test]
    fn test_chroot_with_distant_chdir() {
        // Both are called, but an unavailable or inconclusive listing
        // cannot place the chdir next to the chroot.
        let mut fixture = Fixture::executable("/usr/bin/jail");
        with_functions(&mut fixture, &["chroot@GLIBC_2.2.5", "chdir@GLIBC_2.2.5"]);
        assert_eq!(
            codes(&CallsCheck.run(&fixture.context())),
            vec!["missing-call-to-chdir-with-chroot"]
        );
    }

    #[test]
    fn test_chroot_with_adjacent_chdir() {
        let mut fixture = Fixture::executable("/usr/bin/jail");
        with_functions(&mut fixture, &["chroot@GLIBC_2.2.5", "chdir@GLIBC_2.2.5"]);
        fixture.info.disassembly = Some(Disassembly::parse_output(
            "  401eb8:\te8 c3 f0 ff ff\tcallq  400f80 <chroot@plt>\n\
             \t  401ebd:\te8 be f0 ff ff\tcallq  400f90 <chdir@plt>\n",
        ));
        assert!(CallsCheck.run(&fixture.context()).is_empty());
    }
}
