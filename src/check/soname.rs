// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Soname conventions: presence, naming scheme, the ldconfig symlink and
//! the library package naming policy.

use super::{BinaryCheck, CheckContext, SOVERSION_RE, VALID_SONAME_RE};
use crate::diagnostic::Diagnostic;

pub struct SonameCheck;

impl BinaryCheck for SonameCheck {
    fn name(&self) -> &'static str {
        "soname"
    }

    fn run(&self, ctx: &CheckContext) -> Vec<Diagnostic> {
        if !ctx.is_shared_lib() {
            return Vec::new();
        }
        let Some(soname) = ctx.info.dynamic.soname.as_deref() else {
            return vec![Diagnostic::warning("no-soname", ctx.path, vec![])];
        };

        let mut diagnostics = Vec::new();
        if VALID_SONAME_RE.is_match(soname) {
            if let Some(diagnostic) = ldconfig_symlink(ctx, soname) {
                diagnostics.push(diagnostic);
            }
            if let Some(diagnostic) = package_naming_policy(ctx, soname) {
                diagnostics.push(diagnostic);
            }
        } else {
            diagnostics.push(Diagnostic::error(
                "invalid-soname",
                ctx.path,
                vec![soname.to_string()],
            ));
        }
        diagnostics
    }
}

/// Run-time linking expects `<dir>/<soname>` to exist next to the library,
/// pointing at it. A missing link is only reported for the `lib`/`ld-`
/// namespace; anything else is too noisy.
fn ldconfig_symlink(ctx: &CheckContext, soname: &str) -> Option<Diagnostic> {
    let directory = ctx.path.parent()?;
    let base = ctx.path.file_name()?.to_string_lossy();
    let symlink = directory.join(soname);
    if symlink == ctx.path {
        return None;
    }

    match ctx.files.get(&symlink) {
        Some(link) => {
            let target = link.linkto.as_deref().unwrap_or("");
            if target.is_empty()
                || target == ctx.path.to_string_lossy()
                || target == base.as_ref()
            {
                None
            } else {
                Some(Diagnostic::error(
                    "invalid-ldconfig-symlink",
                    ctx.path,
                    vec![target.to_string()],
                ))
            }
        }
        None if base.starts_with("lib") || base.starts_with("ld-") => {
            Some(Diagnostic::error("no-ldconfig-symlink", ctx.path, vec![]))
        }
        None => None,
    }
}

/// Library packages are named after the soname version: `libfoo.so.1.2`
/// belongs in a package whose name ends `1_2`.
fn package_naming_policy(ctx: &CheckContext, soname: &str) -> Option<Diagnostic> {
    if !ctx.package.name.starts_with("lib") {
        return None;
    }
    let captures = SOVERSION_RE.captures(soname)?;
    let soversion = captures.get(1).or_else(|| captures.get(2))?.as_str();
    let expected = soversion.replace('.', "_");
    if ctx.package.name.ends_with(&expected) {
        None
    } else {
        Some(Diagnostic::error(
            "shlib-policy-name-error",
            ctx.path,
            vec![expected],
        ))
    }
}
