// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Hardcoded run-path policy. A binary may only bake in search paths the
//! dynamic loader would use anyway.

use path_clean::PathClean;
use std::path::PathBuf;

use super::{BinaryCheck, CheckContext, USR_LIB_RE};
use crate::diagnostic::Diagnostic;

pub struct RpathCheck;

impl BinaryCheck for RpathCheck {
    fn name(&self) -> &'static str {
        "rpath"
    }

    fn run(&self, ctx: &CheckContext) -> Vec<Diagnostic> {
        if !ctx.kind.is_elf || !(ctx.kind.is_executable || ctx.kind.is_shared_object) {
            return Vec::new();
        }
        ctx.info
            .dynamic
            .runpaths
            .iter()
            .filter(|entry| !is_allowed(ctx, entry))
            .map(|entry| {
                Diagnostic::error(
                    "binary-or-shlib-defines-rpath",
                    ctx.path,
                    vec![entry.clone()],
                )
            })
            .collect()
    }
}

fn is_allowed(ctx: &CheckContext, entry: &str) -> bool {
    let origin = ctx
        .path
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    let resolved = entry.replace("${ORIGIN}", &origin).replace("$ORIGIN", &origin);
    let cleaned = PathBuf::from(resolved).clean();

    ctx.config
        .system_lib_paths
        .iter()
        .any(|allowed| cleaned.starts_with(allowed))
        || USR_LIB_RE.is_match(&cleaned.to_string_lossy())
}
