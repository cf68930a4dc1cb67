// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Symbol lookup tables of shared libraries.

use super::{BinaryCheck, CheckContext};
use crate::diagnostic::Diagnostic;

pub struct HashCheck;

impl BinaryCheck for HashCheck {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn run(&self, ctx: &CheckContext) -> Vec<Diagnostic> {
        if !ctx.is_shared_lib() {
            return Vec::new();
        }
        let mut diagnostics = Vec::new();
        if !ctx.info.sections.has_section(".hash") {
            diagnostics.push(Diagnostic::error("missing-hash-section", ctx.path, vec![]));
        }
        if !ctx.info.sections.has_section(".gnu.hash") {
            diagnostics.push(Diagnostic::warning(
                "missing-gnu-hash-section",
                ctx.path,
                vec![],
            ));
        }
        diagnostics
    }
}
