// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Debug information that should have been stripped at build time.

use super::{BinaryCheck, CheckContext};
use crate::diagnostic::Diagnostic;

pub struct StripCheck;

impl BinaryCheck for StripCheck {
    fn name(&self) -> &'static str {
        "strip"
    }

    fn run(&self, ctx: &CheckContext) -> Vec<Diagnostic> {
        if !ctx.kind.is_elf && !ctx.kind.is_archive {
            return Vec::new();
        }
        // The file descriptor already states the symbol table status.
        if ctx.file.magic.contains("not stripped") {
            return vec![Diagnostic::warning(
                "unstripped-binary-or-object",
                ctx.path,
                vec![],
            )];
        }
        Vec::new()
    }
}
