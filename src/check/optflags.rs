// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Mandatory compiler flags, verified against the DWARF producer strings.

use super::{BinaryCheck, CheckContext};
use crate::diagnostic::Diagnostic;

pub struct OptflagsCheck;

impl BinaryCheck for OptflagsCheck {
    fn name(&self) -> &'static str {
        "optflags"
    }

    fn run(&self, ctx: &CheckContext) -> Vec<Diagnostic> {
        if ctx.config.mandatory_optflags.is_empty() || !ctx.kind.is_elf {
            return Vec::new();
        }
        let mut missing: Vec<String> = Vec::new();
        for unit in &ctx.info.compile_units.units {
            let tokens = unit.producer_tokens();
            if tokens.is_empty() {
                continue;
            }
            for flag in &ctx.config.mandatory_optflags {
                if !tokens.contains(&flag.as_str()) && !missing.contains(flag) {
                    missing.push(flag.clone());
                }
            }
        }
        if missing.is_empty() {
            Vec::new()
        } else {
            vec![Diagnostic::warning(
                "missing-mandatory-optflags",
                ctx.path,
                missing,
            )]
        }
    }
}
