// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Parses `objdump -d` output into the call sequence, for call-proximity
//! inspection.

use std::path::Path;

use super::{ParseFailure, ParseResult};
use crate::tool::{Tool, ToolRunner};

/// The call targets of a disassembly listing, in instruction order.
///
/// Only the target operand of each call instruction is kept
/// (`callq  400f80 <free@plt>` yields `<free@plt>`); everything else in
/// the listing is irrelevant to the proximity checks.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Disassembly {
    pub calls: Vec<String>,
}

impl Disassembly {
    /// Run `objdump -d` on `path` and collect the call targets.
    ///
    /// # Errors
    /// Returns `ParseFailure::Tool` when the tool fails.
    pub fn parse(tools: &dyn ToolRunner, path: &Path) -> ParseResult<Self> {
        let output = tools
            .run(Tool::Objdump, &["-d"], path)
            .map_err(|e| ParseFailure::from_tool_error(&e))?;
        Ok(Self::parse_output(&output))
    }

    /// Parse captured `objdump -d` output, keeping the last token of each
    /// call instruction line.
    #[must_use]
    pub fn parse_output(output: &str) -> Self {
        let calls = output
            .lines()
            .filter(|line| line.contains("callq ") || line.contains("call "))
            .filter_map(|line| line.rsplit_once(' '))
            .map(|(_, target)| target.to_string())
            .collect();
        Self { calls }
    }

    /// Whether any call to `target` has a call to `neighbor` within two
    /// instructions before or one after it.
    #[must_use]
    pub fn calls_nearby(&self, target: &str, neighbor: &str) -> bool {
        self.calls
            .iter()
            .enumerate()
            .filter(|(_, call)| call.contains(target))
            .any(|(index, _)| {
                let start = index.saturating_sub(2);
                let end = (index + 2).min(self.calls.len());
                self.calls[start..end]
                    .iter()
                    .any(|call| call.contains(neighbor))
            })
    }
}
