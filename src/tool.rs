// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Runs the external inspection tools (`readelf`, `objdump`, `ldd`, ...) and
//! captures their textual output for the parsers.

use std::io;
use std::path::Path;
use std::process::Command;
use thiserror::Error;

/// External tools the auditor shells out to.
///
/// Every invocation runs with a locale-neutral environment so output can be
/// parsed deterministically regardless of the host configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Readelf,
    Objdump,
    Ldd,
    CxxFilt,
    Ar,
    Strings,
    File,
}

impl Tool {
    /// The command name looked up in `PATH`.
    #[must_use]
    pub fn command(self) -> &'static str {
        match self {
            Self::Readelf => "readelf",
            Self::Objdump => "objdump",
            Self::Ldd => "ldd",
            Self::CxxFilt => "c++filt",
            Self::Ar => "ar",
            Self::Strings => "strings",
            Self::File => "file",
        }
    }
}

/// Errors that can occur when invoking an external tool.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Command not found: {tool}")]
    NotFound { tool: &'static str },
    #[error("Failed to run {tool}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("{tool} exited with status {status}")]
    Failed {
        tool: &'static str,
        status: i32,
        stdout: String,
        stderr: String,
    },
}

impl ToolError {
    /// The first line of the tool's error stream, for diagnostics.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::NotFound { .. } | Self::Spawn { .. } => self.to_string(),
            Self::Failed { stderr, .. } => {
                stderr.lines().next().unwrap_or_default().trim().to_string()
            }
        }
    }
}

/// Result type for tool invocations.
pub type ToolResult = std::result::Result<String, ToolError>;

/// Seam between the analysis core and the host's object-inspection tools.
///
/// Production code uses [`SystemTools`]; tests substitute canned output so
/// the parsers and the rule engine can be exercised without the binaries
/// they would normally inspect.
pub trait ToolRunner: Sync {
    /// Run `tool` with `args` against `path` and return its standard output.
    ///
    /// # Errors
    /// Returns an error if the tool is missing, cannot be spawned, or exits
    /// with a non-zero status. The error carries both output streams since
    /// some tools (notably `ldd -u`) report through stdout even on failure.
    fn run(&self, tool: Tool, args: &[&str], path: &Path) -> ToolResult;
}

/// Invokes the real tools via `std::process::Command`.
///
/// There is deliberately no timeout on these invocations: a hanging
/// `readelf` blocks that file's analysis. Known operational risk.
pub struct SystemTools;

impl ToolRunner for SystemTools {
    fn run(&self, tool: Tool, args: &[&str], path: &Path) -> ToolResult {
        let output = Command::new(tool.command())
            .args(args)
            .arg(path)
            .env("LC_ALL", "C")
            .env("LANG", "C")
            .output()
            .map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    ToolError::NotFound {
                        tool: tool.command(),
                    }
                } else {
                    ToolError::Spawn {
                        tool: tool.command(),
                        source: e,
                    }
                }
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            Ok(stdout)
        } else {
            Err(ToolError::Failed {
                tool: tool.command(),
                status: output.status.code().unwrap_or(-1),
                stdout,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_names() {
        assert_eq!(Tool::Readelf.command(), "readelf");
        assert_eq!(Tool::CxxFilt.command(), "c++filt");
    }

    #[test]
    fn test_not_found_error() {
        struct Missing;
        impl ToolRunner for Missing {
            fn run(&self, tool: Tool, _args: &[&str], _path: &Path) -> ToolResult {
                Err(ToolError::NotFound {
                    tool: tool.command(),
                })
            }
        }
        let err = Missing
            .run(Tool::Readelf, &["-W", "-S"], Path::new("/bin/ls"))
            .unwrap_err();
        assert!(err.to_string().contains("readelf"));
    }

    #[test]
    fn test_failed_summary_takes_first_stderr_line() {
        let err = ToolError::Failed {
            tool: "readelf",
            status: 1,
            stdout: String::new(),
            stderr: "readelf: Error: Not an ELF file\nmore context".to_string(),
        };
        assert_eq!(err.summary(), "readelf: Error: Not an ELF file");
    }
}
