// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Classifies package files from their short file-type descriptor (the
//! `file(1)` magic string) into the binary kinds the rule engine cares about.

use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::LazyLock;

/// Binary directories; files here are treated as programs.
pub(crate) static BIN_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(/usr(/X11R6)?)?/s?bin/").expect("valid regex"));

/// Kind flags derived from a file-type descriptor.
///
/// Each flag is an independent substring/prefix test; a single file can set
/// several of them (a PIE is both "executable" and "dynamically linked").
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BinaryKind {
    pub is_elf: bool,
    pub is_archive: bool,
    pub is_shared_object: bool,
    pub is_executable: bool,
    pub is_pie: bool,
    pub is_dynamically_linked: bool,
    pub is_ocaml_native: bool,
    pub is_lua_bytecode: bool,
    pub is_ebpf: bool,
}

impl BinaryKind {
    /// Classify a file-type descriptor string.
    #[must_use]
    pub fn classify(magic: &str) -> Self {
        // The descriptor may carry a setuid/setgid qualifier before "ELF".
        let elf_part = magic
            .strip_prefix("setuid ")
            .or_else(|| magic.strip_prefix("setgid "))
            .unwrap_or(magic);
        Self {
            is_elf: elf_part.starts_with("ELF "),
            is_archive: magic.contains("current ar archive"),
            is_shared_object: magic.contains("shared object"),
            is_executable: magic.contains("executable"),
            is_pie: magic.contains("pie executable"),
            is_dynamically_linked: magic.contains("dynamically linked"),
            is_ocaml_native: magic.contains("Objective caml native"),
            is_lua_bytecode: magic.contains("Lua bytecode"),
            is_ebpf: magic.contains("eBPF"),
        }
    }

    /// Whether the file is a compiled object worth looking at.
    #[must_use]
    pub fn is_binary(&self) -> bool {
        self.is_elf
            || self.is_archive
            || self.is_ocaml_native
            || self.is_lua_bytecode
            || self.is_ebpf
    }

    /// OCaml-native, Lua-bytecode and eBPF objects are binary but carry no
    /// host architecture; they are exempt from all ELF-level analysis.
    #[must_use]
    pub fn is_arch_independent(&self) -> bool {
        self.is_ocaml_native || self.is_lua_bytecode || self.is_ebpf
    }

    /// Resolve the PIE-vs-shared-object ambiguity for a given path.
    ///
    /// Old file-type oracles report PIEs as plain "shared object". A shared
    /// object with no `.so` in its name installed under a binary directory
    /// is therefore treated as an executable. This is a path-pattern
    /// heuristic inherited from packaging practice; do not strengthen it.
    #[must_use]
    pub fn disambiguate(mut self, path: &Path) -> Self {
        let name = path.to_string_lossy();
        if self.is_shared_object
            && !self.is_executable
            && !name.contains(".so")
            && BIN_PATH_RE.is_match(&name)
        {
            self.is_executable = true;
        }
        self
    }
}

/// Kernel modules keep their own stack conventions and are exempt from the
/// executable-stack policy.
#[must_use]
pub fn is_kernel_module(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "ko")
        || path.to_string_lossy().starts_with("/lib/modules/")
}

/// Detached debug-info files are skipped by the dynamic-linker checks.
#[must_use]
pub fn is_debug_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "debug")
}
