// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! The rule engine: walks a package's files, classifies and parses each
//! binary, and evaluates the check registry over the result.
//!
//! Files are independent work units and run in parallel; the tool
//! invocations inside one unit stay sequential. One file failing never
//! stops the others.

use dashmap::DashSet;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::check::{registry, BinaryCheck, CheckContext, CHDIR_RE, CHROOT_RE, SO_PATH_RE};
use crate::config::RuleConfig;
use crate::diagnostic::{Diagnostic, DiagnosticSink};
use crate::magic::{is_debug_file, BinaryKind, BIN_PATH_RE};
use crate::package::{FileInfo, Package, PackageFiles, PackageMeta};
use crate::parser::{
    ArchiveMembers, BinaryInfo, Comments, CompileUnits, DependencyInfo, Disassembly,
    DynamicSection, ElfProgramHeader, EmbeddedStrings, ParseFailure, SectionInfo, SymbolTable,
};
use crate::tool::ToolRunner;

/// Cross-file facts accumulated during the parallel walk and reduced into
/// package-level findings afterwards.
#[derive(Default)]
struct Aggregates {
    has_shared_library: AtomicBool,
    program_files: DashSet<PathBuf>,
}

pub struct Engine<'a> {
    config: &'a RuleConfig,
    tools: &'a dyn ToolRunner,
    checks: Vec<Box<dyn BinaryCheck>>,
}

impl<'a> Engine<'a> {
    #[must_use]
    pub fn new(config: &'a RuleConfig, tools: &'a dyn ToolRunner) -> Self {
        Self {
            config,
            tools,
            checks: registry(),
        }
    }

    /// Audit every file of the package, emitting findings to `sink`.
    pub fn audit(&self, package: &Package, sink: &dyn DiagnosticSink) {
        let aggregates = Aggregates::default();
        package.files().par_iter().for_each(|(path, file)| {
            self.audit_file(package.meta(), package.files(), path, file, sink, &aggregates);
        });

        // Library packages must not also ship programs.
        if aggregates.has_shared_library.load(Ordering::Relaxed) {
            for path in aggregates.program_files.iter() {
                sink.add_info(Diagnostic::error(
                    "executable-in-library-package",
                    path.key().clone(),
                    vec![],
                ));
            }
        }
    }

    fn audit_file(
        &self,
        package: &PackageMeta,
        files: &PackageFiles,
        path: &Path,
        file: &FileInfo,
        sink: &dyn DiagnosticSink,
        aggregates: &Aggregates,
    ) {
        let kind = BinaryKind::classify(&file.magic).disambiguate(path);
        if !kind.is_binary() {
            return;
        }

        // Plain objects and prelink leftovers are build artifacts, not
        // shipped binaries. They also stay out of the library-package
        // aggregates: an OCaml or Lua program in a library package is not
        // a native executable.
        let name = path.to_string_lossy();
        if kind.is_arch_independent() || name.ends_with(".o") || name.ends_with(".static") {
            return;
        }

        if SO_PATH_RE.is_match(&name) {
            aggregates.has_shared_library.store(true, Ordering::Relaxed);
        }
        if kind.is_executable && BIN_PATH_RE.is_match(&name) {
            aggregates.program_files.insert(path.to_path_buf());
        }

        let info = match self.inspect(package, path, file, &kind, sink) {
            Some(info) => info,
            None => return,
        };

        let ctx = CheckContext {
            package,
            path,
            file,
            files,
            kind: &kind,
            info: &info,
            config: self.config,
        };
        self.checks.par_iter().for_each(|check| {
            for diagnostic in check.run(&ctx) {
                sink.add_info(diagnostic);
            }
        });
    }

    /// Run the inspection tools for one file. Returns `None` when analysis
    /// cannot or must not continue; tool failures are reported here and
    /// count as findings of their own.
    fn inspect(
        &self,
        package: &PackageMeta,
        path: &Path,
        file: &FileInfo,
        kind: &BinaryKind,
        sink: &dyn DiagnosticSink,
    ) -> Option<BinaryInfo> {
        let disk_path = file.disk_path.as_path();
        let mut info = BinaryInfo::default();

        if kind.is_archive {
            let members = match ArchiveMembers::parse(self.tools, disk_path) {
                Ok(members) => members,
                Err(failure) => return self.fail(path, failure, sink),
            };
            if members.is_foreign() {
                return None;
            }
            info.sections = match SectionInfo::parse(self.tools, disk_path) {
                Ok(sections) => sections,
                Err(failure) => return self.fail(path, failure, sink),
            };
            info.symbols = match SymbolTable::parse(self.tools, disk_path) {
                Ok(symbols) => symbols,
                Err(failure) => return self.fail(path, failure, sink),
            };
        } else {
            info.sections = match SectionInfo::parse(self.tools, disk_path) {
                Ok(sections) => sections,
                Err(failure) => return self.fail(path, failure, sink),
            };
            info.program_headers = match ElfProgramHeader::parse(self.tools, disk_path) {
                Ok(headers) => headers,
                Err(failure) => return self.fail(path, failure, sink),
            };
            info.dynamic = match DynamicSection::parse(self.tools, disk_path) {
                Ok(dynamic) => dynamic,
                Err(failure) => return self.fail(path, failure, sink),
            };
            info.symbols = match SymbolTable::parse(self.tools, disk_path) {
                Ok(symbols) => symbols,
                Err(failure) => return self.fail(path, failure, sink),
            };
            info.comments = match Comments::parse(self.tools, disk_path) {
                Ok(comments) => comments,
                Err(failure) => return self.fail(path, failure, sink),
            };

            // A chroot caller is only in the clear when the listing shows
            // a chdir right next to it; without the listing the finding
            // stands.
            if info.symbols.has_function_matching(&CHROOT_RE)
                && info.symbols.has_function_matching(&CHDIR_RE)
            {
                match Disassembly::parse(self.tools, disk_path) {
                    Ok(disassembly) => info.disassembly = Some(disassembly),
                    Err(failure) => self.report(path, &failure, sink),
                }
            }

            // The producer inspection costs a full DWARF walk; skip it
            // unless the policy actually asks for flags.
            if !self.config.mandatory_optflags.is_empty() {
                match CompileUnits::parse(self.tools, disk_path) {
                    Ok(units) => info.compile_units = units,
                    Err(failure) => self.report(path, &failure, sink),
                }
            }

            if package.is_installed && !is_debug_file(path) {
                match DependencyInfo::parse(self.tools, disk_path) {
                    Ok(dependencies) => info.dependencies = dependencies,
                    Err(failure) => self.report(path, &failure, sink),
                }
            }
        }

        if self.needs_waiver_scan(&info.symbols) {
            match EmbeddedStrings::parse(self.tools, disk_path) {
                Ok(strings) => info.strings = Some(strings),
                // The finding stands unwaived when the haystack is missing.
                Err(failure) => self.report(path, &failure, sink),
            }
        }
        Some(info)
    }

    /// Whether any waiverable forbidden call is present, requiring the
    /// embedded strings as waiver haystack.
    fn needs_waiver_scan(&self, symbols: &SymbolTable) -> bool {
        self.config
            .forbidden_calls
            .iter()
            .any(|f| f.waiver.is_some() && symbols.has_function_matching(&f.call))
    }

    fn fail(
        &self,
        path: &Path,
        failure: ParseFailure,
        sink: &dyn DiagnosticSink,
    ) -> Option<BinaryInfo> {
        self.report(path, &failure, sink);
        None
    }

    fn report(&self, path: &Path, failure: &ParseFailure, sink: &dyn DiagnosticSink) {
        match failure {
            // Not every binary-looking file is ELF; nothing to report.
            ParseFailure::NotElf => {}
            ParseFailure::Tool { message, .. } => {
                sink.add_info(Diagnostic::error(
                    failure.code(),
                    path,
                    vec![message.clone()],
                ));
            }
        }
    }
}
