// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! A static auditor for compiled binaries shipped in software packages.
//!
//! This crate provides functionality to:
//! - Build a read-only view of a package's files and their types
//! - Parse the textual reports of the object-inspection tools
//!   (`readelf`, `objdump`, `ldd`, `ar`, `strings`) into typed models
//! - Evaluate a fixed set of packaging and security policy checks
//! - Collect and report diagnostics per file and per package

pub mod check;
pub mod config;
pub mod diagnostic;
pub mod engine;
pub mod magic;
pub mod package;
pub mod parser;
pub mod report;
pub mod tool;

// Re-export key types for convenience
pub use config::RuleConfig;
pub use diagnostic::{CollectingSink, Diagnostic, DiagnosticSink, Severity};
pub use engine::Engine;
pub use magic::BinaryKind;
pub use package::{FileInfo, Package, PackageFiles, PackageMeta};
pub use report::Report;
