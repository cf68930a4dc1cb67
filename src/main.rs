// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.
mod args;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::Path;

use args::Args;
use binlint::config::RuleConfig;
use binlint::diagnostic::CollectingSink;
use binlint::engine::Engine;
use binlint::package::{Package, PackageMeta};
use binlint::report::{summarize_report, Report};
use binlint::tool::SystemTools;

fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let meta = PackageMeta {
        name: args
            .package_name
            .unwrap_or_else(|| directory_name(&args.root)),
        arch: args.arch,
        is_installed: args.installed,
    };
    let package = read_package(&args.root, meta)?;

    eprintln!(
        "Auditing package: name={}, files={}",
        package.meta().name,
        package.files().len()
    );
    let sink = CollectingSink::new();
    Engine::new(&config, &SystemTools).audit(&package, &sink);

    let report = Report::new(package.meta(), sink.into_diagnostics());
    if let Some(dest) = args.report.as_deref() {
        eprintln!("Writing report to file: file={}", dest.display());
        report
            .write_json(dest)
            .with_context(|| format!("Failed to write JSON report: {}", dest.display()))?;
    }
    summarize_report(&report);

    if report.has_errors() {
        bail!("Audit failed: {} error(s)", report.error_count());
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<RuleConfig> {
    match path {
        Some(path) => RuleConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(RuleConfig::default()),
    }
}

/// Build the package view from the extracted tree.
///
/// # Errors
/// Returns an error if the tree cannot be walked or holds no files.
fn read_package(root: &Path, meta: PackageMeta) -> Result<Package> {
    eprintln!("Reading package tree: root={}", root.display());
    Package::from_root(root, meta, &SystemTools)
        .with_context(|| format!("Failed to read package tree: {}", root.display()))
}

fn directory_name(root: &Path) -> String {
    root.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string())
}
