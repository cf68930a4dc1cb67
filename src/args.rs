// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "binlint")]
#[command(version)]
#[command(about = "Audits compiled binaries in an extracted package tree for packaging defects")]
pub(crate) struct Args {
    /// Root directory of the extracted package tree to audit.
    pub root: PathBuf,

    /// Package name, as used by the library naming-policy checks.
    /// Defaults to the root directory's name.
    #[arg(long)]
    pub package_name: Option<String>,

    /// Package architecture; the executable-stack policy only applies to
    /// x86-family architectures.
    #[arg(long, default_value = "x86_64")]
    pub arch: String,

    /// The package is installed on this host, enabling the dynamic-loader
    /// resolution checks (ldd).
    #[arg(long)]
    pub installed: bool,

    /// Path to a JSON rule configuration overriding the built-in policy.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Path to the file to write the audit results in JSON format.
    #[arg(long)]
    pub report: Option<PathBuf>,
}
