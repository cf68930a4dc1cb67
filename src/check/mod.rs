// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! The policy checks and the context they evaluate against.
//!
//! Every check is a pure read of the context; the engine runs the fixed
//! registry over each analyzed file and forwards the findings to the sink.

mod calls;
mod hash;
mod linkage;
mod lto;
mod optflags;
mod pie;
mod rpath;
mod soname;
mod stack;
mod strip;

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

pub(crate) use calls::{CHDIR_RE, CHROOT_RE};

use crate::config::RuleConfig;
use crate::diagnostic::Diagnostic;
use crate::magic::BinaryKind;
use crate::package::{FileInfo, PackageFiles, PackageMeta};
use crate::parser::BinaryInfo;

/// Versioned shared-library path: `.../lib(64)/<name>.so[.N...]`.
pub(crate) static SO_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/lib(64)?/[^/]+\.so(\.[0-9]+)*$").expect("valid regex"));

/// Sonames a library may legitimately carry: `lib<x>.so.<N>` or `<x><N>.so`.
pub(crate) static VALID_SONAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\.so\.\d+(\.\d+)*|\d\.so)$").expect("valid regex"));

/// Extracts the numeric version from a soname, either side of `.so`.
pub(crate) static SOVERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r".*?([0-9][.0-9]*)\.so|.*\.so\.([0-9][.0-9]*).*").expect("valid regex")
});

/// The dynamic loader's own soname; exempt from dependency rules. The
/// x86-64 loader spells its soname with a hyphen (`ld-linux-x86-64.so.2`).
pub(crate) static LDSO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ld(-linux(-(ia|x86[-_])64))?\.so").expect("valid regex"));

/// Run paths under `/usr/lib(64)/` are accepted without configuration.
pub(crate) static USR_LIB_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/usr/lib(64)?/").expect("valid regex"));

/// Everything one check may look at for one file. Immutable for the whole
/// evaluation; checks never see each other's findings.
pub struct CheckContext<'a> {
    pub package: &'a PackageMeta,
    pub path: &'a Path,
    pub file: &'a FileInfo,
    /// All files of the package, for symlink lookups.
    pub files: &'a PackageFiles,
    pub kind: &'a BinaryKind,
    pub info: &'a BinaryInfo,
    pub config: &'a RuleConfig,
}

impl CheckContext<'_> {
    /// A shared object installed under a versioned library path.
    #[must_use]
    pub fn is_shared_lib(&self) -> bool {
        self.kind.is_shared_object && SO_PATH_RE.is_match(&self.path.to_string_lossy())
    }
}

/// One policy rule, evaluated per analyzed file.
pub trait BinaryCheck: Send + Sync {
    fn name(&self) -> &'static str;
    fn run(&self, ctx: &CheckContext) -> Vec<Diagnostic>;
}

/// The fixed check list. Order carries no meaning; findings are sorted by
/// the sink.
#[must_use]
pub fn registry() -> Vec<Box<dyn BinaryCheck>> {
    vec![
        Box::new(stack::StackCheck),
        Box::new(soname::SonameCheck),
        Box::new(rpath::RpathCheck),
        Box::new(pie::PieCheck),
        Box::new(calls::CallsCheck),
        Box::new(lto::ArchiveHygieneCheck),
        Box::new(lto::NonPicCheck),
        Box::new(linkage::LinkageCheck),
        Box::new(linkage::DependencyCheck),
        Box::new(hash::HashCheck),
        Box::new(optflags::OptflagsCheck),
        Box::new(strip::StripCheck),
    ]
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::path::{Path, PathBuf};

    use super::CheckContext;
    use crate::config::RuleConfig;
    use crate::magic::BinaryKind;
    use crate::package::{FileInfo, PackageFiles, PackageMeta};
    use crate::parser::BinaryInfo;

    /// Owns everything a `CheckContext` borrows.
    pub struct Fixture {
        pub package: PackageMeta,
        pub path: PathBuf,
        pub file: FileInfo,
        pub files: PackageFiles,
        pub kind: BinaryKind,
        pub info: BinaryInfo,
        pub config: RuleConfig,
    }

    impl Fixture {
        pub fn shared_library(path: &str) -> Self {
            Self::new(
                path,
                "ELF 64-bit LSB shared object, x86-64, version 1 (SYSV), dynamically linked",
            )
        }

        pub fn executable(path: &str) -> Self {
            Self::new(
                path,
                "ELF 64-bit LSB executable, x86-64, version 1 (SYSV), dynamically linked",
            )
        }

        pub fn archive(path: &str) -> Self {
            Self::new(path, "current ar archive")
        }

        pub fn new(path: &str, magic: &str) -> Self {
            let file = FileInfo::regular(magic, path);
            let mut files = PackageFiles::new();
            files.insert(PathBuf::from(path), file.clone());
            Self {
                package: PackageMeta {
                    name: "demo".to_string(),
                    arch: "x86_64".to_string(),
                    is_installed: false,
                },
                path: PathBuf::from(path),
                file,
                files,
                kind: BinaryKind::classify(magic).disambiguate(Path::new(path)),
                info: BinaryInfo::default(),
                config: RuleConfig::default(),
            }
        }

        pub fn context(&self) -> CheckContext<'_> {
            CheckContext {
                package: &self.package,
                path: &self.path,
                file: &self.file,
                files: &self.files,
                kind: &self.kind,
                info: &self.info,
                config: &self.config,
            }
        }
    }

    /// The codes of the findings, for compact assertions.
    pub fn codes(diagnostics: &[crate::diagnostic::Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.code.as_str()).collect()
    }
}
