// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Per-file metadata as provided by the package reader.

use serde::Serialize;
use std::path::PathBuf;

/// Metadata for one file in a package.
///
/// `magic` is the short file-type descriptor from the oracle; `linkto` is
/// the raw symlink target exactly as stored in the package (it may be
/// relative, and is compared verbatim by the ldconfig-symlink check).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub mode: u32,
    pub magic: String,
    pub linkto: Option<String>,
    /// Where the file actually lives on disk, for the inspection tools.
    pub disk_path: PathBuf,
}

impl FileInfo {
    /// A regular file with the given descriptor, located at its package path.
    #[must_use]
    pub fn regular(magic: impl Into<String>, disk_path: impl Into<PathBuf>) -> Self {
        Self {
            mode: 0o100_755,
            magic: magic.into(),
            linkto: None,
            disk_path: disk_path.into(),
        }
    }

    /// A symlink with the given raw target.
    #[must_use]
    pub fn symlink(target: impl Into<String>, disk_path: impl Into<PathBuf>) -> Self {
        Self {
            mode: 0o120_777,
            magic: String::new(),
            linkto: Some(target.into()),
            disk_path: disk_path.into(),
        }
    }

    #[must_use]
    pub fn is_symlink(&self) -> bool {
        self.linkto.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let file = FileInfo::regular("ASCII text", "/usr/share/doc/README");
        assert!(!file.is_symlink());
        assert_eq!(file.magic, "ASCII text");

        let link = FileInfo::symlink("libfoo.so.1.2.3", "/usr/lib64/libfoo.so.1");
        assert!(link.is_symlink());
        assert_eq!(link.linkto.as_deref(), Some("libfoo.so.1.2.3"));
    }
}
