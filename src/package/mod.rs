// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Read-only view of a package: its metadata and the files it ships.
//!
//! The auditor does not extract or parse package containers itself; it is
//! handed (or builds from an extracted tree) a map of package paths to
//! per-file metadata, which is all the rule engine reads.

mod files;

use std::collections::BTreeMap;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::{fs, io};
use thiserror::Error;
use walkdir::WalkDir;

pub use files::FileInfo;

use crate::tool::{Tool, ToolError, ToolRunner};

/// Collection of files in a package, keyed by their absolute package path.
pub type PackageFiles = BTreeMap<PathBuf, FileInfo>;

/// Result type for package-view operations.
pub type PackageResult<T> = std::result::Result<T, PackageError>;

/// Errors that can occur while building the package view.
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("Failed to walk package root: {path:?}")]
    WalkDirFailed {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("Failed to read file metadata: {path:?}")]
    MetadataFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to read symlink: {path:?}")]
    ReadSymlinkFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("File-type oracle failed for {path:?}")]
    FileTypeFailed {
        path: PathBuf,
        #[source]
        source: ToolError,
    },
    #[error("Package root contains no files: {path:?}")]
    Empty { path: PathBuf },
}

/// Identity of the package under audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMeta {
    pub name: String,
    pub arch: String,
    /// Dependency resolution (`ldd`) only makes sense for files that are
    /// actually installed on the host.
    pub is_installed: bool,
}

/// A package: metadata plus the files it ships.
pub struct Package {
    meta: PackageMeta,
    files: PackageFiles,
}

impl Package {
    /// Build the package view from an extracted tree on disk.
    ///
    /// Walks `root`, asking the file-type oracle for each regular file's
    /// descriptor and recording modes and symlink targets. Paths are keyed
    /// as absolute package paths (`/usr/bin/foo`), with the on-disk
    /// location kept alongside for the inspection tools.
    ///
    /// # Errors
    /// Returns an error if the walk fails, metadata cannot be read, or the
    /// root holds no files at all.
    pub fn from_root(
        root: &Path,
        meta: PackageMeta,
        tools: &dyn ToolRunner,
    ) -> PackageResult<Self> {
        let mut files = PackageFiles::new();
        for entry in WalkDir::new(root) {
            let entry = entry.map_err(|e| PackageError::WalkDirFailed {
                path: root.to_path_buf(),
                source: e,
            })?;
            if !entry.file_type().is_file() && !entry.file_type().is_symlink() {
                continue;
            }
            let disk_path = entry.path();
            let package_path = package_path(root, disk_path);
            let file = FileInfo::from_disk(disk_path, tools)?;
            files.insert(package_path, file);
        }

        if files.is_empty() {
            return Err(PackageError::Empty {
                path: root.to_path_buf(),
            });
        }
        Ok(Self { meta, files })
    }

    #[must_use]
    pub fn meta(&self) -> &PackageMeta {
        &self.meta
    }

    #[must_use]
    pub fn files(&self) -> &PackageFiles {
        &self.files
    }

    /// Create a package view directly from file metadata.
    ///
    /// This is how an external package reader hands its contents over, and
    /// how tests construct synthetic packages.
    #[must_use]
    pub fn from_files(meta: PackageMeta, files: PackageFiles) -> Self {
        Self { meta, files }
    }
}

/// Map an on-disk location under the extraction root to the absolute path
/// the file will have once the package is installed.
fn package_path(root: &Path, disk_path: &Path) -> PathBuf {
    match disk_path.strip_prefix(root) {
        Ok(stripped) => Path::new("/").join(stripped),
        Err(_) => disk_path.to_path_buf(),
    }
}

impl FileInfo {
    fn from_disk(disk_path: &Path, tools: &dyn ToolRunner) -> PackageResult<Self> {
        let metadata =
            fs::symlink_metadata(disk_path).map_err(|e| PackageError::MetadataFailed {
                path: disk_path.to_path_buf(),
                source: e,
            })?;

        let linkto = if metadata.file_type().is_symlink() {
            let target = fs::read_link(disk_path).map_err(|e| PackageError::ReadSymlinkFailed {
                path: disk_path.to_path_buf(),
                source: e,
            })?;
            Some(target.to_string_lossy().into_owned())
        } else {
            None
        };

        // Symlinks get no descriptor; the oracle would follow them.
        let magic = if linkto.is_some() {
            String::new()
        } else {
            tools
                .run(Tool::File, &["-b"], disk_path)
                .map_err(|e| PackageError::FileTypeFailed {
                    path: disk_path.to_path_buf(),
                    source: e,
                })?
                .lines()
                .next()
                .unwrap_or_default()
                .trim()
                .to_string()
        };

        Ok(Self {
            mode: metadata.mode(),
            magic,
            linkto,
            disk_path: disk_path.to_path_buf(),
        })
    }
}
