// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Write rewritten entries to disk.
//!
//! Each function here materializes exactly one destination entry. Nothing is
//! rolled back on failure, so callers that need all-or-nothing semantics must
//! materialize into a staging area first.

use std::{
    fs::{self, DirBuilder, OpenOptions, Permissions},
    io::Write,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Permission bits a freshly created directory always keeps for its owner
/// until [`set_dir_mode`] applies the final bits.
pub const OWNER_ACCESS: u32 = 0o700;

/// Create directory and any missing ancestors.
///
/// Does nothing if `path` already is a directory. A freshly created directory
/// gets `mode` with [`OWNER_ACCESS`] added on top, so its children can still
/// be written. Apply the exact bits with [`set_dir_mode`] once the directory
/// is filled.
///
/// Returns `true` if the directory had to be created.
///
/// # Errors
///
/// - Return [`Error::CreateDir`] if the directory cannot be created, e.g.,
///   a regular file already occupies `path`.
/// - Return [`Error::SetPermissions`] if permission bits cannot be applied.
pub fn ensure_dir(path: impl AsRef<Path>, mode: u32) -> Result<bool> {
    let path = path.as_ref();
    if path.is_dir() {
        return Ok(false);
    }

    debug!("directory does not exist, creating: {}", path.display());
    let mode = mode | OWNER_ACCESS;
    dir_builder(mode)
        .create(path)
        .map_err(|err| Error::CreateDir {
            source: err,
            path: path.to_path_buf(),
        })?;
    set_mode(path, mode)?;

    Ok(true)
}

/// Apply exact permission bits to a directory.
///
/// # Errors
///
/// - Return [`Error::SetPermissions`] if permission bits cannot be applied.
pub fn set_dir_mode(path: impl AsRef<Path>, mode: u32) -> Result<()> {
    set_mode(path.as_ref(), mode)
}

/// Write file content, overwriting any existing file at `path`.
///
/// Permission bits of the written file are set to exactly `mode`.
///
/// # Errors
///
/// - Return [`Error::WriteFile`] if content cannot be written.
/// - Return [`Error::SetPermissions`] if permission bits cannot be applied.
pub fn write_file(path: impl AsRef<Path>, content: impl AsRef<[u8]>, mode: u32) -> Result<()> {
    let path = path.as_ref();
    let wrap = |err| Error::WriteFile {
        source: err,
        path: path.to_path_buf(),
    };

    let mut file = open_options(mode).open(path).map_err(wrap)?;
    file.write_all(content.as_ref()).map_err(wrap)?;
    set_mode(path, mode)
}

/// Create symbolic link at `path` pointing to `target`.
///
/// Replaces whatever non-directory entry already sits at `path`.
///
/// # Errors
///
/// - Return [`Error::Symlink`] if the link cannot be created.
pub fn write_symlink(path: impl AsRef<Path>, target: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let wrap = |err| Error::Symlink {
        source: err,
        path: path.to_path_buf(),
    };

    if fs::symlink_metadata(path).is_ok_and(|meta| !meta.is_dir()) {
        fs::remove_file(path).map_err(wrap)?;
    }

    symlink(target.as_ref(), path).map_err(wrap)
}

#[cfg(unix)]
fn dir_builder(mode: u32) -> DirBuilder {
    use std::os::unix::fs::DirBuilderExt;
    let mut builder = DirBuilder::new();
    builder.recursive(true).mode(mode);
    builder
}

#[cfg(not(unix))]
fn dir_builder(_mode: u32) -> DirBuilder {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    builder
}

#[cfg(unix)]
fn open_options(mode: u32) -> OpenOptions {
    use std::os::unix::fs::OpenOptionsExt;
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true).mode(mode);
    options
}

#[cfg(not(unix))]
fn open_options(_mode: u32) -> OpenOptions {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    options
}

// INVARIANT: Apply mode after creation so umask cannot strip bits.
#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, Permissions::from_mode(mode)).map_err(|err| Error::SetPermissions {
        source: err,
        path: path.to_path_buf(),
    })
}

#[cfg(not(unix))]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    let mut permissions: Permissions = fs::metadata(path)
        .map_err(|err| Error::SetPermissions {
            source: err,
            path: path.to_path_buf(),
        })?
        .permissions();
    permissions.set_readonly(mode & 0o222 == 0);
    fs::set_permissions(path, permissions).map_err(|err| Error::SetPermissions {
        source: err,
        path: path.to_path_buf(),
    })
}

#[cfg(unix)]
fn symlink(target: &Path, path: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, path)
}

#[cfg(windows)]
fn symlink(target: &Path, path: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, path)
}

/// Materialization error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Directory cannot be created.
    #[error("failed to create directory {:?}", path.display())]
    CreateDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// File content cannot be written.
    #[error("failed to write file {:?}", path.display())]
    WriteFile {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Symbolic link cannot be created.
    #[error("failed to create symlink {:?}", path.display())]
    Symlink {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Permission bits cannot be applied.
    #[error("failed to set permissions of {:?}", path.display())]
    SetPermissions {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;
