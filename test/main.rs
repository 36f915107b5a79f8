// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT


use anyhow::Result;
use std::{
    fs::{create_dir_all, read, write},
    path::{Path, PathBuf},
};
use tempfile::TempDir;

/// Template source tree laid out on disk for a test.
pub(crate) struct TemplateFixture {
    root: TempDir,
}

impl TemplateFixture {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            root: tempfile::tempdir()?,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        self.root.path()
    }

    pub(crate) fn dir(self, path: impl AsRef<Path>) -> Result<Self> {
        create_dir_all(self.root.path().join(path))?;
        Ok(self)
    }

    pub(crate) fn file(self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<Self> {
        let path = self.root.path().join(path);

        // INVARIANT: Parent directories always exist before the file does.
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }
        write(path, contents)?;
        Ok(self)
    }

    #[cfg(unix)]
    pub(crate) fn mode(self, path: impl AsRef<Path>, mode: u32) -> Result<Self> {
        use std::{
            fs::{set_permissions, Permissions},
            os::unix::fs::PermissionsExt,
        };
        set_permissions(self.root.path().join(path), Permissions::from_mode(mode))?;
        Ok(self)
    }
}

/// Destination directory for a clone.
pub(crate) struct Destination {
    root: TempDir,
}

impl Destination {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            root: tempfile::tempdir()?,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        self.root.path()
    }

    pub(crate) fn join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.path().join(path)
    }

    pub(crate) fn read(&self, path: impl AsRef<Path>) -> Result<Vec<u8>> {
        Ok(read(self.join(path))?)
    }

    /// List every entry under destination root, relative to it.
    pub(crate) fn listing(&self) -> Result<Vec<String>> {
        let mut entries = Vec::new();
        for entry in sprout::walk::TreeWalker::new(self.path())? {
            let entry = entry?;
            if !entry.relative().as_os_str().is_empty() {
                entries.push(entry.relative().display().to_string());
            }
        }
        Ok(entries)
    }
}

#[cfg(unix)]
pub(crate) fn mode_of(path: impl AsRef<Path>) -> Result<u32> {
    use std::os::unix::fs::PermissionsExt;
    Ok(std::fs::metadata(path)?.permissions().mode() & 0o7777)
}
