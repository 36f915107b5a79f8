// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Source tree traversal.
//!
//! Walk a template's source tree in pre-order, yielding one [`TreeEntry`] per
//! filesystem object. Directories are always yielded before anything nested
//! inside of them, and siblings come out sorted by file name so that repeated
//! clones of the same template behave the same way.
//!
//! # Exclusions
//!
//! The version control directory `.git` at the top-level of the source tree
//! is never yielded, and never descended into. Callers can exclude more of the
//! tree through gitignore-style patterns, or by naming absolute paths that must
//! be skipped, e.g., a destination directory that happens to live inside the
//! source tree.

use ignore::{
    gitignore::{Gitignore, GitignoreBuilder},
    Walk, WalkBuilder,
};
use std::{
    fs::{canonicalize, Metadata},
    path::{Path, PathBuf},
    sync::Arc,
};

/// Name of version control metadata directory to skip.
pub const VCS_DIR: &str = ".git";

/// Kind of filesystem object found in source tree.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
    Symlink,

    /// Sockets, FIFOs, device nodes, etc.
    Other,
}

/// Single object visited in source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    source: PathBuf,
    relative: PathBuf,
    kind: EntryKind,
    mode: u32,
}

impl TreeEntry {
    /// Absolute path of entry in source tree.
    pub fn source(&self) -> &Path {
        self.source.as_path()
    }

    /// Path of entry relative to source root.
    ///
    /// The source root itself has an empty relative path.
    pub fn relative(&self) -> &Path {
        self.relative.as_path()
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Permission bits of entry.
    pub fn mode(&self) -> u32 {
        self.mode
    }
}

/// Lazy pre-order walker over a source tree.
///
/// Single pass. The walk ends with the first error it yields, and every call
/// to `next` after that returns `None`.
pub struct TreeWalker {
    root: PathBuf,
    walk: Walk,
    failed: bool,
}

impl TreeWalker {
    /// Start walking source tree at `root`.
    ///
    /// # Errors
    ///
    /// - Return [`Error::Root`] if `root` cannot be resolved.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        TreeWalkerBuilder::new(root).build()
    }

    pub fn builder(root: impl AsRef<Path>) -> TreeWalkerBuilder {
        TreeWalkerBuilder::new(root)
    }

    fn to_entry(&self, entry: ignore::DirEntry) -> Result<TreeEntry> {
        let source = entry.path().to_path_buf();
        let metadata = entry.metadata().map_err(|err| Error::Traverse {
            source: err,
            path: source.clone(),
        })?;

        // INVARIANT: Walk only yields paths nested under the root it was given.
        let relative = source
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok(TreeEntry {
            kind: kind_of(&metadata),
            mode: mode_of(&metadata),
            source,
            relative,
        })
    }
}

impl Iterator for TreeWalker {
    type Item = Result<TreeEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let entry = self
            .walk
            .next()?
            .map_err(|err| Error::Traverse {
                path: err_path(&err).unwrap_or_else(|| self.root.clone()),
                source: err,
            })
            .and_then(|entry| self.to_entry(entry));
        self.failed = entry.is_err();

        Some(entry)
    }
}

impl std::iter::FusedIterator for TreeWalker {}

/// Configure a [`TreeWalker`] before walking.
#[derive(Debug, Clone)]
pub struct TreeWalkerBuilder {
    root: PathBuf,
    patterns: Vec<String>,
    skip_paths: Vec<PathBuf>,
}

impl TreeWalkerBuilder {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            patterns: Vec::new(),
            skip_paths: Vec::new(),
        }
    }

    /// Exclude entries matching gitignore-style patterns.
    pub fn exclude_patterns(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Exclude an absolute path along with everything beneath it.
    pub fn skip_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.skip_paths.push(path.into());
        self
    }

    /// Build new tree walker.
    ///
    /// # Errors
    ///
    /// - Return [`Error::Root`] if source root cannot be resolved.
    /// - Return [`Error::Pattern`] if an exclusion pattern is invalid.
    pub fn build(self) -> Result<TreeWalker> {
        let root = canonicalize(&self.root).map_err(|err| Error::Root {
            source: err,
            path: self.root.clone(),
        })?;

        let mut builder = GitignoreBuilder::new(&root);
        for pattern in &self.patterns {
            builder.add_line(None, pattern).map_err(|err| Error::Pattern {
                source: err,
                pattern: pattern.clone(),
            })?;
        }
        let excludes = Arc::new(builder.build().map_err(|err| Error::Pattern {
            source: err,
            pattern: self.patterns.join(", "),
        })?);
        let skip_paths = Arc::new(self.skip_paths);

        let filter_root = root.clone();
        let walk = WalkBuilder::new(&root)
            .standard_filters(false)
            .hidden(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                keep_entry(entry, &filter_root, &excludes, &skip_paths)
            })
            .build();

        Ok(TreeWalker {
            root,
            walk,
            failed: false,
        })
    }
}

fn keep_entry(
    entry: &ignore::DirEntry,
    root: &Path,
    excludes: &Gitignore,
    skip_paths: &[PathBuf],
) -> bool {
    // INVARIANT: Root is always yielded.
    if entry.depth() == 0 {
        return true;
    }

    if entry.depth() == 1 && entry.file_name() == VCS_DIR {
        return false;
    }

    let path = entry.path();
    if skip_paths.iter().any(|skip| skip == path) {
        return false;
    }

    let is_dir = entry.file_type().is_some_and(|kind| kind.is_dir());
    let relative = path.strip_prefix(root).unwrap_or(path);
    !excludes.matched(relative, is_dir).is_ignore()
}

fn err_path(err: &ignore::Error) -> Option<PathBuf> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.clone()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            err_path(err)
        }
        _ => None,
    }
}

fn kind_of(metadata: &Metadata) -> EntryKind {
    let file_type = metadata.file_type();
    if file_type.is_symlink() {
        EntryKind::Symlink
    } else if file_type.is_dir() {
        EntryKind::Directory
    } else if file_type.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    }
}

#[cfg(unix)]
fn mode_of(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn mode_of(metadata: &Metadata) -> u32 {
    match (metadata.is_dir(), metadata.permissions().readonly()) {
        (true, _) => 0o755,
        (false, true) => 0o444,
        (false, false) => 0o644,
    }
}

/// Tree traversal error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Source root cannot be resolved.
    #[error("failed to resolve source root {:?}", path.display())]
    Root {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Exclusion pattern cannot be parsed.
    #[error("invalid exclusion pattern {pattern:?}")]
    Pattern {
        #[source]
        source: ignore::Error,
        pattern: String,
    },

    /// Source tree cannot be enumerated further.
    #[error("failed to walk source tree at {:?}", path.display())]
    Traverse {
        #[source]
        source: ignore::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;
