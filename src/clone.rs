// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Clone pipeline.
//!
//! A __clone__ copies a template's source tree into a new project directory,
//! substituting the placeholder token with the new project name in every path
//! and in the content of every text file.
//!
//! # Pipeline
//!
//! The [`TreeWalker`] drives everything. Each visited entry gets its
//! destination path computed by [`rewrite_path`], and is then materialized:
//! directories are created, files are read, rewritten, and written back out
//! with their original permission bits, and symlinks are recreated with their
//! target rewritten. Entries are processed one at a time, in walk order, and
//! the first failure stops the whole clone.
//!
//! Newly created directories stay writable by their owner while the walk is
//! running. Their exact source permission bits are applied once every entry
//! has been written, deepest directory first, so a read-only template
//! directory can still be filled.
//!
//! # Write Modes
//!
//! With [`WriteMode::Direct`], the default, entries land in the project
//! directory right away. A failure leaves whatever was already written behind
//! as-is.
//!
//! With [`WriteMode::Staged`] the tree is first materialized into a hidden
//! staging directory inside the destination root. Only after the entire
//! source tree went through does the staged tree get moved into place. Any
//! failure before that point removes the staging directory, leaving the
//! destination untouched.

use crate::{
    config::{CloneSettings, WriteMode},
    materialize::{self, ensure_dir, set_dir_mode, write_file, write_symlink},
    path::{project_dir, validate_project_name, InvalidName, STAGE_PREFIX},
    rewrite::{rewrite_content, rewrite_link_target, rewrite_path, ContentClassifier},
    token::TokenMatcher,
    walk::{self, EntryKind, TreeEntry, TreeWalker},
};

use std::{
    borrow::Cow,
    fs::{canonicalize, read, read_link, rename},
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

/// Inputs of a single clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneRequest {
    /// Name of the new project, used verbatim as the replacement.
    pub name: String,

    /// Directory under which the project directory gets created.
    pub destination: PathBuf,

    /// Root of template source tree.
    pub source: PathBuf,
}

impl CloneRequest {
    /// Construct new clone request of current working directory.
    pub fn new(name: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            destination: destination.into(),
            source: PathBuf::from("."),
        }
    }

    /// Clone from target source tree instead of current working directory.
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = source.into();
        self
    }
}

/// Summary of a finished clone.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CloneReport {
    /// Project directory holding the clone.
    pub project_dir: PathBuf,

    pub directories: usize,
    pub files: usize,
    pub symlinks: usize,

    /// Files whose content changed through substitution.
    pub rewritten: usize,

    /// Files copied verbatim because they were classified as binary.
    pub binary: usize,
}

/// Directory created by a clone, still waiting for its exact permission bits.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingDir {
    path: PathBuf,
    mode: u32,
}

/// Clone pipeline configured from clone settings.
#[derive(Debug, Clone)]
pub struct Cloner {
    matcher: TokenMatcher,
    classifier: ContentClassifier,
    write_mode: WriteMode,
    exclude: Vec<String>,
    dry_run: bool,
}

impl Default for Cloner {
    fn default() -> Self {
        Self::new(&CloneSettings::default())
    }
}

impl Cloner {
    /// Construct new cloner.
    pub fn new(settings: &CloneSettings) -> Self {
        let classifier = ContentClassifier::new(settings.binary_extensions.iter().flatten())
            .skip_binary(settings.skip_binary);

        Self {
            matcher: TokenMatcher::new(settings.case_policy),
            classifier,
            write_mode: settings.write_mode,
            exclude: settings.exclude.clone().unwrap_or_default(),
            dry_run: false,
        }
    }

    /// Only compute and log destination paths, write nothing.
    pub fn dry_run(mut self, yes: bool) -> Self {
        self.dry_run = yes;
        self
    }

    /// Clone source tree into new project directory.
    ///
    /// # Errors
    ///
    /// - Return [`CloneError::InvalidName`] if project name is unusable.
    /// - Return [`CloneError::Walk`] if source tree cannot be walked.
    /// - Return [`CloneError::Read`] if a source file cannot be read.
    /// - Return [`CloneError::UnsupportedEntry`] if the source tree holds a
    ///   special file.
    /// - Return [`CloneError::Materialize`] if a destination entry cannot be
    ///   written.
    /// - Return [`CloneError::Stage`] if staging fails.
    #[instrument(skip(self), level = "debug")]
    pub fn clone_tree(&self, request: &CloneRequest) -> Result<CloneReport> {
        validate_project_name(&request.name)?;
        let project = project_dir(&request.destination, &request.name);
        info!(
            "creating new instance as {} in directory {}",
            request.name,
            project.display()
        );

        if self.dry_run {
            let walker = self.walker(&request.source, &[])?;
            let (report, _) = self.run(walker, &project, &request.name)?;
            return Ok(report);
        }

        ensure_dir(&request.destination, 0o755)?;
        let dest_root = canonicalize(&request.destination).map_err(|err| CloneError::Stage {
            source: err,
            path: request.destination.clone(),
        })?;
        let project = project_dir(&dest_root, &request.name);

        match self.write_mode {
            WriteMode::Direct => {
                let walker = self.walker(&request.source, &[project.clone()])?;
                let (report, pending) = self.run(walker, &project, &request.name)?;
                finalize_dirs(&pending)?;
                Ok(report)
            }
            WriteMode::Staged => self.run_staged(request, &dest_root, project),
        }
    }

    fn run_staged(
        &self,
        request: &CloneRequest,
        dest_root: &Path,
        project: PathBuf,
    ) -> Result<CloneReport> {
        let stage = tempfile::Builder::new()
            .prefix(STAGE_PREFIX)
            .tempdir_in(dest_root)
            .map_err(|err| CloneError::Stage {
                source: err,
                path: dest_root.to_path_buf(),
            })?;
        let staged_project = stage.path().join(&request.name);
        debug!("staging clone in {}", stage.path().display());

        let walker = self.walker(&request.source, &[project.clone(), stage.path().to_path_buf()])?;
        let (mut report, pending) = self.run(walker, &staged_project, &request.name)?;

        // INVARIANT: Directories already in the destination keep their bits.
        let pending = pending
            .into_iter()
            .filter_map(|dir| {
                let relative = dir.path.strip_prefix(&staged_project).ok()?;
                let path = project.join(relative);
                (!path.exists()).then_some(PendingDir { path, ..dir })
            })
            .collect::<Vec<_>>();

        commit(&staged_project, &project)?;
        finalize_dirs(&pending)?;
        report.project_dir = project;

        Ok(report)
    }

    fn walker(&self, source: &Path, skip: &[PathBuf]) -> Result<TreeWalker> {
        let builder = skip.iter().fold(
            TreeWalker::builder(source).exclude_patterns(self.exclude.iter()),
            |builder, path| builder.skip_path(path),
        );
        Ok(builder.build()?)
    }

    fn run(
        &self,
        walker: TreeWalker,
        project: &Path,
        name: &str,
    ) -> Result<(CloneReport, Vec<PendingDir>)> {
        let mut report = CloneReport {
            project_dir: project.to_path_buf(),
            ..CloneReport::default()
        };
        let mut pending = Vec::new();

        for entry in walker {
            let entry = entry?;
            let dest = rewrite_path(&self.matcher, entry.relative(), project, name);
            if self.dry_run {
                info!("{} -> {}", entry.relative().display(), dest.display());
                tally(&mut report, &entry);
                continue;
            }

            if let Some(dir) = self.materialize(&entry, &dest, name, &mut report)? {
                pending.push(dir);
            }
        }

        info!(
            "cloned {} directories, {} files, {} symlinks into {}",
            report.directories,
            report.files,
            report.symlinks,
            report.project_dir.display()
        );

        Ok((report, pending))
    }

    fn materialize(
        &self,
        entry: &TreeEntry,
        dest: &Path,
        name: &str,
        report: &mut CloneReport,
    ) -> Result<Option<PendingDir>> {
        let mut pending = None;
        match entry.kind() {
            EntryKind::Directory => {
                if ensure_dir(dest, entry.mode())? {
                    pending = Some(PendingDir {
                        path: dest.to_path_buf(),
                        mode: entry.mode(),
                    });
                }
            }
            EntryKind::File => {
                let content = read(entry.source()).map_err(|err| CloneError::Read {
                    source: err,
                    path: entry.source().to_path_buf(),
                })?;

                let content = if self.classifier.should_rewrite(entry.source(), &content) {
                    rewrite_content(&self.matcher, &content, name)
                } else {
                    debug!("copy binary file verbatim: {}", entry.relative().display());
                    report.binary += 1;
                    Cow::Borrowed(content.as_slice())
                };

                if let Cow::Owned(_) = content {
                    report.rewritten += 1;
                }

                debug!("write {}", dest.display());
                write_file(dest, &content, entry.mode())?;
            }
            EntryKind::Symlink => {
                let target = read_link(entry.source()).map_err(|err| CloneError::Read {
                    source: err,
                    path: entry.source().to_path_buf(),
                })?;
                let target = rewrite_link_target(&self.matcher, &target, name);
                debug!("link {} -> {}", dest.display(), target.display());
                write_symlink(dest, target)?;
            }
            EntryKind::Other => {
                return Err(CloneError::UnsupportedEntry {
                    path: entry.source().to_path_buf(),
                });
            }
        }

        tally(report, entry);

        Ok(pending)
    }
}

/// Clone a source tree with default settings.
///
/// # Errors
///
/// - Return [`CloneError`] on the first failure in the pipeline.
pub fn clone_tree(request: &CloneRequest) -> Result<CloneReport> {
    Cloner::default().clone_tree(request)
}

/// Apply exact permission bits to created directories, deepest first.
fn finalize_dirs(pending: &[PendingDir]) -> Result<()> {
    for dir in pending.iter().rev() {
        debug!("set mode {:o} on {}", dir.mode, dir.path.display());
        set_dir_mode(&dir.path, dir.mode)?;
    }

    Ok(())
}

fn tally(report: &mut CloneReport, entry: &TreeEntry) {
    match entry.kind() {
        EntryKind::Directory => report.directories += 1,
        EntryKind::File => report.files += 1,
        EntryKind::Symlink => report.symlinks += 1,
        EntryKind::Other => {}
    }
}

/// Move staged project directory into its final location.
///
/// Renames the staged tree in one go when nothing exists at `project` yet.
/// Otherwise every staged entry is moved over the existing tree, overwriting
/// files that are already there.
#[instrument(level = "debug")]
fn commit(staged: &Path, project: &Path) -> Result<()> {
    if !project.exists() {
        debug!("move staged clone into {}", project.display());
        return rename(staged, project).map_err(|err| CloneError::Stage {
            source: err,
            path: project.to_path_buf(),
        });
    }

    info!("merge clone into existing directory {}", project.display());
    for entry in TreeWalker::new(staged)? {
        let entry = entry?;
        let dest = project.join(entry.relative());
        match entry.kind() {
            EntryKind::Directory => {
                ensure_dir(&dest, entry.mode())?;
            }
            _ => rename(entry.source(), &dest).map_err(|err| CloneError::Stage {
                source: err,
                path: dest.clone(),
            })?,
        }
    }

    Ok(())
}

/// Clone pipeline error types.
#[derive(Debug, thiserror::Error)]
pub enum CloneError {
    /// Project name cannot be used for a clone.
    #[error(transparent)]
    InvalidName(#[from] InvalidName),

    /// Source tree cannot be walked.
    #[error(transparent)]
    Walk(#[from] walk::Error),

    /// Source entry cannot be read.
    #[error("failed to read {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Source entry is neither directory, file, nor symlink.
    #[error("cannot clone special file {:?}", path.display())]
    UnsupportedEntry { path: PathBuf },

    /// Destination entry cannot be written.
    #[error(transparent)]
    Materialize(#[from] materialize::Error),

    /// Staging directory cannot be created or committed.
    #[error("failed to stage clone at {:?}", path.display())]
    Stage {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = CloneError> = std::result::Result<T, E>;
