// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine where a clone lands on disk, and make sure the project name can
//! safely be used as a directory name.

use std::path::{Component, Path, PathBuf};

/// Prefix of staging directories created inside a destination root.
pub const STAGE_PREFIX: &str = ".sprout-stage-";

/// Check that project name is usable as a single directory name.
///
/// The name itself is never normalized. It is only rejected when it would
/// place the clone somewhere other than directly under the destination root.
///
/// # Errors
///
/// - Return [`InvalidName`] if name is empty, or is not exactly one normal
///   path component.
pub fn validate_project_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(InvalidName::new(name, "project name cannot be empty"));
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == name => Ok(()),
        _ => Err(InvalidName::new(
            name,
            "project name must be a single directory name",
        )),
    }
}

/// Determine absolute path of project directory of a clone.
///
/// Does not check if the path returned actually exists.
pub fn project_dir(dest_root: impl AsRef<Path>, name: &str) -> PathBuf {
    dest_root.as_ref().join(name)
}

/// Project name cannot be used for a clone.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid project name {name:?}: {reason}")]
pub struct InvalidName {
    pub name: String,
    pub reason: &'static str,
}

impl InvalidName {
    fn new(name: &str, reason: &'static str) -> Self {
        Self {
            name: name.to_owned(),
            reason,
        }
    }
}

/// Friendly result alias :3
pub type Result<T, E = InvalidName> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    #[test_case("myapp"; "plain")]
    #[test_case("my-app"; "hyphenated")]
    #[test_case("My App"; "spaces kept verbatim")]
    #[test_case(".hidden"; "dotfile")]
    #[test]
    fn accept_project_name(name: &str) {
        assert_eq!(validate_project_name(name), Ok(()));
    }

    #[test_case(""; "empty")]
    #[test_case("."; "current dir")]
    #[test_case(".."; "parent dir")]
    #[test_case("a/b"; "nested")]
    #[test_case("/abs"; "absolute")]
    #[test_case("app/"; "trailing separator")]
    #[test]
    fn reject_project_name(name: &str) {
        assert!(validate_project_name(name).is_err());
    }
}
