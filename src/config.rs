// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the optional __template definition__ file that can
//! sit at the top-level of a source tree. The definition tweaks how sprout
//! clones that particular template.
//!
//! # General Layout
//!
//! A template definition only has a settings section for now:
//!
//! ```toml
//! [settings]
//! case_policy = "preserve"
//! write_mode = "staged"
//! skip_binary = true
//! binary_extensions = ["sqlite"]
//! exclude = ["target/", "*.log"]
//! ```
//!
//! Every field is optional. Missing fields fall back to their defaults.

use crate::token::CasePolicy;

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    io::ErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

/// File name of template definition at source root.
pub const DEFINITION_FILE: &str = ".sprout.toml";

/// Template definition layout.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct TemplateDefinition {
    /// Settings for cloning the template.
    #[serde(default)]
    pub settings: CloneSettings,
}

impl TemplateDefinition {
    /// Load template definition from source root.
    ///
    /// A missing definition file is not an error, the default definition is
    /// returned instead.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if the definition file exists but cannot
    ///   be read.
    /// - Return [`ConfigError::Deserialize`] if the definition is malformed.
    pub fn load(source_root: impl AsRef<Path>) -> Result<Self> {
        Self::load_file(source_root.as_ref().join(DEFINITION_FILE))
    }

    /// Load template definition from explicit file path.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if the definition file exists but cannot
    ///   be read.
    /// - Return [`ConfigError::Deserialize`] if the definition is malformed.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match read_to_string(path) {
            Ok(data) => {
                debug!("load template definition: {}", path.display());
                data.parse()
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no template definition at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(err) => Err(ConfigError::Read {
                source: err,
                path: path.to_path_buf(),
            }),
        }
    }
}

impl FromStr for TemplateDefinition {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        toml::de::from_str(data).map_err(ConfigError::Deserialize)
    }
}

impl Display for TemplateDefinition {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Template clone settings.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CloneSettings {
    /// How matched tokens are spelled in the clone.
    pub case_policy: CasePolicy,

    /// Whether the clone is staged before landing in the destination.
    pub write_mode: WriteMode,

    /// Copy content of binary files verbatim instead of rewriting it.
    pub skip_binary: bool,

    /// Extra file extensions to treat as binary when skipping binary files.
    pub binary_extensions: Option<Vec<String>>,

    /// Gitignore-style patterns of entries to leave out of the clone.
    pub exclude: Option<Vec<String>>,
}

/// Strategy for writing the clone to disk.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Materialize straight into the destination. A failure leaves whatever
    /// was already written behind.
    #[default]
    Direct,

    /// Materialize into a staging directory, and move into place only after
    /// the whole source tree was cloned.
    Staged,
}

/// Expand leading tilde and environment variables in a path.
///
/// # Errors
///
/// - Return [`ConfigError::ShellExpansion`] if a referenced variable is not
///   set.
pub fn expand_path(raw: impl AsRef<str>) -> Result<PathBuf> {
    Ok(PathBuf::from(
        shellexpand::full(raw.as_ref())
            .map_err(ConfigError::ShellExpansion)?
            .into_owned(),
    ))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read template definition.
    #[error("failed to read template definition at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[test]
    fn deserialize_template_definition() -> anyhow::Result<()> {
        let result: TemplateDefinition = r#"
            [settings]
            case_policy = "preserve"
            write_mode = "direct"
            binary_extensions = ["sqlite", "db"]
            exclude = ["target/"]
        "#
        .parse()?;

        let expect = TemplateDefinition {
            settings: CloneSettings {
                case_policy: CasePolicy::Preserve,
                write_mode: WriteMode::Direct,
                skip_binary: false,
                binary_extensions: Some(vec!["sqlite".into(), "db".into()]),
                exclude: Some(vec!["target/".into()]),
            },
        };

        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn empty_definition_uses_defaults() -> anyhow::Result<()> {
        let result: TemplateDefinition = "".parse()?;
        assert_eq!(result, TemplateDefinition::default());
        assert_eq!(result.settings.write_mode, WriteMode::Direct);
        assert_eq!(result.settings.case_policy, CasePolicy::Literal);
        assert!(!result.settings.skip_binary);

        Ok(())
    }

    #[test]
    fn reject_unknown_case_policy() {
        let result = indoc! {r#"
            [settings]
            case_policy = "shouty"
        "#}
        .parse::<TemplateDefinition>();
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }

    #[test]
    fn serialize_template_definition() {
        let result = TemplateDefinition {
            settings: CloneSettings {
                case_policy: CasePolicy::Preserve,
                write_mode: WriteMode::Staged,
                skip_binary: true,
                binary_extensions: None,
                exclude: Some(vec!["target/".into(), "*.log".into()]),
            },
        }
        .to_string();

        let expect = indoc! {r#"
            [settings]
            case_policy = "preserve"
            write_mode = "staged"
            skip_binary = true
            exclude = [
                "target/",
                "*.log",
            ]
        "#};

        assert_eq!(result, expect);
    }

    #[sealed_test(files = ["test/fixtures/sprout.toml"])]
    fn load_definition_from_source_root() -> anyhow::Result<()> {
        std::fs::rename("sprout.toml", DEFINITION_FILE)?;
        let result = TemplateDefinition::load(".")?;
        assert_eq!(result.settings.case_policy, CasePolicy::Preserve);
        assert_eq!(result.settings.exclude, Some(vec!["target/".into()]));

        Ok(())
    }

    #[sealed_test]
    fn load_missing_definition() -> anyhow::Result<()> {
        let result = TemplateDefinition::load(".")?;
        assert_eq!(result, TemplateDefinition::default());

        Ok(())
    }

    #[sealed_test(env = [("SPROUT_OUT", "/srv/scaffolds")])]
    fn expand_destination_variables() -> anyhow::Result<()> {
        let result = expand_path("$SPROUT_OUT/next")?;
        assert_eq!(result, PathBuf::from("/srv/scaffolds/next"));

        Ok(())
    }
}
