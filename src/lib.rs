// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Project scaffolding through template cloning.
//!
//! Sprout turns an existing project into a template for new ones. The source
//! tree is copied into a fresh project directory, and every spelling of the
//! placeholder token `trex` is replaced by the new project's name, in file
//! and directory names as well as in file content.
//!
//! # See Also
//!
//! 1. [`clone`] for the pipeline itself.
//! 2. [`token`] for what counts as the placeholder token.

pub mod clone;
pub mod config;
pub mod materialize;
pub mod path;
pub mod rewrite;
pub mod token;
pub mod walk;

pub use clone::{clone_tree, CloneError, CloneReport, CloneRequest, Cloner};
pub use config::{CloneSettings, TemplateDefinition, WriteMode};
pub use token::{match_and_replace, CasePolicy, TokenMatcher};
