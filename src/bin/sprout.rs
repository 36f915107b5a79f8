// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use sprout::{
    config::{expand_path, TemplateDefinition, WriteMode},
    CasePolicy, CloneRequest, Cloner,
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::{path::PathBuf, process::exit};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "sprout [options] <sprout-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        match self.command {
            Command::Clone(opts) => run_clone(opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Clone a new project instance from a template.
    #[command(override_usage = "sprout clone [options]")]
    Clone(CloneOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct CloneOptions {
    /// Name of the new project being provisioned.
    #[arg(short, long, value_name = "name", default_value = "clone-test")]
    pub name: String,

    /// Target directory for the newly provisioned project.
    #[arg(short, long, value_name = "path", default_value = "/tmp")]
    pub destination: String,

    /// Root of template to clone from.
    #[arg(short, long, value_name = "path", default_value = ".")]
    pub source: PathBuf,

    /// Template definition to use instead of the one at the source root.
    #[arg(short, long, value_name = "file")]
    pub config: Option<PathBuf>,

    /// How matched tokens are spelled in the clone: literal or preserve.
    #[arg(long, value_name = "policy")]
    pub case_policy: Option<CasePolicy>,

    /// Stage the clone first, and only move it into place once it is complete.
    #[arg(long)]
    pub staged: bool,

    /// Copy content of binary files verbatim instead of rewriting it.
    #[arg(long)]
    pub skip_binary: bool,

    /// Show where every entry would land without writing anything.
    #[arg(long)]
    pub dry_run: bool,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn run_clone(opts: CloneOptions) -> Result<()> {
    let definition = match &opts.config {
        Some(path) => TemplateDefinition::load_file(path)?,
        None => TemplateDefinition::load(&opts.source)?,
    };

    let mut settings = definition.settings;
    if let Some(policy) = opts.case_policy {
        settings.case_policy = policy;
    }
    if opts.staged {
        settings.write_mode = WriteMode::Staged;
    }
    settings.skip_binary |= opts.skip_binary;

    let request = CloneRequest::new(opts.name, expand_path(&opts.destination)?)
        .with_source(opts.source);
    let report = Cloner::new(&settings)
        .dry_run(opts.dry_run)
        .clone_tree(&request)?;

    info!(
        "{} files rewritten, {} binary files copied verbatim",
        report.rewritten, report.binary
    );

    Ok(())
}
