//! Command-line interface definitions.
//!
//! Defines the argument parser and subcommands using clap's derive API.
//! `scan` reports what would be rewritten; `run` performs the rewrite and
//! moves the images.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Gather images referenced from HTML and CSS into one directory.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Print debug logging to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List image references per file without modifying anything.
    Scan {
        #[command(flatten)]
        task: TaskArgs,

        /// Emit JSON instead of human-readable output.
        #[arg(long)]
        json: bool,
    },

    /// Rewrite references and move images into the destination directory.
    Run {
        #[command(flatten)]
        task: TaskArgs,

        /// Report what would change without writing files or moving images.
        #[arg(long)]
        dry_run: bool,

        /// Preview the changes and confirm before applying them.
        #[arg(short, long, conflicts_with = "dry_run")]
        interactive: bool,

        /// Emit JSON instead of human-readable output.
        #[arg(long)]
        json: bool,
    },
}

/// Where the file groups come from: a task file, or one group given inline.
#[derive(Debug, ClapArgs)]
pub struct TaskArgs {
    /// JSON task file with `options` and `groups`.
    #[arg(short, long, conflicts_with_all = ["src", "dest", "cwd"])]
    pub config: Option<PathBuf>,

    /// Source files, directories, or glob patterns.
    #[arg(short, long, num_args = 1..)]
    pub src: Vec<String>,

    /// Destination directory for images, relative to `--cwd` when given.
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// Working directory that sources and destination are relative to.
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// Accepted image extensions. Matched case-sensitively.
    /// Defaults to png, gif, jpg, jpeg, bmp.
    #[arg(short, long = "format", value_delimiter = ',')]
    pub formats: Vec<String>,

    /// URI prefix for rewritten references. Defaults to the destination.
    #[arg(long)]
    pub new_relative_uri: Option<String>,
}
