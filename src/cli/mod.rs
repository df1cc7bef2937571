//! CLI command definitions for task-quest
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use crate::format::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Task list with experience points, levels, and badges
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the task and progression snapshots (overrides config)
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Output format (overrides config)
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Keep state in memory only; nothing is read from or written to disk
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add a task
    Add {
        /// Task text; multiple words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Toggle a task between done and open
    Done {
        /// Task id or unique id prefix
        id: String,
    },

    /// Delete a task
    Rm {
        /// Task id or unique id prefix
        id: String,
    },

    /// List tasks, most recent first (default if no subcommand given)
    List,

    /// Show level, experience and completion count
    Stats,

    /// Show the badge catalog and which badges are unlocked
    Badges,
}

impl Command {
    /// Task text for `add`, words joined by single spaces.
    pub fn joined_text(words: &[String]) -> String {
        words.join(" ")
    }
}
