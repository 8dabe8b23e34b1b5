//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Stylegate - style checks for JavaScript build trees
#[derive(Parser)]
#[command(name = "sgate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Inline rule object as JSON, takes precedence over any config file
    #[arg(long, global = true, value_name = "JSON", conflicts_with = "config")]
    pub rules: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check an input tree and write the output tree
    Build {
        /// Input tree
        input: PathBuf,

        /// Output directory, replaced on every build
        #[arg(short, long)]
        output: PathBuf,

        /// Parse sources with ES2015+ syntax enabled
        #[arg(long)]
        esnext: bool,

        /// Emit the original sources instead of proxy tests
        #[arg(long)]
        disable_test_generator: bool,

        /// Additional exclude pattern (repeatable)
        #[arg(long = "exclude", value_name = "PATTERN")]
        excludes: Vec<String>,

        /// Keep processed outputs on disk between runs
        #[arg(long)]
        persist: bool,

        /// Directory for persisted outputs
        #[arg(long, requires = "persist")]
        cache_dir: Option<PathBuf>,

        /// Copy the tree without checking it
        #[arg(long)]
        disabled: bool,
    },

    /// Show which configuration applies to a tree
    CheckConfig {
        /// Input tree
        input: PathBuf,
    },
}
