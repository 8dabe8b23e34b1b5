//! Stylegate CLI
//!
//! Runs the style checker over a source tree and writes an output tree of
//! proxy tests or pass-through sources.

mod cli;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use stylegate_core::{
    Builder, ConfigResolver, ConfigSource, ResolvedConfig, StyleTree, TreeOptions,
};

use crate::cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(has_problems) => {
            if has_problems {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    match &cli.command {
        Commands::Build {
            input,
            output,
            esnext,
            disable_test_generator,
            excludes,
            persist,
            cache_dir,
            disabled,
        } => {
            let mut options = base_options(&cli)?
                .enabled(!disabled)
                .disable_test_generator(*disable_test_generator)
                .exclude_files(excludes.iter().cloned())
                .persist(*persist)
                .log_error(|line| eprintln!("{}", line));
            if *esnext {
                options = options.esnext(true);
            }
            if let Some(dir) = cache_dir {
                options = options.cache_dir(dir);
            }
            run_build(input, output, options)
        }
        Commands::CheckConfig { input } => {
            run_check_config(input, base_options(&cli)?).map(|_| false)
        }
    }
}

/// Options shared by every subcommand.
fn base_options(cli: &Cli) -> Result<TreeOptions> {
    let mut options = TreeOptions::new();
    if let Some(path) = &cli.config {
        options = options.config_path(path);
    }
    if let Some(rules) = &cli.rules {
        let value: serde_json::Value = serde_json::from_str(rules).into_diagnostic()?;
        options = options.config(value);
    }
    Ok(options)
}

fn run_build(input: &Path, output: &Path, options: TreeOptions) -> Result<bool> {
    let tree = StyleTree::new(input, options).into_diagnostic()?;
    debug!("Target extension: {}", tree.target_extension());

    let mut builder = Builder::with_output_dir(&tree, output);
    let result = builder.build().into_diagnostic()?;

    println!(
        "Processed {} files, {} problems",
        result.files.len(),
        result.problems
    );

    Ok(result.problems > 0)
}

fn run_check_config(input: &Path, options: TreeOptions) -> Result<()> {
    let resolved = ConfigResolver::resolve(input, &options).into_diagnostic()?;

    let ResolvedConfig::Active {
        config,
        esnext,
        source,
    } = &resolved
    else {
        println!(
            "No config found for {}; files pass through unchanged",
            input.display()
        );
        return Ok(());
    };

    match source {
        ConfigSource::Inline => println!("Config: inline"),
        ConfigSource::FileRef(path) => println!("Config: {}", path.display()),
        ConfigSource::Discovered(path) => println!("Config: {} (discovered)", path.display()),
        ConfigSource::Absent => {}
    }
    println!("ES2015+: {}", if *esnext { "yes" } else { "no" });

    let rules: Vec<&str> = config.enabled_rules().map(|(name, _)| name).collect();
    if rules.is_empty() {
        println!("Rules: none");
    } else {
        println!("Rules: {}", rules.join(", "));
    }

    Ok(())
}
