//! Malheur CLI - Behavior Report Hashing, Kernels and Prototypes
//!
//! ## Commands
//!
//! - `malheur prototype <input>` - Extract prototypes, export and/or save them
//! - `malheur kernel <input>` - Compute a kernel matrix over reports (or prototypes)
//! - `malheur cluster <input>` - Load reports and saved prototypes, report counts

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod format;

use commands::{cluster, kernel, prototype};
use malheur_core::Config;

/// Malheur - Analysis of malware behavior reports
#[derive(Parser)]
#[command(name = "malheur")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Keep a lookup table of tokens per feature index
    #[arg(short = 't', long, global = true)]
    lookup_table: bool,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract prototypes from a report collection
    #[command(alias = "proto")]
    Prototype {
        /// Report directory or line-per-report file
        input: PathBuf,

        /// Write per-report prototype assignments to this file
        #[arg(short, long)]
        result: Option<PathBuf>,

        /// Save the prototype set for later runs
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Compute a kernel matrix
    ///
    /// Without --load the matrix is reports x reports. With --load the
    /// columns are the representatives of a saved prototype set.
    Kernel {
        /// Report directory or line-per-report file
        input: PathBuf,

        /// Write the matrix to this file
        #[arg(short, long)]
        result: PathBuf,

        /// Saved prototype set providing the columns
        #[arg(short, long)]
        load: Option<PathBuf>,
    },

    /// Load reports and an optional prototype set
    Cluster {
        /// Report directory or line-per-report file
        input: PathBuf,

        /// Saved prototype set to check against the reports
        #[arg(short, long)]
        load: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Set up colored output
    if cli.no_color {
        colored::control::set_override(false);
    }

    let result = load_config(cli.config.as_deref(), cli.lookup_table).and_then(|config| {
        match cli.command {
            Commands::Prototype {
                input,
                result,
                save,
            } => prototype::run(config, input, result, save, cli.verbose),
            Commands::Kernel {
                input,
                result,
                load,
            } => kernel::run(config, input, result, load, cli.verbose),
            Commands::Cluster { input, load } => cluster::run(config, input, load, cli.verbose),
        }
    });

    if let Err(e) = result {
        eprintln!("{}", format::format_error(&format!("{:#}", e)));
        std::process::exit(1);
    }

    Ok(())
}

/// Read the configuration file, or fall back to defaults
fn load_config(path: Option<&std::path::Path>, lookup_table: bool) -> anyhow::Result<Config> {
    let mut config = match path {
        Some(path) => {
            let config = Config::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            tracing::debug!("Loaded configuration from {}", path.display());
            config
        }
        None => Config::default(),
    };
    if lookup_table {
        config.features.lookup_table = true;
    }
    Ok(config)
}
