// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Cablepath CLI - trace and maintain cable paths across an inventory

use anyhow::Result;
use cablepath::commands::{self, cable::CableArgs, termination::TerminationArgs, RunContext};
use cablepath::config;
use clap::{CommandFactory, Parser, Subcommand};
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cablepath")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "CABLEPATH_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Data directory override
    #[arg(long, env = "CABLEPATH_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    no_color: bool,

    /// Output in JSON format
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage terminations (interfaces, ports, circuit terminations)
    Termination {
        /// Action: add, list, delete
        action: String,

        /// Termination to act on (id, id prefix, type:id or parent/name)
        target: Option<String>,

        #[command(flatten)]
        args: TerminationArgs,
    },

    /// Manage cables
    Cable {
        /// Action: add, status, delete, list
        action: String,

        /// Cable to act on (id, id prefix or label)
        target: Option<String>,

        #[command(flatten)]
        args: CableArgs,
    },

    /// Show every path leaving a termination
    Trace {
        /// Origin termination
        termination: String,

        /// Re-trace even if stored paths exist
        #[arg(long)]
        refresh: bool,
    },

    /// List stored cable paths
    Paths {
        /// Only paths originating here
        #[arg(long)]
        origin: Option<String>,
    },

    /// Trace every cabled endpoint that has no path
    Retrace {
        /// Endpoint type (all endpoint types if omitted)
        #[arg(long)]
        kind: Option<String>,

        /// Delete and rebuild every path of the type
        #[arg(long)]
        force: bool,
    },

    /// Export topology to various formats
    Export {
        /// Output format (dot, json)
        #[arg(short, long, default_value = "dot")]
        format: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },

    /// Show the effective configuration
    Config {
        /// Single key to print
        key: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    // Initialize logging
    let filter = match cli.verbose {
        0 if cli.quiet => EnvFilter::new("error"),
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ctx = RunContext {
        data_dir: config.data_dir.clone(),
        json: cli.json,
        color: !cli.no_color && std::io::stdout().is_terminal(),
        progress_every: config.progress_every,
    };

    // Execute command
    match cli.command {
        Commands::Termination { action, target, args } => {
            commands::termination::run(&ctx, &action, target, args)
        }
        Commands::Cable { action, target, args } => commands::cable::run(&ctx, &action, target, args),
        Commands::Trace { termination, refresh } => commands::trace::run(&ctx, &termination, refresh),
        Commands::Paths { origin } => commands::paths::run(&ctx, origin),
        Commands::Retrace { kind, force } => commands::retrace::run(&ctx, kind, force),
        Commands::Export { format, output } => commands::export::run(&ctx, &format, output),
        Commands::Config { key } => commands::config::run(&config, key.as_deref()),
        Commands::Completions { shell } => commands::completions::run(shell, &mut Cli::command()),
    }
}
