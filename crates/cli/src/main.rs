// linkdiff CLI - reconcile two gene/accession link snapshots

mod exit_codes;
mod logging;
mod run;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::EXIT_SUCCESS;
use logging::LogLevel;

#[derive(Parser)]
#[command(name = "linkdiff")]
#[command(about = "Compare two snapshots of gene/accession links and propose attribution fixes")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Log level for stderr diagnostics (RUST_LOG overrides)
    #[arg(long, global = true, value_enum, default_value = "info")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load both snapshots, compute every report and write the outputs
    #[command(after_help = "\
Examples:
  linkdiff run linkdiff.toml
  linkdiff run linkdiff.toml --json > manifest.json
  linkdiff run linkdiff.toml --log-level debug")]
    Run {
        /// Path to the linkdiff.toml config file
        config: PathBuf,

        /// Print the run manifest as JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Parse and validate a config without loading any input
    #[command(after_help = "\
Examples:
  linkdiff validate linkdiff.toml")]
    Validate {
        /// Path to the linkdiff.toml config file
        config: PathBuf,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  linkdiff-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  linkdiff-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _logger = match logging::init_logging(cli.log_level) {
        Ok(handle) => Some(handle),
        Err(message) => {
            eprintln!("warning: {message}");
            None
        }
    };

    let result = match cli.command {
        Commands::Run { config, json } => run::cmd_run(config, json),
        Commands::Validate { config } => run::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

