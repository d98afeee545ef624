//! CLI parser and command dispatch.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "dossier")]
#[command(about = "Document inventory and portfolio classification")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative paths from current working directory instead of config file location
    #[arg(long, global = true)]
    cwd: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter configuration file
    Init,

    /// Discover candidate documents (pass one) and save them for analysis
    Scan {
        /// Restrict to documents created in these years (repeatable)
        #[arg(short, long)]
        year: Vec<i32>,
        /// Candidate list output file
        #[arg(short, long, default_value = "dossier_scan.json")]
        output: PathBuf,
    },

    /// Analyze saved candidates (pass two) and save the enriched records
    Analyze {
        /// Candidate list from a prior scan
        #[arg(short, long, default_value = "dossier_scan.json")]
        input: PathBuf,
        /// Enriched record output file
        #[arg(short, long, default_value = "dossier_analysis.json")]
        output: PathBuf,
        /// Skip Finder tag application
        #[arg(long)]
        no_tags: bool,
    },

    /// Write the CSV report (pass three) from saved analysis records
    Report {
        /// Enriched records from a prior analyze
        #[arg(short, long, default_value = "dossier_analysis.json")]
        input: PathBuf,
        /// Report path (overrides the configured reporting directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run all three passes end to end
    Run {
        /// Restrict to documents created in these years (repeatable)
        #[arg(short, long)]
        year: Vec<i32>,
        /// Skip Finder tag application
        #[arg(long)]
        no_tags: bool,
    },

    /// Check that external tools are available
    Check,

    /// Inspect configured remote drives
    Drives {
        #[command(subcommand)]
        command: DriveCommands,
    },
}

#[derive(Subcommand)]
enum DriveCommands {
    /// List configured drives
    List,
    /// Verify a drive's stored credentials against the API
    Test {
        /// Drive name from the configuration
        name: String,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Init) {
        return commands::cmd_init();
    }

    let (settings, config) = load_settings_with_options(LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
    })?;

    match cli.command {
        Commands::Init => unreachable!("handled before config load"),
        Commands::Scan { year, output } => {
            commands::cmd_scan(settings, config, year, &output).await
        }
        Commands::Analyze {
            input,
            output,
            no_tags,
        } => commands::cmd_analyze(settings, config, &input, &output, no_tags).await,
        Commands::Report { input, output } => {
            commands::cmd_report(settings, config, &input, output.as_deref()).await
        }
        Commands::Run { year, no_tags } => {
            commands::cmd_run(settings, config, year, no_tags).await
        }
        Commands::Check => commands::cmd_check(),
        Commands::Drives { command } => match command {
            DriveCommands::List => commands::cmd_drives_list(&config),
            DriveCommands::Test { name } => commands::cmd_drives_test(&config, &name).await,
        },
    }
}
