//! CLI for the medq download scheduling core.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use medq_core::config;
use medq_core::MediaType;
use std::path::PathBuf;

use commands::{run_config, run_fetch, FetchArgs};

/// Top-level CLI for medq.
#[derive(Debug, Parser)]
#[command(name = "medq")]
#[command(about = "medq: session-bound media download scheduler", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download media ids from a local source directory through the engine.
    Fetch {
        /// Media ids (file names under --source-dir).
        #[arg(required = true, value_name = "ID")]
        ids: Vec<String>,

        /// Directory the local transport serves files from.
        #[arg(long, value_name = "DIR")]
        source_dir: PathBuf,

        /// Number of in-memory sessions (one worker each, up to --threads).
        #[arg(long, default_value = "1", value_name = "N")]
        sessions: usize,

        /// Override max_threads from the config file.
        #[arg(long, value_name = "N")]
        threads: Option<usize>,

        /// Override download_root from the config file.
        #[arg(long, value_name = "DIR")]
        download_dir: Option<PathBuf>,

        /// Path segment below the download root; repeatable.
        #[arg(long = "extra-path", value_name = "SEG")]
        extra_paths: Vec<String>,

        /// Treat the first --extra-path as the output root instead of a
        /// directory below the download root.
        #[arg(long, requires = "extra_paths")]
        extra_path_as_root: bool,

        /// Media type recorded on each job.
        #[arg(long = "type", default_value = "track", value_name = "TYPE")]
        media_type: MediaType,

        /// Print events as JSON lines.
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration.
    Config {
        /// Print only the config file path.
        #[arg(long)]
        path: bool,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Fetch {
                ids,
                source_dir,
                sessions,
                threads,
                download_dir,
                extra_paths,
                extra_path_as_root,
                media_type,
                json,
            } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                let args = FetchArgs {
                    ids,
                    source_dir,
                    sessions,
                    threads,
                    download_dir,
                    extra_paths,
                    extra_path_as_root,
                    media_type,
                    json,
                };
                run_fetch(cfg, args).await?;
            }
            CliCommand::Config { path } => run_config(path)?,
        }

        Ok(())
    }
}
