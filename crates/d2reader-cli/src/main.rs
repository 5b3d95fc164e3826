mod commands;
mod config;
mod input;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use d2reader::{BodyLocation, ReadFlag, ReadFlags, ReaderConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "d2reader")]
#[command(about = "Diablo II character state reader")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true, default_value = "d2reader.toml")]
    config: PathBuf,

    /// Game version layout to use (overrides the config file)
    #[arg(long, global = true)]
    game_version: Option<String>,

    /// Polling interval in milliseconds (overrides the config file)
    #[arg(long, global = true)]
    polling_rate: Option<u64>,

    /// Enabled reads; repeat to enable several (replaces the configured set)
    #[arg(long = "read", global = true)]
    read_flags: Vec<ReadFlag>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Poll the game continuously (default)
    #[command(visible_alias = "w")]
    Watch {
        /// Print every event as one JSON line
        #[arg(long)]
        json: bool,
    },

    /// Read once and print the result as JSON
    #[command(visible_alias = "s")]
    Snapshot,

    /// Print equipped items as JSON
    Items {
        /// Slots to read, e.g. Head, BodyArmor (all slots when omitted)
        slots: Vec<BodyLocation>,
    },

    /// List supported game versions
    Versions,
}

impl Cli {
    fn reader_config(&self) -> ReaderConfig {
        let mut config = config::load_or_default(&self.config);
        if let Some(version) = &self.game_version {
            config.game_version = version.clone();
        }
        if let Some(rate) = self.polling_rate {
            config.polling_rate_ms = rate;
        }
        if !self.read_flags.is_empty() {
            config.read_flags = self.read_flags.iter().copied().collect::<ReadFlags>();
        }
        config
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("d2reader=info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = cli.reader_config();
    info!(
        "d2reader {} (game version {})",
        env!("CARGO_PKG_VERSION"),
        config.game_version
    );

    match cli.command.unwrap_or(Command::Watch { json: false }) {
        Command::Watch { json } => commands::watch::run(config, json),
        Command::Snapshot => commands::snapshot::run(config),
        Command::Items { slots } => commands::snapshot::items(config, &slots),
        Command::Versions => {
            commands::versions::run(&config);
            Ok(())
        }
    }
}
