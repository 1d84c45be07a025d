use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{ConfigLoader, CONFIG_ENV, DATA_ENV};

pub mod commands;

use self::commands::{SourceArgs, StreakArgs};

#[derive(Parser, Debug)]
#[command(
    name = "wellness",
    version,
    about = "Streaks, achievements and emotion insights from journal activity"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over WELLNESS_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory holding snapshot.json (takes precedence over WELLNESS_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print every derived value (default)
    Summary(SourceArgs),
    /// Show the current streak for one activity kind
    Streak(StreakArgs),
    /// List achievements and their progress
    Achievements(SourceArgs),
    /// Show the emotion distribution of journal entries
    Emotions(SourceArgs),
    /// Show this week's daily emotion scores and the week-over-week change
    Trend(SourceArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var(DATA_ENV, path);
    }

    let loader = ConfigLoader::discover()?;
    let paths = loader.paths().clone();
    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = Arc::new(loader.load_or_init()?);

    let command = cli
        .command
        .unwrap_or_else(|| Commands::Summary(SourceArgs::default()));
    match command {
        Commands::Summary(args) => commands::summary(config, &paths, args),
        Commands::Streak(args) => commands::streak(config, &paths, args),
        Commands::Achievements(args) => commands::achievements(config, &paths, args),
        Commands::Emotions(args) => commands::emotions(config, &paths, args),
        Commands::Trend(args) => commands::trend(config, &paths, args),
    }
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(())
    })
    .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_streak_with_kind_and_today() {
        let cli = Cli::try_parse_from([
            "wellness",
            "--log-level",
            "debug",
            "streak",
            "--kind",
            "mood",
            "--data",
            "-",
            "--today",
            "2024-05-03",
        ])
        .expect("valid arguments");
        assert_eq!(cli.log_level, "debug");
        assert_matches!(cli.command, Some(Commands::Streak(args)) => {
            assert_eq!(args.kind, crate::records::ActivityKind::Mood);
            assert_eq!(args.source.data.as_deref(), Some(std::path::Path::new("-")));
            assert_eq!(args.source.today.as_deref(), Some("2024-05-03"));
        });
    }

    #[test]
    fn no_subcommand_defaults_to_summary() {
        let cli = Cli::try_parse_from(["wellness"]).expect("valid arguments");
        assert!(cli.command.is_none());
    }
}
