pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, Parser, Subcommand};
use fieldsales_core::config::{AppConfig, LoadOptions, LogFormat};

use crate::commands::report::{FilterArgs, GroupBy};

#[derive(Debug, Parser)]
#[command(
    name = "fieldsales",
    about = "Field sales performance reporting CLI",
    long_about = "Roll up daily sales entries from traveling retail events into per-staff, per-event and cross-event reports.",
    after_help = "Examples:\n  fieldsales seed\n  fieldsales report event EV-2024-0601\n  fieldsales report group --by venue --metric headline\n  fieldsales toggle-cell-up EV-2024-0601 --on"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load and verify the deterministic demo dataset")]
    Seed,
    #[command(about = "Import events and their daily records from a JSON file")]
    Import {
        #[arg(help = "Path to a JSON file with an `events` array")]
        path: PathBuf,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, database connectivity and schema readiness")]
    Doctor,
    #[command(about = "Compute sales reports from stored daily records")]
    Report {
        #[command(subcommand)]
        report: ReportCommand,
    },
    #[command(
        about = "Include or exclude cell-up sales from an event's headline",
        group(ArgGroup::new("state").required(true).args(["on", "off"]))
    )]
    ToggleCellUp {
        id: String,
        #[arg(long)]
        on: bool,
        #[arg(long)]
        off: bool,
    },
}

#[derive(Debug, Subcommand)]
enum ReportCommand {
    #[command(about = "Event summary, ranked staff, daily trend and category progress")]
    Event {
        id: String,
        #[arg(long, help = "Store the computed summary snapshot")]
        persist: bool,
    },
    #[command(about = "Total, count and average of one metric per venue, team or month")]
    Group {
        #[arg(long, value_enum)]
        by: GroupBy,
        #[arg(long, default_value = "headline", help = "Category or metric key")]
        metric: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
    #[command(about = "Monthly target achievement and per-event status")]
    Achievement {
        #[command(flatten)]
        filter: FilterArgs,
    },
    #[command(about = "Cross-event staff leaderboard ordered by headline")]
    Leaderboard {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, help = "Maximum entries; defaults to reporting.leaderboard_limit")]
        limit: Option<usize>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Import { path } => commands::import::run(&path),
        Command::Config => commands::config::run(),
        Command::Doctor => commands::doctor::run(),
        Command::Report { report } => match report {
            ReportCommand::Event { id, persist } => commands::report::event(&id, persist),
            ReportCommand::Group { by, metric, filter } => {
                commands::report::group(by, &metric, filter.into())
            }
            ReportCommand::Achievement { filter } => commands::report::achievement(filter.into()),
            ReportCommand::Leaderboard { filter, limit } => {
                commands::report::leaderboard(filter.into(), limit)
            }
        },
        Command::ToggleCellUp { id, on, off: _ } => commands::toggle::run(&id, on),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout carries only the command payload. A config
/// that fails to load falls back to `info`/compact; the command itself then
/// reports the config error.
fn init_logging() {
    use tracing::Level;

    let (level, format) = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => (
            config.logging.level.parse::<Level>().unwrap_or(Level::INFO),
            config.logging.format,
        ),
        Err(_) => (Level::INFO, LogFormat::Compact),
    };

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr);
    let _ = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
