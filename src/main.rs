use std::fs::File;

use clap::{Parser, ValueEnum};
use log::warn;
use parley::core::config::{self, CliOverrides, ParleyConfig};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

#[derive(Parser)]
#[command(name = "parley", version, about = "Terminal chat client for an ask endpoint")]
struct Args {
    /// Integration profile (built-in: ask, chat)
    #[arg(short, long)]
    profile: Option<String>,

    /// Base URL of the ask service, e.g. http://localhost:8000
    #[arg(short, long)]
    base_url: Option<String>,

    /// Log level written to parley.log
    #[arg(long, default_value_t, value_enum)]
    log_level: LogLevel,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    #[default]
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to parley.log in current directory
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create("parley.log") {
        let _ = WriteLogger::init(args.log_level.into(), log_config, log_file);
    }

    let file_config = config::load_config().unwrap_or_else(|e| {
        warn!("Config not loaded, using defaults: {}", e);
        ParleyConfig::default()
    });
    let cli = CliOverrides {
        profile: args.profile,
        base_url: args.base_url,
    };
    let resolved = config::resolve(&file_config, &cli);

    log::info!(
        "Parley starting up: profile={} endpoint={}{}",
        resolved.profile,
        resolved.base_url,
        resolved.ask_path
    );

    parley::tui::run(resolved)
}
