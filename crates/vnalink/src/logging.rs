use std::io::IsTerminal;

use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;

/// Target prefix shared by the CLI and both library crates.
const VNALINK_TARGET: &str = "vnalink";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// `--log-level` applies to vnalink's own events (dropped frames, resends,
/// update milestones). Dependencies never log above warn.
fn targets(level: LogLevel) -> Targets {
    let level = level.as_filter();
    Targets::new()
        .with_target(VNALINK_TARGET, level)
        .with_default(level.min(LevelFilter::WARN))
}

/// Install the stderr subscriber.
///
/// Stdout belongs to command output: encoded frames (binary under
/// `--format raw`), decoded records and plans. Logs therefore only ever go
/// to stderr, colored only when stderr is a terminal. From debug upwards
/// the emitting module is shown, which separates decoder rejections from
/// updater retries.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(level.as_filter() >= LevelFilter::DEBUG);
    let registry = tracing_subscriber::registry().with(targets(level));

    let _ = match format {
        LogFormat::Text => registry
            .with(layer.with_ansi(std::io::stderr().is_terminal()))
            .try_init(),
        LogFormat::Json => registry.with(layer.json()).try_init(),
    };
}
