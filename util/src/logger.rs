//! Navigation logger
//!
//! Every line is stamped with the seconds elapsed since the session epoch so that log entries
//! line up with the telemetry and sample archives of the same session. Lines are written both
//! to stdout and to the session's log file.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use colored::{ColoredString, Colorize};
use log::{info, Level, Record};
use thiserror::Error;

use crate::session::{self, Session};

pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The least verbose level accepted. Stage changes and scan results are logged at `Info`.
const MIN_VERBOSITY: Level = Level::Info;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Log level `{0}` would hide mission stage changes, use `info` or more verbose")]
    LevelTooQuiet(LevelFilter),

    #[error("Cannot open the session log file: {0}")]
    LogFile(std::io::Error),

    #[error("A logger is already installed: {0}")]
    AlreadyInstalled(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Install the logger for this execution.
///
/// Can only succeed once per process.
pub fn logger_init(min_level: LevelFilter, session: &Session) -> Result<(), LoggerInitError> {
    if min_level < MIN_VERBOSITY {
        return Err(LoggerInitError::LevelTooQuiet(min_level));
    }

    let log_file =
        fern::log_file(&session.log_file_path).map_err(LoggerInitError::LogFile)?;

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} {}",
                line_prefix(session::get_elapsed_seconds(), record),
                message
            ))
        })
        .level(min_level)
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::AlreadyInstalled)?;

    info!("Logging at {:?} to {:?}", min_level, session.log_file_path);
    if let Some(epoch) = session::epoch() {
        info!("Session epoch {}", epoch);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Time and level tag of a line. Debug and trace lines also name the module they come from.
fn line_prefix(elapsed_s: f64, record: &Record) -> String {
    let tag = level_tag(record.level());

    if record.level() > MIN_VERBOSITY {
        format!("[{:10.3} {}] {}:", elapsed_s, tag, record.target())
    } else {
        format!("[{:10.3} {}]", elapsed_s, tag)
    }
}

fn level_tag(level: Level) -> ColoredString {
    match level {
        Level::Trace => "TRC".dimmed(),
        Level::Debug => "DBG".dimmed(),
        Level::Info => "INF".normal(),
        Level::Warn => "WRN".yellow(),
        Level::Error => "ERR".red().bold(),
    }
}
