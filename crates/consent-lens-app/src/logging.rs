//! Per-run file logging.
//!
//! One pipe-delimited log file per process run:
//! `{timestamp} | {level} | {stage} | {action} | {detail}`. Callers are
//! expected to pass details through [`crate::redact_sensitive`] before any
//! payload-bearing string reaches a log line.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use time::OffsetDateTime;

use crate::AppError;

/// Env var overriding the log directory.
pub const ENV_LOG_DIR: &str = "CONSENT_LENS_LOG_DIR";

static RUN_LOGGER: OnceLock<RunLogger> = OnceLock::new();

struct RunLogger {
    file: Mutex<File>,
    path: PathBuf,
}

impl RunLogger {
    fn new() -> Result<Self, AppError> {
        let dir = log_dir();
        std::fs::create_dir_all(&dir).map_err(|error| {
            AppError::Logging(format!(
                "unable to create log directory '{}': {error}",
                dir.display()
            ))
        })?;

        let timestamp = timestamp_compact_utc();
        let path = dir.join(format!("{timestamp}_consent_lens_log.txt"));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|error| {
                AppError::Logging(format!(
                    "unable to create log file '{}': {error}",
                    path.display()
                ))
            })?;

        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    fn write_line(&self, level: &str, stage: &str, action: &str, detail: &str) {
        let timestamp = timestamp_compact_utc();
        let line = format!("{timestamp} | {level} | {stage} | {action} | {detail}\n");
        if let Ok(mut file) = self.file.lock() {
            let _ = file.write_all(line.as_bytes());
        }
    }
}

fn log_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(ENV_LOG_DIR) {
        return PathBuf::from(dir);
    }

    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()))
        .unwrap_or_else(std::env::temp_dir)
}

/// Initializes the per-run logger; repeated calls are no-ops.
///
/// # Errors
/// Returns [`AppError::Logging`] when the log file cannot be created.
pub fn initialize_logger() -> Result<(), AppError> {
    if RUN_LOGGER.get().is_some() {
        return Ok(());
    }

    let logger = RunLogger::new()?;
    let path = logger.path.display().to_string();
    let _ = RUN_LOGGER.set(logger);
    log_info("logging", "file_created", &format!("log_file={path}"));
    Ok(())
}

/// Writes one INFO line; silent before initialization.
pub fn log_info(stage: &str, action: &str, detail: &str) {
    if let Some(logger) = RUN_LOGGER.get() {
        logger.write_line("INFO", stage, action, detail);
    }
}

/// Writes one ERROR line; silent before initialization.
pub fn log_error(stage: &str, action: &str, detail: &str) {
    if let Some(logger) = RUN_LOGGER.get() {
        logger.write_line("ERROR", stage, action, detail);
    }
}

fn timestamp_compact_utc() -> String {
    let now = OffsetDateTime::now_utc();
    format!(
        "{:04}{:02}{:02}_{:02}{:02}{:02}",
        now.year(),
        now.month() as u8,
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}
