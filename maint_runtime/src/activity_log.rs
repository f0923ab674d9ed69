//! Activity log file: one `[DD-MM-YYYY HH:MM:SS] message` line per entry.
//!
//! Appends are fire-and-forget. A failed write is reported to `tracing`
//! and otherwise ignored.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tracing::warn;

use maint_engine::ports::ActivityLog;

pub const LINE_TIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

pub fn format_line(at: NaiveDateTime, message: &str) -> String {
    format!("[{}] {}\n", at.format(LINE_TIME_FORMAT), message)
}

#[derive(Debug, Clone)]
pub struct FileActivityLog {
    path: PathBuf,
}

impl FileActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

impl ActivityLog for FileActivityLog {
    fn append(&self, message: &str) {
        let line = format_line(Local::now().naive_local(), message);
        if let Err(e) = self.write_line(&line) {
            warn!(path = %self.path.display(), error = %e, "activity log append failed");
        }
    }
}

/// Whole log contents, or `None` when nothing has been logged yet.
pub fn read_log(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
