//! Best-effort diagnostic sink.
//!
//! The sink is the user-facing trail of a download session: one timestamped
//! line per event, plus copies of pages that could not be understood. Nothing
//! written here can fail a download; write errors are swallowed and reported
//! through `log::debug!` only.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Local};

/// File name of the session log inside the diagnostics directory.
pub const DEBUG_LOG_FILE: &str = "fontmask_debug.log";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Destination for diagnostic messages and failure pages.
pub trait DiagnosticSink: Send + Sync {
    /// Append one message stamped with `timestamp`.
    fn append(&self, timestamp: DateTime<Local>, message: &str);

    /// Keep a copy of a page body for offline inspection.
    fn save_page(&self, _name: &str, _body: &str) {}
}

/// Append `message` stamped with the current local time.
pub fn record(sink: &dyn DiagnosticSink, message: &str) {
    sink.append(Local::now(), message);
}

/// Format a message as a log line.
pub fn format_line(timestamp: DateTime<Local>, message: &str) -> String {
    format!("[{}] {}", timestamp.format(TIMESTAMP_FORMAT), message)
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn append(&self, _timestamp: DateTime<Local>, _message: &str) {}
}

/// Sink writing `fontmask_debug.log` and `error_<id>.html` files into a directory.
#[derive(Debug)]
pub struct FileSink {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl FileSink {
    /// Sink rooted at `dir`; the directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    /// Directory the sink writes into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the session log.
    pub fn log_path(&self) -> PathBuf {
        self.dir.join(DEBUG_LOG_FILE)
    }

    /// Path a saved page named `name` is written to.
    pub fn page_path(&self, name: &str) -> PathBuf {
        let safe: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("error_{}.html", safe))
    }

    fn try_append(&self, line: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path())?;
        writeln!(file, "{}", line)
    }
}

impl DiagnosticSink for FileSink {
    fn append(&self, timestamp: DateTime<Local>, message: &str) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = self.try_append(&format_line(timestamp, message)) {
            log::debug!("Could not write diagnostic log: {}", e);
        }
    }

    fn save_page(&self, name: &str, body: &str) {
        let path = self.page_path(name);
        let result = fs::create_dir_all(&self.dir).and_then(|_| fs::write(&path, body));
        match result {
            Ok(()) => log::debug!("Saved failure page to {}", path.display()),
            Err(e) => log::debug!("Could not save failure page {}: {}", path.display(), e),
        }
    }
}

/// Sink that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
    pages: Mutex<Vec<(String, String)>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages appended so far, without timestamps.
    pub fn messages(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Pages saved so far as `(name, body)`.
    pub fn pages(&self) -> Vec<(String, String)> {
        self.pages.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl DiagnosticSink for MemorySink {
    fn append(&self, _timestamp: DateTime<Local>, message: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }

    fn save_page(&self, name: &str, body: &str) {
        self.pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((name.to_string(), body.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_line() {
        let ts = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(format_line(ts, "hello"), "[2024-03-09 07:05:01] hello");
    }

    #[test]
    fn test_file_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path().join("diag"));

        record(&sink, "first");
        record(&sink, "second");

        let log = fs::read_to_string(sink.log_path()).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("] first"));
        assert!(lines[1].ends_with("] second"));
    }

    #[test]
    fn test_file_sink_saves_page() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path());

        sink.save_page("7301", "<html></html>");
        let saved = fs::read_to_string(dir.path().join("error_7301.html")).unwrap();
        assert_eq!(saved, "<html></html>");
    }

    #[test]
    fn test_page_name_sanitised() {
        let sink = FileSink::new("/tmp/x");
        assert_eq!(sink.page_path("../a b"), PathBuf::from("/tmp/x/error____a_b.html"));
    }

    #[test]
    fn test_unwritable_dir_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();

        let sink = FileSink::new(blocker.join("sub"));
        record(&sink, "dropped");
        sink.save_page("1", "body");
        assert!(!blocker.join("sub").exists());
    }

    #[test]
    fn test_memory_sink() {
        let sink = MemorySink::new();
        record(&sink, "one");
        sink.save_page("9", "page");
        assert_eq!(sink.messages(), vec!["one".to_string()]);
        assert_eq!(sink.pages(), vec![("9".to_string(), "page".to_string())]);
    }
}
