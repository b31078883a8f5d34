//! Advisory log of raw downloader output.
//!
//! The log only feeds the live progress line shown while a file downloads.
//! Per-file results come from the transfer outcome, never from this file.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

/// Default log filename inside the platform temp directory.
pub const DEFAULT_LOG_FILENAME: &str = "wget_progress.log";

/// Handle to the progress log file.
#[derive(Debug, Clone)]
pub struct ProgressLog {
    path: PathBuf,
}

impl Default for ProgressLog {
    fn default() -> Self {
        Self::new(std::env::temp_dir().join(DEFAULT_LOG_FILENAME))
    }
}

impl ProgressLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncate the log and return a writer for a new transfer.
    pub async fn start(&self) -> io::Result<ProgressLogWriter> {
        let file = File::create(&self.path).await?;
        Ok(ProgressLogWriter { file })
    }

    /// Replace the log contents with a single line.
    pub async fn write_marker(&self, line: &str) -> io::Result<()> {
        let mut writer = self.start().await?;
        writer.write_line(line).await
    }

    /// Last `n` lines of the log, oldest first.
    pub async fn tail(&self, n: usize) -> io::Result<Vec<String>> {
        let contents = fs::read_to_string(&self.path).await?;
        let lines: Vec<&str> = contents.lines().collect();
        let start = lines.len().saturating_sub(n);
        Ok(lines[start..].iter().map(|l| l.to_string()).collect())
    }
}

/// Line-oriented writer over a truncated log file.
pub struct ProgressLogWriter {
    file: File,
}

impl ProgressLogWriter {
    /// Append one line and flush so pollers see it immediately.
    pub async fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.file.write_all(line.as_bytes()).await?;
        self.file.write_all(b"\n").await?;
        self.file.flush().await
    }
}

/// Splits a byte stream into progress lines on `\r` and `\n`.
///
/// Progress bars redraw in place with carriage returns, so each redraw
/// becomes its own line. Blank lines are dropped and lines are trimmed.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and collect every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in chunk {
            if byte == b'\r' || byte == b'\n' {
                if let Some(line) = self.take_line() {
                    lines.push(line);
                }
            } else {
                self.pending.push(byte);
            }
        }
        lines
    }

    /// Flush whatever remains once the stream ends.
    pub fn finish(&mut self) -> Option<String> {
        self.take_line()
    }

    fn take_line(&mut self) -> Option<String> {
        let raw = std::mem::take(&mut self.pending);
        let line = String::from_utf8_lossy(&raw).trim().to_string();
        (!line.is_empty()).then_some(line)
    }
}
