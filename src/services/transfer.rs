//! Per-file transfer through an external downloader.

use std::io;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::progress_log::{LineSplitter, ProgressLog};
use crate::models::{DescriptorError, FileDescriptor, FileOutcome, OutcomeStatus};

/// Default external download tool.
pub const DEFAULT_DOWNLOADER: &str = "wget";

/// Failures of a single downloader invocation.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Downloader was terminated by a signal")]
    Terminated,
}

/// Fetches one URL to a local path.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Download `url` to `dest`, streaming tool output into `log`.
    /// Returns the tool's exit code.
    async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        token: Option<&str>,
        log: &ProgressLog,
    ) -> Result<i32, TransferError>;
}

/// Downloader backed by `wget` (or a compatible binary).
#[derive(Debug, Clone)]
pub struct WgetDownloader {
    program: String,
}

impl Default for WgetDownloader {
    fn default() -> Self {
        Self::new(DEFAULT_DOWNLOADER)
    }
}

impl WgetDownloader {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Whether the binary can be found on PATH (or at the given path).
    pub fn is_available(&self) -> bool {
        which::which(&self.program).is_ok()
    }

    /// Arguments passed to the tool for one file.
    pub fn command_args(url: &str, dest: &Path, token: Option<&str>) -> Vec<String> {
        let mut args = vec!["--progress=bar:noscroll".to_string()];
        if let Some(token) = token {
            args.push("--header".to_string());
            args.push(format!("Authorization: Bearer {}", token));
        }
        args.push("-O".to_string());
        args.push(dest.to_string_lossy().to_string());
        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl Downloader for WgetDownloader {
    async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        token: Option<&str>,
        log: &ProgressLog,
    ) -> Result<i32, TransferError> {
        let args = Self::command_args(url, dest, token);
        debug!(
            "Command: {} {}",
            self.program,
            redact_token(&args.join(" "), token)
        );

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TransferError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Merge stdout and stderr into one ordered line stream
        let (line_tx, mut line_rx) = mpsc::unbounded_channel();
        let mut pumps = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            pumps.push(tokio::spawn(pump_lines(stdout, line_tx.clone())));
        }
        if let Some(stderr) = child.stderr.take() {
            pumps.push(tokio::spawn(pump_lines(stderr, line_tx.clone())));
        }
        drop(line_tx);

        let mut writer = match log.start().await {
            Ok(w) => Some(w),
            Err(e) => {
                debug!("Progress log unavailable at {:?}: {}", log.path(), e);
                None
            }
        };

        while let Some(line) = line_rx.recv().await {
            let failed = match writer.as_mut() {
                Some(w) => w.write_line(&line).await.is_err(),
                None => false,
            };
            if failed {
                debug!("Stopped writing progress log at {:?}", log.path());
                writer = None;
            }
        }

        for pump in pumps {
            let _ = pump.await;
        }

        let status = child.wait().await?;
        status.code().ok_or(TransferError::Terminated)
    }
}

async fn pump_lines<R>(mut reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut splitter = LineSplitter::new();
    let mut buf = [0u8; 4096];

    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                for line in splitter.push(&buf[..n]) {
                    if tx.send(line).is_err() {
                        return;
                    }
                }
            }
        }
    }

    if let Some(line) = splitter.finish() {
        let _ = tx.send(line);
    }
}

fn redact_token(command: &str, token: Option<&str>) -> String {
    match token {
        Some(t) if !t.is_empty() => command.replace(t, "***"),
        _ => command.to_string(),
    }
}

/// Download one descriptor unless its destination already exists.
///
/// Only a descriptor that cannot be resolved to a filename is returned as
/// an error; every transfer failure becomes an `error` outcome.
pub async fn transfer_file(
    descriptor: &FileDescriptor,
    base_path: &Path,
    token: Option<&str>,
    downloader: &dyn Downloader,
    log: &ProgressLog,
) -> Result<FileOutcome, DescriptorError> {
    let filename = descriptor.file_name()?;
    let target_dir = descriptor.target_dir(base_path);
    let full_path = target_dir.join(&filename);

    if let Err(e) = fs::create_dir_all(&target_dir).await {
        let message = format!("Unexpected error with {}: {}", descriptor.url, e);
        warn!("{}", message);
        return Ok(FileOutcome::new(OutcomeStatus::Error, filename, message));
    }

    if fs::try_exists(&full_path).await.unwrap_or(false) {
        let message = format!(
            "File already exists: {} - Skipping download...",
            full_path.display()
        );
        info!("{}", message);
        return Ok(FileOutcome::new(OutcomeStatus::Skipped, filename, message));
    }

    info!("Downloading: {}", filename);

    let outcome = match downloader
        .fetch(&descriptor.url, &full_path, token, log)
        .await
    {
        Ok(0) => {
            let message = format!("Successfully downloaded: {}", filename);
            info!("{}", message);
            FileOutcome::new(OutcomeStatus::Success, filename, message)
        }
        Ok(code) => {
            discard_empty_partial(&full_path).await;
            let message = format!("Download failed for {} (exit code: {})", filename, code);
            warn!("{}", message);
            FileOutcome::new(OutcomeStatus::Error, filename, message)
        }
        Err(e) => {
            discard_empty_partial(&full_path).await;
            let message = format!("Unexpected error with {}: {}", descriptor.url, e);
            warn!("{}", message);
            FileOutcome::new(OutcomeStatus::Error, filename, message)
        }
    };

    Ok(outcome)
}

/// Remove a zero-length file left behind by a failed transfer so the next
/// run does not mistake it for a finished download.
async fn discard_empty_partial(path: &Path) {
    if let Ok(meta) = fs::metadata(path).await {
        if meta.is_file() && meta.len() == 0 {
            if let Err(e) = fs::remove_file(path).await {
                debug!("Could not remove empty partial {:?}: {}", path, e);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted downloader for coordinator and server tests.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    /// Writes `contents` to the destination and exits with `exit_code`.
    #[derive(Clone)]
    pub struct FakeDownloader {
        pub exit_code: i32,
        pub contents: &'static [u8],
        pub calls: Arc<AtomicUsize>,
        pub tokens: Arc<std::sync::Mutex<Vec<Option<String>>>>,
    }

    impl FakeDownloader {
        pub fn succeeding() -> Self {
            Self {
                exit_code: 0,
                contents: b"model weights",
                calls: Arc::new(AtomicUsize::new(0)),
                tokens: Arc::new(std::sync::Mutex::new(Vec::new())),
            }
        }

        pub fn failing(exit_code: i32) -> Self {
            Self {
                exit_code,
                contents: b"",
                ..Self::succeeding()
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Downloader for FakeDownloader {
        async fn fetch(
            &self,
            _url: &str,
            dest: &Path,
            token: Option<&str>,
            log: &ProgressLog,
        ) -> Result<i32, TransferError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.tokens
                .lock()
                .unwrap()
                .push(token.map(|t| t.to_string()));

            let mut writer = log.start().await?;
            writer.write_line("50% [=====>     ] 1.2MB/s eta 1s").await?;
            fs::write(dest, self.contents).await?;
            Ok(self.exit_code)
        }
    }
}
