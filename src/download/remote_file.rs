//! The single-file download task.
//!
//! A [`RemoteFile`] performs one blocking HTTP GET per call to
//! [`start`](RemoteFile::start). The body is streamed from the network stack
//! on a private current-thread runtime and appended to the destination file
//! chunk by chunk, while the task's observable state (status, byte counters,
//! failure reason) is updated under a lock so other threads can poll it.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use futures_util::StreamExt;
use serde::Serialize;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use super::client::{HttpClient, parse_download_url};
use super::error::{DownloadError, ErrorKind};
use super::status::Status;
use crate::pool::Runnable;

/// How an attempt treats content already present at the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Create or truncate the destination when the attempt starts.
    #[default]
    Truncate,
    /// Append after whatever the destination already holds.
    Append,
}

impl WriteMode {
    /// Returns the stable string label used in config files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Truncate => "truncate",
            Self::Append => "append",
        }
    }
}

/// Serializable snapshot of a download task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadReport {
    /// Source URL as given.
    pub url: String,
    /// Destination path.
    pub path: PathBuf,
    /// Lifecycle state when the snapshot was taken.
    pub status: Status,
    /// Bytes written to the destination during the latest attempt.
    pub bytes_read: u64,
    /// Expected body size, when the server announced one.
    pub bytes_total: Option<u64>,
    /// Failure reason; present only when `status` is `Error`.
    pub error: Option<String>,
    /// Failure category; present only when `status` is `Error`.
    pub error_kind: Option<ErrorKind>,
}

#[derive(Debug, Default)]
struct TransferState {
    status: Status,
    bytes_read: u64,
    bytes_total: Option<u64>,
    error_string: String,
    error_kind: Option<ErrorKind>,
}

/// One URL-to-file transfer.
///
/// [`start`](Self::start) blocks the calling thread until the transfer ends.
/// Every accessor takes `&self`, so wrap the task in an `Arc` to observe it
/// from another thread while a worker runs it.
///
/// The destination is checked for writability before the request is sent,
/// but in [`WriteMode::Truncate`] its previous content is only dropped once
/// the server answers with a success status. A failed attempt that received
/// no bytes leaves an existing file untouched and removes a file it created.
/// Once bytes have arrived, a failure leaves the partial file on disk.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use remote_file::{RemoteFile, Status, WorkerPool};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = WorkerPool::new(2)?;
/// let file = Arc::new(RemoteFile::new("https://example.com/a.iso", "a.iso"));
/// pool.submit(file.clone())?;
/// pool.join();
/// assert!(file.status().is_terminal());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RemoteFile {
    url: String,
    file_path: PathBuf,
    client: Option<HttpClient>,
    write_mode: WriteMode,
    state: Mutex<TransferState>,
}

impl RemoteFile {
    /// Creates a task with a per-attempt client and [`WriteMode::Truncate`].
    ///
    /// The URL is not validated until [`start`](Self::start).
    pub fn new(url: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self::with_options(url, file_path, None, WriteMode::default())
    }

    /// Creates a task with an explicit client and write mode.
    ///
    /// When `client` is `None`, a client with default timeouts is built at
    /// the start of every attempt.
    pub fn with_options(
        url: impl Into<String>,
        file_path: impl Into<PathBuf>,
        client: Option<HttpClient>,
        write_mode: WriteMode,
    ) -> Self {
        Self {
            url: url.into(),
            file_path: file_path.into(),
            client,
            write_mode,
            state: Mutex::new(TransferState::default()),
        }
    }

    /// Source URL as given at construction.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Destination path.
    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Write mode used by every attempt.
    #[must_use]
    pub fn write_mode(&self) -> WriteMode {
        self.write_mode
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn status(&self) -> Status {
        self.lock_state().status
    }

    /// Bytes written during the latest attempt.
    #[must_use]
    pub fn bytes_read(&self) -> u64 {
        self.lock_state().bytes_read
    }

    /// Expected body size of the latest attempt, if the server announced one.
    #[must_use]
    pub fn bytes_total(&self) -> Option<u64> {
        self.lock_state().bytes_total
    }

    /// Completion percentage of the latest attempt.
    ///
    /// `None` while the total size is unknown. Always `Some(100)` once the
    /// status is [`Status::Loaded`].
    #[must_use]
    pub fn progress(&self) -> Option<u8> {
        let state = self.lock_state();
        if state.status == Status::Loaded {
            return Some(100);
        }
        percent(state.bytes_read, state.bytes_total)
    }

    /// Human-readable failure reason. Empty unless the status is [`Status::Error`].
    #[must_use]
    pub fn error_string(&self) -> String {
        self.lock_state().error_string.clone()
    }

    /// Category of the latest failure, if the status is [`Status::Error`].
    #[must_use]
    pub fn last_error_kind(&self) -> Option<ErrorKind> {
        self.lock_state().error_kind
    }

    /// Takes a consistent snapshot of the task.
    #[must_use]
    pub fn report(&self) -> DownloadReport {
        let state = self.lock_state();
        let failed = state.status == Status::Error;
        DownloadReport {
            url: self.url.clone(),
            path: self.file_path.clone(),
            status: state.status,
            bytes_read: state.bytes_read,
            bytes_total: state.bytes_total,
            error: failed.then(|| state.error_string.clone()),
            error_kind: if failed { state.error_kind } else { None },
        }
    }

    /// Runs one transfer attempt, blocking until it ends.
    ///
    /// Any previous error and byte counters are cleared first. Afterwards the
    /// status is either [`Status::Loaded`] or [`Status::Error`].
    ///
    /// Must not be called from a thread that is driving an async runtime;
    /// run it on a [`WorkerPool`](crate::WorkerPool) or a plain thread.
    #[instrument(skip(self), fields(url = %self.url, path = %self.file_path.display()))]
    pub fn start(&self) {
        self.begin_attempt();

        let outcome = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime.block_on(self.transfer()),
            Err(e) => Err(DownloadError::runtime(e)),
        };

        match outcome {
            Ok(bytes) => {
                self.lock_state().status = Status::Loaded;
                info!(bytes, "download complete");
            }
            Err(err) => self.fail(&err),
        }
    }

    async fn transfer(&self) -> Result<u64, DownloadError> {
        let url = parse_download_url(&self.url)?;
        let client = match &self.client {
            Some(client) => client.clone(),
            None => HttpClient::new()?,
        };

        let created = check_destination(&self.file_path).await?;
        let result = self.receive(&client, &url).await;

        if created && result.is_err() && self.lock_state().bytes_read == 0 {
            discard_empty_destination(&self.file_path).await;
        }
        result
    }

    async fn receive(&self, client: &HttpClient, url: &Url) -> Result<u64, DownloadError> {
        let response = client.send_get(url).await?;
        if self.write_mode == WriteMode::Truncate {
            truncate_destination(&self.file_path).await?;
        }
        self.lock_state().bytes_total = response.content_length();

        let mut stream = response.bytes_stream();
        let mut bytes_written: u64 = 0;
        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| DownloadError::from_reqwest(url.as_str(), e))?;
            // Returning drops the stream, which closes the connection.
            append_chunk(&self.file_path, &chunk).await?;
            bytes_written += chunk.len() as u64;
            self.lock_state().bytes_read = bytes_written;
        }

        Ok(bytes_written)
    }

    fn begin_attempt(&self) {
        let mut state = self.lock_state();
        *state = TransferState {
            status: Status::Loading,
            ..TransferState::default()
        };
        debug!(mode = self.write_mode.as_str(), "download started");
    }

    fn fail(&self, err: &DownloadError) {
        let mut state = self.lock_state();
        state.status = Status::Error;
        state.error_string = err.to_string();
        state.error_kind = Some(err.kind());
        let bytes_read = state.bytes_read;
        drop(state);

        error!(error = %err, kind = ?err.kind(), "download failed");
        if bytes_read > 0 {
            warn!(
                path = %self.file_path.display(),
                bytes = bytes_read,
                "partial file left on disk"
            );
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, TransferState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Runnable for RemoteFile {
    fn run(&self) {
        self.start();
    }
}

/// Integer percentage of `read` over `total`, clamped to 100.
fn percent(read: u64, total: Option<u64>) -> Option<u8> {
    let total = total?;
    if total == 0 {
        return Some(0);
    }
    let pct = (u128::from(read) * 100 / u128::from(total)).min(100);
    Some(u8::try_from(pct).unwrap_or(100))
}

/// Verifies the destination can be opened for writing without changing it.
///
/// Returns `true` when the file did not exist and was created empty.
async fn check_destination(path: &Path) -> Result<bool, DownloadError> {
    match OpenOptions::new().write(true).create_new(true).open(path).await {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            OpenOptions::new()
                .write(true)
                .open(path)
                .await
                .map_err(|e| DownloadError::io(path, e))?;
            Ok(false)
        }
        Err(e) => Err(DownloadError::io(path, e)),
    }
}

/// Drops previous content once the server has answered with a success status.
async fn truncate_destination(path: &Path) -> Result<(), DownloadError> {
    let file = OpenOptions::new()
        .write(true)
        .open(path)
        .await
        .map_err(|e| DownloadError::io(path, e))?;
    file.set_len(0).await.map_err(|e| DownloadError::io(path, e))
}

/// Removes a destination this attempt created but never wrote to.
async fn discard_empty_destination(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        debug!(path = %path.display(), error = %e, "could not remove empty destination");
    }
}

/// Opens the destination for append, writes one chunk, and closes it again.
async fn append_chunk(path: &Path, chunk: &[u8]) -> Result<(), DownloadError> {
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .await
        .map_err(|e| DownloadError::io(path, e))?;
    file.write_all(chunk)
        .await
        .map_err(|e| DownloadError::io(path, e))?;
    // tokio only completes the write on flush; dropping without it may lose data.
    file.flush().await.map_err(|e| DownloadError::io(path, e))?;
    Ok(())
}
