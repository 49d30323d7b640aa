//! Error types for the download module.
//!
//! Every failure of a [`RemoteFile`](super::RemoteFile) attempt is captured as
//! a [`DownloadError`]. The task itself only exposes the rendered message and
//! the coarse [`ErrorKind`], so the messages here are what users read.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during a single-file download.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The provided URL is malformed or uses an unsupported scheme.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// Network-level error (DNS resolution, connection refused, reset mid-body, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Connect or read timed out.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The destination could not be opened or written.
    #[error("filesystem error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// The per-transfer async runtime could not be started.
    #[error("failed to start transfer runtime: {source}")]
    Runtime {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Coarse failure category reported by a download task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Connection, timeout, invalid URL or server-side error.
    Network,
    /// The destination file could not be opened or written.
    Filesystem,
    /// The local HTTP stack or runtime could not be set up.
    Internal,
}

impl DownloadError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Maps a reqwest error to [`Timeout`](Self::Timeout) or [`Network`](Self::Network).
    pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::timeout(url)
        } else {
            Self::network(url, source)
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a client build error.
    pub fn client_build(source: reqwest::Error) -> Self {
        Self::ClientBuild { source }
    }

    /// Creates a runtime start error.
    pub fn runtime(source: std::io::Error) -> Self {
        Self::Runtime { source }
    }

    /// Returns the failure category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUrl { .. }
            | Self::Network { .. }
            | Self::Timeout { .. }
            | Self::HttpStatus { .. } => ErrorKind::Network,
            Self::Io { .. } => ErrorKind::Filesystem,
            Self::ClientBuild { .. } | Self::Runtime { .. } => ErrorKind::Internal,
        }
    }

    /// Returns true if the destination file was the cause.
    #[must_use]
    pub fn is_filesystem(&self) -> bool {
        self.kind() == ErrorKind::Filesystem
    }

    /// Returns true if the connection or the server was the cause.
    #[must_use]
    pub fn is_network(&self) -> bool {
        self.kind() == ErrorKind::Network
    }
}

// No `From<reqwest::Error>` / `From<io::Error>`: every variant needs a url or path.
