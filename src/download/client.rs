//! HTTP client wrapper for downloading files.
//!
//! This module provides the `HttpClient` struct which owns the timeout and
//! User-Agent configuration and maps transport failures and error statuses to
//! [`DownloadError`].

use std::time::Duration;

use reqwest::{Client, ClientBuilder, Response};
use tracing::{debug, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use crate::user_agent;

/// HTTP client for single-file downloads.
///
/// Cloning is cheap and clones share configuration. Idle connections are
/// never pooled: each [`RemoteFile`](super::RemoteFile) attempt runs on its
/// own runtime, and a connection must not outlive the runtime that opened it.
///
/// # Example
///
/// ```no_run
/// use remote_file::download::{HttpClient, RemoteFile, WriteMode};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::with_timeouts(10, 60)?;
/// let file = RemoteFile::with_options(
///     "https://example.com/file.pdf",
///     "./file.pdf",
///     Some(client),
///     WriteMode::Truncate,
/// );
/// file.start();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes between body chunks
    /// - Gzip decompression: enabled
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the TLS backend or resolver
    /// cannot be initialized.
    pub fn new() -> Result<Self, DownloadError> {
        Self::with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the client cannot be built.
    #[instrument(level = "debug")]
    pub fn with_timeouts(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, DownloadError> {
        let client = base_client_builder(connect_timeout_secs, read_timeout_secs)
            .build()
            .map_err(DownloadError::client_build)?;
        Ok(Self { client })
    }

    /// Sends a GET request and returns the response once headers arrive.
    ///
    /// The body has not been read yet when this returns.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The request fails (DNS, connection refused, TLS)
    /// - The connect timeout elapses
    /// - The server returns a non-success status (4xx, 5xx)
    pub async fn send_get(&self, url: &Url) -> Result<Response, DownloadError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| DownloadError::from_reqwest(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "server returned error status");
            return Err(DownloadError::http_status(url.as_str(), status.as_u16()));
        }

        debug!(
            status = status.as_u16(),
            content_length = ?response.content_length(),
            "response headers received"
        );
        Ok(response)
    }
}

/// Parses and checks a download URL. Only `http` and `https` are accepted.
pub(crate) fn parse_download_url(raw: &str) -> Result<Url, DownloadError> {
    let parsed = Url::parse(raw).map_err(|_| DownloadError::invalid_url(raw))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(DownloadError::invalid_url(raw)),
    }
}

fn base_client_builder(connect_timeout_secs: u64, read_timeout_secs: u64) -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .read_timeout(Duration::from_secs(read_timeout_secs))
        .pool_max_idle_per_host(0)
        .gzip(true)
        .user_agent(user_agent::default_download_user_agent())
}
