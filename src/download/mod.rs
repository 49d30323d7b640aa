//! Single-file HTTP download task.
//!
//! This module provides the [`RemoteFile`] task which performs one blocking
//! HTTP GET and appends the response body to a destination file chunk by
//! chunk as it arrives.
//!
//! # Features
//!
//! - Streaming downloads (memory-efficient for large files)
//! - Observable lifecycle ([`Status`]), byte counters and percentage progress
//! - Human-readable failure reason, classified as network or filesystem
//! - Truncate-on-start by default, opt-in append mode
//! - Configurable timeouts (30s connect, 5min read by default)
//!
//! # Example
//!
//! ```no_run
//! use remote_file::download::{RemoteFile, Status};
//!
//! let file = RemoteFile::new("https://example.com/paper.pdf", "./paper.pdf");
//! file.start();
//! match file.status() {
//!     Status::Loaded => println!("saved {} bytes", file.bytes_read()),
//!     _ => eprintln!("failed: {}", file.error_string()),
//! }
//! ```

mod client;
mod constants;
mod error;
mod filename;
mod remote_file;
mod status;

pub use client::HttpClient;
pub use constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
pub use error::{DownloadError, ErrorKind};
pub use filename::filename_from_url;
pub use remote_file::{DownloadReport, RemoteFile, WriteMode};
pub use status::Status;

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
