//! Remote File Library
//!
//! This library downloads one remote resource to one local file while
//! exposing the transfer's status, byte progress and failure reason to the
//! caller.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`download`] - The [`RemoteFile`] task, its [`Status`] and the HTTP client wrapper
//! - [`pool`] - Worker threads that run blocking tasks off the calling thread
//!
//! A [`RemoteFile`] blocks the thread that calls [`RemoteFile::start`]. Hand it
//! to a [`WorkerPool`] (it implements [`Runnable`]) and poll it from elsewhere
//! through a shared `Arc`.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub mod pool;
mod user_agent;

// Re-export commonly used types
pub use download::{
    DownloadError, DownloadReport, ErrorKind, HttpClient, RemoteFile, Status, WriteMode,
    filename_from_url,
};
pub use pool::{DEFAULT_WORKERS, PoolError, PoolStats, Runnable, WorkerPool};
