//! Constants for the download module (timeouts, filename fallback).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes between body chunks).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Filename used when a URL has no usable last path segment.
pub(crate) const FALLBACK_FILENAME: &str = "download.bin";
