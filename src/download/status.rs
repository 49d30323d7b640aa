//! Lifecycle state of a download task.

use std::fmt;

use serde::Serialize;

/// Lifecycle state of a [`RemoteFile`](super::RemoteFile).
///
/// ```text
/// Unknown ──start()──▶ Loading ──▶ Loaded
///                         │
///                         └──────▶ Error
/// ```
///
/// Calling `start()` again from a terminal state begins a fresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Status {
    /// Created, never started.
    #[default]
    Unknown,
    /// Transfer in progress.
    Loading,
    /// Transfer finished and every byte was written.
    Loaded,
    /// Transfer failed; see `error_string()`.
    Error,
}

impl Status {
    /// Returns the stable string label for display output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Loading => "Loading",
            Self::Loaded => "Loaded",
            Self::Error => "Error",
        }
    }

    /// Returns true for `Loaded` and `Error`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Loaded | Self::Error)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
