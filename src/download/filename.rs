//! Filename derivation and sanitization for download destinations.

use std::path::{Component, Path};

use tracing::debug;
use url::Url;

use super::constants::FALLBACK_FILENAME;

/// Derives a safe local filename from the last path segment of a URL.
///
/// The segment is percent-decoded and sanitized. URLs without a usable
/// segment (e.g. `https://example.com/`) yield `download.bin`.
#[must_use]
pub fn filename_from_url(url: &Url) -> String {
    if let Some(mut segments) = url.path_segments()
        && let Some(last) = segments.next_back()
        && !last.is_empty()
    {
        let decoded = urlencoding::decode(last).unwrap_or_else(|e| {
            debug!(
                segment = %last,
                error = %e,
                "URL decoding failed, using raw segment"
            );
            last.into()
        });
        let sanitized = sanitize_filename(&decoded);
        if !sanitized.trim_matches('_').is_empty() {
            return sanitized;
        }
    }

    FALLBACK_FILENAME.to_string()
}

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
