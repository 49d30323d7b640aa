//! Default User-Agent string for download requests.

/// Product token identifying the tool (RFC 9110 section 10.1.5).
const PRODUCT: &str = "remote-file";

/// Default User-Agent for download requests (identifies the tool).
#[must_use]
pub(crate) fn default_download_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("{PRODUCT}/{version} (single-file-downloader)")
}
