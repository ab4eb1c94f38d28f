//! Remote call failures

use thiserror::Error;

/// Why a catalog or directory request did not produce data
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, timeout, or body decoding failure
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },
}
