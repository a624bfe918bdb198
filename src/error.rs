//! Error taxonomy for a single installer run
//!
//! Every variant is fatal to the run. The only local recovery is the
//! fetcher's retry loop, which turns repeated [`InstallError::DownloadError`]s
//! into one [`InstallError::DownloadExhaustedError`].

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = InstallError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("invalid repository identifier {0:?}: expected owner/name")]
    InvalidRepository(String),

    #[error("install directory {} does not exist", .0.display())]
    InstallDirMissing(PathBuf),

    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("release API request to {url} failed")]
    ApiRequest {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("release API request to {url} failed with status {status}")]
    ApiError { url: String, status: u16 },

    #[error("malformed release API response from {url}")]
    ParseError {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("download of {url} failed: {reason}")]
    DownloadError { url: String, reason: String },

    #[error("download of {url} failed after {attempts} attempts")]
    DownloadExhaustedError {
        url: String,
        attempts: u32,
        #[source]
        last: Box<InstallError>,
    },

    #[error("failed to extract {}", .archive.display())]
    ExtractError {
        archive: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write settings to {}", .path.display())]
    SettingsWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to publish output {name}")]
    OutputError {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("installation cancelled")]
    Cancelled,
}

impl InstallError {
    pub(crate) fn download(url: &str, reason: impl Into<String>) -> Self {
        Self::DownloadError {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
