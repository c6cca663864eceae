//! Error types for the DEM I/O crate.

use demscope_mesh::GeometryError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while decoding a DEM file.
#[derive(Debug, Error)]
pub enum ParseError {
    /// I/O error reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The FITS header is malformed or missing required keywords.
    #[error("Invalid FITS header: {0}")]
    InvalidHeader(String),

    /// BITPIX value this reader does not decode.
    #[error("Unsupported FITS BITPIX: {0}")]
    UnsupportedBitpix(i64),

    /// The data unit is shorter than the header announces.
    #[error("Truncated data: expected {expected} bytes, found {actual}")]
    Truncated {
        /// Bytes required by the header.
        expected: usize,
        /// Bytes available.
        actual: usize,
    },

    /// A malformed record in an OBJ file.
    #[error("Invalid OBJ data at line {line}: {reason}")]
    InvalidObj {
        /// 1-based line number.
        line: usize,
        /// What was wrong.
        reason: String,
    },

    /// The grid decoded but could not be triangulated.
    #[error("Geometry error: {0}")]
    Geometry(GeometryError),

    /// The parse observed its cancellation flag.
    #[error("Parse was cancelled")]
    Cancelled,
}

impl From<GeometryError> for ParseError {
    fn from(err: GeometryError) -> Self {
        match err {
            GeometryError::Cancelled => ParseError::Cancelled,
            other => ParseError::Geometry(other),
        }
    }
}

/// Errors that can occur while making a DEM resource available locally.
#[derive(Debug, Error)]
pub enum FetchError {
    /// I/O error reading or caching a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request error.
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// The local file does not exist.
    #[error("File does not exist: {0}")]
    NotFound(PathBuf),

    /// The server answered but the download did not succeed.
    #[error("Failed to download {url}: {reason}")]
    DownloadFailed {
        /// Requested URL.
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// The source is not something this fetcher can resolve.
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    /// The fetch observed its cancellation flag.
    #[error("Fetch was cancelled")]
    Cancelled,
}
