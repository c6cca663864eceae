//! Error types for the load lifecycle.

use demscope_catalog::CatalogError;
use demscope_io::{FetchError, ParseError};
use demscope_mesh::GeometryError;
use std::path::PathBuf;
use thiserror::Error;

/// Why a load did not produce a mesh.
///
/// Stored in a painter's failed slot, so it carries messages rather than the
/// underlying I/O errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    /// The source could not be made available locally.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The content is neither a structured grid nor an OBJ shape model.
    #[error("parse failed: {0}")]
    Parse(String),

    /// The grid decoded but no mesh could be built from it.
    #[error("mesh build failed: {0}")]
    Geometry(GeometryError),

    /// The load was cancelled. Never stored as a failure.
    #[error("load cancelled")]
    Cancelled,
}

impl LoadError {
    /// Label used for the `stage` metric label.
    pub fn stage(&self) -> &'static str {
        match self {
            LoadError::Fetch(_) => "fetch",
            LoadError::Parse(_) => "parse",
            LoadError::Geometry(_) => "geometry",
            LoadError::Cancelled => "cancelled",
        }
    }
}

impl From<FetchError> for LoadError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Cancelled => LoadError::Cancelled,
            other => LoadError::Fetch(other.to_string()),
        }
    }
}

impl From<ParseError> for LoadError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Cancelled => LoadError::Cancelled,
            ParseError::Geometry(GeometryError::Cancelled) => LoadError::Cancelled,
            ParseError::Geometry(geometry) => LoadError::Geometry(geometry),
            other => LoadError::Parse(other.to_string()),
        }
    }
}

/// Errors setting up or persisting a [`DemManager`](crate::DemManager).
#[derive(Debug, Error)]
pub enum ManagerError {
    /// The worker pool could not be created.
    #[error("failed to start load workers: {0}")]
    Scheduler(#[from] rayon::ThreadPoolBuildError),

    /// The download cache could not be prepared.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Errors reading [`LoadSettings`](crate::LoadSettings).
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_recognized_everywhere() {
        assert_eq!(LoadError::from(FetchError::Cancelled), LoadError::Cancelled);
        assert_eq!(LoadError::from(ParseError::Cancelled), LoadError::Cancelled);
        assert_eq!(
            LoadError::from(ParseError::Geometry(GeometryError::Cancelled)),
            LoadError::Cancelled
        );
    }

    #[test]
    fn test_geometry_is_kept_structured() {
        let err = LoadError::from(ParseError::Geometry(GeometryError::EmptyMesh));
        assert_eq!(err, LoadError::Geometry(GeometryError::EmptyMesh));
        assert_eq!(err.stage(), "geometry");
    }

    #[test]
    fn test_other_errors_become_messages() {
        let err = LoadError::from(ParseError::InvalidHeader("first keyword is not SIMPLE".into()));
        assert!(matches!(&err, LoadError::Parse(msg) if msg.contains("SIMPLE")));

        let err = LoadError::from(FetchError::NotFound("/nope.fit".into()));
        assert_eq!(err.stage(), "fetch");
    }
}
