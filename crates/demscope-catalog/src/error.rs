//! Error and warning types for catalog files.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Hard failures while reading or writing a catalog or painter file.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The file could not be opened, read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CatalogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CatalogError::Io {
            path: path.into(),
            source,
        }
    }
}

/// What went wrong on a single line. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    /// Unknown tag, or a known tag with too few fields.
    UnrecognizedLine(String),
    /// The file declares a newer format than this reader knows.
    FutureVersion(String),
    /// The version could not be parsed; reading stopped here.
    UnparseableVersion(String),
    /// A `dem` block resolved to a path that was already read.
    DuplicatePath(String),
    /// A configuration block names a DEM that is not known.
    UnmatchedConfig(String),
}

/// A per-line problem found while reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigParseWarning {
    /// 1-based line number.
    pub line: usize,
    pub kind: WarningKind,
}

impl fmt::Display for ConfigParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WarningKind::UnrecognizedLine(text) => write!(f, "[L:{}] skipping unrecognized line: {}", self.line, text),
            WarningKind::FutureVersion(ver) => {
                write!(f, "[L:{}] future version {}, some instructions may be unsupported", self.line, ver)
            }
            WarningKind::UnparseableVersion(ver) => {
                write!(f, "[L:{}] unrecognized version '{}', aborting", self.line, ver)
            }
            WarningKind::DuplicatePath(path) => {
                write!(f, "[L:{}] skipping dem, path already specified: {}", self.line, path)
            }
            WarningKind::UnmatchedConfig(path) => {
                write!(f, "[L:{}] skipping configuration, path does not map to a dem: {}", self.line, path)
            }
        }
    }
}

/// Outcome of a read apart from the decoded content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadReport {
    pub warnings: Vec<ConfigParseWarning>,
    /// Reading stopped early at an unparseable version line.
    pub aborted: bool,
}

impl ReadReport {
    /// No warnings and read to the end.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && !self.aborted
    }

    pub(crate) fn warn(&mut self, line: usize, kind: WarningKind) {
        let warning = ConfigParseWarning { line, kind };
        tracing::warn!(line, "{}", warning);
        self.warnings.push(warning);
    }
}
