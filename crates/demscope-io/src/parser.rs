//! Format dispatch for DEM files.

use crate::error::ParseError;
use crate::fits::read_grid;
use crate::obj::parse_obj;
use crate::Result;
use demscope_common::{KeyValueMap, ViewMode};
use demscope_mesh::{ProgressMonitor, DemMesh, GridMeshBuilder, NoopMonitor};
use std::path::Path;
use tracing::debug;

/// Output of a successful parse.
#[derive(Debug, Clone)]
pub struct ParsedDem {
    pub mesh: DemMesh,
    /// Header metadata. Empty for OBJ files.
    pub key_values: KeyValueMap,
}

/// Whether a file name carries the OBJ extension.
pub fn is_obj_name(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".obj")
}

/// Reads DEM files and hands structured grids to a [`GridMeshBuilder`].
///
/// A structured (FITS) grid is tried first. Only when that fails and the
/// name ends in `.obj` is the content read as an OBJ shape model; if that
/// fails too the structured-grid error is returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemFileParser {
    builder: GridMeshBuilder,
}

impl DemFileParser {
    pub fn new(builder: GridMeshBuilder) -> Self {
        Self { builder }
    }

    pub fn builder(&self) -> &GridMeshBuilder {
        &self.builder
    }

    /// Read and parse a file from disk.
    pub fn parse_file(&self, path: &Path, mode: ViewMode) -> Result<ParsedDem> {
        self.parse_file_monitored(path, mode, &mut NoopMonitor)
    }

    pub fn parse_file_monitored(&self, path: &Path, mode: ViewMode, monitor: &mut dyn ProgressMonitor) -> Result<ParsedDem> {
        let bytes = std::fs::read(path)?;
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        self.parse_bytes(&name, &bytes, mode, monitor)
    }

    /// Parse in-memory content. `name` is only used to pick the fallback format.
    pub fn parse_bytes(
        &self,
        name: &str,
        bytes: &[u8],
        mode: ViewMode,
        monitor: &mut dyn ProgressMonitor,
    ) -> Result<ParsedDem> {
        let structured_err = match self.parse_structured(bytes, mode, monitor) {
            Ok(parsed) => return Ok(parsed),
            Err(ParseError::Cancelled) => return Err(ParseError::Cancelled),
            Err(err) => err,
        };

        if !is_obj_name(name) {
            return Err(structured_err);
        }
        debug!(name, error = %structured_err, "Not a structured grid, reading as OBJ");

        let text = String::from_utf8_lossy(bytes);
        match parse_obj(&text) {
            Ok(mesh) => {
                monitor.progress(1.0);
                Ok(ParsedDem {
                    mesh,
                    key_values: KeyValueMap::new(),
                })
            }
            Err(obj_err) => {
                debug!(name, error = %obj_err, "OBJ read failed as well");
                Err(structured_err)
            }
        }
    }

    fn parse_structured(&self, bytes: &[u8], mode: ViewMode, monitor: &mut dyn ProgressMonitor) -> Result<ParsedDem> {
        let fits = read_grid(bytes)?;
        let mesh = self.builder.build_monitored(&fits.grid, mode, monitor)?;
        Ok(ParsedDem {
            mesh,
            key_values: fits.header.key_values(),
        })
    }
}
