//! # demscope-catalog
//!
//! Reading and writing the two text files that describe a DEM collection:
//!
//! - **Catalog files** (`*.cat.csv`) list the DEMs and their nominal geometry.
//! - **Painter files** (`*.pcf.csv`) hold per-DEM display configuration.
//!
//! Both are line-oriented lists of comma-delimited [`Instruction`]s. A `dem`
//! line starts a block that runs to the next `dem` line, and `base` lines set
//! the prefix for the `dem` paths that follow. Instructions meant for the
//! other file kind are skipped; anything else that is not understood is
//! logged and reported as a [`ConfigParseWarning`] without failing the read.
//!
//! ## Example
//!
//! ```
//! use demscope_catalog::{Catalog, PainterConfig};
//!
//! let text = "ver,2020.11.0\n\
//!             base,/data/a\n\
//!             dem,x.fit\n\
//!             geom,-12.5,100.25,64,0.05\n";
//! let (catalog, report) = Catalog::decode(text);
//! assert!(report.is_clean());
//! assert_eq!(catalog.entries[0].descriptor.source, "/data/a/x.fit");
//!
//! let known: Vec<_> = catalog.descriptors().cloned().collect();
//! let (config, _) = PainterConfig::decode("dem,/data/a/x.fit\nrndr,true,false,0.8,val\n", &known);
//! assert!(config.entries[0].1.show_interior);
//! ```

mod catalog;
mod config;
mod error;
mod header;
mod instruction;
mod naming;
mod path;
mod reader;
mod version;

pub use catalog::{Catalog, CatalogEntry};
pub use config::{ConfigEntry, PainterConfig, WindowCfg};
pub use error::{CatalogError, ConfigParseWarning, ReadReport, WarningKind};
pub use instruction::{FileKind, Instruction};
pub use naming::{catalog_file, painter_file, painter_file_for, CATALOG_SUFFIX, PAINTER_SUFFIX};
pub use path::{is_url, resolve};
pub use version::FormatVersion;

/// Result type for catalog file operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
