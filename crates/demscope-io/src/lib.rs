//! # demscope-io
//!
//! Reading DEM files and making DEM resources available locally.
//!
//! ## Formats
//!
//! - **Structured grids (FITS)**: a primary HDU whose cube holds X, Y, Z and
//!   any number of backplanes. `PLANEn` header cards say which plane is which.
//!   Decoded into a [`RawGrid`](demscope_mesh::RawGrid) and triangulated by a
//!   [`GridMeshBuilder`](demscope_mesh::GridMeshBuilder).
//! - **OBJ shape models**: plain vertex/face geometry, no backplanes.
//!
//! [`DemFileParser`] tries the structured grid first and falls back to OBJ
//! only for files named `*.obj`.
//!
//! ## Fetching
//!
//! The [`Fetch`] trait turns a [`DemDescriptor`](demscope_common::DemDescriptor)
//! into local bytes. [`LocalFetcher`] reads local paths; [`HttpFetcher`]
//! downloads URLs into a cache directory.
//!
//! ## Example
//!
//! ```no_run
//! use demscope_common::ViewMode;
//! use demscope_io::{describe_file, DemFileParser};
//! use std::path::Path;
//!
//! let path = Path::new("dems/bennu_tile.fit");
//! let described = describe_file(path)?;
//! println!("center: {}, {}", described.descriptor.lat, described.descriptor.lon);
//!
//! let parsed = DemFileParser::default().parse_file(path, ViewMode::ValidOnly)?;
//! println!("{} triangles", parsed.mesh.triangle_count());
//! # Ok::<(), demscope_io::ParseError>(())
//! ```

mod error;
mod fetch;
mod fits;
mod ingest;
mod obj;
mod parser;

pub use error::{FetchError, ParseError};
pub use fetch::{local_path, DownloadStats, Fetch, HttpFetcher, LocalBytes, LocalFetcher};
pub use fits::{encode_grid, read_grid, FitsGrid, FitsHeader, HeaderCard, BLOCK_SIZE, CARD_SIZE};
pub use ingest::{copy_to_cache, describe_file, remove_cached, DescribedDem};
pub use obj::parse_obj;
pub use parser::{is_obj_name, DemFileParser, ParsedDem};

/// Result type for parse operations.
pub type Result<T> = std::result::Result<T, ParseError>;
