//! # demscope-common
//!
//! Types shared by every crate in the demscope workspace:
//!
//! - [`DemDescriptor`]: the immutable identity of a DEM tile (where it lives and
//!   its nominal geometry).
//! - [`ViewMode`]: the validity policy a mesh was built under.
//! - [`KeyValueEntry`] / [`KeyValueMap`]: header metadata harvested from DEM files.
//!
//! ## Example
//!
//! ```
//! use demscope_common::{DemDescriptor, KeyValueMap, ViewMode};
//!
//! let dem = DemDescriptor::new("/data/a/x.fit", 10.0, 20.0, 0.5, 64.0);
//! assert_eq!(dem.file_name(), "x.fit");
//!
//! let moved = dem.with_center(11.0, 21.0);
//! assert_ne!(dem, moved);
//!
//! assert_eq!(ViewMode::from_abbrev("val"), Some(ViewMode::ValidOnly));
//!
//! let mut kv = KeyValueMap::new();
//! kv.insert("GSD", "0.5", None);
//! kv.insert("GSD", "9.9", None);
//! assert_eq!(kv.value("GSD"), Some("0.5"));
//! ```

mod descriptor;
mod key_value;
mod view_mode;

pub use descriptor::DemDescriptor;
pub use key_value::{KeyValueEntry, KeyValueMap};
pub use view_mode::{UnknownViewMode, ViewMode};
