//! Immutable DEM tile descriptor.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a DEM tile.
///
/// Geometry fields that are unknown (for example a descriptor formed from an
/// OBJ file) are `NaN`. Equality and hashing compare the float bit patterns,
/// so a descriptor with `NaN` fields is still equal to itself and can be used
/// as a map key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemDescriptor {
    /// Path or URL of the DEM resource.
    pub source: String,
    /// Center latitude in degrees.
    pub lat: f64,
    /// Center longitude in degrees.
    pub lon: f64,
    /// Ground sample distance (meters per pixel).
    pub gsd: f64,
    /// Tile dimension in pixels (tiles are square).
    pub num_pixels: f64,
}

impl DemDescriptor {
    /// Create a descriptor.
    pub fn new(source: impl Into<String>, lat: f64, lon: f64, gsd: f64, num_pixels: f64) -> Self {
        Self {
            source: source.into(),
            lat,
            lon,
            gsd,
            num_pixels,
        }
    }

    /// Descriptor for a source whose geometry is not known.
    pub fn unknown_geometry(source: impl Into<String>) -> Self {
        Self::new(source, f64::NAN, f64::NAN, f64::NAN, f64::NAN)
    }

    /// Copy of this descriptor pointing at a different source.
    pub fn with_source(&self, source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..self.clone()
        }
    }

    /// Copy of this descriptor with a different center.
    pub fn with_center(&self, lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            ..self.clone()
        }
    }

    /// Copy of this descriptor with a different ground sample distance.
    pub fn with_gsd(&self, gsd: f64) -> Self {
        Self { gsd, ..self.clone() }
    }

    /// Copy of this descriptor with a different pixel dimension.
    pub fn with_num_pixels(&self, num_pixels: f64) -> Self {
        Self {
            num_pixels,
            ..self.clone()
        }
    }

    /// True when the source is a remote URL (`scheme://...`) other than `file://`.
    pub fn is_remote(&self) -> bool {
        match self.source.split_once("://") {
            Some((scheme, _)) => !scheme.eq_ignore_ascii_case("file"),
            None => false,
        }
    }

    /// Final path component of the source.
    pub fn file_name(&self) -> &str {
        let trimmed = self.source.trim_end_matches('/');
        match trimmed.rfind(['/', '\\']) {
            Some(idx) => &trimmed[idx + 1..],
            None => trimmed,
        }
    }

    /// Everything in the source before the final `/`, without a trailing
    /// separator. Empty when the source has no `/`.
    ///
    /// Only `/` separates a base, since that is what a base is joined back
    /// with. A Windows path such as `C:\dems\a.fit` has no base.
    pub fn base_path(&self) -> &str {
        let trimmed = self.source.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(0) => "/",
            Some(idx) => &trimmed[..idx],
            None => "",
        }
    }

    fn key(&self) -> (&str, u64, u64, u64, u64) {
        (
            self.source.as_str(),
            self.lat.to_bits(),
            self.lon.to_bits(),
            self.gsd.to_bits(),
            self.num_pixels.to_bits(),
        )
    }
}

impl PartialEq for DemDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for DemDescriptor {}

impl Hash for DemDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for DemDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}
