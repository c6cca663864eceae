//! Adding user files to the DEM cache.

use crate::fetch::local_path;
use crate::fits::FitsHeader;
use crate::parser::is_obj_name;
use crate::Result;
use demscope_common::{DemDescriptor, KeyValueMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A descriptor formed from a file's header, plus that header.
#[derive(Debug, Clone)]
pub struct DescribedDem {
    pub descriptor: DemDescriptor,
    pub key_values: KeyValueMap,
}

/// Form a descriptor from the header of a DEM file without decoding its data.
///
/// Geometry comes from `CLAT`/`LATITUDE`, `CLON`/`360 - LONGTUDE`,
/// `GSD`/`SCALE` and `NAXIS1`. A file that is not a structured grid but has
/// the `.obj` extension yields a descriptor with unknown geometry.
pub fn describe_file(path: &Path) -> Result<DescribedDem> {
    let bytes = fs::read(path)?;
    let source = path.to_string_lossy().into_owned();

    let header = match FitsHeader::parse(&bytes) {
        Ok((header, _)) => header,
        Err(err) => {
            let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            if is_obj_name(&name) {
                return Ok(DescribedDem {
                    descriptor: DemDescriptor::unknown_geometry(source),
                    key_values: KeyValueMap::new(),
                });
            }
            return Err(err);
        }
    };

    let lat = header.f64_value("CLAT").or_else(|| header.f64_value("LATITUDE"));
    let lon = header
        .f64_value("CLON")
        .or_else(|| header.f64_value("LONGTUDE").map(|west| 360.0 - west));
    let gsd = header.f64_value("GSD").or_else(|| header.f64_value("SCALE"));
    let num_pixels = header.f64_value("NAXIS1");

    let descriptor = DemDescriptor::new(
        source,
        lat.unwrap_or(f64::NAN),
        lon.unwrap_or(f64::NAN),
        gsd.unwrap_or(f64::NAN),
        num_pixels.unwrap_or(f64::NAN),
    );
    Ok(DescribedDem {
        descriptor,
        key_values: header.key_values(),
    })
}

/// Copy `path` into `cache_dir` under the next free name and describe the copy.
pub fn copy_to_cache(cache_dir: &Path, path: &Path) -> Result<DescribedDem> {
    if !path.is_file() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("not a file: {}", path.display()),
        )
        .into());
    }

    let described = describe_file(path)?;

    fs::create_dir_all(cache_dir)?;
    let dest = next_available(cache_dir, path);
    fs::copy(path, &dest)?;

    if described.descriptor.lat.is_nan() {
        warn!(file = %path.display(), "Content not validated, assuming OBJ shape model");
    }
    info!(file = %path.display(), cached = %dest.display(), "Added DEM to cache");

    let source = dest.to_string_lossy().into_owned();
    Ok(DescribedDem {
        descriptor: described.descriptor.with_source(source),
        key_values: described.key_values,
    })
}

/// Delete the cached file behind `descriptor`, if it exists locally.
pub fn remove_cached(descriptor: &DemDescriptor) -> Result<bool> {
    if descriptor.is_remote() {
        return Ok(false);
    }
    let path = local_path(&descriptor.source);
    let path = path.as_path();
    if !path.is_file() {
        return Ok(false);
    }
    info!(file = %path.display(), "Removing cache file");
    fs::remove_file(path)?;
    Ok(true)
}

/// `dir/name.ext`, or `dir/name_1.ext`, `dir/name_2.ext`, ... if taken.
fn next_available(dir: &Path, path: &Path) -> PathBuf {
    let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let candidate = dir.join(&file_name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), format!(".{ext}")),
        _ => (file_name.clone(), String::new()),
    };
    (1..)
        .map(|n| dir.join(format!("{stem}_{n}{ext}")))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_available() {
        let dir = tempfile::tempdir().unwrap();
        let src = Path::new("/somewhere/tile.fit");
        assert_eq!(next_available(dir.path(), src), dir.path().join("tile.fit"));

        fs::write(dir.path().join("tile.fit"), b"x").unwrap();
        fs::write(dir.path().join("tile_1.fit"), b"x").unwrap();
        assert_eq!(next_available(dir.path(), src), dir.path().join("tile_2.fit"));
    }

    #[test]
    fn test_obj_gets_unknown_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shape.OBJ");
        fs::write(&path, "v 0 0 0\n").unwrap();

        let described = describe_file(&path).unwrap();
        assert!(described.descriptor.lat.is_nan());
        assert!(described.descriptor.num_pixels.is_nan());
        assert!(described.key_values.is_empty());
    }

    #[test]
    fn test_unknown_format_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "hello").unwrap();
        assert!(describe_file(&path).is_err());
    }
}
