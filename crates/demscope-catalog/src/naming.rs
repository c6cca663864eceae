//! File naming for catalog and painter files.

use std::path::{Path, PathBuf};

pub const CATALOG_SUFFIX: &str = ".cat.csv";
pub const PAINTER_SUFFIX: &str = ".pcf.csv";

/// `<dir>/<tag>.cat.csv`
pub fn catalog_file(dir: &Path, tag: &str) -> PathBuf {
    dir.join(format!("{tag}{CATALOG_SUFFIX}"))
}

/// `<dir>/<tag>.pcf.csv`
pub fn painter_file(dir: &Path, tag: &str) -> PathBuf {
    dir.join(format!("{tag}{PAINTER_SUFFIX}"))
}

/// The painter file that accompanies a catalog file: `x.cat.csv` becomes
/// `x.pcf.csv` in the same directory. Any other name gets the suffix appended.
pub fn painter_file_for(catalog: &Path) -> PathBuf {
    let name = catalog.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    let tag = name.strip_suffix(CATALOG_SUFFIX).unwrap_or(&name);
    let file = format!("{tag}{PAINTER_SUFFIX}");
    match catalog.parent() {
        Some(dir) => dir.join(file),
        None => PathBuf::from(file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        let dir = Path::new("/cache/dems");
        assert_eq!(catalog_file(dir, "bennu"), Path::new("/cache/dems/bennu.cat.csv"));
        assert_eq!(painter_file(dir, "bennu"), Path::new("/cache/dems/bennu.pcf.csv"));
    }

    #[test]
    fn test_painter_for_catalog() {
        assert_eq!(
            painter_file_for(Path::new("/cache/bennu.cat.csv")),
            Path::new("/cache/bennu.pcf.csv")
        );
        assert_eq!(painter_file_for(Path::new("/cache/list.txt")), Path::new("/cache/list.txt.pcf.csv"));
        assert_eq!(painter_file_for(Path::new("x.cat.csv")), Path::new("x.pcf.csv"));
    }
}
