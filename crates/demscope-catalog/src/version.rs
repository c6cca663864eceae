//! File format version.

use std::fmt;

/// `<year>.<month>[.<patch>]` version stamped on catalog and painter files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormatVersion {
    pub year: u32,
    pub month: u32,
    pub patch: u32,
}

impl FormatVersion {
    /// Version written by this crate.
    pub const CURRENT: FormatVersion = FormatVersion::new(2020, 11, 0);

    pub const fn new(year: u32, month: u32, patch: u32) -> Self {
        Self { year, month, patch }
    }

    /// Parse `yyyy.mm` or `yyyy.mm.pp`. Returns `None` for anything else.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.trim().split('.');
        let year = parts.next()?.parse().ok()?;
        let month = parts.next()?.parse().ok()?;
        let patch = match parts.next() {
            Some(p) => p.parse().ok()?,
            None => 0,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(year, month, patch))
    }

    /// Whether this version is newer than [`FormatVersion::CURRENT`].
    pub fn is_future(&self) -> bool {
        *self > Self::CURRENT
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.year, self.month, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!(FormatVersion::parse("2020.11"), Some(FormatVersion::CURRENT));
        assert_eq!(FormatVersion::parse(" 2020.11.0 "), Some(FormatVersion::CURRENT));
        assert_eq!(FormatVersion::parse("2021.2.3"), Some(FormatVersion::new(2021, 2, 3)));
        assert_eq!(FormatVersion::parse("2020"), None);
        assert_eq!(FormatVersion::parse("abc.11"), None);
        assert_eq!(FormatVersion::parse("2020.11.0.1"), None);
    }

    #[test]
    fn test_future() {
        assert!(!FormatVersion::CURRENT.is_future());
        assert!(!FormatVersion::new(2019, 12, 5).is_future());
        assert!(FormatVersion::new(2020, 11, 1).is_future());
        assert!(FormatVersion::new(2021, 1, 0).is_future());
        assert_eq!(FormatVersion::CURRENT.to_string(), "2020.11.0");
    }
}
