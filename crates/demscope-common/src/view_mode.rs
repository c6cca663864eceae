//! Validity policy a DEM mesh is built under.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which cells of a DEM grid are admitted into a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ViewMode {
    /// Geometry only, no per-cell measurements (e.g. OBJ shape models).
    Plain,
    /// Admit every cell whose coordinates and backplanes are defined.
    IncludingInvalid,
    /// Additionally require the validity backplane to be non-zero.
    ValidOnly,
}

/// Error returned when a view mode string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown view mode: {0}")]
pub struct UnknownViewMode(pub String);

impl ViewMode {
    /// All modes, in declaration order.
    pub const ALL: [ViewMode; 3] = [ViewMode::Plain, ViewMode::IncludingInvalid, ViewMode::ValidOnly];

    /// Short label used in status strings.
    pub fn brief(self) -> &'static str {
        match self {
            ViewMode::Plain => "Pla.",
            ViewMode::IncludingInvalid => "Reg.",
            ViewMode::ValidOnly => "Val.",
        }
    }

    /// Abbreviation used in configuration files. `Plain` is never written.
    pub fn abbrev(self) -> Option<&'static str> {
        match self {
            ViewMode::Plain => None,
            ViewMode::IncludingInvalid => Some("reg"),
            ViewMode::ValidOnly => Some("val"),
        }
    }

    /// Parse a configuration file abbreviation (case-insensitive).
    ///
    /// The legacy boolean spellings are accepted: `true` meant "view bad
    /// data" and maps to [`ViewMode::IncludingInvalid`].
    pub fn from_abbrev(s: &str) -> Option<ViewMode> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reg" | "true" => Some(ViewMode::IncludingInvalid),
            "val" | "false" => Some(ViewMode::ValidOnly),
            _ => None,
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ViewMode::Plain => "plain",
            ViewMode::IncludingInvalid => "including-invalid",
            ViewMode::ValidOnly => "valid-only",
        };
        f.write_str(s)
    }
}

impl FromStr for ViewMode {
    type Err = UnknownViewMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "plain" | "pla" => Ok(ViewMode::Plain),
            "including-invalid" | "regular" => Ok(ViewMode::IncludingInvalid),
            "valid-only" | "valid" => Ok(ViewMode::ValidOnly),
            other => ViewMode::from_abbrev(other).ok_or_else(|| UnknownViewMode(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbrev_round_trip() {
        for mode in ViewMode::ALL {
            if let Some(abbrev) = mode.abbrev() {
                assert_eq!(ViewMode::from_abbrev(abbrev), Some(mode));
            }
        }
        assert_eq!(ViewMode::Plain.abbrev(), None);
    }

    #[test]
    fn test_legacy_booleans() {
        assert_eq!(ViewMode::from_abbrev("TRUE"), Some(ViewMode::IncludingInvalid));
        assert_eq!(ViewMode::from_abbrev("false"), Some(ViewMode::ValidOnly));
        assert_eq!(ViewMode::from_abbrev("maybe"), None);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("valid-only".parse::<ViewMode>(), Ok(ViewMode::ValidOnly));
        assert_eq!("Reg".parse::<ViewMode>(), Ok(ViewMode::IncludingInvalid));
        assert!("sideways".parse::<ViewMode>().is_err());
    }

    #[test]
    fn test_brief() {
        assert_eq!(ViewMode::ValidOnly.brief(), "Val.");
        assert_eq!(ViewMode::IncludingInvalid.brief(), "Reg.");
        assert_eq!(ViewMode::Plain.brief(), "Pla.");
    }
}
