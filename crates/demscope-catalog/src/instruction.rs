//! Line-level tokenizer for catalog and painter files.
//!
//! Every non-blank, non-comment line is a comma-delimited instruction whose
//! first field is a tag. Numeric fields that fail to parse fall back to the
//! instruction's default rather than rejecting the line.

use crate::config::WindowCfg;
use demscope_common::ViewMode;
use std::fmt;

/// Which kind of file an instruction belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// Lists DEMs and their nominal geometry (`*.cat.csv`).
    Catalog,
    /// Per-DEM display configuration (`*.pcf.csv`).
    Painter,
}

/// A decoded instruction line.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// `ver,<version>`
    Version(String),
    /// `base,<path>`, commas preserved. An empty path clears the base.
    Base(String),
    /// `name,<text>`
    Name(String),
    /// `dem,<path>`, commas preserved.
    Dem(String),
    /// `disk,<unused>,<size>`
    Disk(Option<u64>),
    /// `geom,<lat>,<lon>,<halfSize>,<scale>`
    Geom {
        lat: f64,
        lon: f64,
        num_pixels: f64,
        gsd: f64,
    },
    /// `descr,<text>`, commas preserved.
    Descr(String),
    /// `offs,<radialOffset>`
    Offs(f64),
    /// `rndr,<showInterior>,<showExterior>,<opacity>[,<reg|val>]`
    Rndr {
        show_interior: bool,
        show_exterior: bool,
        opacity: f64,
        view_mode: Option<ViewMode>,
    },
    /// `win,<isShown>,<x>,<y>,<w>,<h>`
    Win(WindowCfg),
}

impl Instruction {
    /// Decode a line.
    ///
    /// Returns `None` for blank and `#` comment lines and `Some(Err(tag))`
    /// for an unknown tag or a known tag with too few fields.
    pub fn parse(line: &str) -> Option<Result<Instruction, String>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let fields: Vec<&str> = line.split(',').collect();
        let tag = fields[0];
        let field = |i: usize| fields.get(i).map(|f| f.trim());

        let instr = match (tag, fields.len()) {
            ("ver", n) if n >= 2 => Instruction::Version(fields[1].trim().to_string()),
            ("base", n) if n >= 2 => Instruction::Base(rest_after(line, "base").trim().to_string()),
            ("name", n) if n >= 2 => Instruction::Name(rest_after(line, "name").to_string()),
            ("dem", n) if n >= 2 => Instruction::Dem(rest_after(line, "dem").trim().to_string()),
            ("disk", n) if n >= 3 => Instruction::Disk(field(2).and_then(|s| s.parse().ok())),
            ("geom", n) if n >= 5 => Instruction::Geom {
                lat: read_f64(field(1), f64::NAN),
                lon: read_f64(field(2), f64::NAN),
                num_pixels: read_f64(field(3), f64::NAN),
                gsd: read_f64(field(4), f64::NAN),
            },
            ("descr", n) if n >= 2 => Instruction::Descr(rest_after(line, "descr").to_string()),
            ("offs", n) if n >= 2 => Instruction::Offs(read_f64(field(1), 0.0)),
            ("rndr", n) if n >= 4 => Instruction::Rndr {
                show_interior: read_bool(field(1), false),
                show_exterior: read_bool(field(2), false),
                opacity: read_f64(field(3), 1.0),
                view_mode: field(4).and_then(ViewMode::from_abbrev),
            },
            ("win", n) if n >= 6 => {
                let defaults = WindowCfg::default();
                Instruction::Win(WindowCfg {
                    shown: read_bool(field(1), false),
                    x: read_i32(field(2), defaults.x),
                    y: read_i32(field(3), defaults.y),
                    width: read_i32(field(4), defaults.width),
                    height: read_i32(field(5), defaults.height),
                })
            }
            _ => return Some(Err(tag.to_string())),
        };
        Some(Ok(instr))
    }

    /// The file kind this instruction belongs to, or `None` if valid in both.
    pub fn file_kind(&self) -> Option<FileKind> {
        match self {
            Instruction::Version(_) | Instruction::Base(_) | Instruction::Dem(_) => None,
            Instruction::Name(_) | Instruction::Disk(_) | Instruction::Geom { .. } => Some(FileKind::Catalog),
            Instruction::Descr(_) | Instruction::Offs(_) | Instruction::Rndr { .. } | Instruction::Win(_) => {
                Some(FileKind::Painter)
            }
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Version(v) => write!(f, "ver,{v}"),
            Instruction::Base(path) => write!(f, "base,{path}"),
            Instruction::Name(name) => write!(f, "name,{name}"),
            Instruction::Dem(path) => write!(f, "dem,{path}"),
            Instruction::Disk(Some(size)) => write!(f, "disk,0,{size}"),
            Instruction::Disk(None) => write!(f, "disk,0,-1"),
            Instruction::Geom {
                lat,
                lon,
                num_pixels,
                gsd,
            } => write!(f, "geom,{lat},{lon},{num_pixels},{gsd}"),
            Instruction::Descr(text) => write!(f, "descr,{text}"),
            Instruction::Offs(offset) => write!(f, "offs,{offset}"),
            Instruction::Rndr {
                show_interior,
                show_exterior,
                opacity,
                view_mode,
            } => {
                write!(f, "rndr,{show_interior},{show_exterior},{opacity}")?;
                match view_mode.and_then(ViewMode::abbrev) {
                    Some(abbrev) => write!(f, ",{abbrev}"),
                    None => Ok(()),
                }
            }
            Instruction::Win(win) => write!(
                f,
                "win,{},{},{},{},{}",
                win.shown, win.x, win.y, win.width, win.height
            ),
        }
    }
}

fn rest_after<'a>(line: &'a str, tag: &str) -> &'a str {
    line.get(tag.len() + 1..).unwrap_or_default()
}

fn read_f64(field: Option<&str>, default: f64) -> f64 {
    field.and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn read_i32(field: Option<&str>, default: i32) -> i32 {
    field.and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn read_bool(field: Option<&str>, default: bool) -> bool {
    match field {
        Some(s) if s.eq_ignore_ascii_case("true") => true,
        Some(s) if s.eq_ignore_ascii_case("false") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Instruction {
        Instruction::parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_blank_and_comment_lines() {
        assert!(Instruction::parse("").is_none());
        assert!(Instruction::parse("   ").is_none());
        assert!(Instruction::parse("# dem,foo.fit").is_none());
    }

    #[test]
    fn test_unknown_and_short_lines() {
        assert_eq!(Instruction::parse("foo,bar"), Some(Err("foo".to_string())));
        assert_eq!(Instruction::parse("geom,1,2,3"), Some(Err("geom".to_string())));
        assert_eq!(Instruction::parse("dem"), Some(Err("dem".to_string())));
    }

    #[test]
    fn test_descr_keeps_commas() {
        assert_eq!(parse("descr,north pole, high res"), Instruction::Descr("north pole, high res".into()));
    }

    #[test]
    fn test_paths_keep_commas() {
        assert_eq!(parse("dem,/data/bennu,v2/tile 1,2.fit"), Instruction::Dem("/data/bennu,v2/tile 1,2.fit".into()));
        assert_eq!(parse("base, /data/run,3 "), Instruction::Base("/data/run,3".into()));
        assert_eq!(parse("base,"), Instruction::Base(String::new()));
        let dem = Instruction::Dem("a,b.fit".into());
        assert_eq!(parse(&dem.to_string()), dem);
    }

    #[test]
    fn test_geom_fallback_to_nan() {
        match parse("geom,10.5,abc,64.0,0.25") {
            Instruction::Geom {
                lat,
                lon,
                num_pixels,
                gsd,
            } => {
                assert_eq!(lat, 10.5);
                assert!(lon.is_nan());
                assert_eq!(num_pixels, 64.0);
                assert_eq!(gsd, 0.25);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_rndr_view_modes() {
        let rndr = |mode: &str| match parse(&format!("rndr,true,false,0.5{mode}")) {
            Instruction::Rndr { view_mode, .. } => view_mode,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(rndr(""), None);
        assert_eq!(rndr(",reg"), Some(ViewMode::IncludingInvalid));
        assert_eq!(rndr(",VAL"), Some(ViewMode::ValidOnly));
        assert_eq!(rndr(",true"), Some(ViewMode::IncludingInvalid));
        assert_eq!(rndr(",false"), Some(ViewMode::ValidOnly));
        assert_eq!(rndr(",sideways"), None);
    }

    #[test]
    fn test_win_defaults() {
        assert_eq!(
            parse("win,true,x,5,?,?"),
            Instruction::Win(WindowCfg {
                shown: true,
                x: 0,
                y: 5,
                width: 800,
                height: 450,
            })
        );
    }

    #[test]
    fn test_display_matches_parse() {
        let lines = [
            "ver,2020.11.0",
            "base,/data/a",
            "dem,x.fit",
            "disk,0,1024",
            "geom,-12.5,100.25,64,0.05",
            "descr,a, b",
            "offs,-3",
            "rndr,true,false,0.75,val",
            "rndr,false,false,1",
            "win,false,10,20,800,450",
        ];
        for line in lines {
            assert_eq!(parse(line).to_string(), line);
        }
    }

    #[test]
    fn test_file_kinds() {
        assert_eq!(parse("dem,x").file_kind(), None);
        assert_eq!(parse("disk,0,1").file_kind(), Some(FileKind::Catalog));
        assert_eq!(parse("offs,1").file_kind(), Some(FileKind::Painter));
    }
}
