//! Painter configuration files: per-DEM display state.

use crate::error::{CatalogError, ReadReport, WarningKind};
use crate::header::write_header;
use crate::instruction::{FileKind, Instruction};
use crate::path::split_source;
use crate::reader::read_document;
use crate::Result;
use demscope_common::{DemDescriptor, ViewMode};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::info;

/// Placement of a DEM's analysis window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowCfg {
    pub shown: bool,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Default for WindowCfg {
    fn default() -> Self {
        Self {
            shown: false,
            x: 0,
            y: 0,
            width: 800,
            height: 450,
        }
    }
}

/// Display configuration of one DEM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub description: Option<String>,
    pub show_interior: bool,
    pub show_exterior: bool,
    pub opacity: f64,
    pub radial_offset: f64,
    /// Preferred view mode. `None` leaves the choice to the application.
    pub view_mode: Option<ViewMode>,
    pub window: Option<WindowCfg>,
}

impl Default for ConfigEntry {
    fn default() -> Self {
        Self {
            description: None,
            show_interior: false,
            show_exterior: false,
            opacity: 1.0,
            radial_offset: 0.0,
            view_mode: None,
            window: None,
        }
    }
}

impl ConfigEntry {
    /// Whether anything asks for the DEM to be shown right away.
    pub fn wants_display(&self) -> bool {
        self.show_interior || self.show_exterior || self.window.is_some_and(|w| w.shown)
    }

    /// Clear every "show" flag, keeping the rest of the configuration.
    pub fn clear_display_flags(&mut self) {
        self.show_interior = false;
        self.show_exterior = false;
        if let Some(window) = self.window.as_mut() {
            window.shown = false;
        }
    }

    fn apply(&mut self, instr: Instruction) {
        match instr {
            Instruction::Descr(text) => self.description = Some(text),
            Instruction::Offs(offset) => self.radial_offset = offset,
            Instruction::Rndr {
                show_interior,
                show_exterior,
                opacity,
                view_mode,
            } => {
                self.show_interior = show_interior;
                self.show_exterior = show_exterior;
                self.opacity = opacity;
                if view_mode.is_some() {
                    self.view_mode = view_mode;
                }
            }
            Instruction::Win(window) => self.window = Some(window),
            _ => {}
        }
    }

    fn encode_into(&self, out: &mut String) {
        if let Some(text) = &self.description {
            out.push_str(&format!("{}\n", Instruction::Descr(text.clone())));
        }
        if self.radial_offset != 0.0 {
            out.push_str(&format!("{}\n", Instruction::Offs(self.radial_offset)));
        }
        let rndr = Instruction::Rndr {
            show_interior: self.show_interior,
            show_exterior: self.show_exterior,
            opacity: self.opacity,
            view_mode: self.view_mode.filter(|m| *m != ViewMode::Plain),
        };
        out.push_str(&format!("{rndr}\n"));
        if let Some(window) = self.window {
            out.push_str(&format!("{}\n", Instruction::Win(window)));
        }
    }
}

/// Contents of a painter configuration file, matched to known DEMs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PainterConfig {
    pub entries: Vec<(DemDescriptor, ConfigEntry)>,
}

impl PainterConfig {
    pub fn new(entries: Vec<(DemDescriptor, ConfigEntry)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, dem: &DemDescriptor) -> Option<&ConfigEntry> {
        self.entries.iter().find(|(d, _)| d == dem).map(|(_, c)| c)
    }

    /// Decode painter text, keeping only blocks that match one of `known`.
    ///
    /// A block matches the descriptor with the same full source path or,
    /// failing that, the same file name.
    pub fn decode(text: &str, known: &[DemDescriptor]) -> (Self, ReadReport) {
        let doc = read_document(text, FileKind::Painter, None);
        let mut report = doc.report;

        let by_path: HashMap<&str, &DemDescriptor> = known.iter().map(|d| (d.source.as_str(), d)).collect();
        let mut by_name: HashMap<&str, &DemDescriptor> = HashMap::new();
        for dem in known {
            by_name.entry(dem.file_name()).or_insert(dem);
        }

        let mut matched = HashSet::new();
        let mut entries = Vec::new();
        for block in doc.blocks {
            let name = DemDescriptor::unknown_geometry(block.path.as_str());
            let dem = by_path
                .get(block.path.as_str())
                .or_else(|| by_name.get(name.file_name()))
                .copied();
            let Some(dem) = dem else {
                report.warn(block.line, WarningKind::UnmatchedConfig(block.path));
                continue;
            };
            if !matched.insert(dem) {
                report.warn(block.line, WarningKind::DuplicatePath(dem.source.clone()));
                continue;
            }

            let mut config = ConfigEntry::default();
            for instr in block.instructions {
                config.apply(instr);
            }
            entries.push((dem.clone(), config));
        }

        (Self { entries }, report)
    }

    /// Encode as painter text, header included.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        write_header(&mut out, FileKind::Painter);

        let mut current_base: Option<&str> = None;
        for (dem, config) in &self.entries {
            let (base, file) = split_source(dem);
            if current_base != Some(base) {
                current_base = Some(base);
                out.push_str(&format!("{}\n\n", Instruction::Base(base.to_string())));
            }
            out.push_str(&format!("{}\n", Instruction::Dem(file.to_string())));
            config.encode_into(&mut out);
            out.push('\n');
        }
        out
    }

    /// Read a painter file, matching blocks against `known`.
    pub fn load(path: &Path, known: &[DemDescriptor]) -> Result<(Self, ReadReport)> {
        info!(path = %path.display(), "Loading painter config");
        let text = fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
        Ok(Self::decode(&text, known))
    }

    /// Write a painter file, replacing any existing one.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.encode()).map_err(|e| CatalogError::io(path, e))?;
        info!(path = %path.display(), items = self.entries.len(), "Painter config saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known() -> Vec<DemDescriptor> {
        vec![
            DemDescriptor::new("/data/a/x.fit", 1.0, 2.0, 0.5, 64.0),
            DemDescriptor::new("/data/b/y.fit", 3.0, 4.0, 0.5, 64.0),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = ConfigEntry::default();
        assert_eq!(config.opacity, 1.0);
        assert!(!config.wants_display());
        assert_eq!(WindowCfg::default().width, 800);
    }

    #[test]
    fn test_match_by_path_then_name() {
        let text = "base,/data/a\ndem,x.fit\nrndr,true,false,0.5,val\n\
                    base,/elsewhere\ndem,y.fit\ndescr,moved, but same name\n\
                    dem,z.fit\nrndr,true,true,1\n";
        let (config, report) = PainterConfig::decode(text, &known());
        assert_eq!(config.entries.len(), 2);

        let (dem, x) = &config.entries[0];
        assert_eq!(dem.source, "/data/a/x.fit");
        assert!(x.show_interior && !x.show_exterior);
        assert_eq!(x.opacity, 0.5);
        assert_eq!(x.view_mode, Some(ViewMode::ValidOnly));

        let (dem, y) = &config.entries[1];
        assert_eq!(dem.source, "/data/b/y.fit");
        assert_eq!(y.description.as_deref(), Some("moved, but same name"));

        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, WarningKind::UnmatchedConfig("/elsewhere/z.fit".into()));
    }

    #[test]
    fn test_catalog_lines_skipped_silently() {
        let text = "name,cat\ndem,/data/a/x.fit\ngeom,1,2,3,4\ndisk,0,5\noffs,-2\n";
        let (config, report) = PainterConfig::decode(text, &known());
        assert!(report.is_clean());
        assert_eq!(config.entries[0].1.radial_offset, -2.0);
    }

    #[test]
    fn test_encode_omits_defaults() {
        let config = PainterConfig::new(vec![(known()[0].clone(), ConfigEntry::default())]);
        let text = config.encode();
        let body: Vec<_> = text.lines().filter(|l| !l.starts_with('#') && !l.is_empty()).collect();
        assert_eq!(body, ["ver,2020.11.0", "base,/data/a", "dem,x.fit", "rndr,false,false,1"]);
    }

    #[test]
    fn test_plain_view_mode_not_written() {
        let entry = ConfigEntry {
            view_mode: Some(ViewMode::Plain),
            ..ConfigEntry::default()
        };
        let mut out = String::new();
        entry.encode_into(&mut out);
        assert_eq!(out, "rndr,false,false,1\n");
    }

    #[test]
    fn test_clear_display_flags() {
        let mut config = ConfigEntry {
            show_interior: true,
            show_exterior: true,
            window: Some(WindowCfg {
                shown: true,
                ..WindowCfg::default()
            }),
            ..ConfigEntry::default()
        };
        assert!(config.wants_display());
        config.clear_display_flags();
        assert!(!config.wants_display());
        assert!(config.window.is_some());
    }
}
