//! Catalog files: the list of known DEMs and their nominal geometry.

use crate::error::{CatalogError, ReadReport};
use crate::header::write_header;
use crate::instruction::{FileKind, Instruction};
use crate::path::split_source;
use crate::reader::read_document;
use crate::Result;
use demscope_common::DemDescriptor;
use std::fs;
use std::path::Path;
use tracing::info;

/// A DEM listed in a catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub descriptor: DemDescriptor,
    /// Size of the resource in bytes, from the `disk` instruction.
    pub disk_size: Option<u64>,
}

impl CatalogEntry {
    pub fn new(descriptor: DemDescriptor) -> Self {
        Self {
            descriptor,
            disk_size: None,
        }
    }
}

/// Contents of a catalog file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    /// Display name, from the `name` instruction.
    pub name: Option<String>,
    pub entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(name: Option<String>, entries: Vec<CatalogEntry>) -> Self {
        Self { name, entries }
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &DemDescriptor> {
        self.entries.iter().map(|e| &e.descriptor)
    }

    /// Decode catalog text.
    pub fn decode(text: &str) -> (Self, ReadReport) {
        Self::decode_with_base(text, None)
    }

    /// Decode catalog text whose relative paths resolve against
    /// `default_base` until the first `base` instruction.
    pub fn decode_with_base(text: &str, default_base: Option<&str>) -> (Self, ReadReport) {
        let doc = read_document(text, FileKind::Catalog, default_base);

        let entries = doc
            .blocks
            .into_iter()
            .map(|block| {
                let mut entry = CatalogEntry::new(DemDescriptor::unknown_geometry(block.path));
                for instr in block.instructions {
                    match instr {
                        Instruction::Disk(size) => entry.disk_size = size,
                        Instruction::Geom {
                            lat,
                            lon,
                            num_pixels,
                            gsd,
                        } => {
                            entry.descriptor = DemDescriptor::new(entry.descriptor.source, lat, lon, gsd, num_pixels);
                        }
                        _ => {}
                    }
                }
                entry
            })
            .collect();

        (
            Self {
                name: doc.name,
                entries,
            },
            doc.report,
        )
    }

    /// Encode as catalog text, header included.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        write_header(&mut out, FileKind::Catalog);

        if let Some(name) = &self.name {
            out.push_str(&format!("{}\n\n", Instruction::Name(name.clone())));
        }

        let mut current_base: Option<&str> = None;
        for entry in &self.entries {
            let dem = &entry.descriptor;
            let (base, file) = split_source(dem);
            if current_base != Some(base) {
                current_base = Some(base);
                out.push_str(&format!("{}\n\n", Instruction::Base(base.to_string())));
            }

            out.push_str(&format!("{}\n", Instruction::Dem(file.to_string())));
            if entry.disk_size.is_some() {
                out.push_str(&format!("{}\n", Instruction::Disk(entry.disk_size)));
            }
            let geom = Instruction::Geom {
                lat: dem.lat,
                lon: dem.lon,
                num_pixels: dem.num_pixels,
                gsd: dem.gsd,
            };
            out.push_str(&format!("{geom}\n\n"));
        }
        out
    }

    /// Read a catalog file.
    pub fn load(path: &Path) -> Result<(Self, ReadReport)> {
        info!(path = %path.display(), "Loading catalog");
        let text = fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
        Ok(Self::decode(&text))
    }

    /// Write a catalog file, replacing any existing one.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.encode()).map_err(|e| CatalogError::io(path, e))?;
        info!(path = %path.display(), items = self.entries.len(), "Catalog file saved");
        Ok(())
    }
}
