//! Shared block reader for both file kinds.
//!
//! Handles versioning, `base` tracking, block boundaries, duplicate paths and
//! skipping of instructions that belong to the other file kind. What a block
//! means is left to the catalog and painter decoders.

use crate::error::{ReadReport, WarningKind};
use crate::instruction::{FileKind, Instruction};
use crate::path::resolve;
use crate::version::FormatVersion;
use std::collections::HashSet;

/// Instructions following one `dem` line.
#[derive(Debug, Clone)]
pub(crate) struct Block {
    /// Line of the `dem` instruction.
    pub line: usize,
    /// Path after resolution against the active base.
    pub path: String,
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Default)]
pub(crate) struct Document {
    pub name: Option<String>,
    pub blocks: Vec<Block>,
    pub report: ReadReport,
}

impl Document {
    fn commit(&mut self, block: Option<Block>, seen: &mut HashSet<String>) {
        let Some(block) = block else { return };
        if seen.insert(block.path.clone()) {
            self.blocks.push(block);
        } else {
            self.report.warn(block.line, WarningKind::DuplicatePath(block.path));
        }
    }
}

/// Split `text` into blocks for a file of `kind`.
pub(crate) fn read_document(text: &str, kind: FileKind, default_base: Option<&str>) -> Document {
    let mut doc = Document::default();
    let mut base = default_base.map(str::to_string);
    let mut current: Option<Block> = None;
    let mut seen = HashSet::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let instr = match Instruction::parse(raw) {
            None => continue,
            Some(Ok(instr)) => instr,
            Some(Err(_)) => {
                doc.report.warn(line, WarningKind::UnrecognizedLine(raw.trim().to_string()));
                continue;
            }
        };

        match instr {
            Instruction::Version(text) => match FormatVersion::parse(&text) {
                Some(version) if version.is_future() => {
                    doc.report.warn(line, WarningKind::FutureVersion(text));
                }
                Some(_) => {}
                None => {
                    doc.report.warn(line, WarningKind::UnparseableVersion(text));
                    doc.report.aborted = true;
                    break;
                }
            },
            Instruction::Base(path) => {
                base = Some(path);
            }
            Instruction::Dem(path) => {
                let next = Block {
                    line,
                    path: resolve(base.as_deref(), &path),
                    instructions: Vec::new(),
                };
                doc.commit(current.replace(next), &mut seen);
            }
            other if other.file_kind().is_some_and(|k| k != kind) => {}
            Instruction::Name(name) => {
                doc.name = Some(name);
            }
            other => match current.as_mut() {
                Some(block) => block.instructions.push(other),
                None => doc.report.warn(line, WarningKind::UnrecognizedLine(raw.trim().to_string())),
            },
        }
    }

    doc.commit(current.take(), &mut seen);
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_and_bases() {
        let text = "ver,2020.11\nbase,/data/a\ndem,x.fit\ngeom,1,2,3,4\nbase,/data/b\ndem,y.fit\n";
        let doc = read_document(text, FileKind::Catalog, None);
        assert!(doc.report.is_clean());
        let paths: Vec<_> = doc.blocks.iter().map(|b| b.path.as_str()).collect();
        assert_eq!(paths, ["/data/a/x.fit", "/data/b/y.fit"]);
        assert_eq!(doc.blocks[0].instructions.len(), 1);
        assert!(doc.blocks[1].instructions.is_empty());
    }

    #[test]
    fn test_other_kind_skipped_silently() {
        let text = "name,cat\ndem,/x.fit\nrndr,true,true,1\ndisk,0,5\n";
        let doc = read_document(text, FileKind::Painter, None);
        assert!(doc.report.is_clean());
        assert_eq!(doc.name, None);
        assert_eq!(doc.blocks[0].instructions.len(), 1);
    }

    #[test]
    fn test_duplicate_first_wins() {
        let text = "dem,/x.fit\ngeom,1,1,1,1\ndem,/x.fit\ngeom,2,2,2,2\n";
        let doc = read_document(text, FileKind::Catalog, None);
        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(
            doc.blocks[0].instructions[0],
            Instruction::Geom {
                lat: 1.0,
                lon: 1.0,
                num_pixels: 1.0,
                gsd: 1.0
            }
        );
        assert_eq!(doc.report.warnings.len(), 1);
        assert_eq!(doc.report.warnings[0].line, 3);
        assert_eq!(doc.report.warnings[0].kind, WarningKind::DuplicatePath("/x.fit".into()));
    }

    #[test]
    fn test_bad_version_aborts() {
        let text = "dem,/a.fit\nver,next\ndem,/b.fit\n";
        let doc = read_document(text, FileKind::Catalog, None);
        assert!(doc.report.aborted);
        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(doc.blocks[0].path, "/a.fit");
    }

    #[test]
    fn test_future_version_continues() {
        let text = "ver,2031.1\ndem,/a.fit\n";
        let doc = read_document(text, FileKind::Catalog, None);
        assert!(!doc.report.aborted);
        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(doc.report.warnings[0].kind, WarningKind::FutureVersion("2031.1".into()));
    }

    #[test]
    fn test_default_base() {
        let doc = read_document("dem,x.fit\n", FileKind::Catalog, Some("https://host/browse/"));
        assert_eq!(doc.blocks[0].path, "https://host/browse/x.fit");
    }
}
