//! Commented header written at the top of every file.

use crate::instruction::{FileKind, Instruction};
use crate::version::FormatVersion;

/// Header lines and the file kind they apply to (`None` = both).
const HEADER: &[(Option<FileKind>, &str)] = &[
    (None, "# ------------------------------------------------------------------------------"),
    (None, "# Each line holds one instruction: <instr>,<arg>*"),
    (None, "# Blank lines and lines starting with '#' are ignored."),
    (None, "#"),
    (None, "#   ver,<version>"),
    (None, "#      Format version, yyyy.mm[.pp]."),
    (None, "#"),
    (None, "#   base,<path>"),
    (None, "#      Base path or URL for the dem instructions that follow."),
    (None, "#"),
    (Some(FileKind::Catalog), "#   name,<text>"),
    (Some(FileKind::Catalog), "#      Display name of this catalog."),
    (Some(FileKind::Catalog), "#"),
    (None, "#   dem,<path>"),
    (None, "#      Starts a DEM definition, which runs until the next dem instruction."),
    (None, "#      The path is relative to the current base, if any."),
    (None, "#"),
    (Some(FileKind::Painter), "#   descr,<text>"),
    (Some(FileKind::Painter), "#      Description of the DEM. Commas are allowed."),
    (Some(FileKind::Painter), "#"),
    (Some(FileKind::Catalog), "#   disk,<unused>,<size>"),
    (Some(FileKind::Catalog), "#      Size of the DEM resource in bytes."),
    (Some(FileKind::Catalog), "#"),
    (Some(FileKind::Catalog), "#   geom,<lat>,<lon>,<halfSize>,<scale>"),
    (Some(FileKind::Catalog), "#      Center latitude and longitude in degrees, size in pixels and"),
    (Some(FileKind::Catalog), "#      scale in meters per pixel. The last geom of a DEM wins."),
    (Some(FileKind::Catalog), "#"),
    (Some(FileKind::Painter), "#   offs,<offset>"),
    (Some(FileKind::Painter), "#      Offset along the DEM normal, integral in [-100, 100]."),
    (Some(FileKind::Painter), "#"),
    (Some(FileKind::Painter), "#   rndr,<showInterior>,<showExterior>,<opacity>[,<viewMode>]"),
    (Some(FileKind::Painter), "#      Visibility flags, opacity in [0.0, 1.0] and the view mode:"),
    (Some(FileKind::Painter), "#         reg: show valid and invalid data"),
    (Some(FileKind::Painter), "#         val: show only valid data"),
    (Some(FileKind::Painter), "#"),
    (Some(FileKind::Painter), "#   win,<isShown>,<x>,<y>,<width>,<height>"),
    (Some(FileKind::Painter), "#      Placement of the analysis window."),
    (Some(FileKind::Painter), "#"),
];

/// Append the header and version line for `kind`.
pub(crate) fn write_header(out: &mut String, kind: FileKind) {
    let title = match kind {
        FileKind::Catalog => "Catalog",
        FileKind::Painter => "Painter",
    };
    out.push_str(&format!("# DEM {title} File\n"));
    for (applies, line) in HEADER {
        if applies.map_or(true, |k| k == kind) {
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push_str(&format!("{}\n\n", Instruction::Version(FormatVersion::CURRENT.to_string())));
}
