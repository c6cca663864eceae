//! Example: Describe a DEM file and build its mesh.
//!
//! Usage: cargo run --example inspect_dem -- <file> [reg|val]

use demscope_common::ViewMode;
use demscope_io::{describe_file, DemFileParser};
use std::env;
use std::path::Path;
use std::time::Instant;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <file> [reg|val]", args[0]);
        eprintln!("Example: {} ./dems/bennu_tile.fit val", args[0]);
        std::process::exit(1);
    }

    let path = Path::new(&args[1]);
    let mode = match args.get(2) {
        Some(abbrev) => ViewMode::from_abbrev(abbrev).unwrap_or_else(|| {
            eprintln!("Unknown view mode '{}', expected reg or val", abbrev);
            std::process::exit(1);
        }),
        None => ViewMode::ValidOnly,
    };

    let described = match describe_file(path) {
        Ok(described) => described,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let dem = &described.descriptor;
    println!("{}", dem.file_name());
    println!(
        "Center: lat {:.4}°, lon {:.4}°  GSD: {}  Pixels: {}",
        dem.lat, dem.lon, dem.gsd, dem.num_pixels
    );
    println!("Header entries: {}", described.key_values.len());

    println!("\nBuilding {} mesh...", mode);
    let start = Instant::now();

    match DemFileParser::default().parse_file(path, mode) {
        Ok(parsed) => {
            let mesh = &parsed.mesh;
            println!(
                "{} vertices, {} triangles, {} boundary segments in {:.3}s",
                mesh.vertex_count(),
                mesh.triangle_count(),
                mesh.boundary.segments.len(),
                start.elapsed().as_secs_f64()
            );
            println!("Center: ({:.4}, {:.4}, {:.4})", mesh.center.x, mesh.center.y, mesh.center.z);
            for feature in &mesh.features {
                let unit = feature.channel.unit.as_deref().unwrap_or("-");
                println!("  feature: {} [{}]", feature.channel.name, unit);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
