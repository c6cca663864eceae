//! Example: Load every DEM listed in a catalog file.
//!
//! Usage: cargo run --example load_catalog -- <catalog.cat.csv> [reg|val]
//!
//! Set `RUST_LOG=debug` for per-load logging. A painter file next to the
//! catalog (`x.pcf.csv` for `x.cat.csv`) is installed when present.

use demscope_catalog::{painter_file_for, Catalog};
use demscope_common::ViewMode;
use demscope_painter::{DemManager, EventKind, LoadSettings};
use std::env;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <catalog.cat.csv> [reg|val]", args[0]);
        eprintln!("Example: {} ./dems/bennu.cat.csv val", args[0]);
        std::process::exit(1);
    }

    let catalog_path = Path::new(&args[1]);
    let mode = match args.get(2) {
        Some(abbrev) => ViewMode::from_abbrev(abbrev).unwrap_or_else(|| {
            eprintln!("Unknown view mode '{}', expected reg or val", abbrev);
            std::process::exit(1);
        }),
        None => ViewMode::ValidOnly,
    };

    let (catalog, report) = match Catalog::load(catalog_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    for warning in &report.warnings {
        eprintln!("  {}", warning);
    }
    println!(
        "Catalog {}: {} DEMs",
        catalog.name.as_deref().unwrap_or("(unnamed)"),
        catalog.entries.len()
    );

    let settings = LoadSettings {
        default_view_mode: mode,
        ..LoadSettings::default()
    };
    let mut manager = match DemManager::from_settings(settings) {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let events = manager.subscribe();
    let ids = manager.set_all_descriptors(catalog.descriptors().cloned());

    let painter_path = painter_file_for(catalog_path);
    if painter_path.is_file() {
        match manager.load_configuration(&painter_path) {
            Ok(report) => println!("Installed {} ({} warnings)", painter_path.display(), report.warnings.len()),
            Err(e) => eprintln!("Ignoring {}: {}", painter_path.display(), e),
        }
    }

    let start = Instant::now();
    for &id in &ids {
        manager.request_load(id, mode);
    }

    while manager.active_loads() > 0 {
        manager.wait_for_reports(Duration::from_millis(250));
        for event in events.try_iter() {
            match event.kind {
                EventKind::Loaded { .. } | EventKind::Failed { .. } => {
                    let status = manager.status_brief(event.id).unwrap_or_default();
                    println!("  {} {}", event.id, status);
                }
                _ => {}
            }
        }
    }
    println!("All loads settled in {:.2?}", start.elapsed());

    for id in ids {
        let Some(record) = manager.get(id) else { continue };
        let size = record
            .painter
            .mesh()
            .map(|m| format!("{} vertices, {} triangles", m.vertex_count(), m.triangle_count()))
            .unwrap_or_default();
        println!("{:<32} {:<14} {}", record.descriptor.file_name(), record.painter.status_brief(), size);
    }
}
