//! Integration tests for the load lifecycle against real files on disk.

use demscope_catalog::{ConfigEntry, PainterConfig};
use demscope_common::{DemDescriptor, ViewMode};
use demscope_io::{encode_grid, HeaderCard, LocalFetcher};
use demscope_mesh::{PlaneLayout, RawGrid, INVALID_VALUE};
use demscope_painter::{
    CancelOutcome, DemManager, EventKind, LoadError, LoadSettings, PainterEvent, PainterStatus,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(10);

/// Write a `size x size` tile with a validity plane at index 7.
///
/// Cells listed in `invalid` have validity 0.
fn write_tile(dir: &Path, name: &str, size: usize, invalid: &[usize]) -> DemDescriptor {
    let n = size * size;
    let mut planes: Vec<Vec<f32>> = vec![
        (0..n).map(|i| (i % size) as f32).collect(),
        (0..n).map(|i| (i / size) as f32).collect(),
        vec![2.0; n],
    ];
    for _ in 3..7 {
        planes.push(vec![0.0; n]);
    }
    planes.push((0..n).map(|i| if invalid.contains(&i) { 0.0 } else { 1.0 }).collect());

    let grid = RawGrid::from_planes(size, size, planes, PlaneLayout::default()).unwrap();
    let mut cards = vec![
        HeaderCard::new("PLANE1", "X coordinate of vertices (kilometers)", None),
        HeaderCard::new("PLANE2", "Y coordinate of vertices (kilometers)", None),
        HeaderCard::new("PLANE3", "Z coordinate of vertices (kilometers)", None),
        HeaderCard::new("CLAT", "10.0", None),
        HeaderCard::new("CLON", "20.0", None),
    ];
    for (i, name) in ["Albedo", "Slope", "Roughness", "Tilt"].iter().enumerate() {
        cards.push(HeaderCard::new(format!("PLANE{}", i + 4), *name, None));
    }
    cards.push(HeaderCard::new("PLANE8", "Valid", None));

    let path = dir.join(name);
    std::fs::write(&path, encode_grid(&grid, &cards)).unwrap();
    DemDescriptor::new(path.to_string_lossy(), 10.0, 20.0, 0.5, size as f64)
}

fn manager() -> DemManager {
    DemManager::new(LoadSettings::default(), Arc::new(LocalFetcher)).unwrap()
}

#[test]
fn test_request_then_immediate_cancel() {
    let dir = tempfile::tempdir().unwrap();
    let dem = write_tile(dir.path(), "tile.fit", 16, &[]);
    let mut manager = manager();
    let id = manager.add(dem);

    assert!(manager.request_load(id, ViewMode::ValidOnly));
    assert_eq!(manager.cancel(id), CancelOutcome::Idle);
    let painter = manager.painter(id).unwrap();
    assert!(!painter.is_loading());
    assert!(!painter.is_ready());
    assert!(matches!(painter.status(), PainterStatus::Halted { .. }));
    assert_eq!(manager.active_loads(), 0);

    // Whatever the cancelled worker reports is ignored.
    std::thread::sleep(Duration::from_millis(100));
    manager.process_reports();
    assert!(!manager.painter(id).unwrap().is_ready());

    assert!(manager.request_load(id, ViewMode::ValidOnly));
    assert!(manager.wait_idle(WAIT));
    let painter = manager.painter(id).unwrap();
    assert!(painter.is_ready());
    assert_eq!(painter.status_brief(), "Loaded: Val.");
    assert_eq!(painter.mesh().unwrap().vertex_count(), 256);
}

#[test]
fn test_modes_are_kept_side_by_side() {
    let dir = tempfile::tempdir().unwrap();
    let dem = write_tile(dir.path(), "holes.fit", 3, &[4]);
    let mut manager = manager();
    let id = manager.add(dem);

    manager.request_load(id, ViewMode::IncludingInvalid);
    assert!(manager.wait_idle(WAIT));
    manager.request_load(id, ViewMode::ValidOnly);
    assert!(manager.wait_idle(WAIT));

    let painter = manager.painter(id).unwrap();
    let all = painter.mesh_for(ViewMode::IncludingInvalid).unwrap();
    let valid = painter.mesh_for(ViewMode::ValidOnly).unwrap();
    assert_eq!((all.vertex_count(), all.triangle_count()), (9, 8));
    assert_eq!((valid.vertex_count(), valid.triangle_count()), (8, 2));
    assert_eq!(painter.active_mode(), ViewMode::ValidOnly);

    // Switching back is immediate.
    assert!(!manager.request_load(id, ViewMode::IncludingInvalid));
    assert_eq!(manager.status_brief(id).as_deref(), Some("Loaded: Reg."));
}

#[test]
fn test_failure_keeps_other_mode_and_clears_display() {
    let dir = tempfile::tempdir().unwrap();
    // Every cell flagged invalid: the valid-only build has nothing to admit.
    let dem = write_tile(dir.path(), "bad.fit", 3, &(0..9).collect::<Vec<_>>());
    let mut manager = manager();
    let id = manager.add(dem.clone());

    manager.request_load(id, ViewMode::IncludingInvalid);
    assert!(manager.wait_idle(WAIT));

    let events = manager.subscribe();
    manager.install_configuration(&PainterConfig::new(vec![(
        dem,
        ConfigEntry {
            show_interior: true,
            view_mode: Some(ViewMode::ValidOnly),
            ..ConfigEntry::default()
        },
    )]));
    assert!(manager.painter(id).unwrap().is_loading());
    assert!(manager.wait_idle(WAIT));

    let record = manager.get(id).unwrap();
    assert!(matches!(record.painter.last_error(), Some(LoadError::Geometry(_))));
    assert_eq!(record.painter.status_brief(), "Failure");
    assert!(record.painter.mesh_for(ViewMode::IncludingInvalid).is_some());
    assert!(!record.config.wants_display());

    // Observers hear about the failure, then about the cleared flags.
    let kinds: Vec<_> = events.try_iter().map(|e: PainterEvent| e.kind).collect();
    let n = kinds.len();
    assert!(n >= 3, "{kinds:?}");
    assert_eq!(kinds[0], EventKind::ConfigChanged);
    assert!(matches!(
        kinds[n - 2],
        EventKind::Failed {
            mode: ViewMode::ValidOnly,
            error: LoadError::Geometry(_)
        }
    ));
    assert_eq!(kinds[n - 1], EventKind::ConfigChanged);
}

#[test]
fn test_missing_file_is_fetch_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = manager();
    let events = manager.subscribe();
    let id = manager.add(DemDescriptor::unknown_geometry(dir.path().join("absent.fit").to_string_lossy()));

    manager.request_load(id, ViewMode::ValidOnly);
    assert!(manager.wait_idle(WAIT));
    assert!(matches!(
        manager.painter(id).unwrap().last_error(),
        Some(LoadError::Fetch(_))
    ));

    let kinds: Vec<_> = events.try_iter().map(|e: PainterEvent| e.kind).collect();
    assert!(matches!(kinds.first(), Some(EventKind::LoadStarted { .. })));
    assert!(matches!(
        kinds.last(),
        Some(EventKind::Failed {
            mode: ViewMode::ValidOnly,
            error: LoadError::Fetch(_)
        })
    ));
}

#[test]
fn test_events_and_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let dem = write_tile(dir.path(), "tile.fit", 8, &[]);
    let mut manager = manager();
    let events = manager.subscribe();
    let id = manager.add(dem);

    manager.request_load(id, ViewMode::IncludingInvalid);
    assert!(manager.wait_idle(WAIT));

    let events: Vec<_> = events.try_iter().collect();
    assert!(events.iter().all(|e| e.id == id));
    assert_eq!(
        events.last().map(|e| &e.kind),
        Some(&EventKind::Loaded {
            mode: ViewMode::IncludingInvalid
        })
    );
    let key_values = manager.key_values(id).unwrap();
    assert_eq!(key_values.value_f64("CLAT"), Some(10.0));
    assert_eq!(key_values.value("PLANE8"), Some("Valid"));
}

#[test]
fn test_obj_loads_as_plain() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shape.obj");
    std::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 0 0 1\nf 1 2 3\nf 1 2 4\n").unwrap();
    let mut manager = manager();
    let id = manager.add(DemDescriptor::unknown_geometry(path.to_string_lossy()));

    manager.update_config(id, |c| c.show_exterior = true);
    assert!(manager.wait_idle(WAIT));

    let record = manager.get(id).unwrap();
    assert_eq!(record.painter.active_mode(), ViewMode::Plain);
    assert_eq!(record.config.view_mode, Some(ViewMode::Plain));
    assert_eq!(record.painter.mesh().unwrap().triangle_count(), 2);
    assert!(record.key_values.is_empty());
}

#[test]
fn test_configuration_round_trip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_tile(dir.path(), "a.fit", 3, &[]);
    let b = write_tile(dir.path(), "b.fit", 3, &[]);
    let mut manager = manager();
    let ids = manager.set_all_descriptors([a, b]);
    manager.update_config(ids[1], |c| {
        c.description = Some("second tile".into());
        c.opacity = 0.5;
    });

    let path = dir.path().join("tiles.pcf.csv");
    manager.save_configuration(&path).unwrap();

    let mut other = manager_with(INVALID_VALUE);
    let other_ids = other.set_all_descriptors(manager.ids().map(|id| manager.get(id).unwrap().descriptor.clone()));
    let report = other.load_configuration(&path).unwrap();
    assert!(report.is_clean(), "{:?}", report.warnings);
    assert_eq!(other.get(other_ids[1]).unwrap().config.description.as_deref(), Some("second tile"));
    assert_eq!(other.configuration(), manager.configuration());
}

fn manager_with(invalid_value: f32) -> DemManager {
    let settings = LoadSettings {
        invalid_value,
        max_concurrent_loads: 2,
        ..LoadSettings::default()
    };
    DemManager::new(settings, Arc::new(LocalFetcher)).unwrap()
}
