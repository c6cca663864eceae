//! # demscope-painter
//!
//! Load lifecycle for DEM tiles.
//!
//! A [`DemManager`] owns one [`DemRecord`] per DEM: its descriptor, display
//! configuration, harvested header metadata and a [`Painter`], the state
//! machine that tracks which meshes exist and which load is in flight.
//! Loads run on a bounded [`LoadScheduler`] pool; workers fetch the source,
//! parse it and build the mesh, then report back over a channel. The
//! manager applies reports on its own thread and publishes
//! [`PainterEvent`]s, with progress notifications throttled per DEM.
//!
//! ## Example
//!
//! ```no_run
//! use demscope_common::{DemDescriptor, ViewMode};
//! use demscope_painter::{DemManager, LoadSettings};
//! use std::time::Duration;
//!
//! let mut manager = DemManager::from_settings(LoadSettings::default())?;
//! let events = manager.subscribe();
//!
//! let id = manager.add(DemDescriptor::unknown_geometry("/data/bennu/tile.fit"));
//! manager.request_load(id, ViewMode::ValidOnly);
//!
//! while manager.active_loads() > 0 {
//!     manager.wait_for_reports(Duration::from_millis(100));
//!     for event in events.try_iter() {
//!         println!("{}: {:?}", event.id, event.kind);
//!     }
//! }
//! println!("{}", manager.status_brief(id).unwrap_or_default());
//! # Ok::<(), demscope_painter::ManagerError>(())
//! ```

mod error;
mod load;
mod manager;
mod notify;
mod painter;
mod scheduler;
mod settings;

pub use error::{LoadError, ManagerError, SettingsError};
pub use load::{LoadReport, ReportKind};
pub use manager::{DemId, DemManager, DemRecord};
pub use notify::{EventKind, NotifyThrottle, PainterEvent};
pub use painter::{
    CancelOutcome, JobId, LoadOutcome, LoadPhase, LoadTicket, MeshSlot, Painter, PainterStatus,
};
pub use scheduler::LoadScheduler;
pub use settings::{LoadSettings, DEFAULT_NOTIFY_INTERVAL_MS, MAX_LOAD_WORKERS};
