//! Per-DEM load state machine.
//!
//! A [`Painter`] owns every mesh built for one DEM, one slot per
//! [`ViewMode`], and at most one load in flight. It never does work itself:
//! [`Painter::request_load`] hands out a [`LoadTicket`] for the scheduler and
//! the outcome comes back through [`Painter::complete`]. Reports carrying a
//! job id other than the one in flight are stale and ignored.

use crate::error::LoadError;
use demscope_common::ViewMode;
use demscope_mesh::DemMesh;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Identifies one submitted load. Unique for the life of the process.
pub type JobId = u64;

static NEXT_JOB: AtomicU64 = AtomicU64::new(1);

/// What a load is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    /// Fetching a remote source into the cache.
    Download,
    /// Reading and triangulating local data.
    Load,
}

/// Result stored for one view mode.
#[derive(Debug, Clone)]
pub enum MeshSlot {
    Ready(Arc<DemMesh>),
    Failed(LoadError),
}

/// Work order handed to the scheduler for a new load.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    pub job: JobId,
    pub mode: ViewMode,
    /// Set when the load is cancelled. Workers poll it.
    pub cancel: Arc<AtomicBool>,
}

#[derive(Debug)]
struct InFlight {
    job: JobId,
    mode: ViewMode,
    phase: LoadPhase,
    cancel: Arc<AtomicBool>,
}

/// What [`Painter::cancel`] left the painter in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// Nothing was loading.
    NotLoading,
    /// Switched back to a mode that already has a mesh.
    Reverted(ViewMode),
    /// No mesh is available; the painter is idle.
    Idle,
}

/// How an in-flight load settled.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// A mesh was stored under this mode, now the active one.
    Ready(ViewMode),
    /// The requested mode's slot was marked failed.
    Failed(ViewMode, LoadError),
    /// The worker gave up after observing its cancellation flag.
    Cancelled,
}

/// Snapshot of a painter's state.
#[derive(Debug, Clone, PartialEq)]
pub enum PainterStatus {
    /// Nothing requested yet.
    Unloaded,
    Loading { phase: LoadPhase, progress: f64 },
    /// Cancelled with no mesh to fall back to.
    Halted { progress: f64 },
    Ready(ViewMode),
    Failed(LoadError),
}

impl fmt::Display for PainterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PainterStatus::Unloaded => f.write_str("Unloaded"),
            PainterStatus::Loading { phase, progress } => {
                let tag = match phase {
                    LoadPhase::Download => "DL",
                    LoadPhase::Load => "LD",
                };
                write!(f, "{tag}: {:.2}%", progress * 100.0)
            }
            PainterStatus::Halted { progress } => write!(f, "Halt: {:.2}%", progress * 100.0),
            PainterStatus::Ready(mode) => write!(f, "Loaded: {}", mode.brief()),
            PainterStatus::Failed(_) => f.write_str("Failure"),
        }
    }
}

/// Load state of one DEM.
#[derive(Debug)]
pub struct Painter {
    slots: BTreeMap<ViewMode, MeshSlot>,
    active_mode: ViewMode,
    in_flight: Option<InFlight>,
    progress: f64,
    halted: bool,
}

impl Painter {
    pub fn new(mode: ViewMode) -> Self {
        Self {
            slots: BTreeMap::new(),
            active_mode: mode,
            in_flight: None,
            progress: 0.0,
            halted: false,
        }
    }

    pub fn active_mode(&self) -> ViewMode {
        self.active_mode
    }

    /// Select which mode queries refer to without loading anything.
    ///
    /// Ignored while a load is in flight.
    pub fn set_active_mode(&mut self, mode: ViewMode) {
        if self.in_flight.is_none() {
            self.active_mode = mode;
        }
    }

    /// Ask for a mesh built under `mode`.
    ///
    /// Returns a ticket when a new load must be scheduled. Returns `None`
    /// while another load is in flight, or when a mesh for `mode` already
    /// exists (which then becomes the active mode). A previous failure for
    /// `mode` is forgotten and retried.
    pub fn request_load(&mut self, mode: ViewMode) -> Option<LoadTicket> {
        if self.in_flight.is_some() {
            return None;
        }
        if matches!(self.slots.get(&mode), Some(MeshSlot::Ready(_))) {
            self.active_mode = mode;
            return None;
        }
        self.slots.remove(&mode);

        let ticket = LoadTicket {
            job: NEXT_JOB.fetch_add(1, Ordering::Relaxed),
            mode,
            cancel: Arc::new(AtomicBool::new(false)),
        };
        self.in_flight = Some(InFlight {
            job: ticket.job,
            mode,
            phase: LoadPhase::Load,
            cancel: Arc::clone(&ticket.cancel),
        });
        self.active_mode = mode;
        self.progress = 0.0;
        self.halted = false;
        Some(ticket)
    }

    /// Stop the load in flight.
    ///
    /// The worker is told to stop and anything it reports later is ignored.
    /// The painter falls back to the first mode with a ready mesh.
    pub fn cancel(&mut self) -> CancelOutcome {
        let Some(job) = self.in_flight.take() else {
            return CancelOutcome::NotLoading;
        };
        job.cancel.store(true, Ordering::Relaxed);
        self.fall_back()
    }

    fn fall_back(&mut self) -> CancelOutcome {
        let first_ready = self.ready_modes().next();
        match first_ready {
            Some(mode) => {
                self.active_mode = mode;
                self.progress = 1.0;
                self.halted = false;
                CancelOutcome::Reverted(mode)
            }
            None => {
                self.halted = true;
                CancelOutcome::Idle
            }
        }
    }

    /// Record progress reported by a worker. Returns `false` for stale jobs.
    ///
    /// Progress never moves backwards within a phase and restarts at the
    /// beginning of a new one.
    pub fn apply_progress(&mut self, job: JobId, phase: LoadPhase, fraction: f64) -> bool {
        let Some(in_flight) = self.in_flight.as_mut().filter(|f| f.job == job) else {
            return false;
        };
        let fraction = fraction.clamp(0.0, 1.0);
        if in_flight.phase != phase {
            in_flight.phase = phase;
            self.progress = fraction;
        } else {
            self.progress = self.progress.max(fraction);
        }
        true
    }

    /// Settle the load `job`. Returns `None` for stale jobs.
    ///
    /// A mesh is stored under the mode it was actually built in, which then
    /// becomes active. A failure marks only the requested mode; other meshes
    /// are untouched.
    pub fn complete(&mut self, job: JobId, result: Result<DemMesh, LoadError>) -> Option<LoadOutcome> {
        if self.current_job() != Some(job) {
            return None;
        }
        let in_flight = self.in_flight.take()?;
        let outcome = match result {
            Ok(mesh) => {
                let mode = mesh.mode;
                self.slots.insert(mode, MeshSlot::Ready(Arc::new(mesh)));
                self.active_mode = mode;
                self.progress = 1.0;
                self.halted = false;
                LoadOutcome::Ready(mode)
            }
            Err(LoadError::Cancelled) => {
                self.fall_back();
                LoadOutcome::Cancelled
            }
            Err(err) => {
                self.slots.insert(in_flight.mode, MeshSlot::Failed(err.clone()));
                LoadOutcome::Failed(in_flight.mode, err)
            }
        };
        Some(outcome)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Whether the active mode has a mesh.
    pub fn is_ready(&self) -> bool {
        self.mesh().is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Job id of the load in flight.
    pub fn current_job(&self) -> Option<JobId> {
        self.in_flight.as_ref().map(|f| f.job)
    }

    /// Failure recorded for the active mode.
    pub fn last_error(&self) -> Option<&LoadError> {
        match self.slots.get(&self.active_mode) {
            Some(MeshSlot::Failed(err)) => Some(err),
            _ => None,
        }
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn status(&self) -> PainterStatus {
        if let Some(in_flight) = &self.in_flight {
            return PainterStatus::Loading {
                phase: in_flight.phase,
                progress: self.progress,
            };
        }
        match self.slots.get(&self.active_mode) {
            Some(MeshSlot::Ready(_)) => PainterStatus::Ready(self.active_mode),
            Some(MeshSlot::Failed(err)) => PainterStatus::Failed(err.clone()),
            None if self.halted => PainterStatus::Halted { progress: self.progress },
            None => PainterStatus::Unloaded,
        }
    }

    /// One-line status such as `Loaded: Val.` or `DL: 45.00%`.
    pub fn status_brief(&self) -> String {
        self.status().to_string()
    }

    /// Mesh for the active mode.
    pub fn mesh(&self) -> Option<&Arc<DemMesh>> {
        self.mesh_for(self.active_mode)
    }

    pub fn mesh_for(&self, mode: ViewMode) -> Option<&Arc<DemMesh>> {
        match self.slots.get(&mode) {
            Some(MeshSlot::Ready(mesh)) => Some(mesh),
            _ => None,
        }
    }

    /// Modes with a ready mesh, in [`ViewMode::ALL`] order.
    pub fn ready_modes(&self) -> impl Iterator<Item = ViewMode> + '_ {
        ViewMode::ALL
            .into_iter()
            .filter(|mode| self.mesh_for(*mode).is_some())
    }
}
