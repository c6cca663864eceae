//! Owner of every DEM record and the interactive side of the load lifecycle.
//!
//! All painter state lives on the thread that owns the [`DemManager`].
//! Workers only send [`LoadReport`]s; the manager applies them when
//! [`DemManager::process_reports`] or [`DemManager::wait_for_reports`] is
//! called and forwards the resulting [`PainterEvent`]s to subscribers.

use crate::error::ManagerError;
use crate::load::{LoadJob, LoadReport, ReportKind};
use crate::notify::{EventKind, NotifyThrottle, PainterEvent};
use crate::painter::{CancelOutcome, LoadOutcome, LoadPhase, Painter};
use crate::settings::LoadSettings;
use crate::scheduler::LoadScheduler;
use crossbeam_channel::{unbounded, Receiver, Sender};
use demscope_catalog::{ConfigEntry, PainterConfig, ReadReport};
use demscope_common::{DemDescriptor, KeyValueMap, ViewMode};
use demscope_io::{DemFileParser, DescribedDem, Fetch, HttpFetcher, LocalFetcher};
use demscope_mesh::GridMeshBuilder;
use demscope_metrics::{metric_defs, LoadLabels};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Handle to one DEM record. Never reused within a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DemId(usize);

impl DemId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for DemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dem#{}", self.0)
    }
}

/// Everything known about one DEM.
#[derive(Debug)]
pub struct DemRecord {
    pub descriptor: DemDescriptor,
    pub config: ConfigEntry,
    pub painter: Painter,
    /// Header metadata gathered so far. Loads only add missing keys.
    pub key_values: KeyValueMap,
}

impl DemRecord {
    fn labels(&self, mode: ViewMode) -> LoadLabels {
        LoadLabels::new(self.descriptor.file_name(), mode)
    }
}

/// Arena of DEM records plus the scheduler that loads them.
pub struct DemManager {
    settings: LoadSettings,
    scheduler: LoadScheduler,
    fetcher: Arc<dyn Fetch>,
    parser: DemFileParser,
    records: Vec<Option<DemRecord>>,
    report_tx: Sender<LoadReport>,
    report_rx: Receiver<LoadReport>,
    subscribers: Vec<Sender<PainterEvent>>,
    throttle: NotifyThrottle,
    active_loads: usize,
}

impl std::fmt::Debug for DemManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemManager")
            .field("dems", &self.len())
            .field("active_loads", &self.active_loads)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

impl DemManager {
    pub fn new(settings: LoadSettings, fetcher: Arc<dyn Fetch>) -> Result<Self, ManagerError> {
        let scheduler = LoadScheduler::new(settings.worker_count())?;
        let (report_tx, report_rx) = unbounded();
        info!(workers = scheduler.workers(), "DEM manager started");
        Ok(Self {
            parser: DemFileParser::new(GridMeshBuilder::new(settings.invalid_value)),
            throttle: NotifyThrottle::new(settings.notify_interval()),
            settings,
            scheduler,
            fetcher,
            records: Vec::new(),
            report_tx,
            report_rx,
            subscribers: Vec::new(),
            active_loads: 0,
        })
    }

    /// Manager with the fetcher implied by the settings: a caching HTTP
    /// fetcher when a cache directory is set, local files otherwise.
    pub fn from_settings(settings: LoadSettings) -> Result<Self, ManagerError> {
        let fetcher: Arc<dyn Fetch> = match &settings.cache_dir {
            Some(dir) => Arc::new(HttpFetcher::new(dir)?),
            None => Arc::new(LocalFetcher),
        };
        Self::new(settings, fetcher)
    }

    pub fn settings(&self) -> &LoadSettings {
        &self.settings
    }

    /// Receive every event delivered from now on.
    pub fn subscribe(&mut self) -> Receiver<PainterEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    // ========================================================================
    // Records
    // ========================================================================

    /// Add a DEM, or return the existing record for an equal descriptor.
    pub fn add(&mut self, descriptor: DemDescriptor) -> DemId {
        self.add_with_key_values(descriptor, KeyValueMap::new())
    }

    /// Add a DEM described by its file header.
    pub fn add_described(&mut self, described: DescribedDem) -> DemId {
        self.add_with_key_values(described.descriptor, described.key_values)
    }

    fn add_with_key_values(&mut self, descriptor: DemDescriptor, key_values: KeyValueMap) -> DemId {
        if let Some(id) = self.id_of(&descriptor) {
            if let Some(record) = self.record_mut(id) {
                record.key_values.merge_missing(&key_values);
            }
            return id;
        }
        let id = DemId(self.records.len());
        debug!(%id, dem = %descriptor.source, "DEM added");
        self.records.push(Some(DemRecord {
            painter: Painter::new(self.settings.default_view_mode),
            config: ConfigEntry::default(),
            descriptor,
            key_values,
        }));
        id
    }

    /// Make the set of DEMs exactly `descriptors`, in that order of ids.
    ///
    /// Records for descriptors already present are kept with their meshes
    /// and configuration. Records not listed are removed.
    pub fn set_all_descriptors<I>(&mut self, descriptors: I) -> Vec<DemId>
    where
        I: IntoIterator<Item = DemDescriptor>,
    {
        let ids: Vec<_> = descriptors.into_iter().map(|d| self.add(d)).collect();
        let stale: Vec<_> = self.ids().filter(|id| !ids.contains(id)).collect();
        for id in stale {
            self.remove(id);
        }
        ids
    }

    /// Remove a DEM, cancelling its load.
    pub fn remove(&mut self, id: DemId) -> Option<DemRecord> {
        let mut record = self.records.get_mut(id.0)?.take()?;
        if record.painter.cancel() != CancelOutcome::NotLoading {
            self.load_settled();
        }
        self.throttle.forget(id);
        debug!(%id, dem = %record.descriptor.source, "DEM removed");
        Some(record)
    }

    pub fn id_of(&self, descriptor: &DemDescriptor) -> Option<DemId> {
        self.records
            .iter()
            .position(|r| r.as_ref().is_some_and(|r| &r.descriptor == descriptor))
            .map(DemId)
    }

    pub fn get(&self, id: DemId) -> Option<&DemRecord> {
        self.records.get(id.0).and_then(Option::as_ref)
    }

    fn record_mut(&mut self, id: DemId) -> Option<&mut DemRecord> {
        self.records.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn painter(&self, id: DemId) -> Option<&Painter> {
        self.get(id).map(|r| &r.painter)
    }

    pub fn key_values(&self, id: DemId) -> Option<&KeyValueMap> {
        self.get(id).map(|r| &r.key_values)
    }

    pub fn ids(&self) -> impl Iterator<Item = DemId> + '_ {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_some())
            .map(|(i, _)| DemId(i))
    }

    pub fn len(&self) -> usize {
        self.records.iter().filter(|r| r.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loads currently in flight.
    pub fn active_loads(&self) -> usize {
        self.active_loads
    }

    pub fn status_brief(&self, id: DemId) -> Option<String> {
        self.painter(id).map(Painter::status_brief)
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Apply painter configuration to the matching records.
    ///
    /// Entries for unknown DEMs are skipped. DEMs whose configuration asks
    /// to be shown start loading. Returns the number of entries applied.
    pub fn install_configuration(&mut self, config: &PainterConfig) -> usize {
        let mut applied = 0;
        for (descriptor, entry) in &config.entries {
            let Some(id) = self.id_of(descriptor) else {
                debug!(dem = %descriptor.source, "No DEM for configuration entry");
                continue;
            };
            if let Some(record) = self.record_mut(id) {
                record.config = entry.clone();
                if let Some(mode) = entry.view_mode {
                    record.painter.set_active_mode(mode);
                }
                applied += 1;
            }
            self.emit(id, EventKind::ConfigChanged);
            self.auto_load(id);
        }
        info!(applied, total = config.entries.len(), "Painter configuration installed");
        applied
    }

    /// Current configuration of every DEM, in id order.
    pub fn configuration(&self) -> PainterConfig {
        PainterConfig::new(
            self.records
                .iter()
                .flatten()
                .map(|r| (r.descriptor.clone(), r.config.clone()))
                .collect(),
        )
    }

    /// Read a painter file and install it.
    pub fn load_configuration(&mut self, path: &Path) -> Result<ReadReport, ManagerError> {
        let known: Vec<_> = self.records.iter().flatten().map(|r| r.descriptor.clone()).collect();
        let (config, report) = PainterConfig::load(path, &known)?;
        self.install_configuration(&config);
        Ok(report)
    }

    pub fn save_configuration(&self, path: &Path) -> Result<(), ManagerError> {
        self.configuration().save(path)?;
        Ok(())
    }

    /// Edit one DEM's configuration, loading it if it now wants to be shown.
    pub fn update_config<F>(&mut self, id: DemId, edit: F) -> bool
    where
        F: FnOnce(&mut ConfigEntry),
    {
        let Some(record) = self.record_mut(id) else {
            return false;
        };
        edit(&mut record.config);
        self.emit(id, EventKind::ConfigChanged);
        self.auto_load(id);
        true
    }

    /// Choose the view mode of a DEM. A shown DEM loads the mode if needed.
    pub fn set_view_mode(&mut self, id: DemId, mode: ViewMode) -> bool {
        let Some(record) = self.record_mut(id) else {
            return false;
        };
        record.config.view_mode = Some(mode);
        record.painter.set_active_mode(mode);
        self.emit(id, EventKind::ConfigChanged);
        self.auto_load(id);
        true
    }

    fn auto_load(&mut self, id: DemId) {
        let Some(record) = self.get(id) else {
            return;
        };
        if record.config.wants_display() {
            let mode = record.config.view_mode.unwrap_or(self.settings.default_view_mode);
            self.request_load(id, mode);
        }
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Ask for the mesh of `id` built under `mode`.
    ///
    /// Returns `true` when a new load was scheduled. Nothing is scheduled
    /// while the DEM is already loading, and a mesh that already exists just
    /// becomes the active one.
    pub fn request_load(&mut self, id: DemId, mode: ViewMode) -> bool {
        let Some(record) = self.records.get_mut(id.0).and_then(Option::as_mut) else {
            return false;
        };
        let Some(ticket) = record.painter.request_load(mode) else {
            return false;
        };

        let download = self.fetcher.needs_download(&record.descriptor);
        if download {
            record.painter.apply_progress(ticket.job, LoadPhase::Download, 0.0);
        }
        let labels = record.labels(mode);
        info!(%id, dem = %record.descriptor.source, %mode, download, "Load requested");

        let job = LoadJob {
            id,
            descriptor: record.descriptor.clone(),
            ticket,
            download,
            fetcher: Arc::clone(&self.fetcher),
            parser: self.parser,
            reports: self.report_tx.clone(),
        };
        self.scheduler.submit(move || job.run());

        metrics::counter!(metric_defs::LOAD_STARTED.name, &labels.to_labels()).increment(1);
        self.active_loads += 1;
        metrics::gauge!(metric_defs::LOAD_ACTIVE.name).set(self.active_loads as f64);
        self.emit(id, EventKind::LoadStarted { mode });
        true
    }

    /// Cancel the load of `id`.
    ///
    /// With no mesh to fall back to, the DEM's display flags are cleared so
    /// it does not reload on its own.
    pub fn cancel(&mut self, id: DemId) -> CancelOutcome {
        let Some(record) = self.record_mut(id) else {
            return CancelOutcome::NotLoading;
        };
        let mode = record.painter.active_mode();
        let outcome = record.painter.cancel();
        let config_changed = match outcome {
            CancelOutcome::NotLoading => return outcome,
            CancelOutcome::Idle => hide(&mut record.config),
            CancelOutcome::Reverted(mode) => record.config.view_mode.replace(mode) != Some(mode),
        };
        let labels = record.labels(mode);
        info!(%id, dem = %record.descriptor.source, ?outcome, "Load cancelled");

        metrics::counter!(metric_defs::LOAD_CANCELLED.name, &labels.to_labels()).increment(1);
        self.load_settled();
        self.emit(id, EventKind::Cancelled { outcome });
        if config_changed {
            self.emit(id, EventKind::ConfigChanged);
        }
        outcome
    }

    /// Apply every report that has arrived. Returns how many were handled.
    pub fn process_reports(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(report) = self.report_rx.try_recv() {
            self.handle_report(report);
            handled += 1;
        }
        handled
    }

    /// Block up to `timeout` for the next report, then apply it and any
    /// others already queued.
    pub fn wait_for_reports(&mut self, timeout: Duration) -> usize {
        match self.report_rx.recv_timeout(timeout) {
            Ok(report) => {
                self.handle_report(report);
                1 + self.process_reports()
            }
            Err(_) => 0,
        }
    }

    /// Process reports until no load is in flight or `timeout` passes.
    ///
    /// Returns `true` if every load settled in time.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.active_loads > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            self.wait_for_reports(remaining);
        }
        true
    }

    fn handle_report(&mut self, report: LoadReport) {
        let LoadReport { id, job, kind } = report;
        let Some(record) = self.records.get_mut(id.0).and_then(Option::as_mut) else {
            debug!(%id, job, "Report for a removed DEM");
            return;
        };

        let (result, elapsed) = match kind {
            ReportKind::Progress { phase, fraction } => {
                if record.painter.apply_progress(job, phase, fraction) {
                    self.emit(id, EventKind::Progress { phase, fraction });
                }
                return;
            }
            ReportKind::Finished { result, elapsed } => (result, elapsed),
        };

        let (mesh, key_values) = match result {
            Ok(parsed) => (Ok(parsed.mesh), Some(parsed.key_values)),
            Err(err) => (Err(err), None),
        };
        let size = mesh.as_ref().map(|m| (m.vertex_count(), m.triangle_count())).ok();

        let Some(outcome) = record.painter.complete(job, mesh) else {
            debug!(%id, job, "Ignoring stale load report");
            return;
        };

        let mut config_changed = false;
        let event = match outcome {
            LoadOutcome::Ready(mode) => {
                if let Some(key_values) = key_values {
                    let added = record.key_values.merge_missing(&key_values);
                    debug!(%id, added, "Header metadata merged");
                }
                if mode == ViewMode::Plain {
                    config_changed = record.config.view_mode.replace(ViewMode::Plain) != Some(ViewMode::Plain);
                }

                let labels = record.labels(mode).to_labels();
                metrics::counter!(metric_defs::LOAD_COMPLETED.name, &labels).increment(1);
                metrics::histogram!(metric_defs::LOAD_DURATION.name, &labels).record(elapsed.as_secs_f64() * 1000.0);
                if let Some((vertices, triangles)) = size {
                    metrics::counter!(metric_defs::MESH_VERTICES.name, &labels).increment(vertices as u64);
                    metrics::counter!(metric_defs::MESH_TRIANGLES.name, &labels).increment(triangles as u64);
                }
                info!(
                    %id,
                    dem = %record.descriptor.source,
                    %mode,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "DEM loaded"
                );
                EventKind::Loaded { mode }
            }
            LoadOutcome::Failed(mode, error) => {
                config_changed = hide(&mut record.config);
                let labels = record.labels(mode).with_stage(error.stage());
                metrics::counter!(metric_defs::LOAD_FAILED.name, &labels).increment(1);
                warn!(%id, dem = %record.descriptor.source, %mode, %error, "DEM load failed");
                EventKind::Failed { mode, error }
            }
            // `cancel` detaches its job, so this is a fetcher or parser that
            // stopped with `Cancelled` on its own, e.g. a source that gave up.
            LoadOutcome::Cancelled => {
                let outcome = if record.painter.is_ready() {
                    CancelOutcome::Reverted(record.painter.active_mode())
                } else {
                    config_changed = hide(&mut record.config);
                    CancelOutcome::Idle
                };
                let labels = record.labels(record.painter.active_mode());
                metrics::counter!(metric_defs::LOAD_CANCELLED.name, &labels.to_labels()).increment(1);
                debug!(%id, job, "Worker stopped after cancellation");
                EventKind::Cancelled { outcome }
            }
        };

        self.load_settled();
        self.emit(id, event);
        if config_changed {
            self.emit(id, EventKind::ConfigChanged);
        }
    }

    fn load_settled(&mut self) {
        self.active_loads = self.active_loads.saturating_sub(1);
        metrics::gauge!(metric_defs::LOAD_ACTIVE.name).set(self.active_loads as f64);
    }

    fn emit(&mut self, id: DemId, kind: EventKind) {
        let forced = kind.is_forced();
        if !self.throttle.admit(id, forced, Instant::now()) {
            metrics::counter!(metric_defs::NOTIFY_THROTTLED.name).increment(1);
            return;
        }
        let event = PainterEvent { id, kind };
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// Clear the display flags, returning whether any was set.
fn hide(config: &mut ConfigEntry) -> bool {
    let shown = config.wants_display();
    config.clear_display_flags();
    shown
}
