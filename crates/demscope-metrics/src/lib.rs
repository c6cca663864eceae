//! Metrics for the demscope DEM load lifecycle.
//!
//! Every metric is declared once as a const [`Metric`] in [`metric_defs`] so
//! names cannot drift between the recording site and exporters. The `metrics`
//! crate is re-exported; install any recorder and call [`describe_metrics`]
//! once at startup.
//!
//! # Example
//!
//! ```rust
//! use demscope_common::ViewMode;
//! use demscope_metrics::{describe_metrics, metric_defs, LoadLabels};
//!
//! describe_metrics();
//!
//! let labels = LoadLabels::new("bennu_tile.fit", ViewMode::ValidOnly);
//! metrics::counter!(metric_defs::LOAD_STARTED.name, &labels.to_labels()).increment(1);
//! ```
//!
//! # Declaring a metric
//!
//! ```rust
//! use demscope_metrics::{Metric, MetricKind};
//! use metrics::Unit;
//!
//! const CACHE_HITS: Metric = Metric::counter("demscope.cache.hits")
//!     .with_description("Sources served from the download cache")
//!     .with_unit(Unit::Count)
//!     .with_labels(&["dem"]);
//!
//! assert_eq!(CACHE_HITS.kind, MetricKind::Counter);
//! CACHE_HITS.describe();
//! ```

pub use metrics;

use demscope_common::ViewMode;
use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// How a metric is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

/// Name, kind and metadata of one metric, declared as a `const`.
#[derive(Debug, Clone)]
pub struct Metric {
    pub name: &'static str,
    pub kind: MetricKind,
    pub description: &'static str,
    pub unit: Option<Unit>,
    /// Label keys every recording of this metric carries.
    pub labels: &'static [&'static str],
}

impl Metric {
    const fn new(name: &'static str, kind: MetricKind) -> Self {
        Self {
            name,
            kind,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    pub const fn counter(name: &'static str) -> Self {
        Self::new(name, MetricKind::Counter)
    }

    pub const fn gauge(name: &'static str) -> Self {
        Self::new(name, MetricKind::Gauge)
    }

    pub const fn histogram(name: &'static str) -> Self {
        Self::new(name, MetricKind::Histogram)
    }

    pub const fn with_description(self, description: &'static str) -> Self {
        Self { description, ..self }
    }

    pub const fn with_unit(self, unit: Unit) -> Self {
        Self {
            unit: Some(unit),
            ..self
        }
    }

    pub const fn with_labels(self, labels: &'static [&'static str]) -> Self {
        Self { labels, ..self }
    }

    /// Hand the description and unit to the installed recorder.
    pub fn describe(&self) {
        let (name, text) = (self.name, self.description);
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => {
                describe_counter!(name, unit, text);
            }
            (MetricKind::Counter, None) => {
                describe_counter!(name, text);
            }
            (MetricKind::Gauge, Some(unit)) => {
                describe_gauge!(name, unit, text);
            }
            (MetricKind::Gauge, None) => {
                describe_gauge!(name, text);
            }
            (MetricKind::Histogram, Some(unit)) => {
                describe_histogram!(name, unit, text);
            }
            (MetricKind::Histogram, None) => {
                describe_histogram!(name, text);
            }
        }
    }
}

/// All metric definitions for the load lifecycle.
pub mod metric_defs {
    use super::{Metric, Unit};

    // ========================================================================
    // Label Keys
    // ========================================================================

    /// Labels present on every per-load metric.
    pub const LOAD_LABELS: &[&str] = &["dem", "mode"];

    /// Per-load labels plus the stage that failed.
    pub const FAILURE_LABELS: &[&str] = &["dem", "mode", "stage"];

    // ========================================================================
    // Load Lifecycle
    // ========================================================================

    /// Loads submitted to the scheduler.
    pub const LOAD_STARTED: Metric = Metric::counter("demscope.load.started")
        .with_description("Loads submitted to the scheduler")
        .with_unit(Unit::Count)
        .with_labels(LOAD_LABELS);

    /// Loads that produced a mesh.
    pub const LOAD_COMPLETED: Metric = Metric::counter("demscope.load.completed")
        .with_description("Loads that produced a mesh")
        .with_unit(Unit::Count)
        .with_labels(LOAD_LABELS);

    /// Loads that ended in a fetch, parse or geometry failure.
    ///
    /// Labels: dem, mode, stage (fetch | parse | geometry)
    pub const LOAD_FAILED: Metric = Metric::counter("demscope.load.failed")
        .with_description("Loads that ended in a failure")
        .with_unit(Unit::Count)
        .with_labels(FAILURE_LABELS);

    /// Loads cancelled before completion.
    pub const LOAD_CANCELLED: Metric = Metric::counter("demscope.load.cancelled")
        .with_description("Loads cancelled before completion")
        .with_unit(Unit::Count)
        .with_labels(LOAD_LABELS);

    /// Wall time from worker start to report, successful loads only.
    pub const LOAD_DURATION: Metric = Metric::histogram("demscope.load.duration_ms")
        .with_description("Time spent fetching, parsing and building a mesh")
        .with_unit(Unit::Milliseconds)
        .with_labels(LOAD_LABELS);

    /// Loads currently in flight across all DEMs.
    pub const LOAD_ACTIVE: Metric = Metric::gauge("demscope.load.active")
        .with_description("Loads currently in flight")
        .with_unit(Unit::Count);

    // ========================================================================
    // Mesh Output
    // ========================================================================

    /// Vertices in meshes built.
    pub const MESH_VERTICES: Metric = Metric::counter("demscope.mesh.vertices")
        .with_description("Vertices in meshes built")
        .with_unit(Unit::Count)
        .with_labels(LOAD_LABELS);

    /// Triangles in meshes built.
    pub const MESH_TRIANGLES: Metric = Metric::counter("demscope.mesh.triangles")
        .with_description("Triangles in meshes built")
        .with_unit(Unit::Count)
        .with_labels(LOAD_LABELS);

    // ========================================================================
    // Notifications
    // ========================================================================

    /// Progress notifications dropped by the per-DEM throttle.
    pub const NOTIFY_THROTTLED: Metric = Metric::counter("demscope.notify.throttled")
        .with_description("Progress notifications dropped by the throttle")
        .with_unit(Unit::Count);

    /// Every metric above.
    pub const ALL: &[&Metric] = &[
        &LOAD_STARTED,
        &LOAD_COMPLETED,
        &LOAD_FAILED,
        &LOAD_CANCELLED,
        &LOAD_DURATION,
        &LOAD_ACTIVE,
        &MESH_VERTICES,
        &MESH_TRIANGLES,
        &NOTIFY_THROTTLED,
    ];
}

/// Labels identifying one load: which DEM and under which view mode.
#[derive(Debug, Clone)]
pub struct LoadLabels {
    /// File name of the DEM source.
    pub dem: String,
    pub mode: ViewMode,
}

impl LoadLabels {
    pub fn new(dem: impl Into<String>, mode: ViewMode) -> Self {
        Self { dem: dem.into(), mode }
    }

    /// `dem` and `mode` labels, in [`metric_defs::LOAD_LABELS`] order.
    pub fn to_labels(&self) -> Vec<(&'static str, String)> {
        vec![("dem", self.dem.clone()), ("mode", self.mode.to_string())]
    }

    /// Labels for a failure, in [`metric_defs::FAILURE_LABELS`] order.
    pub fn with_stage(&self, stage: &str) -> Vec<(&'static str, String)> {
        let mut labels = self.to_labels();
        labels.push(("stage", stage.to_string()));
        labels
    }
}

/// Describe every load lifecycle metric. Call once after installing a recorder.
pub fn describe_metrics() {
    metric_defs::ALL.iter().for_each(|metric| metric.describe());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_follow_declared_keys() {
        let labels = LoadLabels::new("x.fit", ViewMode::IncludingInvalid);
        let keys: Vec<_> = labels.to_labels().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, metric_defs::LOAD_LABELS);
        assert_eq!(labels.to_labels()[1].1, "including-invalid");

        let failure = labels.with_stage("parse");
        let keys: Vec<_> = failure.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, metric_defs::FAILURE_LABELS);
        assert_eq!(failure[2].1, "parse");
    }

    #[test]
    fn test_load_metric_kinds() {
        assert_eq!(metric_defs::LOAD_STARTED.kind, MetricKind::Counter);
        assert_eq!(metric_defs::LOAD_DURATION.kind, MetricKind::Histogram);
        assert_eq!(metric_defs::LOAD_DURATION.unit, Some(Unit::Milliseconds));
        assert_eq!(metric_defs::LOAD_ACTIVE.kind, MetricKind::Gauge);
        assert!(metric_defs::LOAD_ACTIVE.labels.is_empty());
        assert_eq!(metric_defs::LOAD_FAILED.labels, metric_defs::FAILURE_LABELS);
    }

    #[test]
    fn test_names_are_unique_and_namespaced() {
        let mut names: Vec<_> = metric_defs::ALL.iter().map(|m| m.name).collect();
        assert!(names.iter().all(|n| n.starts_with("demscope.")));
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), metric_defs::ALL.len());
    }

    #[test]
    fn test_builder_defaults() {
        const BARE: Metric = Metric::gauge("demscope.test.bare");
        assert_eq!(BARE.description, "");
        assert_eq!(BARE.unit, None);
        assert!(BARE.labels.is_empty());
    }

    #[test]
    fn test_describe_without_recorder() {
        describe_metrics();
    }
}
