//! Worker side of a load: fetch, parse, build, report.

use crate::error::LoadError;
use crate::manager::DemId;
use crate::painter::{JobId, LoadPhase, LoadTicket};
use crossbeam_channel::Sender;
use demscope_common::DemDescriptor;
use demscope_io::{DemFileParser, Fetch, ParsedDem};
use demscope_mesh::ProgressMonitor;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Smallest progress step worth a report.
const PROGRESS_STEP: f64 = 0.01;

/// Message from a worker to the interactive thread.
#[derive(Debug)]
pub struct LoadReport {
    pub id: DemId,
    pub job: JobId,
    pub kind: ReportKind,
}

#[derive(Debug)]
pub enum ReportKind {
    Progress { phase: LoadPhase, fraction: f64 },
    Finished {
        result: Result<ParsedDem, LoadError>,
        elapsed: Duration,
    },
}

/// Everything a worker needs to run one load.
pub(crate) struct LoadJob {
    pub id: DemId,
    pub descriptor: DemDescriptor,
    pub ticket: LoadTicket,
    pub download: bool,
    pub fetcher: Arc<dyn Fetch>,
    pub parser: DemFileParser,
    pub reports: Sender<LoadReport>,
}

impl LoadJob {
    /// Run to completion and send the final report.
    pub(crate) fn run(self) {
        let started = Instant::now();
        // A panicking decoder still settles the painter as a failure.
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.execute())).unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            warn!(dem = %self.descriptor.file_name(), %message, "Load worker panicked");
            Err(LoadError::Parse(format!("loader panicked: {message}")))
        });
        let elapsed = started.elapsed();
        debug!(
            dem = %self.descriptor.file_name(),
            mode = %self.ticket.mode,
            ok = result.is_ok(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Load finished"
        );
        // The manager may be gone; nothing left to tell.
        let _ = self.reports.send(LoadReport {
            id: self.id,
            job: self.ticket.job,
            kind: ReportKind::Finished { result, elapsed },
        });
    }

    fn execute(&self) -> Result<ParsedDem, LoadError> {
        let cancel = self.ticket.cancel.as_ref();
        let phase = if self.download {
            LoadPhase::Download
        } else {
            LoadPhase::Load
        };
        let mut monitor = JobMonitor::new(self.id, self.ticket.job, phase, cancel, &self.reports);
        if monitor.is_cancelled() {
            return Err(LoadError::Cancelled);
        }

        let local = self.fetcher.fetch(&self.descriptor, &mut monitor)?;
        if monitor.is_cancelled() {
            return Err(LoadError::Cancelled);
        }

        monitor.enter(LoadPhase::Load);
        let name = local
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.descriptor.file_name().to_string());
        let parsed = self
            .parser
            .parse_bytes(&name, &local.bytes, self.ticket.mode, &mut monitor)?;
        if monitor.is_cancelled() {
            return Err(LoadError::Cancelled);
        }
        Ok(parsed)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text.to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Forwards fetch and build progress as reports, polling the cancel flag.
struct JobMonitor<'a> {
    id: DemId,
    job: JobId,
    phase: LoadPhase,
    cancel: &'a AtomicBool,
    reports: &'a Sender<LoadReport>,
    last_sent: Option<f64>,
}

impl<'a> JobMonitor<'a> {
    fn new(id: DemId, job: JobId, phase: LoadPhase, cancel: &'a AtomicBool, reports: &'a Sender<LoadReport>) -> Self {
        Self {
            id,
            job,
            phase,
            cancel,
            reports,
            last_sent: None,
        }
    }

    fn enter(&mut self, phase: LoadPhase) {
        if self.phase != phase {
            self.phase = phase;
            self.last_sent = None;
            self.progress(0.0);
        }
    }

    fn send(&mut self, fraction: f64) {
        self.last_sent = Some(fraction);
        let _ = self.reports.send(LoadReport {
            id: self.id,
            job: self.job,
            kind: ReportKind::Progress {
                phase: self.phase,
                fraction,
            },
        });
    }
}

impl ProgressMonitor for JobMonitor<'_> {
    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    fn progress(&mut self, fraction: f64) {
        let due = match self.last_sent {
            None => true,
            Some(last) => fraction - last >= PROGRESS_STEP || (fraction >= 1.0 && last < 1.0),
        };
        if due {
            self.send(fraction);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use demscope_common::ViewMode;
    use demscope_io::{encode_grid, FetchError, HeaderCard, LocalBytes};
    use demscope_mesh::{PlaneLayout, RawGrid};
    use std::path::PathBuf;

    /// FITS bytes for a flat `size x size` tile.
    pub(crate) fn tile_bytes(size: usize) -> Vec<u8> {
        let n = size * size;
        let planes = vec![
            (0..n).map(|i| (i % size) as f32).collect(),
            (0..n).map(|i| (i / size) as f32).collect(),
            vec![1.0; n],
        ];
        let grid = RawGrid::from_planes(size, size, planes, PlaneLayout::default()).unwrap();
        let cards = vec![
            HeaderCard::new("PLANE1", "X coordinate of vertices (kilometers)", None),
            HeaderCard::new("PLANE2", "Y coordinate of vertices (kilometers)", None),
            HeaderCard::new("PLANE3", "Z coordinate of vertices (kilometers)", None),
            HeaderCard::new("GSD", "0.5", None),
        ];
        encode_grid(&grid, &cards)
    }

    /// Serves fixed bytes for any descriptor.
    struct Canned(Vec<u8>);

    impl Fetch for Canned {
        fn fetch(&self, descriptor: &DemDescriptor, monitor: &mut dyn ProgressMonitor) -> Result<LocalBytes, FetchError> {
            if monitor.is_cancelled() {
                return Err(FetchError::Cancelled);
            }
            monitor.progress(1.0);
            Ok(LocalBytes {
                path: PathBuf::from(&descriptor.source),
                bytes: self.0.clone(),
            })
        }
    }

    /// Fails the way a decoder bug would.
    struct Exploding;

    impl Fetch for Exploding {
        fn fetch(&self, _: &DemDescriptor, _: &mut dyn ProgressMonitor) -> Result<LocalBytes, FetchError> {
            panic!("attempt to multiply with overflow");
        }
    }

    fn job(bytes: Vec<u8>, cancelled: bool) -> (LoadJob, crossbeam_channel::Receiver<LoadReport>) {
        let (tx, rx) = unbounded();
        let ticket = LoadTicket {
            job: 7,
            mode: ViewMode::IncludingInvalid,
            cancel: Arc::new(AtomicBool::new(cancelled)),
        };
        let job = LoadJob {
            id: DemId::from_index(0),
            descriptor: DemDescriptor::unknown_geometry("/data/tile.fit"),
            ticket,
            download: true,
            fetcher: Arc::new(Canned(bytes)),
            parser: DemFileParser::default(),
            reports: tx,
        };
        (job, rx)
    }

    #[test]
    fn test_successful_job_reports_phases_then_mesh() {
        let (job, rx) = job(tile_bytes(3), false);
        job.run();
        let reports: Vec<_> = rx.try_iter().collect();

        let phases: Vec<_> = reports
            .iter()
            .filter_map(|r| match r.kind {
                ReportKind::Progress { phase, .. } => Some(phase),
                _ => None,
            })
            .collect();
        assert_eq!(phases.first(), Some(&LoadPhase::Download));
        assert_eq!(phases.last(), Some(&LoadPhase::Load));

        let last = reports.last().unwrap();
        assert_eq!(last.job, 7);
        match &last.kind {
            ReportKind::Finished { result: Ok(parsed), .. } => {
                assert_eq!(parsed.mesh.vertex_count(), 9);
                assert_eq!(parsed.mesh.triangle_count(), 8);
                assert_eq!(parsed.key_values.value("GSD"), Some("0.5"));
            }
            other => panic!("unexpected report {other:?}"),
        }
    }

    #[test]
    fn test_cancelled_job_does_no_work() {
        let (job, rx) = job(tile_bytes(3), true);
        job.run();
        let reports: Vec<_> = rx.try_iter().collect();
        assert_eq!(reports.len(), 1);
        assert!(matches!(
            reports[0].kind,
            ReportKind::Finished {
                result: Err(LoadError::Cancelled),
                ..
            }
        ));
    }

    #[test]
    fn test_garbage_is_parse_failure() {
        let (job, rx) = job(b"not a dem".to_vec(), false);
        job.run();
        let last = rx.try_iter().last().unwrap();
        assert!(matches!(
            last.kind,
            ReportKind::Finished {
                result: Err(LoadError::Parse(_)),
                ..
            }
        ));
    }

    #[test]
    fn test_panicking_worker_reports_failure() {
        let (mut job, rx) = job(Vec::new(), false);
        job.fetcher = Arc::new(Exploding);
        job.run();
        let last = rx.try_iter().last().unwrap();
        assert_eq!(last.job, 7);
        match last.kind {
            ReportKind::Finished {
                result: Err(LoadError::Parse(message)),
                ..
            } => assert!(message.contains("multiply with overflow"), "{message}"),
            other => panic!("unexpected report {other:?}"),
        }
    }

    #[test]
    fn test_progress_is_coalesced() {
        let (tx, rx) = unbounded();
        let cancel = AtomicBool::new(false);
        let mut monitor = JobMonitor::new(DemId::from_index(0), 1, LoadPhase::Load, &cancel, &tx);
        for i in 0..=1000 {
            monitor.progress(i as f64 / 1000.0);
        }
        let count = rx.try_iter().count();
        assert!(count <= 101, "{count} reports");
        assert!(count >= 50);
    }
}
