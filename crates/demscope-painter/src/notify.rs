//! Observer notifications and their per-DEM throttle.

use crate::error::LoadError;
use crate::manager::DemId;
use crate::painter::{CancelOutcome, LoadPhase};
use demscope_common::ViewMode;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A state change of one DEM, as seen by observers.
#[derive(Debug, Clone, PartialEq)]
pub struct PainterEvent {
    pub id: DemId,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    LoadStarted { mode: ViewMode },
    Progress { phase: LoadPhase, fraction: f64 },
    Loaded { mode: ViewMode },
    Failed { mode: ViewMode, error: LoadError },
    Cancelled { outcome: CancelOutcome },
    /// The DEM's configuration entry changed, including flags cleared by a
    /// failed or cancelled load.
    ConfigChanged,
}

impl EventKind {
    /// Terminal and lifecycle events are never dropped.
    pub fn is_forced(&self) -> bool {
        !matches!(self, EventKind::Progress { .. })
    }
}

/// Drops notifications that arrive too soon after the previous one for the
/// same DEM. Forced notifications always pass and restart the interval.
#[derive(Debug)]
pub struct NotifyThrottle {
    interval: Duration,
    last: HashMap<DemId, Instant>,
}

impl NotifyThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: HashMap::new(),
        }
    }

    /// Whether a notification for `id` at `now` should be delivered.
    pub fn admit(&mut self, id: DemId, forced: bool, now: Instant) -> bool {
        let due = forced
            || self
                .last
                .get(&id)
                .map_or(true, |last| now.saturating_duration_since(*last) >= self.interval);
        if due {
            self.last.insert(id, now);
        }
        due
    }

    /// Forget a DEM that no longer exists.
    pub fn forget(&mut self, id: DemId) {
        self.last.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_per_dem() {
        let mut throttle = NotifyThrottle::new(Duration::from_millis(47));
        let a = DemId::from_index(0);
        let b = DemId::from_index(1);
        let t0 = Instant::now();

        assert!(throttle.admit(a, false, t0));
        assert!(!throttle.admit(a, false, t0 + Duration::from_millis(20)));
        // Another DEM has its own clock.
        assert!(throttle.admit(b, false, t0 + Duration::from_millis(20)));
        assert!(throttle.admit(a, false, t0 + Duration::from_millis(47)));
    }

    #[test]
    fn test_forced_always_passes_and_restarts() {
        let mut throttle = NotifyThrottle::new(Duration::from_millis(47));
        let a = DemId::from_index(0);
        let t0 = Instant::now();

        assert!(throttle.admit(a, false, t0));
        assert!(throttle.admit(a, true, t0 + Duration::from_millis(1)));
        assert!(!throttle.admit(a, false, t0 + Duration::from_millis(47)));
        assert!(throttle.admit(a, false, t0 + Duration::from_millis(48)));

        throttle.forget(a);
        assert!(throttle.admit(a, false, t0 + Duration::from_millis(49)));
    }

    #[test]
    fn test_only_progress_is_throttled() {
        assert!(!EventKind::Progress {
            phase: LoadPhase::Load,
            fraction: 0.5
        }
        .is_forced());
        assert!(EventKind::Loaded { mode: ViewMode::ValidOnly }.is_forced());
        assert!(EventKind::Cancelled {
            outcome: CancelOutcome::Idle
        }
        .is_forced());
    }
}
