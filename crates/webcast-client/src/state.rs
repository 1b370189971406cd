//! Process-lifetime aggregates shared by event handlers.
//!
//! Handlers run on the receive loop, but the aggregates outlive a single
//! connection attempt and are readable from other tasks, so every mutable
//! field here is synchronized.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::sink::{NullSink, RecordSink};

/// Running diamond value of all tracked gifts. Never decreases.
#[derive(Debug, Default)]
pub struct DiamondTotal {
    total: AtomicU64,
}

impl DiamondTotal {
    /// Add `value` and return the new total (saturating).
    pub fn add(&self, value: u64) -> u64 {
        let prev = self
            .total
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |t| {
                Some(t.saturating_add(value))
            })
            .unwrap_or_else(|t| t);
        prev.saturating_add(value)
    }

    pub fn get(&self) -> u64 {
        self.total.load(Ordering::Acquire)
    }
}

/// Lets one event through per interval; the first event always passes.
#[derive(Debug, Default)]
pub struct RateGate {
    last: Mutex<Option<Instant>>,
}

impl RateGate {
    pub fn try_pass(&self, interval: Duration, now: Instant) -> bool {
        // Poisoned mutex means logic bug; suppress rather than panic.
        let Ok(mut last) = self.last.lock() else {
            return false;
        };
        match *last {
            Some(prev) if now.saturating_duration_since(prev) < interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}

/// Shared handler state: aggregates plus the record sink.
pub struct SharedState {
    pub diamonds: DiamondTotal,
    pub viewer_gate: RateGate,
    pub sink: Arc<dyn RecordSink>,
}

impl SharedState {
    pub fn new(sink: Arc<dyn RecordSink>) -> Self {
        Self {
            diamonds: DiamondTotal::default(),
            viewer_gate: RateGate::default(),
            sink,
        }
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(Arc::new(NullSink))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diamond_total_accumulates() {
        let d = DiamondTotal::default();
        assert_eq!(d.add(50), 50);
        assert_eq!(d.add(0), 50);
        assert_eq!(d.add(7), 57);
        assert_eq!(d.get(), 57);
    }

    #[test]
    fn diamond_total_saturates_instead_of_wrapping() {
        let d = DiamondTotal::default();
        d.add(u64::MAX - 1);
        assert_eq!(d.add(10), u64::MAX);
        assert_eq!(d.get(), u64::MAX);
    }

    #[test]
    fn gate_passes_first_then_waits_for_interval() {
        let gate = RateGate::default();
        let t0 = Instant::now();
        let every = Duration::from_secs(300);

        assert!(gate.try_pass(every, t0));
        assert!(!gate.try_pass(every, t0 + Duration::from_secs(10)));
        assert!(!gate.try_pass(every, t0 + Duration::from_secs(299)));
        assert!(gate.try_pass(every, t0 + Duration::from_secs(300)));
        assert!(!gate.try_pass(every, t0 + Duration::from_secs(301)));
    }
}
