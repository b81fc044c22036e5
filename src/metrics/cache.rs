use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::AggregatedMetric;

/// Default freshness window for a computed snapshot.
pub const DEFAULT_TTL: Duration = Duration::from_millis(15_000);

/// Process-wide holder of the most recent percentile snapshot.
///
/// Last writer wins: two requests racing past a miss both compute and
/// both `put`, and the later write replaces the earlier one. Unless
/// `per_window` is set, a hit is served regardless of which `days`
/// produced the stored snapshot.
pub struct CacheGate {
    ttl: Duration,
    per_window: bool,
    entry: Mutex<Option<CacheEntry>>,
}

struct CacheEntry {
    metrics: Vec<AggregatedMetric>,
    days: u32,
    computed_at: Instant,
}

impl CacheGate {
    pub fn new(ttl: Duration, per_window: bool) -> Self {
        Self {
            ttl,
            per_window,
            entry: Mutex::new(None),
        }
    }

    /// Returns the stored snapshot if it is younger than the TTL.
    pub fn get(&self, days: u32) -> Option<Vec<AggregatedMetric>> {
        self.get_at(days, Instant::now())
    }

    pub fn put(&self, days: u32, metrics: Vec<AggregatedMetric>) {
        self.put_at(days, metrics, Instant::now());
    }

    /// Drop the stored snapshot. Returns whether one was present.
    pub fn clear(&self) -> bool {
        self.entry.lock().take().is_some()
    }

    fn get_at(&self, days: u32, now: Instant) -> Option<Vec<AggregatedMetric>> {
        let guard = self.entry.lock();
        let entry = guard.as_ref()?;

        if now.saturating_duration_since(entry.computed_at) >= self.ttl {
            return None;
        }
        if self.per_window && entry.days != days {
            return None;
        }
        Some(entry.metrics.clone())
    }

    fn put_at(&self, days: u32, metrics: Vec<AggregatedMetric>, now: Instant) {
        *self.entry.lock() = Some(CacheEntry {
            metrics,
            days,
            computed_at: now,
        });
    }
}

impl Default for CacheGate {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(metric: &str) -> Vec<AggregatedMetric> {
        vec![AggregatedMetric::empty(metric)]
    }

    #[test]
    fn empty_gate_misses() {
        let gate = CacheGate::default();
        assert!(gate.get(7).is_none());
    }

    #[test]
    fn hit_inside_ttl_miss_at_ttl() {
        let gate = CacheGate::default();
        let t0 = Instant::now();
        gate.put_at(7, snapshot("LCP"), t0);

        assert_eq!(
            gate.get_at(7, t0 + Duration::from_millis(14_999)),
            Some(snapshot("LCP"))
        );
        assert!(gate.get_at(7, t0 + DEFAULT_TTL).is_none());
        assert!(gate.get_at(7, t0 + Duration::from_secs(60)).is_none());
    }

    #[test]
    fn unkeyed_gate_serves_other_windows() {
        let gate = CacheGate::default();
        gate.put(7, snapshot("LCP"));
        assert_eq!(gate.get(30), Some(snapshot("LCP")));
    }

    #[test]
    fn per_window_gate_misses_on_other_windows() {
        let gate = CacheGate::new(DEFAULT_TTL, true);
        gate.put(7, snapshot("LCP"));
        assert!(gate.get(30).is_none());
        assert_eq!(gate.get(7), Some(snapshot("LCP")));
    }

    #[test]
    fn later_put_overwrites() {
        let gate = CacheGate::default();
        gate.put(7, snapshot("LCP"));
        gate.put(7, snapshot("CLS"));
        assert_eq!(gate.get(7), Some(snapshot("CLS")));
    }

    #[test]
    fn clear_ignores_ttl() {
        let gate = CacheGate::default();
        gate.put(7, snapshot("LCP"));
        assert!(gate.clear());
        assert!(gate.get(7).is_none());
        assert!(!gate.clear());
    }
}
