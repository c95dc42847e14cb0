use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use super::state::{RegionState, Transition};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSnapshot {
    pub state: RegionState,
    pub display_secs: Option<u64>,
}

/// Latest computed state for every region, one lock domain covering all of
/// them. The detection loop publishes a full sweep under a single write
/// acquisition, so a renderer never observes a half-updated sweep; renderers
/// read under the read lock. The lock is held for state arithmetic only,
/// never across capture or matching work.
#[derive(Clone)]
pub struct StateStore {
    regions: Arc<RwLock<Vec<RegionState>>>,
    cap_ms: u64,
}

impl StateStore {
    pub fn new(region_count: usize, cap_ms: u64) -> Self {
        Self {
            regions: Arc::new(RwLock::new(vec![RegionState::default(); region_count])),
            cap_ms,
        }
    }

    pub fn region_count(&self) -> usize {
        self.regions.read().unwrap().len()
    }

    pub fn cap_ms(&self) -> u64 {
        self.cap_ms
    }

    /// Runs every region's tick for one sweep atomically. `detections` must
    /// be index-aligned with the configured regions.
    pub fn advance_sweep(
        &self,
        detections: &[bool],
        now: Instant,
        wall_now: DateTime<Utc>,
    ) -> Vec<Option<Transition>> {
        let mut guard = self.regions.write().unwrap();
        debug_assert_eq!(detections.len(), guard.len());

        guard
            .iter_mut()
            .zip(detections)
            .map(|(state, &detected)| state.apply_detection(detected, now, wall_now, self.cap_ms))
            .collect()
    }

    pub fn region(&self, index: usize) -> Option<RegionSnapshot> {
        let guard = self.regions.read().unwrap();
        guard.get(index).map(|state| RegionSnapshot {
            display_secs: state.display_secs(),
            state: state.clone(),
        })
    }

    pub fn snapshot(&self) -> Vec<RegionSnapshot> {
        let guard = self.regions.read().unwrap();
        guard
            .iter()
            .map(|state| RegionSnapshot {
                display_secs: state.display_secs(),
                state: state.clone(),
            })
            .collect()
    }

    /// Renderer query: truncated whole seconds as text while the counter is
    /// live, empty string at rest (no counter shown).
    pub fn display_text(&self, index: usize) -> String {
        let guard = self.regions.read().unwrap();
        guard
            .get(index)
            .and_then(RegionState::display_secs)
            .map(|secs| secs.to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const CAP_MS: u64 = 91_000;

    #[test]
    fn starts_with_all_regions_idle_and_blank() {
        let store = StateStore::new(4, CAP_MS);
        assert_eq!(store.region_count(), 4);

        for snapshot in store.snapshot() {
            assert!(!snapshot.state.running);
            assert!(snapshot.state.pattern_present);
            assert_eq!(snapshot.display_secs, None);
        }
        assert_eq!(store.display_text(0), "");
    }

    #[test]
    fn sweep_advances_each_region_independently() {
        let store = StateStore::new(3, CAP_MS);
        let start = Instant::now();

        let transitions = store.advance_sweep(&[true, false, true], start, Utc::now());
        assert_eq!(transitions[0], None);
        assert_eq!(transitions[1], Some(Transition::Started));
        assert_eq!(transitions[2], None);

        let later = start + Duration::from_secs(7);
        store.advance_sweep(&[true, false, true], later, Utc::now());

        let snapshots = store.snapshot();
        assert!(!snapshots[0].state.running);
        assert_eq!(snapshots[1].state.elapsed_ms, 7_000);
        assert_eq!(store.display_text(1), "7");
        assert_eq!(store.display_text(2), "");
    }

    #[test]
    fn display_text_is_empty_for_unknown_region() {
        let store = StateStore::new(1, CAP_MS);
        assert_eq!(store.display_text(9), "");
        assert!(store.region(9).is_none());
    }

    #[test]
    fn snapshots_stay_internally_consistent_under_concurrent_reads() {
        let store = StateStore::new(4, CAP_MS);
        let reader = store.clone();

        let handle = std::thread::spawn(move || {
            for _ in 0..2_000 {
                for snapshot in reader.snapshot() {
                    // A resting region never reports a displayable value.
                    if !snapshot.state.running && snapshot.state.elapsed_ms == 0 {
                        assert_eq!(snapshot.display_secs, None);
                    }
                    assert!(snapshot.state.elapsed_ms <= CAP_MS);
                }
            }
        });

        let start = Instant::now();
        for step in 0..2_000u64 {
            let detected = step % 5 == 0;
            store.advance_sweep(
                &[detected, !detected, detected, !detected],
                start + Duration::from_millis(step),
                Utc::now(),
            );
        }

        handle.join().unwrap();
    }
}
