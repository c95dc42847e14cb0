use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Detection edge observed by a region on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Pattern disappeared; the counter started from zero.
    Started,
    /// Pattern came back; the counter reset to idle.
    Reset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionState {
    /// Whether the elapsed counter is actively advancing.
    pub running: bool,
    /// Displayed elapsed time, always within `[0, cap_ms]`.
    pub elapsed_ms: u64,
    /// Most recent classification, consulted for edge detection before being
    /// overwritten at the end of each tick.
    pub pattern_present: bool,
    pub started_at: Option<DateTime<Utc>>,
    /// Monotonic anchor the elapsed time is recomputed from every tick, so a
    /// coarse or uneven sweep cadence never distorts the counter.
    #[serde(skip)]
    pub started_anchor: Option<Instant>,
}

impl Default for RegionState {
    fn default() -> Self {
        // Pattern assumed present at startup, so the first disappearance
        // registers as a real edge.
        Self {
            running: false,
            elapsed_ms: 0,
            pattern_present: true,
            started_at: None,
            started_anchor: None,
        }
    }
}

impl RegionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances one tick. `now` and `wall_now` are passed in rather than read
    /// from the clock so tests can synthesize time.
    ///
    /// Edge table: present-to-absent starts the counter at zero,
    /// absent-to-present resets it to idle unconditionally. While running the
    /// elapsed time is recomputed from the anchor and clamped to `cap_ms`;
    /// hitting the cap stops the counter on the same tick and it holds there
    /// until the pattern returns. `pattern_present` is updated last.
    pub fn apply_detection(
        &mut self,
        detected: bool,
        now: Instant,
        wall_now: DateTime<Utc>,
        cap_ms: u64,
    ) -> Option<Transition> {
        let transition = match (self.pattern_present, detected) {
            (true, false) => {
                self.running = true;
                self.elapsed_ms = 0;
                self.started_at = Some(wall_now);
                self.started_anchor = Some(now);
                Some(Transition::Started)
            }
            (false, true) => {
                self.running = false;
                self.elapsed_ms = 0;
                self.started_at = None;
                self.started_anchor = None;
                Some(Transition::Reset)
            }
            _ => None,
        };

        if self.running {
            if let Some(anchor) = self.started_anchor {
                let elapsed = now.saturating_duration_since(anchor).as_millis() as u64;
                if elapsed >= cap_ms {
                    self.elapsed_ms = cap_ms;
                    self.running = false;
                    self.started_anchor = None;
                } else {
                    self.elapsed_ms = elapsed;
                }
            }
        }

        self.pattern_present = detected;
        transition
    }

    /// Truncated whole seconds while the counter is live, `None` at rest.
    pub fn display_secs(&self) -> Option<u64> {
        if self.running || self.elapsed_ms > 0 {
            Some(self.elapsed_ms / 1000)
        } else {
            None
        }
    }
}
