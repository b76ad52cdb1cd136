//! Recency/aging highlight state machine.
//!
//! A value that just changed carries a "recent" visual class, decaying
//! through "medium" and "old" before losing emphasis entirely. The decay
//! is monotonic, driven by elapsed wall-clock time since the value's
//! origin timestamp, and re-evaluated when the value changes or a
//! scheduled boundary fires. Each cell owns at most one pending
//! transition at a time: touching a cell replaces its entry wholesale, so
//! no stale deadline can survive a newer origin.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tracing::trace;

/// Tier boundaries in seconds since the value's origin.
pub const RECENT_BOUNDARY_SECS: i64 = 2 * 60;
pub const MEDIUM_BOUNDARY_SECS: i64 = 5 * 60;
pub const OLD_BOUNDARY_SECS: i64 = 10 * 60;

/// Visual freshness tier of a changed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Recent,
    Medium,
    Old,
}

impl Tier {
    /// CSS-ish class name, mirrored by the front-end's tier styling.
    pub fn class_name(&self) -> &'static str {
        match self {
            Tier::Recent => "recent",
            Tier::Medium => "medium",
            Tier::Old => "old",
        }
    }

    /// Age at which this tier ends and the next classification fires.
    fn boundary_secs(&self) -> i64 {
        match self {
            Tier::Recent => RECENT_BOUNDARY_SECS,
            Tier::Medium => MEDIUM_BOUNDARY_SECS,
            Tier::Old => OLD_BOUNDARY_SECS,
        }
    }
}

/// Classify an elapsed age into a tier. `None` once past the final
/// boundary: the emphasis is removed and the timer chain ends.
pub fn classify(elapsed_secs: i64) -> Option<Tier> {
    if elapsed_secs < RECENT_BOUNDARY_SECS {
        Some(Tier::Recent)
    } else if elapsed_secs < MEDIUM_BOUNDARY_SECS {
        Some(Tier::Medium)
    } else if elapsed_secs < OLD_BOUNDARY_SECS {
        Some(Tier::Old)
    } else {
        None
    }
}

/// Live aging state for one cell address.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AgeEntry {
    origin: DateTime<Utc>,
    tier: Tier,
    /// The single pending transition for this cell.
    deadline: DateTime<Utc>,
}

/// Owned map from cell address to its single pending aging transition.
///
/// The driver asks for [`next_deadline`](AgingScheduler::next_deadline),
/// sleeps until it, then calls [`advance`](AgingScheduler::advance) and
/// repaints the returned cells.
#[derive(Debug, Default)]
pub struct AgingScheduler {
    entries: HashMap<String, AgeEntry>,
}

impl AgingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re-)enter the state machine for `address` with a value aged
    /// `age_secs` at `now`. Any previous entry for the address is
    /// replaced in the same step, cancelling its pending transition.
    /// Returns the tier to paint, `None` when the value is already past
    /// the final boundary (in which case no entry is kept).
    pub fn touch(&mut self, address: &str, age_secs: i64, now: DateTime<Utc>) -> Option<Tier> {
        let age_secs = age_secs.max(0);
        let origin = now - Duration::seconds(age_secs);
        match classify(age_secs) {
            Some(tier) => {
                let deadline = origin + Duration::seconds(tier.boundary_secs());
                trace!(address, age_secs, ?tier, "aging touch");
                self.entries.insert(
                    address.to_string(),
                    AgeEntry { origin, tier, deadline },
                );
                Some(tier)
            }
            None => {
                self.entries.remove(address);
                None
            }
        }
    }

    /// Drop the entry for `address`, cancelling its pending transition.
    /// Used when the displayed value becomes the placeholder.
    pub fn clear(&mut self, address: &str) {
        self.entries.remove(address);
    }

    /// Drop every entry. A full re-render discards all addresses, so all
    /// timers go with them.
    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    /// Current tier of a cell, if it is inside the decay window.
    pub fn tier(&self, address: &str) -> Option<Tier> {
        self.entries.get(address).map(|entry| entry.tier)
    }

    /// Earliest pending transition across all cells.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.entries.values().map(|entry| entry.deadline).min()
    }

    /// Fire every transition due at `now`: reclassify each due cell from
    /// its origin, reschedule the single next boundary, and report the
    /// new tier (`None` = emphasis removed, entry dropped).
    pub fn advance(&mut self, now: DateTime<Utc>) -> Vec<(String, Option<Tier>)> {
        let due: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.deadline <= now)
            .map(|(address, _)| address.clone())
            .collect();

        let mut transitions = Vec::with_capacity(due.len());
        for address in due {
            let origin = self.entries[&address].origin;
            let elapsed = (now - origin).num_seconds();
            match classify(elapsed) {
                Some(tier) => {
                    let deadline = origin + Duration::seconds(tier.boundary_secs());
                    self.entries.insert(
                        address.clone(),
                        AgeEntry { origin, tier, deadline },
                    );
                    transitions.push((address, Some(tier)));
                }
                None => {
                    self.entries.remove(&address);
                    transitions.push((address, None));
                }
            }
        }
        transitions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        "2026-03-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(classify(0), Some(Tier::Recent));
        assert_eq!(classify(119), Some(Tier::Recent));
        assert_eq!(classify(120), Some(Tier::Medium));
        assert_eq!(classify(299), Some(Tier::Medium));
        assert_eq!(classify(300), Some(Tier::Old));
        assert_eq!(classify(599), Some(Tier::Old));
        assert_eq!(classify(600), None);
        assert_eq!(classify(10_000), None);
    }

    #[test]
    fn test_touch_schedules_one_deadline_at_next_boundary() {
        let mut sched = AgingScheduler::new();
        let t0 = now();

        assert_eq!(sched.touch("1-0-26-0-0", 30, t0), Some(Tier::Recent));
        assert_eq!(sched.len(), 1);
        // Origin is 30s ago, so the recent->medium boundary is 90s out.
        assert_eq!(sched.next_deadline(), Some(t0 + Duration::seconds(90)));

        assert_eq!(sched.touch("1-0-26-0-0", 150, t0), Some(Tier::Medium));
        assert_eq!(sched.len(), 1, "re-touch must replace, never stack");
        assert_eq!(sched.next_deadline(), Some(t0 + Duration::seconds(150)));
    }

    #[test]
    fn test_touch_past_final_boundary_keeps_no_entry() {
        let mut sched = AgingScheduler::new();
        assert_eq!(sched.touch("1-1", 600, now()), None);
        assert!(sched.is_empty());
        assert_eq!(sched.next_deadline(), None);
    }

    #[test]
    fn test_chain_advances_tier_by_tier() {
        let mut sched = AgingScheduler::new();
        let t0 = now();
        sched.touch("1-0-26-0-0", 0, t0);

        // Nothing due before the first boundary.
        assert!(sched.advance(t0 + Duration::seconds(119)).is_empty());

        let fired = sched.advance(t0 + Duration::seconds(120));
        assert_eq!(fired, vec![("1-0-26-0-0".to_string(), Some(Tier::Medium))]);
        assert_eq!(sched.next_deadline(), Some(t0 + Duration::seconds(300)));

        let fired = sched.advance(t0 + Duration::seconds(300));
        assert_eq!(fired, vec![("1-0-26-0-0".to_string(), Some(Tier::Old))]);

        let fired = sched.advance(t0 + Duration::seconds(600));
        assert_eq!(fired, vec![("1-0-26-0-0".to_string(), None)]);
        assert!(sched.is_empty(), "chain must end after the final tier");
    }

    #[test]
    fn test_clear_cancels_pending_transition() {
        let mut sched = AgingScheduler::new();
        let t0 = now();
        sched.touch("9-2", 10, t0);
        sched.clear("9-2");
        assert!(sched.is_empty());
        assert!(sched.advance(t0 + Duration::seconds(1_000)).is_empty());
    }

    #[test]
    fn test_late_advance_skips_straight_to_correct_tier() {
        // A driver that wakes up late must still classify from origin,
        // not step through intermediate tiers one wakeup at a time.
        let mut sched = AgingScheduler::new();
        let t0 = now();
        sched.touch("5-1", 0, t0);
        let fired = sched.advance(t0 + Duration::seconds(450));
        assert_eq!(fired, vec![("5-1".to_string(), Some(Tier::Old))]);
    }
}
