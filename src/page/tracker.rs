//! Pagination detection as an explicit state machine.
//!
//! The host page animates the review wrapper's opacity away from 1 while it
//! swaps the rendered page of reviews, and back to 1 when the swap is done.
//! The tracker turns a stream of sampled opacity values into at most one
//! resubmit signal per excursion, however many intermediate samples the
//! animation produces.

/// Steady-state opacity. Samples at or above this are "settled".
const STEADY: f64 = 0.999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// No container observed yet.
    Idle,
    /// Container visible; watching the wrapper opacity.
    ArmedWatching,
    /// Opacity left its steady value; a page swap is animating.
    PaginationInProgress,
    /// Opacity returned to steady; a re-harvest is owed after the settle
    /// delay. Stays here until [`PaginationTracker::rearm`].
    SettledResubmit,
}

/// Emitted by [`PaginationTracker::observe_opacity`] on a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerEvent {
    PaginationStarted,
    Resubmit,
}

#[derive(Debug)]
pub struct PaginationTracker {
    state: TrackerState,
}

impl PaginationTracker {
    pub fn new() -> Self {
        Self {
            state: TrackerState::Idle,
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    /// Arm the tracker once the container has become visible.
    pub fn arm(&mut self) {
        if self.state == TrackerState::Idle {
            self.state = TrackerState::ArmedWatching;
        }
    }

    /// Feed one sampled wrapper opacity through the machine.
    pub fn observe_opacity(&mut self, opacity: f64) -> Option<TrackerEvent> {
        match self.state {
            TrackerState::Idle | TrackerState::SettledResubmit => None,
            TrackerState::ArmedWatching => {
                if opacity < STEADY {
                    self.state = TrackerState::PaginationInProgress;
                    Some(TrackerEvent::PaginationStarted)
                } else {
                    None
                }
            }
            TrackerState::PaginationInProgress => {
                if opacity >= STEADY {
                    self.state = TrackerState::SettledResubmit;
                    Some(TrackerEvent::Resubmit)
                } else {
                    None
                }
            }
        }
    }

    /// Return to watching after the owed re-harvest has been handled.
    pub fn rearm(&mut self) {
        if self.state == TrackerState::SettledResubmit {
            self.state = TrackerState::ArmedWatching;
        }
    }
}

impl Default for PaginationTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_ignores_samples() {
        let mut tracker = PaginationTracker::new();
        assert_eq!(tracker.observe_opacity(0.2), None);
        assert_eq!(tracker.observe_opacity(1.0), None);
        assert_eq!(tracker.state(), TrackerState::Idle);
    }

    #[test]
    fn test_full_excursion_emits_one_resubmit() {
        let mut tracker = PaginationTracker::new();
        tracker.arm();

        // 1 → 0.x → ... → 1, with several intermediate mutation samples
        let mut resubmits = 0;
        for opacity in [1.0, 0.8, 0.3, 0.0, 0.4, 0.9, 1.0, 1.0, 1.0] {
            if tracker.observe_opacity(opacity) == Some(TrackerEvent::Resubmit) {
                resubmits += 1;
            }
        }
        assert_eq!(resubmits, 1);
        assert_eq!(tracker.state(), TrackerState::SettledResubmit);
    }

    #[test]
    fn test_started_event_on_leaving_steady() {
        let mut tracker = PaginationTracker::new();
        tracker.arm();
        assert_eq!(tracker.observe_opacity(1.0), None);
        assert_eq!(
            tracker.observe_opacity(0.7),
            Some(TrackerEvent::PaginationStarted)
        );
        assert_eq!(tracker.observe_opacity(0.4), None);
    }

    #[test]
    fn test_settled_holds_until_rearmed() {
        let mut tracker = PaginationTracker::new();
        tracker.arm();
        tracker.observe_opacity(0.5);
        tracker.observe_opacity(1.0);

        // A new excursion while the owed re-harvest is pending is swallowed
        assert_eq!(tracker.observe_opacity(0.5), None);
        assert_eq!(tracker.observe_opacity(1.0), None);

        tracker.rearm();
        assert_eq!(tracker.state(), TrackerState::ArmedWatching);
        assert_eq!(
            tracker.observe_opacity(0.5),
            Some(TrackerEvent::PaginationStarted)
        );
        assert_eq!(tracker.observe_opacity(1.0), Some(TrackerEvent::Resubmit));
    }

    #[test]
    fn test_arm_is_idempotent_from_watching() {
        let mut tracker = PaginationTracker::new();
        tracker.arm();
        tracker.observe_opacity(0.5);
        tracker.arm(); // must not reset an in-progress transition
        assert_eq!(tracker.state(), TrackerState::PaginationInProgress);
    }
}
