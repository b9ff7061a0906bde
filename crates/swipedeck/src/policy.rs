#![forbid(unsafe_code)]

//! Commit policy: the one decision made per gesture.
//!
//! At release the controller asks [`CommitPolicy::evaluate`] whether the
//! deck should move to a neighbor or settle back to rest. The decision uses
//! the final offset and the release velocity:
//!
//! - forward iff `offset > threshold || velocity > velocity_threshold`,
//!   and the active card is not the last one;
//! - backward iff `offset < -threshold || velocity < -velocity_threshold`,
//!   and the active card is not the first one;
//! - otherwise stay.
//!
//! Each direction is gated by its own neighbor. When both directions qualify
//! (dragged forward past the threshold, then flicked back hard, with cards on
//! both sides) the flick wins. When only one qualifies it commits even if the
//! other intent pointed at an edge. The threshold is a fraction of the card
//! width so behavior is resolution independent.

use crate::config::CommitConfig;

/// Direction of an index change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Toward `index + 1`.
    Forward,
    /// Toward `index - 1`.
    Backward,
}

impl Direction {
    /// +1.0 for forward, -1.0 for backward.
    #[must_use]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Forward => 1.0,
            Self::Backward => -1.0,
        }
    }

    /// Whether a neighbor exists in this direction.
    #[must_use]
    pub const fn has_neighbor(self, index: usize, len: usize) -> bool {
        match self {
            Self::Forward => index.saturating_add(1) < len,
            Self::Backward => index > 0 && len > 0,
        }
    }

    /// Step `index` one place in this direction, clamped to `[0, len - 1]`.
    #[must_use]
    pub fn apply(self, index: usize, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        let stepped = match self {
            Self::Forward => index.saturating_add(1),
            Self::Backward => index.saturating_sub(1),
        };
        stepped.min(len - 1)
    }
}

/// Why a gesture settles back to rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StayReason {
    /// Neither distance nor velocity crossed its threshold.
    BelowThreshold,
    /// Forward intent on the last card (rubber-band).
    AtLastItem,
    /// Backward intent on the first card (rubber-band).
    AtFirstItem,
    /// The pointer sequence was cancelled by the platform.
    Cancelled,
    /// No items.
    EmptyDeck,
}

/// Outcome of evaluating one released gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitDecision {
    Commit(Direction),
    Stay(StayReason),
}

impl CommitDecision {
    #[must_use]
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Self::Commit(direction) => Some(direction),
            Self::Stay(_) => None,
        }
    }
}

/// Threshold-based commit policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommitPolicy {
    threshold_fraction: f64,
    velocity_threshold: f64,
}

impl CommitPolicy {
    #[must_use]
    pub fn new(config: &CommitConfig) -> Self {
        Self {
            threshold_fraction: config.threshold_fraction,
            velocity_threshold: config.velocity_threshold.abs(),
        }
    }

    /// Commit distance in px for a card of `card_width`.
    #[must_use]
    pub fn threshold(&self, card_width: f64) -> f64 {
        self.threshold_fraction * card_width
    }

    #[must_use]
    pub fn velocity_threshold(&self) -> f64 {
        self.velocity_threshold
    }

    /// Whether the release qualifies for `direction`, ignoring deck bounds.
    #[must_use]
    pub fn wants(&self, direction: Direction, offset: f64, velocity: f64, card_width: f64) -> bool {
        let threshold = self.threshold(card_width);
        let sign = direction.sign();
        sign * offset > threshold || sign * velocity > self.velocity_threshold
    }

    /// Decide what a released gesture does to the deck at `index`.
    #[must_use]
    pub fn evaluate(
        &self,
        index: usize,
        len: usize,
        offset: f64,
        velocity: f64,
        card_width: f64,
    ) -> CommitDecision {
        if len == 0 {
            return CommitDecision::Stay(StayReason::EmptyDeck);
        }
        let wants_forward = self.wants(Direction::Forward, offset, velocity, card_width);
        let wants_backward = self.wants(Direction::Backward, offset, velocity, card_width);
        let forward = wants_forward && Direction::Forward.has_neighbor(index, len);
        let backward = wants_backward && Direction::Backward.has_neighbor(index, len);

        match (forward, backward) {
            (true, false) => CommitDecision::Commit(Direction::Forward),
            (false, true) => CommitDecision::Commit(Direction::Backward),
            // Distance one way, flick the other: the flick decides.
            (true, true) if velocity < 0.0 => CommitDecision::Commit(Direction::Backward),
            (true, true) => CommitDecision::Commit(Direction::Forward),
            (false, false) => CommitDecision::Stay(match (wants_forward, wants_backward) {
                (false, false) => StayReason::BelowThreshold,
                (true, false) => StayReason::AtLastItem,
                (false, true) => StayReason::AtFirstItem,
                (true, true) if velocity < 0.0 => StayReason::AtFirstItem,
                (true, true) => StayReason::AtLastItem,
            }),
        }
    }
}

impl Default for CommitPolicy {
    fn default() -> Self {
        Self::new(&CommitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTH: f64 = 300.0;

    fn policy() -> CommitPolicy {
        CommitPolicy::default()
    }

    #[test]
    fn threshold_is_fraction_of_width() {
        assert!((policy().threshold(WIDTH) - 54.0).abs() < 1e-9);
    }

    #[test]
    fn past_threshold_commits_forward() {
        let p = policy();
        let t = p.threshold(WIDTH);
        assert_eq!(
            p.evaluate(0, 5, t + 1.0, 0.0, WIDTH),
            CommitDecision::Commit(Direction::Forward)
        );
    }

    #[test]
    fn past_negative_threshold_commits_backward() {
        let p = policy();
        let t = p.threshold(WIDTH);
        assert_eq!(
            p.evaluate(2, 5, -t - 1.0, 0.0, WIDTH),
            CommitDecision::Commit(Direction::Backward)
        );
    }

    #[test]
    fn exactly_at_threshold_stays() {
        let p = policy();
        let t = p.threshold(WIDTH);
        assert_eq!(
            p.evaluate(2, 5, t, 0.0, WIDTH),
            CommitDecision::Stay(StayReason::BelowThreshold)
        );
    }

    #[test]
    fn flick_overrides_short_distance() {
        let p = policy();
        let t = p.threshold(WIDTH);
        assert_eq!(
            p.evaluate(1, 5, t - 1.0, 800.0, WIDTH),
            CommitDecision::Commit(Direction::Forward)
        );
        assert_eq!(
            p.evaluate(1, 5, 0.0, -800.0, WIDTH),
            CommitDecision::Commit(Direction::Backward)
        );
    }

    #[test]
    fn flick_back_beats_distance() {
        let p = policy();
        let t = p.threshold(WIDTH);
        assert_eq!(
            p.evaluate(2, 5, t + 40.0, -900.0, WIDTH),
            CommitDecision::Commit(Direction::Backward)
        );
    }

    #[test]
    fn distance_commits_forward_when_flick_points_off_the_first_card() {
        let p = policy();
        let t = p.threshold(WIDTH);
        assert_eq!(
            p.evaluate(0, 5, t + 40.0, -900.0, WIDTH),
            CommitDecision::Commit(Direction::Forward)
        );
    }

    #[test]
    fn distance_commits_backward_when_flick_points_off_the_last_card() {
        let p = policy();
        let t = p.threshold(WIDTH);
        assert_eq!(
            p.evaluate(4, 5, -t - 40.0, 900.0, WIDTH),
            CommitDecision::Commit(Direction::Backward)
        );
    }

    #[test]
    fn flick_commits_when_distance_points_off_an_edge() {
        let p = policy();
        let t = p.threshold(WIDTH);
        assert_eq!(
            p.evaluate(4, 5, t + 40.0, -900.0, WIDTH),
            CommitDecision::Commit(Direction::Backward)
        );
        assert_eq!(
            p.evaluate(0, 5, -t - 40.0, 900.0, WIDTH),
            CommitDecision::Commit(Direction::Forward)
        );
    }

    #[test]
    fn conflicting_intents_on_single_card_rubber_band_toward_flick() {
        let p = policy();
        let t = p.threshold(WIDTH);
        assert_eq!(
            p.evaluate(0, 1, t + 40.0, -900.0, WIDTH),
            CommitDecision::Stay(StayReason::AtFirstItem)
        );
        assert_eq!(
            p.evaluate(0, 1, -t - 40.0, 900.0, WIDTH),
            CommitDecision::Stay(StayReason::AtLastItem)
        );
    }

    #[test]
    fn edges_rubber_band() {
        let p = policy();
        let t = p.threshold(WIDTH);
        assert_eq!(
            p.evaluate(4, 5, t + 1.0, 0.0, WIDTH),
            CommitDecision::Stay(StayReason::AtLastItem)
        );
        assert_eq!(
            p.evaluate(0, 5, -t - 1.0, 0.0, WIDTH),
            CommitDecision::Stay(StayReason::AtFirstItem)
        );
    }

    #[test]
    fn single_item_never_commits() {
        let p = policy();
        for (offset, velocity) in [(200.0, 0.0), (-200.0, 0.0), (0.0, 3000.0), (0.0, -3000.0)] {
            assert!(p.evaluate(0, 1, offset, velocity, WIDTH).direction().is_none());
        }
    }

    #[test]
    fn empty_deck_stays() {
        assert_eq!(
            policy().evaluate(0, 0, 500.0, 0.0, WIDTH),
            CommitDecision::Stay(StayReason::EmptyDeck)
        );
    }

    #[test]
    fn direction_apply_clamps() {
        assert_eq!(Direction::Forward.apply(4, 5), 4);
        assert_eq!(Direction::Forward.apply(3, 5), 4);
        assert_eq!(Direction::Backward.apply(0, 5), 0);
        assert_eq!(Direction::Backward.apply(9, 5), 4);
        assert_eq!(Direction::Forward.apply(0, 0), 0);
    }

    #[test]
    fn has_neighbor() {
        assert!(Direction::Forward.has_neighbor(0, 2));
        assert!(!Direction::Forward.has_neighbor(1, 2));
        assert!(!Direction::Backward.has_neighbor(0, 2));
        assert!(Direction::Backward.has_neighbor(1, 2));
        assert!(!Direction::Backward.has_neighbor(1, 0));
    }
}
