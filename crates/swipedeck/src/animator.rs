#![forbid(unsafe_code)]

//! The drag offset and its two drivers.
//!
//! [`OffsetAnimator`] owns one scalar: the active card's displacement from
//! rest, in logical pixels. Exactly one driver moves it at a time:
//!
//! - **drag**: [`drive`](OffsetAnimator::drive) sets the offset directly from
//!   the gesture delta, on top of the baseline captured when the drag began;
//! - **settle**: [`settle_to`](OffsetAnimator::settle_to) hands the offset to
//!   a spring that carries it to a target over subsequent
//!   [`advance`](OffsetAnimator::advance) calls.
//!
//! # Invariants
//!
//! 1. Each [`SettleTicket`] completes at most once, and only when its spring
//!    comes to rest. An interrupted or reset settle never completes.
//! 2. Interrupting a settle leaves the offset at its in-flight value.
//! 3. While dragging, the offset stays within `±limit`, widened to the drag
//!    baseline when a settle was interrupted beyond it.
//! 4. A completed settle leaves the offset exactly on its target.

use std::time::Duration;

use swipedeck_core::animation::Spring;

use crate::config::SpringConfig;

/// Identifies one settle animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SettleTicket(u64);

impl SettleTicket {
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Reported once when a settle animation reaches its target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettleCompleted {
    pub ticket: SettleTicket,
    pub target: f64,
}

/// Which driver currently owns the offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OffsetDriver {
    /// Nothing is moving the offset.
    Held,
    /// A gesture sets the offset relative to `baseline`.
    Drag { baseline: f64 },
    /// A spring carries the offset to `target`.
    Settle { ticket: SettleTicket, target: f64 },
}

/// Physically animated drag offset.
#[derive(Debug, Clone)]
pub struct OffsetAnimator {
    offset: f64,
    limit: f64,
    driver: OffsetDriver,
    spring: Spring,
    next_ticket: u64,
}

impl OffsetAnimator {
    /// Create an animator at rest. `limit` bounds the dragged offset.
    #[must_use]
    pub fn new(limit: f64, spring: &SpringConfig) -> Self {
        Self {
            offset: 0.0,
            limit: limit.abs(),
            driver: OffsetDriver::Held,
            spring: spring.build(0.0),
            next_ticket: 1,
        }
    }

    #[inline]
    #[must_use]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    #[inline]
    #[must_use]
    pub fn driver(&self) -> OffsetDriver {
        self.driver
    }

    #[inline]
    #[must_use]
    pub fn limit(&self) -> f64 {
        self.limit
    }

    /// Change the drag bound, e.g. after the card was resized.
    pub fn set_limit(&mut self, limit: f64) {
        self.limit = limit.abs();
    }

    #[must_use]
    pub fn is_settling(&self) -> bool {
        matches!(self.driver, OffsetDriver::Settle { .. })
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.driver, OffsetDriver::Drag { .. })
    }

    /// Current offset velocity in px/s (zero unless settling).
    #[must_use]
    pub fn velocity(&self) -> f64 {
        if self.is_settling() {
            self.spring.velocity()
        } else {
            0.0
        }
    }

    /// Hand the offset to a new gesture.
    ///
    /// Any in-flight settle is interrupted; its ticket is returned and will
    /// never complete. The current offset becomes the drag baseline.
    pub fn begin_drag(&mut self) -> Option<SettleTicket> {
        let interrupted = self.interrupt();
        self.driver = OffsetDriver::Drag {
            baseline: self.offset,
        };
        interrupted
    }

    /// Set the offset from the gesture delta. Ignored unless dragging.
    pub fn drive(&mut self, delta: f64) {
        let OffsetDriver::Drag { baseline } = self.driver else {
            return;
        };
        let bound = self.limit.max(baseline.abs());
        let next = baseline + delta;
        self.offset = if next.is_finite() {
            next.clamp(-bound, bound)
        } else {
            baseline
        };
    }

    /// Start a spring from the current offset toward `target`.
    ///
    /// `velocity_hint` seeds the spring (px/s) so a flick keeps its momentum.
    pub fn settle_to(&mut self, target: f64, velocity_hint: f64) -> SettleTicket {
        let ticket = SettleTicket(self.next_ticket);
        self.next_ticket = self.next_ticket.wrapping_add(1);
        let velocity = if velocity_hint.is_finite() {
            velocity_hint
        } else {
            0.0
        };
        self.spring.retarget(self.offset, velocity, target);
        self.driver = OffsetDriver::Settle { ticket, target };
        ticket
    }

    /// Stop an in-flight settle without completing it.
    ///
    /// The offset keeps its in-flight value. Returns the cancelled ticket.
    pub fn interrupt(&mut self) -> Option<SettleTicket> {
        match self.driver {
            OffsetDriver::Settle { ticket, .. } => {
                self.spring.snap_to(self.offset);
                self.driver = OffsetDriver::Held;
                Some(ticket)
            }
            OffsetDriver::Held | OffsetDriver::Drag { .. } => None,
        }
    }

    /// Advance the settle spring by one frame.
    ///
    /// Returns the completion exactly once, on the frame the spring rests.
    pub fn advance(&mut self, dt: Duration) -> Option<SettleCompleted> {
        let OffsetDriver::Settle { ticket, target } = self.driver else {
            return None;
        };
        self.spring.advance(dt);
        self.offset = self.spring.position();
        if !self.spring.is_at_rest() {
            return None;
        }
        self.driver = OffsetDriver::Held;
        Some(SettleCompleted { ticket, target })
    }

    /// Put the offset back to zero immediately, dropping any driver.
    pub fn reset(&mut self) {
        self.offset = 0.0;
        self.spring.snap_to(0.0);
        self.driver = OffsetDriver::Held;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS_16: Duration = Duration::from_millis(16);

    fn animator() -> OffsetAnimator {
        OffsetAnimator::new(352.0, &SpringConfig::default())
    }

    fn run_to_completion(a: &mut OffsetAnimator) -> Vec<SettleCompleted> {
        let mut done = Vec::new();
        for _ in 0..600 {
            if let Some(c) = a.advance(MS_16) {
                done.push(c);
            }
        }
        done
    }

    #[test]
    fn starts_at_rest() {
        let a = animator();
        assert_eq!(a.offset(), 0.0);
        assert_eq!(a.driver(), OffsetDriver::Held);
    }

    #[test]
    fn drive_requires_drag() {
        let mut a = animator();
        a.drive(50.0);
        assert_eq!(a.offset(), 0.0);
        a.begin_drag();
        a.drive(50.0);
        assert_eq!(a.offset(), 50.0);
    }

    #[test]
    fn drive_is_clamped() {
        let mut a = animator();
        a.begin_drag();
        a.drive(5000.0);
        assert_eq!(a.offset(), 352.0);
        a.drive(-5000.0);
        assert_eq!(a.offset(), -352.0);
    }

    #[test]
    fn drive_ignores_non_finite_delta() {
        let mut a = animator();
        a.begin_drag();
        a.drive(f64::NAN);
        assert_eq!(a.offset(), 0.0);
    }

    #[test]
    fn settle_completes_exactly_once_on_target() {
        let mut a = animator();
        a.begin_drag();
        a.drive(120.0);
        let ticket = a.settle_to(0.0, 0.0);
        let done = run_to_completion(&mut a);
        assert_eq!(
            done,
            vec![SettleCompleted {
                ticket,
                target: 0.0
            }]
        );
        assert_eq!(a.offset(), 0.0);
        assert!(!a.is_settling());
    }

    #[test]
    fn zero_distance_settle_still_completes() {
        let mut a = animator();
        let ticket = a.settle_to(0.0, 0.0);
        assert_eq!(
            a.advance(MS_16),
            Some(SettleCompleted {
                ticket,
                target: 0.0
            })
        );
    }

    #[test]
    fn interrupt_keeps_in_flight_offset() {
        let mut a = animator();
        a.begin_drag();
        a.drive(200.0);
        let ticket = a.settle_to(368.0, 900.0);
        for _ in 0..3 {
            assert!(a.advance(MS_16).is_none());
        }
        let in_flight = a.offset();
        assert!(in_flight > 200.0);

        assert_eq!(a.begin_drag(), Some(ticket));
        assert_eq!(a.offset(), in_flight);
        a.drive(0.0);
        assert_eq!(a.offset(), in_flight);
        // The interrupted ticket never completes.
        assert!(run_to_completion(&mut a).is_empty());
    }

    #[test]
    fn baseline_beyond_limit_widens_bound() {
        let mut a = OffsetAnimator::new(100.0, &SpringConfig::default());
        a.begin_drag();
        a.drive(100.0);
        a.settle_to(400.0, 0.0);
        for _ in 0..10 {
            a.advance(MS_16);
        }
        let in_flight = a.offset();
        assert!(in_flight > 100.0);
        a.begin_drag();
        a.drive(0.0);
        assert_eq!(a.offset(), in_flight);
    }

    #[test]
    fn tickets_are_unique() {
        let mut a = animator();
        let t1 = a.settle_to(0.0, 0.0);
        let t2 = a.settle_to(0.0, 0.0);
        assert_ne!(t1, t2);
        assert!(t2 > t1);
    }

    #[test]
    fn reset_cancels_settle_without_completion() {
        let mut a = animator();
        a.begin_drag();
        a.drive(80.0);
        a.settle_to(0.0, 0.0);
        a.reset();
        assert_eq!(a.offset(), 0.0);
        assert!(run_to_completion(&mut a).is_empty());
    }

    #[test]
    fn velocity_hint_carries_momentum() {
        let mut a = animator();
        a.begin_drag();
        a.drive(50.0);
        a.settle_to(0.0, 1500.0);
        a.advance(MS_16);
        assert!(a.offset() > 50.0, "offset {}", a.offset());
        assert!(a.velocity() > 0.0);
    }
}
