#![forbid(unsafe_code)]

//! Damped harmonic oscillator (spring) for settling a drag offset.
//!
//! The spring follows the classical damped equation
//!
//!   a = -stiffness × (position - target) - damping × velocity
//!
//! and works in whatever unit the caller uses for position. The deck drives
//! it in logical pixels, with velocities in pixels per second, so a release
//! velocity from the gesture sampler can be handed over unchanged.
//!
//! # Parameters
//!
//! - **stiffness** (k): restoring force. Higher settles faster.
//! - **damping** (c): velocity drag. `c = 2√k` is critical damping; the
//!   [`with_damping_ratio`](Spring::with_damping_ratio) builder expresses
//!   damping relative to that value (ζ). ζ slightly below 1.0 gives a
//!   barely perceptible overshoot.
//! - **rest_threshold** / **velocity_threshold**: once both the distance to
//!   target and the speed fall below them, the spring snaps onto the target.
//!
//! # Invariants
//!
//! 1. A spring at rest has `position() == target()` exactly and zero velocity.
//! 2. A spring at rest stays at rest until `retarget` or `reset` wakes it.
//! 3. Stiffness is at least 0.1; damping is at least 0.0.
//! 4. Identical parameter and `dt` sequences produce identical positions.
//!
//! # Failure Modes
//!
//! - Very large `dt`: subdivided into steps of at most 4ms, so a stalled
//!   frame cannot blow up the integration.
//! - Zero damping: oscillates forever and never reports rest. The deck
//!   constructors replace a non-positive damping ratio with the default
//!   before any spring is built.

use std::time::Duration;

use super::Animation;

/// Maximum dt per integration step (4ms).
const MAX_STEP_SECS: f64 = 0.004;

/// Default rest threshold: distance below which the spring may rest.
const DEFAULT_REST_THRESHOLD: f64 = 0.001;

/// Default velocity threshold: speed below which the spring may rest.
const DEFAULT_VELOCITY_THRESHOLD: f64 = 0.01;

/// Minimum stiffness to prevent degenerate springs.
const MIN_STIFFNESS: f64 = 0.1;

/// A damped spring moving a scalar position toward a target.
///
/// ```
/// use std::time::Duration;
/// use swipedeck_core::animation::Spring;
///
/// let mut spring = Spring::new(120.0, 0.0)
///     .with_stiffness(170.0)
///     .with_damping_ratio(0.9);
///
/// for _ in 0..120 {
///     spring.advance(Duration::from_millis(16));
/// }
/// assert!(spring.position().abs() < 0.01);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Spring {
    position: f64,
    velocity: f64,
    target: f64,
    initial: f64,
    stiffness: f64,
    damping: f64,
    rest_threshold: f64,
    velocity_threshold: f64,
    at_rest: bool,
}

impl Spring {
    /// A moving spring from `initial` toward `target` (k = 170, c = 26).
    ///
    /// Defaults: stiffness 170, damping 26 (about 0.997 of critical).
    #[must_use]
    pub fn new(initial: f64, target: f64) -> Self {
        Self {
            position: initial,
            velocity: 0.0,
            target,
            initial,
            stiffness: 170.0,
            damping: 26.0,
            rest_threshold: DEFAULT_REST_THRESHOLD,
            velocity_threshold: DEFAULT_VELOCITY_THRESHOLD,
            at_rest: false,
        }
    }

    /// A spring already at rest at `position`.
    #[must_use]
    pub fn resting(position: f64) -> Self {
        let mut spring = Self::new(position, position);
        spring.at_rest = true;
        spring
    }

    /// Builder: spring constant in 1/s², at least 0.1.
    #[must_use]
    pub fn with_stiffness(mut self, k: f64) -> Self {
        self.stiffness = k.max(MIN_STIFFNESS);
        self
    }

    /// Builder: damping coefficient in 1/s, never negative.
    #[must_use]
    pub fn with_damping(mut self, c: f64) -> Self {
        self.damping = c.max(0.0);
        self
    }

    /// Set damping as a ratio of critical damping for the current stiffness.
    ///
    /// Call after [`with_stiffness`](Self::with_stiffness).
    #[must_use]
    pub fn with_damping_ratio(self, ratio: f64) -> Self {
        let critical = self.critical_damping();
        self.with_damping(ratio.max(0.0) * critical)
    }

    /// Builder: distance from target (px) at which the spring may rest.
    #[must_use]
    pub fn with_rest_threshold(mut self, threshold: f64) -> Self {
        self.rest_threshold = threshold.abs();
        self
    }

    /// Builder: speed (px/s) below which the spring may rest.
    #[must_use]
    pub fn with_velocity_threshold(mut self, threshold: f64) -> Self {
        self.velocity_threshold = threshold.abs();
        self
    }

    /// Current position in px; may overshoot the target.
    #[inline]
    #[must_use]
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Current velocity in position units per second.
    #[inline]
    #[must_use]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Current target.
    #[inline]
    #[must_use]
    pub fn target(&self) -> f64 {
        self.target
    }

    #[inline]
    #[must_use]
    pub fn stiffness(&self) -> f64 {
        self.stiffness
    }

    #[inline]
    #[must_use]
    pub fn damping(&self) -> f64 {
        self.damping
    }

    /// Damping expressed as a fraction of critical damping.
    #[must_use]
    pub fn damping_ratio(&self) -> f64 {
        self.damping / self.critical_damping()
    }

    /// Critical damping coefficient for the current stiffness.
    #[must_use]
    pub fn critical_damping(&self) -> f64 {
        2.0 * self.stiffness.sqrt()
    }

    /// True once the spring has snapped onto its target.
    #[inline]
    #[must_use]
    pub fn is_at_rest(&self) -> bool {
        self.at_rest
    }

    /// Restart from `position` with `velocity`, heading for `target`.
    ///
    /// Always wakes the spring, even when it is already sitting on `target`:
    /// a zero-distance settle still has to report completion on the next
    /// advance.
    pub fn retarget(&mut self, position: f64, velocity: f64, target: f64) {
        self.position = position;
        self.velocity = velocity;
        self.initial = position;
        self.target = target;
        self.at_rest = false;
    }

    /// Place the spring at `position` and put it to rest there.
    pub fn snap_to(&mut self, position: f64) {
        self.position = position;
        self.initial = position;
        self.target = position;
        self.velocity = 0.0;
        self.at_rest = true;
    }

    /// Perform a single semi-implicit Euler step of `dt` seconds.
    fn step(&mut self, dt: f64) {
        let displacement = self.position - self.target;
        let acceleration = -self.stiffness * displacement - self.damping * self.velocity;

        self.velocity += acceleration * dt;
        self.position += self.velocity * dt;
    }

    /// Advance the spring by `dt`, subdividing for stability.
    ///
    /// Returns `true` if this call brought the spring to rest.
    pub fn advance(&mut self, dt: Duration) -> bool {
        if self.at_rest {
            return false;
        }

        let mut remaining = dt.as_secs_f64();
        while remaining > 0.0 {
            let step_dt = remaining.min(MAX_STEP_SECS);
            self.step(step_dt);
            remaining -= step_dt;
        }

        let pos_delta = (self.position - self.target).abs();
        if pos_delta < self.rest_threshold && self.velocity.abs() < self.velocity_threshold {
            self.position = self.target;
            self.velocity = 0.0;
            self.at_rest = true;
            return true;
        }
        false
    }
}

impl Animation for Spring {
    fn tick(&mut self, dt: Duration) {
        self.advance(dt);
    }

    fn is_complete(&self) -> bool {
        self.at_rest
    }

    /// Fraction of the distance from the initial position to the target,
    /// clamped to [0.0, 1.0].
    fn value(&self) -> f32 {
        let span = self.target - self.initial;
        if span.abs() <= f64::EPSILON {
            return if self.at_rest { 1.0 } else { 0.0 };
        }
        (((self.position - self.initial) / span) as f32).clamp(0.0, 1.0)
    }

    fn reset(&mut self) {
        self.position = self.initial;
        self.velocity = 0.0;
        self.at_rest = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS_16: Duration = Duration::from_millis(16);

    fn simulate(spring: &mut Spring, frames: usize) {
        for _ in 0..frames {
            spring.tick(MS_16);
        }
    }

    #[test]
    fn spring_reaches_target() {
        let mut spring = Spring::new(0.0, 100.0)
            .with_stiffness(170.0)
            .with_damping(26.0);

        simulate(&mut spring, 200);

        assert_eq!(spring.position(), 100.0);
        assert!(spring.is_complete());
    }

    #[test]
    fn resting_spring_is_complete() {
        let spring = Spring::resting(42.0);
        assert!(spring.is_at_rest());
        assert_eq!(spring.position(), 42.0);
        assert_eq!(spring.target(), 42.0);
    }

    #[test]
    fn damping_ratio_builder() {
        let spring = Spring::new(0.0, 1.0)
            .with_stiffness(100.0)
            .with_damping_ratio(0.5);
        assert!((spring.damping() - 10.0).abs() < 1e-12);
        assert!((spring.damping_ratio() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn slightly_underdamped_overshoot_is_small() {
        let mut spring = Spring::new(345.0, 0.0)
            .with_stiffness(170.0)
            .with_damping_ratio(0.9)
            .with_rest_threshold(0.25)
            .with_velocity_threshold(2.0);

        let mut min_pos = f64::MAX;
        for _ in 0..300 {
            spring.tick(MS_16);
            min_pos = min_pos.min(spring.position());
        }

        // Overshoot past zero stays within one percent of the travel.
        assert!(min_pos > -3.45, "overshoot too large: {min_pos}");
        assert!(spring.is_complete());
        assert_eq!(spring.position(), 0.0);
    }

    #[test]
    fn critical_damping_no_overshoot() {
        let k: f64 = 170.0;
        let mut spring = Spring::new(0.0, 1.0)
            .with_stiffness(k)
            .with_damping(2.0 * k.sqrt());

        let mut max_pos = 0.0_f64;
        for _ in 0..300 {
            spring.tick(MS_16);
            max_pos = max_pos.max(spring.position());
        }

        assert!(max_pos < 1.01, "overshoot {max_pos}");
    }

    #[test]
    fn retarget_carries_velocity() {
        let mut spring = Spring::resting(0.0);
        spring.retarget(10.0, 500.0, 0.0);
        assert!(!spring.is_at_rest());
        spring.tick(MS_16);
        // Initial velocity pushes past the start before the spring pulls back.
        assert!(spring.position() > 10.0);
    }

    #[test]
    fn retarget_onto_current_position_still_completes() {
        let mut spring = Spring::resting(0.0);
        spring.retarget(0.0, 0.0, 0.0);
        assert!(!spring.is_at_rest());
        assert!(spring.advance(MS_16));
        assert!(spring.is_at_rest());
    }

    #[test]
    fn advance_reports_rest_only_once() {
        let mut spring = Spring::new(0.0, 10.0);
        let mut rest_reports = 0;
        for _ in 0..400 {
            if spring.advance(MS_16) {
                rest_reports += 1;
            }
        }
        assert_eq!(rest_reports, 1);
    }

    #[test]
    fn snap_to_rests_immediately() {
        let mut spring = Spring::new(0.0, 100.0);
        spring.tick(MS_16);
        spring.snap_to(0.0);
        assert!(spring.is_at_rest());
        assert_eq!(spring.position(), 0.0);
        assert_eq!(spring.velocity(), 0.0);
    }

    #[test]
    fn spring_reset() {
        let mut spring = Spring::new(0.0, 1.0);
        simulate(&mut spring, 100);
        assert!(spring.is_complete());

        spring.reset();
        assert!(!spring.is_complete());
        assert_eq!(spring.position(), 0.0);
        assert_eq!(spring.velocity(), 0.0);
    }

    #[test]
    fn zero_dt_noop() {
        let mut spring = Spring::new(0.0, 1.0);
        spring.tick(Duration::ZERO);
        assert_eq!(spring.position(), 0.0);
    }

    #[test]
    fn large_dt_subdivided() {
        let mut spring = Spring::new(0.0, 1.0);
        spring.tick(Duration::from_secs(5));
        assert!((spring.position() - 1.0).abs() < 0.01);
    }

    #[test]
    fn clamps_degenerate_parameters() {
        let spring = Spring::new(0.0, 1.0)
            .with_stiffness(0.0)
            .with_damping(-5.0);
        assert!(spring.stiffness() >= MIN_STIFFNESS);
        assert_eq!(spring.damping(), 0.0);
    }

    #[test]
    fn value_tracks_travel_fraction() {
        let mut spring = Spring::new(100.0, 0.0);
        assert_eq!(spring.value(), 0.0);
        simulate(&mut spring, 300);
        assert_eq!(spring.value(), 1.0);
    }

    #[test]
    fn deterministic_across_runs() {
        let run = || {
            let mut spring = Spring::new(0.0, 300.0).with_damping_ratio(0.9);
            spring.retarget(0.0, -800.0, 300.0);
            (0..50)
                .map(|_| {
                    spring.tick(MS_16);
                    spring.position()
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
