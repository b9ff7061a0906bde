#![forbid(unsafe_code)]

//! Animation primitives.
//!
//! The deck only needs one physically animated scalar, so this module is
//! deliberately small: the [`Animation`] trait, the [`Spring`] integrator,
//! and the interpolation helpers the render stack uses.

use std::time::Duration;

pub mod spring;

pub use spring::Spring;

/// A time-driven animation.
pub trait Animation {
    /// Advance the animation by `dt`.
    fn tick(&mut self, dt: Duration);

    /// Whether the animation has finished.
    fn is_complete(&self) -> bool;

    /// Normalized output in `[0.0, 1.0]`.
    fn value(&self) -> f32;

    /// Return to the initial state.
    fn reset(&mut self);
}

/// Linear interpolation between `a` and `b`. `t` is clamped to `[0, 1]`.
///
/// Both endpoints are reproduced exactly.
#[inline]
#[must_use]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    a * (1.0 - t) + b * t
}

/// Fraction of `limit` covered by `magnitude`, clamped to `[0, 1]`.
///
/// A non-positive `limit` yields 1.0 for any non-zero magnitude.
#[inline]
#[must_use]
pub fn progress(magnitude: f64, limit: f64) -> f64 {
    if limit <= f64::EPSILON {
        return if magnitude.abs() > 0.0 { 1.0 } else { 0.0 };
    }
    (magnitude.abs() / limit).clamp(0.0, 1.0)
}
