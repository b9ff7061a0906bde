#![forbid(unsafe_code)]

//! Drag sampling: turns a pointer sample stream into a drag delta and a
//! release velocity along one axis.
//!
//! [`GestureSampler`] tracks one pointer sequence (down → moves → up). It
//! does not decide anything about decks or indices; it only answers "how far
//! along the primary axis has the pointer travelled since it went down" and,
//! on release, "how fast was it moving".
//!
//! # State Machine
//!
//! ```text
//! Idle --begin--> Pending --primary >= activation--> Active --end--> Idle
//!                    |  \--cross > tolerance--> Rejected --end--> Idle
//!                    \--end--> Idle (tap)
//! ```
//!
//! # Invariants
//!
//! 1. `Activated` is emitted at most once per pointer sequence.
//! 2. Once `Rejected`, nothing further is reported until the next `begin`.
//! 3. `delta` is always measured from the position at `begin`, projected
//!    onto the primary axis; cross-axis motion never changes it.
//! 4. Release velocity uses only samples inside the velocity window ending
//!    at the release sample, unless the host supplies its own velocity.
//!
//! # Failure Modes
//!
//! - Samples with timestamps earlier than the previous one are treated as
//!   simultaneous (zero elapsed time) rather than producing negative rates.
//! - A release with no elapsed time inside the window reports zero velocity.

use std::collections::VecDeque;
use std::time::Duration;

use web_time::Instant;

use crate::geometry::{Axis, Point};

/// Upper bound on retained samples; older samples fall outside any sane
/// velocity window long before this is reached.
const MAX_SAMPLES: usize = 64;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Thresholds for drag recognition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerConfig {
    /// Axis along which drags are measured (default: horizontal).
    pub axis: Axis,
    /// Primary-axis travel (px) before the drag is captured (default: 12).
    pub activation_distance: f64,
    /// Cross-axis travel (px) that rejects the drag while still pending
    /// (default: 55).
    pub cross_axis_tolerance: f64,
    /// Trailing window used to estimate release velocity (default: 100ms).
    pub velocity_window: Duration,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            axis: Axis::Horizontal,
            activation_distance: 12.0,
            cross_axis_tolerance: 55.0,
            velocity_window: Duration::from_millis(100),
        }
    }
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One raw pointer sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSample {
    pub position: Point,
    pub time: Instant,
}

impl DragSample {
    #[must_use]
    pub const fn new(position: Point, time: Instant) -> Self {
        Self { position, time }
    }
}

/// Recognition phase of the current pointer sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerPhase {
    /// No pointer is down.
    Idle,
    /// Pointer is down but has not travelled far enough to be a drag.
    Pending,
    /// The drag has been captured.
    Active,
    /// Cross-axis motion won; the sequence belongs to someone else.
    Rejected,
}

/// What a single `update` produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplerUpdate {
    /// Nothing to report (pending, rejected, or idle).
    Quiet,
    /// The drag was captured by this sample.
    Activated { delta: f64 },
    /// The captured drag moved.
    Moved { delta: f64 },
    /// Cross-axis motion exceeded tolerance before activation.
    Rejected,
}

/// Final measurement of a captured drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragRelease {
    /// Primary-axis distance from the start position.
    pub delta: f64,
    /// Signed primary-axis velocity in px/s.
    pub velocity: f64,
}

/// Outcome of ending a pointer sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplerRelease {
    /// Pointer went up before the drag activated.
    Tap { position: Point },
    /// A captured drag ended.
    Drag(DragRelease),
    /// The sequence was rejected or never started.
    Ignored,
}

// ---------------------------------------------------------------------------
// GestureSampler
// ---------------------------------------------------------------------------

/// Stateful drag sampler for a single pointer.
#[derive(Debug, Clone)]
pub struct GestureSampler {
    config: SamplerConfig,
    phase: SamplerPhase,
    start: Point,
    last: Point,
    samples: VecDeque<DragSample>,
}

impl GestureSampler {
    /// Create a sampler with the given configuration.
    #[must_use]
    pub fn new(config: SamplerConfig) -> Self {
        Self {
            config,
            phase: SamplerPhase::Idle,
            start: Point::ZERO,
            last: Point::ZERO,
            samples: VecDeque::with_capacity(16),
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn phase(&self) -> SamplerPhase {
        self.phase
    }

    /// Whether a drag is currently captured.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase == SamplerPhase::Active
    }

    /// Primary-axis distance from the start of the pointer sequence.
    #[must_use]
    pub fn delta(&self) -> f64 {
        self.config.axis.primary(self.last - self.start)
    }

    /// Pointer went down. Starts a new sequence, discarding any previous one.
    pub fn begin(&mut self, sample: DragSample) {
        self.phase = SamplerPhase::Pending;
        self.start = sample.position;
        self.last = sample.position;
        self.samples.clear();
        self.push(sample);
    }

    /// Pointer moved.
    pub fn update(&mut self, sample: DragSample) -> SamplerUpdate {
        match self.phase {
            SamplerPhase::Idle | SamplerPhase::Rejected => SamplerUpdate::Quiet,
            SamplerPhase::Pending => {
                self.last = sample.position;
                self.push(sample);
                let travel = sample.position - self.start;
                let primary = self.config.axis.primary(travel).abs();
                let cross = self.config.axis.cross(travel).abs();
                if cross > self.config.cross_axis_tolerance {
                    self.phase = SamplerPhase::Rejected;
                    self.samples.clear();
                    #[cfg(feature = "tracing")]
                    tracing::trace!(cross, "drag rejected by cross-axis motion");
                    SamplerUpdate::Rejected
                } else if primary >= self.config.activation_distance {
                    self.phase = SamplerPhase::Active;
                    #[cfg(feature = "tracing")]
                    tracing::trace!(primary, "drag activated");
                    SamplerUpdate::Activated {
                        delta: self.delta(),
                    }
                } else {
                    SamplerUpdate::Quiet
                }
            }
            SamplerPhase::Active => {
                self.last = sample.position;
                self.push(sample);
                SamplerUpdate::Moved {
                    delta: self.delta(),
                }
            }
        }
    }

    /// Pointer went up.
    ///
    /// `platform_velocity` is the host's own primary-axis velocity estimate
    /// in px/s, used instead of the windowed estimate when present.
    pub fn end(&mut self, sample: DragSample, platform_velocity: Option<f64>) -> SamplerRelease {
        let phase = self.phase;
        let release = match phase {
            SamplerPhase::Pending => SamplerRelease::Tap {
                position: sample.position,
            },
            SamplerPhase::Active => {
                self.last = sample.position;
                self.push(sample);
                let velocity = platform_velocity
                    .filter(|v| v.is_finite())
                    .unwrap_or_else(|| self.window_velocity());
                SamplerRelease::Drag(DragRelease {
                    delta: self.delta(),
                    velocity,
                })
            }
            SamplerPhase::Idle | SamplerPhase::Rejected => SamplerRelease::Ignored,
        };
        self.reset();
        release
    }

    /// The pointer sequence was cancelled by the platform.
    ///
    /// Returns the drag measurement with zero velocity if a drag was captured.
    pub fn cancel(&mut self) -> Option<DragRelease> {
        let release = self.is_active().then(|| DragRelease {
            delta: self.delta(),
            velocity: 0.0,
        });
        self.reset();
        release
    }

    /// Return to idle without reporting anything.
    pub fn reset(&mut self) {
        self.phase = SamplerPhase::Idle;
        self.samples.clear();
        self.start = Point::ZERO;
        self.last = Point::ZERO;
    }

    /// Velocity over the trailing window, in px/s.
    #[must_use]
    pub fn window_velocity(&self) -> f64 {
        let Some(newest) = self.samples.back() else {
            return 0.0;
        };
        let axis = self.config.axis;
        let oldest = self
            .samples
            .iter()
            .find(|s| newest.time.saturating_duration_since(s.time) <= self.config.velocity_window)
            .unwrap_or(newest);
        let elapsed = newest.time.saturating_duration_since(oldest.time).as_secs_f64();
        if elapsed <= f64::EPSILON {
            return 0.0;
        }
        axis.primary(newest.position - oldest.position) / elapsed
    }

    fn push(&mut self, sample: DragSample) {
        if self.samples.len() == MAX_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }
}

impl Default for GestureSampler {
    fn default() -> Self {
        Self::new(SamplerConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
