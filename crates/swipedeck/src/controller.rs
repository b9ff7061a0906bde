#![forbid(unsafe_code)]

//! Deck lifecycle state machine.
//!
//! [`DeckController`] owns the active index and the [`OffsetAnimator`]. It
//! turns gesture begin/update/end into drag offsets, makes the commit
//! decision once per gesture, and applies the index change only when the
//! settle animation for that decision completes.
//!
//! ```text
//! Idle --begin--> Dragging --end(commit)--> SettlingToNeighbor --done--> Idle (index ± 1)
//!   ^                |    \--end(stay)----> SettlingToRest -----done--> Idle
//!   |                \--cancel------------> SettlingToRest
//!   \---------------- any state --begin--> Dragging (interrupts settle)
//! ```
//!
//! # Invariants
//!
//! 1. `index < len` whenever `len > 0`; out-of-range requests are clamped.
//! 2. Each settle changes the index by at most one, and only on its own
//!    completion; an interrupted settle never changes the index.
//! 3. The index change and the offset reset to zero happen in the same call,
//!    so no observer sees the new index at a non-zero offset.
//! 4. In `Idle` the offset is exactly zero.
//! 5. Every call returns a [`DeckTransition`]; ignored input is reported as
//!    [`DeckEffect::Noop`] with a reason, never as an error.

use std::time::Duration;

use tracing::{debug, trace};

use crate::animator::{OffsetAnimator, SettleTicket};
use crate::config::{DeckConfig, DeckConfigError};
use crate::policy::{CommitDecision, CommitPolicy, Direction, StayReason};

/// Lifecycle state of the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckState {
    Idle,
    Dragging {
        origin_index: usize,
    },
    SettlingToNeighbor {
        direction: Direction,
        ticket: SettleTicket,
    },
    SettlingToRest {
        ticket: SettleTicket,
    },
}

impl DeckState {
    #[must_use]
    pub const fn is_settling(self) -> bool {
        matches!(
            self,
            Self::SettlingToNeighbor { .. } | Self::SettlingToRest { .. }
        )
    }
}

/// Transient record of one drag, from gesture begin to gesture end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    /// Index frozen at gesture begin.
    pub origin_index: usize,
    /// Offset at gesture begin; non-zero if a settle was interrupted.
    pub baseline: f64,
    /// Latest offset (baseline plus delta, clamped).
    pub accumulated_offset: f64,
}

/// Why an input left the deck untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckNoopReason {
    EmptyDeck,
    NotDragging,
    /// A discrete request arrived while the deck was moving.
    Busy,
    /// `step` toward a neighbor that does not exist.
    AtBoundary,
    /// A settle completion that no longer matches the current state.
    StaleSettle,
}

/// Effect emitted by one transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeckEffect {
    DragStarted {
        origin_index: usize,
        baseline: f64,
        interrupted: Option<SettleTicket>,
    },
    DragMoved {
        delta: f64,
        offset: f64,
    },
    SettleStarted {
        decision: CommitDecision,
        from_offset: f64,
        target: f64,
        velocity: f64,
        ticket: SettleTicket,
    },
    IndexCommitted {
        from: usize,
        to: usize,
    },
    SettledAtRest {
        index: usize,
    },
    Jumped {
        from: usize,
        to: usize,
    },
    Noop {
        reason: DeckNoopReason,
    },
}

/// One state-machine step with deterministic diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeckTransition {
    pub transition_id: u64,
    pub from: DeckState,
    pub to: DeckState,
    pub effect: DeckEffect,
}

impl DeckTransition {
    /// The committed index change, if this transition made one.
    #[must_use]
    pub fn index_change(&self) -> Option<(usize, usize)> {
        match self.effect {
            DeckEffect::IndexCommitted { from, to } | DeckEffect::Jumped { from, to }
                if from != to =>
            {
                Some((from, to))
            }
            _ => None,
        }
    }
}

/// Index state machine driving the offset animator.
#[derive(Debug, Clone)]
pub struct DeckController {
    state: DeckState,
    index: usize,
    card_width: f64,
    overshoot_allowance: f64,
    exit_distance: f64,
    policy: CommitPolicy,
    animator: OffsetAnimator,
    session: Option<DragSession>,
    transition_counter: u64,
}

impl DeckController {
    /// Build a controller at index 0.
    ///
    /// Out-of-range values fall back to their defaults (see
    /// [`DeckConfig::sanitized`]); use [`try_new`](Self::try_new) to reject
    /// them instead.
    #[must_use]
    pub fn new(config: &DeckConfig) -> Self {
        let config = config.sanitized();
        let card_width = config.card_width;
        let overshoot_allowance = config.commit.overshoot_allowance;
        Self {
            state: DeckState::Idle,
            index: 0,
            card_width,
            overshoot_allowance,
            exit_distance: config.commit.exit_distance,
            policy: CommitPolicy::new(&config.commit),
            animator: OffsetAnimator::new(card_width * overshoot_allowance, &config.spring),
            session: None,
            transition_counter: 0,
        }
    }

    /// Build a controller, refusing a configuration that fails validation.
    pub fn try_new(config: &DeckConfig) -> Result<Self, DeckConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Builder: start at `index` (clamped on first use).
    #[must_use]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    #[inline]
    #[must_use]
    pub const fn state(&self) -> DeckState {
        self.state
    }

    /// Active index for a deck of `len` items, `None` when empty.
    #[must_use]
    pub fn current_index(&self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.index.min(len - 1))
    }

    #[inline]
    #[must_use]
    pub fn offset(&self) -> f64 {
        self.animator.offset()
    }

    #[inline]
    #[must_use]
    pub fn card_width(&self) -> f64 {
        self.card_width
    }

    /// Commit distance in px.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.policy.threshold(self.card_width)
    }

    #[must_use]
    pub fn policy(&self) -> &CommitPolicy {
        &self.policy
    }

    #[must_use]
    pub fn is_settling(&self) -> bool {
        self.state.is_settling()
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DeckState::Dragging { .. })
    }

    /// The live drag session, if a gesture is in progress.
    #[must_use]
    pub fn drag_session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Update the card width after a layout change.
    pub fn set_card_width(&mut self, width: f64) {
        if width.is_finite() && width > 0.0 {
            self.card_width = width;
            self.animator.set_limit(width * self.overshoot_allowance);
        }
    }

    // -----------------------------------------------------------------------
    // Gesture input
    // -----------------------------------------------------------------------

    /// A drag was captured. Legal from every state; interrupts any settle.
    pub fn gesture_begin(&mut self, len: usize) -> DeckTransition {
        let from = self.state;
        self.clamp_index(len);
        if len == 0 {
            return self.noop(from, DeckNoopReason::EmptyDeck);
        }

        let interrupted = self.animator.begin_drag();
        let baseline = self.animator.offset();
        self.session = Some(DragSession {
            origin_index: self.index,
            baseline,
            accumulated_offset: baseline,
        });
        self.state = DeckState::Dragging {
            origin_index: self.index,
        };
        self.record(
            from,
            DeckEffect::DragStarted {
                origin_index: self.index,
                baseline,
                interrupted,
            },
        )
    }

    /// The captured drag moved to `delta` from its start.
    pub fn gesture_update(&mut self, len: usize, delta: f64) -> DeckTransition {
        let from = self.state;
        if len == 0 {
            return self.noop(from, DeckNoopReason::EmptyDeck);
        }
        let Some(session) = self.session.as_mut() else {
            return self.noop(from, DeckNoopReason::NotDragging);
        };

        self.animator.drive(delta);
        let offset = self.animator.offset();
        session.accumulated_offset = offset;
        self.record(from, DeckEffect::DragMoved { delta, offset })
    }

    /// The captured drag was released at `delta` with `velocity` (px/s).
    ///
    /// Consumes the drag session and makes the commit decision.
    pub fn gesture_end(&mut self, len: usize, delta: f64, velocity: f64) -> DeckTransition {
        let from = self.state;
        if self.session.is_none() {
            return self.noop(from, DeckNoopReason::NotDragging);
        }
        self.clamp_index(len);
        if len == 0 {
            self.session = None;
            self.animator.reset();
            self.state = DeckState::Idle;
            return self.noop(from, DeckNoopReason::EmptyDeck);
        }

        self.animator.drive(delta);
        self.session = None;
        let offset = self.animator.offset();
        let velocity = if velocity.is_finite() { velocity } else { 0.0 };
        let decision = self
            .policy
            .evaluate(self.index, len, offset, velocity, self.card_width);
        self.start_settle(from, decision, velocity)
    }

    /// The platform cancelled the pointer sequence; settle back to rest.
    pub fn gesture_cancel(&mut self, len: usize) -> DeckTransition {
        let from = self.state;
        if self.session.take().is_none() {
            return self.noop(from, DeckNoopReason::NotDragging);
        }
        self.clamp_index(len);
        self.start_settle(from, CommitDecision::Stay(StayReason::Cancelled), 0.0)
    }

    // -----------------------------------------------------------------------
    // Programmatic navigation
    // -----------------------------------------------------------------------

    /// Animate to the neighbor in `direction`, as a committed gesture would.
    pub fn step(&mut self, len: usize, direction: Direction) -> DeckTransition {
        let from = self.state;
        if len == 0 {
            return self.noop(from, DeckNoopReason::EmptyDeck);
        }
        if self.state != DeckState::Idle {
            return self.noop(from, DeckNoopReason::Busy);
        }
        self.clamp_index(len);
        if !direction.has_neighbor(self.index, len) {
            return self.noop(from, DeckNoopReason::AtBoundary);
        }
        self.start_settle(from, CommitDecision::Commit(direction), 0.0)
    }

    /// Jump to `index` without animation. Cancels any settle in flight.
    pub fn go_to(&mut self, len: usize, index: usize) -> DeckTransition {
        let from = self.state;
        if len == 0 {
            return self.noop(from, DeckNoopReason::EmptyDeck);
        }
        if self.is_dragging() {
            return self.noop(from, DeckNoopReason::Busy);
        }
        let previous = self.index.min(len - 1);
        self.index = index.min(len - 1);
        self.animator.reset();
        self.state = DeckState::Idle;
        self.record(
            from,
            DeckEffect::Jumped {
                from: previous,
                to: self.index,
            },
        )
    }

    // -----------------------------------------------------------------------
    // Frame clock
    // -----------------------------------------------------------------------

    /// Advance the settle animation by one frame.
    ///
    /// Returns a transition only on the frame the settle completes.
    pub fn tick(&mut self, len: usize, dt: Duration) -> Option<DeckTransition> {
        let completed = self.animator.advance(dt)?;
        let from = self.state;
        let transition = match self.state {
            DeckState::SettlingToNeighbor { direction, ticket } if ticket == completed.ticket => {
                let previous = self.index;
                self.index = direction.apply(self.index, len);
                self.animator.reset();
                self.state = DeckState::Idle;
                self.record(
                    from,
                    DeckEffect::IndexCommitted {
                        from: previous,
                        to: self.index,
                    },
                )
            }
            DeckState::SettlingToRest { ticket } if ticket == completed.ticket => {
                self.animator.reset();
                self.state = DeckState::Idle;
                self.clamp_index(len);
                self.record(from, DeckEffect::SettledAtRest { index: self.index })
            }
            _ => self.noop(from, DeckNoopReason::StaleSettle),
        };
        Some(transition)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn start_settle(
        &mut self,
        from: DeckState,
        decision: CommitDecision,
        velocity: f64,
    ) -> DeckTransition {
        let from_offset = self.animator.offset();
        let target = match decision {
            CommitDecision::Commit(direction) => {
                direction.sign() * self.card_width * self.exit_distance
            }
            CommitDecision::Stay(_) => 0.0,
        };
        let ticket = self.animator.settle_to(target, velocity);
        self.state = match decision {
            CommitDecision::Commit(direction) => {
                DeckState::SettlingToNeighbor { direction, ticket }
            }
            CommitDecision::Stay(_) => DeckState::SettlingToRest { ticket },
        };
        self.record(
            from,
            DeckEffect::SettleStarted {
                decision,
                from_offset,
                target,
                velocity,
                ticket,
            },
        )
    }

    fn clamp_index(&mut self, len: usize) {
        self.index = match len {
            0 => 0,
            n => self.index.min(n - 1),
        };
    }

    fn noop(&mut self, from: DeckState, reason: DeckNoopReason) -> DeckTransition {
        self.record(from, DeckEffect::Noop { reason })
    }

    fn record(&mut self, from: DeckState, effect: DeckEffect) -> DeckTransition {
        self.transition_counter = self.transition_counter.saturating_add(1);
        let transition = DeckTransition {
            transition_id: self.transition_counter,
            from,
            to: self.state,
            effect,
        };
        match effect {
            DeckEffect::DragMoved { delta, offset } => {
                trace!(transition_id = transition.transition_id, delta, offset, "deck drag");
            }
            DeckEffect::IndexCommitted { from, to } => {
                debug!(
                    transition_id = transition.transition_id,
                    from, to, "deck index committed"
                );
            }
            _ => {
                debug!(
                    transition_id = transition.transition_id,
                    from = ?transition.from,
                    to = ?transition.to,
                    effect = ?effect,
                    "deck transition"
                );
            }
        }
        transition
    }
}
