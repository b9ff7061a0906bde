#![forbid(unsafe_code)]

//! Host-facing deck component.
//!
//! [`DeckNavigator`] wires the pieces together: pointer events go through the
//! [`GestureSampler`], captured drags drive the [`DeckController`], the frame
//! clock advances settles, and [`render`](DeckNavigator::render) turns the
//! current `(index, offset)` into a [`DeckView`] through the [`RenderStack`].
//!
//! ```text
//! PointerEvent --> GestureSampler --activated/moved/released--> DeckController
//!                       \--tap--> on_open_details / on_toggle_complete
//! tick(dt) ------------------------------------------------> DeckController
//!                                                    \--index change--> on_index_change
//! render(deck) --(index, offset)--> RenderStack --> DeckView
//! ```
//!
//! # Failure Modes
//!
//! - Events for an empty deck are ignored.
//! - A tap is honoured only if the deck was idle when the pointer went down;
//!   taps on a moving deck are dropped. The tapped item is identified by the
//!   id captured at press time, never by index.
//! - A pointer-down that arrives while a drag is still captured (a lost
//!   pointer-up) cancels that drag first.
//! - A drag that interrupts a settle measures its delta from the activation
//!   point, so the card picks up exactly where the animation left it.

use std::fmt;
use std::time::Duration;

use tracing::{Span, debug, debug_span};
use web_time::Instant;

use swipedeck_core::geometry::Point;
use swipedeck_core::gesture::{
    DragSample, GestureSampler, SamplerPhase, SamplerRelease, SamplerUpdate,
};

use crate::config::{DeckConfig, DeckConfigError};
use crate::controller::{DeckController, DeckState, DeckTransition};
use crate::deck::{Deck, DeckItem, Segment, SegmentProgress};
use crate::policy::Direction;
use crate::render_stack::{CardFrame, RenderStack};

// ---------------------------------------------------------------------------
// Pointer input
// ---------------------------------------------------------------------------

/// Where on the active card the pointer went down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PressRegion {
    /// The card's primary area (opens details on tap).
    #[default]
    Card,
    /// The completion control (toggles completion on tap).
    CompletionControl,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerKind {
    Down { region: PressRegion },
    Move,
    /// `velocity` is the platform's own primary-axis estimate in px/s.
    Up { velocity: Option<f64> },
    Cancel,
}

/// One pointer event from the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub position: Point,
    pub time: Instant,
}

impl PointerEvent {
    #[must_use]
    pub const fn new(kind: PointerKind, position: Point, time: Instant) -> Self {
        Self {
            kind,
            position,
            time,
        }
    }

    #[must_use]
    pub const fn down(position: Point, time: Instant) -> Self {
        Self::new(
            PointerKind::Down {
                region: PressRegion::Card,
            },
            position,
            time,
        )
    }

    #[must_use]
    pub const fn down_on(region: PressRegion, position: Point, time: Instant) -> Self {
        Self::new(PointerKind::Down { region }, position, time)
    }

    #[must_use]
    pub const fn moved(position: Point, time: Instant) -> Self {
        Self::new(PointerKind::Move, position, time)
    }

    #[must_use]
    pub const fn up(position: Point, time: Instant) -> Self {
        Self::new(PointerKind::Up { velocity: None }, position, time)
    }

    #[must_use]
    pub const fn up_with_velocity(position: Point, time: Instant, velocity: f64) -> Self {
        Self::new(
            PointerKind::Up {
                velocity: Some(velocity),
            },
            position,
            time,
        )
    }

    #[must_use]
    pub const fn cancel(position: Point, time: Instant) -> Self {
        Self::new(PointerKind::Cancel, position, time)
    }
}

// ---------------------------------------------------------------------------
// Callbacks
// ---------------------------------------------------------------------------

type OpenDetailsFn<I> = Box<dyn FnMut(&I)>;
type ToggleCompleteFn<Id> = Box<dyn FnMut(&Id, bool)>;
type InteractionFn = Box<dyn FnMut(bool)>;
type IndexChangeFn = Box<dyn FnMut(usize, usize)>;

/// Host hooks. Every hook is optional.
pub struct DeckCallbacks<I: DeckItem> {
    open_details: Option<OpenDetailsFn<I>>,
    toggle_complete: Option<ToggleCompleteFn<I::Id>>,
    interaction_change: Option<InteractionFn>,
    index_change: Option<IndexChangeFn>,
}

impl<I: DeckItem> Default for DeckCallbacks<I> {
    fn default() -> Self {
        Self {
            open_details: None,
            toggle_complete: None,
            interaction_change: None,
            index_change: None,
        }
    }
}

impl<I: DeckItem> fmt::Debug for DeckCallbacks<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeckCallbacks")
            .field("open_details", &self.open_details.is_some())
            .field("toggle_complete", &self.toggle_complete.is_some())
            .field("interaction_change", &self.interaction_change.is_some())
            .field("index_change", &self.index_change.is_some())
            .finish()
    }
}

impl<I: DeckItem> DeckCallbacks<I> {
    fn open_details(&mut self, item: &I) {
        if let Some(f) = self.open_details.as_mut() {
            f(item);
        }
    }

    fn toggle_complete(&mut self, id: &I::Id, previous: bool) {
        if let Some(f) = self.toggle_complete.as_mut() {
            f(id, previous);
        }
    }

    fn interaction_changed(&mut self, dragging: bool) {
        if let Some(f) = self.interaction_change.as_mut() {
            f(dragging);
        }
    }

    fn index_changed(&mut self, from: usize, to: usize) {
        if let Some(f) = self.index_change.as_mut() {
            f(from, to);
        }
    }
}

// ---------------------------------------------------------------------------
// Rendered view
// ---------------------------------------------------------------------------

/// One card to draw.
#[derive(Debug)]
pub struct CardView<'a, I> {
    pub item: &'a I,
    pub frame: CardFrame,
    pub segment: Segment,
    pub is_complete: bool,
}

/// One progress indicator dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressDot {
    pub index: usize,
    pub segment: Segment,
    pub is_complete: bool,
    pub is_active: bool,
}

/// Everything the host needs to draw the deck for one frame.
#[derive(Debug)]
pub struct DeckView<'a, I> {
    pub active_index: Option<usize>,
    pub len: usize,
    /// Cards in paint order: neighbors first, the active card last.
    pub cards: Vec<CardView<'a, I>>,
    pub dots: Vec<ProgressDot>,
    pub required: SegmentProgress,
    pub optional: SegmentProgress,
    pub offset: f64,
    pub is_dragging: bool,
    pub is_settling: bool,
}

impl<'a, I> DeckView<'a, I> {
    /// The active card, if the deck is not empty.
    #[must_use]
    pub fn active(&self) -> Option<&CardView<'a, I>> {
        self.cards.last()
    }
}

// ---------------------------------------------------------------------------
// DeckNavigator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Press<Id> {
    id: Id,
    region: PressRegion,
}

/// Swipeable deck component.
#[derive(Debug)]
pub struct DeckNavigator<I: DeckItem> {
    controller: DeckController,
    sampler: GestureSampler,
    render_stack: RenderStack,
    callbacks: DeckCallbacks<I>,
    press: Option<Press<I::Id>>,
    /// Open while a drag is captured.
    gesture_span: Option<Span>,
    /// Sampler delta that maps to zero controller delta. Non-zero only when
    /// the drag interrupted a settle.
    delta_origin: f64,
}

impl<I: DeckItem> DeckNavigator<I> {
    /// Build a navigator at index 0. Out-of-range configuration values fall
    /// back to their defaults with a WARN log.
    #[must_use]
    pub fn new(config: &DeckConfig) -> Self {
        let config = config.sanitized();
        Self {
            controller: DeckController::new(&config),
            sampler: GestureSampler::new(config.gesture.sampler_config()),
            render_stack: RenderStack::new(&config),
            callbacks: DeckCallbacks::default(),
            press: None,
            gesture_span: None,
            delta_origin: 0.0,
        }
    }

    /// Build a navigator, refusing a configuration that fails validation.
    pub fn try_new(config: &DeckConfig) -> Result<Self, DeckConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Builder: start at `index` (clamped against the deck on first use).
    #[must_use]
    pub fn with_index(mut self, index: usize) -> Self {
        self.controller = self.controller.with_index(index);
        self
    }

    #[must_use]
    pub fn on_open_details(mut self, f: impl FnMut(&I) + 'static) -> Self {
        self.callbacks.open_details = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_toggle_complete(mut self, f: impl FnMut(&I::Id, bool) + 'static) -> Self {
        self.callbacks.toggle_complete = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_interaction_change(mut self, f: impl FnMut(bool) + 'static) -> Self {
        self.callbacks.interaction_change = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_index_change(mut self, f: impl FnMut(usize, usize) + 'static) -> Self {
        self.callbacks.index_change = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn controller(&self) -> &DeckController {
        &self.controller
    }

    #[must_use]
    pub fn state(&self) -> DeckState {
        self.controller.state()
    }

    #[must_use]
    pub fn current_index(&self, deck: &Deck<'_, I>) -> Option<usize> {
        self.controller.current_index(deck.len())
    }

    #[must_use]
    pub fn offset(&self) -> f64 {
        self.controller.offset()
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.gesture_span.is_some()
    }

    /// Propagate a layout change to the thresholds and the render stack.
    pub fn set_card_width(&mut self, width: f64) {
        self.controller.set_card_width(width);
        self.render_stack.set_card_width(width);
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// Feed one pointer event.
    ///
    /// Returns the controller transition the event caused, if any.
    pub fn process(&mut self, deck: &Deck<'_, I>, event: &PointerEvent) -> Option<DeckTransition> {
        let sample = DragSample::new(event.position, event.time);
        match event.kind {
            PointerKind::Down { region } => self.pointer_down(deck, sample, region),
            PointerKind::Move => self.pointer_move(deck, sample),
            PointerKind::Up { velocity } => self.pointer_up(deck, sample, velocity),
            PointerKind::Cancel => self.pointer_cancel(deck),
        }
    }

    /// Advance the settle animation by one frame.
    pub fn tick(&mut self, deck: &Deck<'_, I>, dt: Duration) -> Option<DeckTransition> {
        let transition = self.controller.tick(deck.len(), dt)?;
        self.notify(&transition);
        Some(transition)
    }

    /// Animate to the neighbor in `direction`.
    pub fn step(&mut self, deck: &Deck<'_, I>, direction: Direction) -> DeckTransition {
        self.controller.step(deck.len(), direction)
    }

    /// Jump to `index` without animation.
    pub fn go_to(&mut self, deck: &Deck<'_, I>, index: usize) -> DeckTransition {
        let transition = self.controller.go_to(deck.len(), index);
        self.notify(&transition);
        transition
    }

    fn pointer_down(
        &mut self,
        deck: &Deck<'_, I>,
        sample: DragSample,
        region: PressRegion,
    ) -> Option<DeckTransition> {
        let lost = if self.gesture_span.is_some() {
            self.pointer_cancel(deck)
        } else {
            None
        };
        if deck.is_empty() {
            self.sampler.reset();
            self.press = None;
            return lost;
        }

        self.sampler.begin(sample);
        self.press = match (self.controller.state(), self.current_index(deck)) {
            (DeckState::Idle, Some(index)) => deck.get(index).map(|item| Press {
                id: item.id(),
                region,
            }),
            _ => None,
        };
        lost
    }

    fn pointer_move(&mut self, deck: &Deck<'_, I>, sample: DragSample) -> Option<DeckTransition> {
        let len = deck.len();
        match self.sampler.update(sample) {
            SamplerUpdate::Activated { delta } => {
                self.press = None;
                let span = debug_span!(
                    "deck.gesture",
                    origin_index = ?self.controller.current_index(len)
                );
                let interrupting = self.controller.is_settling();
                let transition = {
                    let _entered = span.enter();
                    self.controller.gesture_begin(len);
                    if !self.controller.is_dragging() {
                        self.sampler.reset();
                        return None;
                    }
                    self.delta_origin = if interrupting { delta } else { 0.0 };
                    self.callbacks.interaction_changed(true);
                    self.controller.gesture_update(len, delta - self.delta_origin)
                };
                self.gesture_span = Some(span);
                Some(transition)
            }
            SamplerUpdate::Moved { delta } => {
                let span = self.gesture_span.clone()?;
                let _entered = span.enter();
                Some(self.controller.gesture_update(len, delta - self.delta_origin))
            }
            SamplerUpdate::Rejected => {
                self.press = None;
                debug!("pointer released to host scroll");
                None
            }
            SamplerUpdate::Quiet => None,
        }
    }

    fn pointer_up(
        &mut self,
        deck: &Deck<'_, I>,
        sample: DragSample,
        velocity: Option<f64>,
    ) -> Option<DeckTransition> {
        let press = self.press.take();
        match self.sampler.end(sample, velocity) {
            SamplerRelease::Drag(release) => {
                let span = self.gesture_span.take()?;
                let transition = {
                    let _entered = span.enter();
                    self.controller.gesture_end(
                        deck.len(),
                        release.delta - self.delta_origin,
                        release.velocity,
                    )
                };
                self.callbacks.interaction_changed(false);
                Some(transition)
            }
            SamplerRelease::Tap { .. } => {
                if let Some(press) = press {
                    self.tap(deck, press);
                }
                None
            }
            SamplerRelease::Ignored => None,
        }
    }

    fn pointer_cancel(&mut self, deck: &Deck<'_, I>) -> Option<DeckTransition> {
        self.press = None;
        let release = self.sampler.cancel();
        let span = self.gesture_span.take()?;
        let transition = {
            let _entered = span.enter();
            debug!(captured = release.is_some(), "pointer cancelled");
            self.controller.gesture_cancel(deck.len())
        };
        self.callbacks.interaction_changed(false);
        Some(transition)
    }

    fn tap(&mut self, deck: &Deck<'_, I>, press: Press<I::Id>) {
        if self.controller.state() != DeckState::Idle {
            return;
        }
        match press.region {
            PressRegion::Card => {
                if let Some(item) = deck.position_of(&press.id).and_then(|i| deck.get(i)) {
                    debug!(id = ?press.id, "open details");
                    self.callbacks.open_details(item);
                }
            }
            PressRegion::CompletionControl => {
                let previous = deck.is_complete(&press.id);
                debug!(id = ?press.id, previous, "toggle complete");
                self.callbacks.toggle_complete(&press.id, previous);
            }
        }
    }

    fn notify(&mut self, transition: &DeckTransition) {
        if let Some((from, to)) = transition.index_change() {
            self.callbacks.index_changed(from, to);
        }
    }

    // -----------------------------------------------------------------------
    // Output
    // -----------------------------------------------------------------------

    /// Build the view for the current `(index, offset)`.
    #[must_use]
    pub fn render<'a>(&self, deck: &Deck<'a, I>) -> DeckView<'a, I> {
        let len = deck.len();
        let active_index = self.controller.current_index(len);
        let offset = self.controller.offset();

        let cards = active_index
            .and_then(|index| self.render_stack.compute(index, len, offset))
            .map(|frames| {
                frames
                    .paint_order()
                    .filter_map(|frame| {
                        let item = deck.get(frame.index)?;
                        Some(CardView {
                            item,
                            frame,
                            segment: deck.segment(frame.index),
                            is_complete: deck.is_complete(&item.id()),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let dots = deck
            .items()
            .iter()
            .enumerate()
            .map(|(index, item)| ProgressDot {
                index,
                segment: deck.segment(index),
                is_complete: deck.is_complete(&item.id()),
                is_active: Some(index) == active_index,
            })
            .collect();

        DeckView {
            active_index,
            len,
            cards,
            dots,
            required: deck.segment_progress(Segment::Required),
            optional: deck.segment_progress(Segment::Optional),
            offset,
            is_dragging: self.is_dragging(),
            is_settling: self.controller.is_settling(),
        }
    }

    /// Sampler phase of the pointer currently down, if any.
    #[must_use]
    pub fn pointer_phase(&self) -> SamplerPhase {
        self.sampler.phase()
    }
}
