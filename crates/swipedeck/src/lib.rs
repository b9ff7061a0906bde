#![forbid(unsafe_code)]

//! Swipeable sequential deck navigator.
//!
//! # Role in SwipeDeck
//! `swipedeck` browses an ordered list of items one card at a time. A drag
//! moves the active card with the pointer, previews the neighbor it would
//! reveal, and on release either commits to that neighbor or springs back.
//!
//! # Primary responsibilities
//! - **OffsetAnimator**: the drag offset and its drag/settle drivers.
//! - **DeckController**: index state machine; one commit decision per gesture,
//!   applied only when its settle completes.
//! - **RenderStack**: pure `(index, offset) -> frames` for the visible cards.
//! - **DeckNavigator**: pointer routing, host callbacks, and the rendered view.
//! - **DeckConfig**: tunables, validation, and optional TOML/JSON loading.
//!
//! # How it fits in the system
//! Input sampling and spring physics come from `swipedeck-core`. Everything
//! runs on the caller's thread: the host feeds pointer events and a frame
//! clock and draws whatever [`DeckNavigator::render`] returns.
//!
//! ```
//! use std::time::Duration;
//! use swipedeck::{Deck, DeckConfig, DeckItem, DeckNavigator, Direction};
//!
//! struct Lesson(u32);
//! impl DeckItem for Lesson {
//!     type Id = u32;
//!     fn id(&self) -> u32 { self.0 }
//! }
//!
//! let lessons = [Lesson(1), Lesson(2), Lesson(3)];
//! let deck = Deck::new(&lessons);
//! let mut nav = DeckNavigator::new(&DeckConfig::default());
//!
//! nav.step(&deck, Direction::Forward);
//! while nav.tick(&deck, Duration::from_millis(16)).is_none() {}
//! assert_eq!(nav.current_index(&deck), Some(1));
//! ```

pub mod animator;
pub mod config;
pub mod controller;
pub mod deck;
pub mod navigator;
pub mod policy;
pub mod render_stack;

pub use animator::{OffsetAnimator, OffsetDriver, SettleCompleted, SettleTicket};
pub use config::{
    CommitConfig, ConfigLoadError, DeckConfig, DeckConfigError, GestureConfig, RenderConfig,
    SpringConfig,
};
pub use controller::{
    DeckController, DeckEffect, DeckNoopReason, DeckState, DeckTransition, DragSession,
};
pub use deck::{Completions, Deck, DeckItem, Segment, SegmentProgress};
pub use navigator::{
    CardView, DeckCallbacks, DeckNavigator, DeckView, PointerEvent, PointerKind, PressRegion,
    ProgressDot,
};
pub use policy::{CommitDecision, CommitPolicy, Direction, StayReason};
pub use render_stack::{CardFrame, CardRole, RenderStack, StackFrames};

pub use swipedeck_core::geometry::{Axis, Point};
