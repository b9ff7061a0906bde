#![forbid(unsafe_code)]

//! Core: spring physics, drag sampling, and geometric primitives.
//!
//! # Role in SwipeDeck
//! `swipedeck-core` is the input and motion layer. It knows nothing about
//! decks, indices, or cards; it turns raw pointer samples into a projected
//! drag delta plus release velocity, and it integrates the damped spring that
//! the navigator uses to settle the drag offset.
//!
//! # Primary responsibilities
//! - **Spring**: deterministic damped harmonic oscillator.
//! - **GestureSampler**: axis-locked drag recognition with windowed velocity.
//! - **Geometry**: logical-pixel points and the primary axis.
//!
//! # How it fits in the system
//! The `swipedeck` crate composes these primitives into the offset animator,
//! the deck state machine, and the render stack.

pub mod animation;
pub mod geometry;
pub mod gesture;
