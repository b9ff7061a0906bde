#![forbid(unsafe_code)]

//! Borrowed view of the host's items.
//!
//! The navigator never owns or mutates items. Each call receives a [`Deck`]
//! that borrows the host's slice together with the completion map and the
//! segment boundary, so the host stays the single source of truth.

use std::fmt::Debug;
use std::hash::Hash;

/// Completion flags keyed by item identity.
pub type Completions<Id> = ahash::AHashMap<Id, bool>;

/// An item that can be shown on a card.
pub trait DeckItem {
    /// Stable identity, used for completion lookups and callbacks.
    type Id: Clone + Eq + Hash + Debug;

    fn id(&self) -> Self::Id;
}

/// Display-only split of the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Required,
    Optional,
}

/// The host's items for one call.
#[derive(Debug)]
pub struct Deck<'a, I: DeckItem> {
    items: &'a [I],
    segment_boundary: usize,
    completions: Option<&'a Completions<I::Id>>,
}

impl<I: DeckItem> Clone for Deck<'_, I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I: DeckItem> Copy for Deck<'_, I> {}

impl<'a, I: DeckItem> Deck<'a, I> {
    /// Every item is required and none is complete.
    #[must_use]
    pub fn new(items: &'a [I]) -> Self {
        Self {
            items,
            segment_boundary: items.len(),
            completions: None,
        }
    }

    /// Items at `boundary` and beyond belong to the optional segment.
    #[must_use]
    pub fn with_segment_boundary(mut self, boundary: usize) -> Self {
        self.segment_boundary = boundary.min(self.items.len());
        self
    }

    #[must_use]
    pub fn with_completions(mut self, completions: &'a Completions<I::Id>) -> Self {
        self.completions = Some(completions);
        self
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn items(&self) -> &'a [I] {
        self.items
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&'a I> {
        self.items.get(index)
    }

    #[must_use]
    pub fn segment_boundary(&self) -> usize {
        self.segment_boundary
    }

    #[must_use]
    pub fn segment(&self, index: usize) -> Segment {
        if index < self.segment_boundary {
            Segment::Required
        } else {
            Segment::Optional
        }
    }

    /// Completion flag for `id`; missing entries count as not done.
    #[must_use]
    pub fn is_complete(&self, id: &I::Id) -> bool {
        self.completions
            .and_then(|c| c.get(id).copied())
            .unwrap_or(false)
    }

    /// Position of the item with identity `id`.
    #[must_use]
    pub fn position_of(&self, id: &I::Id) -> Option<usize> {
        self.items.iter().position(|item| &item.id() == id)
    }

    /// Done and total counts for one segment.
    #[must_use]
    pub fn segment_progress(&self, segment: Segment) -> SegmentProgress {
        let range = match segment {
            Segment::Required => 0..self.segment_boundary,
            Segment::Optional => self.segment_boundary..self.items.len(),
        };
        let total = range.len();
        let done = self.items[range]
            .iter()
            .filter(|item| self.is_complete(&item.id()))
            .count();
        SegmentProgress { done, total }
    }
}

/// Done/total counts for a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SegmentProgress {
    pub done: usize,
    pub total: usize,
}

impl SegmentProgress {
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.done == self.total
    }
}
