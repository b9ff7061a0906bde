#![forbid(unsafe_code)]

//! Pure `(index, offset) -> frames` mapping for the visible cards.
//!
//! [`RenderStack`] holds only configuration. [`RenderStack::compute`] derives
//! the active card's frame and, depending on the sign of the offset, the frame
//! of the neighbor being revealed. Nothing is retained between calls, so the
//! same `(index, len, offset)` always yields the same frames whether the
//! offset came from a drag or from a settling spring.
//!
//! Positive offsets move the active card toward the forward commit and
//! reveal the next card; negative offsets reveal the previous one.

use swipedeck_core::animation::{lerp, progress};
use swipedeck_core::geometry::Axis;

use crate::config::DeckConfig;

/// Paint order: active above both neighbors.
pub const ACTIVE_Z: i32 = 2;
pub const NEIGHBOR_Z: i32 = 1;

/// Which slot of the stack a frame occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardRole {
    Active,
    Next,
    Previous,
}

/// Visual transform for one card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardFrame {
    pub index: usize,
    pub role: CardRole,
    pub translate_x: f64,
    pub translate_y: f64,
    pub rotation_deg: f64,
    pub scale: f64,
    pub opacity: f64,
    pub z_index: i32,
}

/// The frames for one render pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StackFrames {
    pub active: CardFrame,
    pub next: Option<CardFrame>,
    pub previous: Option<CardFrame>,
}

impl StackFrames {
    /// Frames in paint order (lowest z first).
    pub fn paint_order(&self) -> impl Iterator<Item = CardFrame> + '_ {
        self.previous
            .iter()
            .chain(self.next.iter())
            .copied()
            .chain(std::iter::once(self.active))
    }
}

/// Stateless frame calculator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStack {
    axis: Axis,
    card_width: f64,
    threshold_fraction: f64,
    exit_distance: f64,
    max_rotation_deg: f64,
    active_min_scale: f64,
    peek_scale: f64,
    peek_offset: f64,
    peek_opacity: f64,
    exit_fade: f64,
}

impl RenderStack {
    /// Out-of-range values fall back to their defaults.
    #[must_use]
    pub fn new(config: &DeckConfig) -> Self {
        let config = config.sanitized();
        Self {
            axis: config.gesture.axis,
            card_width: config.card_width,
            threshold_fraction: config.commit.threshold_fraction,
            exit_distance: config.commit.exit_distance,
            max_rotation_deg: config.render.max_rotation_deg.abs(),
            active_min_scale: config.render.active_min_scale,
            peek_scale: config.render.peek_scale,
            peek_offset: config.render.peek_offset,
            peek_opacity: config.render.peek_opacity,
            exit_fade: config.render.exit_fade,
        }
    }

    /// Match a new card width after a layout change.
    pub fn set_card_width(&mut self, width: f64) {
        if width.is_finite() && width > 0.0 {
            self.card_width = width;
        }
    }

    #[must_use]
    pub fn card_width(&self) -> f64 {
        self.card_width
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold_fraction * self.card_width
    }

    /// Frames for the deck at `index` of `len` displaced by `offset`.
    ///
    /// Returns `None` for an empty deck. `index` is clamped into range.
    #[must_use]
    pub fn compute(&self, index: usize, len: usize, offset: f64) -> Option<StackFrames> {
        if len == 0 {
            return None;
        }
        let index = index.min(len - 1);
        let offset = if offset.is_finite() { offset } else { 0.0 };

        let next = (offset > 0.0 && index + 1 < len)
            .then(|| self.neighbor_frame(index + 1, CardRole::Next, offset));
        let previous = (offset < 0.0 && index > 0)
            .then(|| self.neighbor_frame(index - 1, CardRole::Previous, offset));

        Some(StackFrames {
            active: self.active_frame(index, offset),
            next,
            previous,
        })
    }

    fn active_frame(&self, index: usize, offset: f64) -> CardFrame {
        let threshold = self.threshold();
        let drag = progress(offset, threshold);

        let rotation_deg = if self.card_width > 0.0 {
            (offset / self.card_width * self.max_rotation_deg)
                .clamp(-self.max_rotation_deg, self.max_rotation_deg)
        } else {
            0.0
        };

        // Fade only over the stretch between the threshold and the exit point.
        let exit = self.card_width * self.exit_distance;
        let beyond = (offset.abs() - threshold).max(0.0);
        let fade = progress(beyond, exit - threshold);

        let (translate_x, translate_y) = self.along_axis(offset, 0.0);
        CardFrame {
            index,
            role: CardRole::Active,
            translate_x,
            translate_y,
            rotation_deg,
            scale: lerp(1.0, self.active_min_scale, drag),
            opacity: 1.0 - self.exit_fade * fade,
            z_index: ACTIVE_Z,
        }
    }

    fn neighbor_frame(&self, index: usize, role: CardRole, offset: f64) -> CardFrame {
        let ready = progress(offset, self.threshold());
        let (translate_x, translate_y) = self.along_axis(0.0, lerp(self.peek_offset, 0.0, ready));
        CardFrame {
            index,
            role,
            translate_x,
            translate_y,
            rotation_deg: 0.0,
            scale: lerp(self.peek_scale, 1.0, ready),
            opacity: lerp(self.peek_opacity, 1.0, ready),
            z_index: NEIGHBOR_Z,
        }
    }

    /// Map (primary, cross) displacement onto screen (x, y).
    fn along_axis(&self, primary: f64, cross: f64) -> (f64, f64) {
        match self.axis {
            Axis::Horizontal => (primary, cross),
            Axis::Vertical => (cross, primary),
        }
    }
}

impl Default for RenderStack {
    fn default() -> Self {
        Self::new(&DeckConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack() -> RenderStack {
        RenderStack::new(&DeckConfig::default().with_card_width(300.0))
    }

    #[test]
    fn empty_deck_has_no_frames() {
        assert_eq!(stack().compute(0, 0, 10.0), None);
    }

    #[test]
    fn at_rest_only_active_is_visible() {
        let frames = stack().compute(2, 5, 0.0).unwrap();
        assert_eq!(frames.next, None);
        assert_eq!(frames.previous, None);
        let active = frames.active;
        assert_eq!(active.index, 2);
        assert_eq!(active.translate_x, 0.0);
        assert_eq!(active.rotation_deg, 0.0);
        assert_eq!(active.scale, 1.0);
        assert_eq!(active.opacity, 1.0);
    }

    #[test]
    fn positive_offset_reveals_next_only() {
        let frames = stack().compute(2, 5, 30.0).unwrap();
        assert_eq!(frames.next.map(|f| f.index), Some(3));
        assert_eq!(frames.previous, None);
        assert_eq!(frames.active.translate_x, 30.0);
    }

    #[test]
    fn negative_offset_reveals_previous_only() {
        let frames = stack().compute(2, 5, -30.0).unwrap();
        assert_eq!(frames.previous.map(|f| f.index), Some(1));
        assert_eq!(frames.next, None);
    }

    #[test]
    fn no_neighbor_past_the_ends() {
        let s = stack();
        assert_eq!(s.compute(4, 5, 80.0).unwrap().next, None);
        assert_eq!(s.compute(0, 5, -80.0).unwrap().previous, None);
    }

    #[test]
    fn neighbor_goes_from_peek_to_ready() {
        let s = stack();
        let peek = s.compute(0, 5, 0.001).unwrap().next.unwrap();
        assert!((peek.scale - 0.92).abs() < 1e-3);
        assert!((peek.translate_y - 14.0).abs() < 1e-2);
        assert!((peek.opacity - 0.6).abs() < 1e-3);

        let ready = s.compute(0, 5, s.threshold()).unwrap().next.unwrap();
        assert_eq!(ready.scale, 1.0);
        assert_eq!(ready.translate_y, 0.0);
        assert_eq!(ready.opacity, 1.0);

        // Past the threshold the neighbor stays ready.
        let beyond = s.compute(0, 5, 300.0).unwrap().next.unwrap();
        assert_eq!(beyond, ready);
    }

    #[test]
    fn rotation_is_bounded() {
        let s = stack();
        let r = s.compute(1, 3, 150.0).unwrap().active.rotation_deg;
        assert!((r - 4.0).abs() < 1e-9);
        let r = s.compute(1, 3, 10_000.0).unwrap().active.rotation_deg;
        assert_eq!(r, 8.0);
        let r = s.compute(1, 3, -10_000.0).unwrap().active.rotation_deg;
        assert_eq!(r, -8.0);
    }

    #[test]
    fn active_scale_tracks_threshold_progress() {
        let s = stack();
        let half = s.compute(1, 3, s.threshold() / 2.0).unwrap().active;
        assert!((half.scale - 0.98).abs() < 1e-9);
        let full = s.compute(1, 3, s.threshold() * 3.0).unwrap().active;
        assert!((full.scale - 0.96).abs() < 1e-9);
    }

    #[test]
    fn opacity_fades_only_past_threshold() {
        let s = stack();
        let inside = s.compute(1, 3, s.threshold()).unwrap().active;
        assert_eq!(inside.opacity, 1.0);
        let exit = s.compute(1, 3, 345.0).unwrap().active;
        assert!((exit.opacity - 0.65).abs() < 1e-9);
    }

    #[test]
    fn active_is_painted_last() {
        let frames = stack().compute(1, 3, 40.0).unwrap();
        let order: Vec<CardRole> = frames.paint_order().map(|f| f.role).collect();
        assert_eq!(order, vec![CardRole::Next, CardRole::Active]);
        assert!(frames.active.z_index > frames.next.unwrap().z_index);
    }

    #[test]
    fn vertical_axis_swaps_components() {
        let mut config = DeckConfig::default().with_card_width(300.0);
        config.gesture.axis = Axis::Vertical;
        let frames = RenderStack::new(&config).compute(0, 2, 40.0).unwrap();
        assert_eq!(frames.active.translate_y, 40.0);
        assert_eq!(frames.active.translate_x, 0.0);
        assert!(frames.next.unwrap().translate_x > 0.0);
    }

    #[test]
    fn out_of_range_index_is_clamped() {
        let frames = stack().compute(42, 3, 0.0).unwrap();
        assert_eq!(frames.active.index, 2);
    }

    #[test]
    fn non_finite_offset_renders_at_rest() {
        let frames = stack().compute(1, 3, f64::NAN).unwrap();
        assert_eq!(frames.active.translate_x, 0.0);
        assert_eq!(frames.next, None);
    }
}
