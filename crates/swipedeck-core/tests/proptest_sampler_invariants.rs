//! Property-based invariant tests for the drag sampler and spring.
//!
//! 1. `Activated` is reported at most once per pointer sequence.
//! 2. The reported delta always equals the primary-axis travel from the start.
//! 3. Release velocity is always finite.
//! 4. A spring started anywhere comes to rest exactly on its target.

use std::time::Duration;

use proptest::prelude::*;
use swipedeck_core::animation::Spring;
use swipedeck_core::geometry::Point;
use swipedeck_core::gesture::{
    DragSample, GestureSampler, SamplerConfig, SamplerRelease, SamplerUpdate,
};
use web_time::Instant;

// ── Strategies ──────────────────────────────────────────────────────────

/// A pointer path as (dt_ms, dx, dy) steps.
fn path_strategy() -> impl Strategy<Value = Vec<(u64, f64, f64)>> {
    prop::collection::vec((0u64..40, -40.0f64..40.0, -20.0f64..20.0), 1..60)
}

proptest! {
    #[test]
    fn activation_reported_at_most_once(path in path_strategy()) {
        let t0 = Instant::now();
        let mut sampler = GestureSampler::new(SamplerConfig::default());
        sampler.begin(DragSample::new(Point::ZERO, t0));

        let mut t = t0;
        let mut pos = Point::ZERO;
        let mut activations = 0;
        for (dt, dx, dy) in path {
            t += Duration::from_millis(dt);
            pos = Point::new(pos.x + dx, pos.y + dy);
            if let SamplerUpdate::Activated { .. } = sampler.update(DragSample::new(pos, t)) {
                activations += 1;
            }
        }
        prop_assert!(activations <= 1, "activated {} times", activations);
    }

    #[test]
    fn delta_tracks_primary_travel(path in path_strategy()) {
        let t0 = Instant::now();
        let start = Point::new(200.0, 300.0);
        let mut sampler = GestureSampler::new(SamplerConfig {
            cross_axis_tolerance: f64::INFINITY,
            ..SamplerConfig::default()
        });
        sampler.begin(DragSample::new(start, t0));

        let mut t = t0;
        let mut pos = start;
        for (dt, dx, dy) in path {
            t += Duration::from_millis(dt);
            pos = Point::new(pos.x + dx, pos.y + dy);
            match sampler.update(DragSample::new(pos, t)) {
                SamplerUpdate::Activated { delta } | SamplerUpdate::Moved { delta } => {
                    prop_assert!((delta - (pos.x - start.x)).abs() < 1e-9);
                }
                SamplerUpdate::Quiet => {}
                SamplerUpdate::Rejected => prop_assert!(false, "rejection is disabled"),
            }
        }
    }

    #[test]
    fn release_velocity_is_finite(path in path_strategy()) {
        let t0 = Instant::now();
        let mut sampler = GestureSampler::new(SamplerConfig::default());
        sampler.begin(DragSample::new(Point::ZERO, t0));

        let mut t = t0;
        let mut pos = Point::ZERO;
        for (dt, dx, dy) in path {
            t += Duration::from_millis(dt);
            pos = Point::new(pos.x + dx, pos.y + dy);
            sampler.update(DragSample::new(pos, t));
        }
        if let SamplerRelease::Drag(release) = sampler.end(DragSample::new(pos, t), None) {
            prop_assert!(release.velocity.is_finite());
            prop_assert!(release.delta.is_finite());
        }
    }

    #[test]
    fn spring_rests_exactly_on_target(
        start in -500.0f64..500.0,
        target in prop_oneof![Just(0.0f64), Just(414.0), Just(-414.0)],
        velocity in -4000.0f64..4000.0,
    ) {
        let mut spring = Spring::new(start, target)
            .with_stiffness(170.0)
            .with_damping_ratio(0.9)
            .with_rest_threshold(0.25)
            .with_velocity_threshold(2.0);
        spring.retarget(start, velocity, target);
        for _ in 0..600 {
            spring.advance(Duration::from_millis(16));
        }
        prop_assert!(spring.is_at_rest());
        prop_assert_eq!(spring.position(), target);
    }
}
