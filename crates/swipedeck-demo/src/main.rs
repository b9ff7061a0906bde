#![forbid(unsafe_code)]

//! SwipeDeck scripted session.
//!
//! Drives a [`DeckNavigator`] through a fixed sequence of pointer gestures on
//! a small lesson deck and logs every transition, callback and settled view.
//! Time is simulated, so the run is instant and reproducible.
//!
//! # Running
//!
//! ```sh
//! RUST_LOG=debug cargo run -p swipedeck-demo
//! RUST_LOG=swipedeck=trace cargo run -p swipedeck-demo -- --json
//! cargo run -p swipedeck-demo -- --config deck.toml
//! ```

use std::cell::RefCell;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use swipedeck::{
    Completions, Deck, DeckConfig, DeckItem, DeckNavigator, DeckState, Direction, Point,
    PointerEvent, PressRegion,
};
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use web_time::Instant;

const FRAME: Duration = Duration::from_millis(16);
const MAX_SETTLE_FRAMES: usize = 1_000;

// ---------------------------------------------------------------------------
// Host model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Lesson {
    slug: &'static str,
    title: &'static str,
}

impl DeckItem for Lesson {
    type Id = &'static str;

    fn id(&self) -> Self::Id {
        self.slug
    }
}

fn lessons() -> Vec<Lesson> {
    [
        ("ownership", "Ownership"),
        ("borrowing", "Borrowing"),
        ("lifetimes", "Lifetimes"),
        ("traits", "Traits"),
        ("macros", "Macros"),
        ("unsafe", "Unsafe"),
    ]
    .into_iter()
    .map(|(slug, title)| Lesson { slug, title })
    .collect()
}

/// Required lessons come first; the rest are optional.
const REQUIRED: usize = 4;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Debug, Parser)]
#[command(
    name = "swipedeck-demo",
    about = "Scripted swipe session that logs every deck transition",
    version
)]
struct Args {
    /// Deck configuration file; `.json` is read as JSON, anything else as TOML.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json: bool,
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,swipedeck=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<DeckConfig, swipedeck::ConfigLoadError> {
    let Some(path) = path else {
        return Ok(DeckConfig::default());
    };
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => DeckConfig::from_json_file(path),
        _ => DeckConfig::from_toml_file(path),
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Simulated pointer with its own clock.
struct Finger {
    now: Instant,
    at: Point,
}

impl Finger {
    fn new() -> Self {
        Self {
            now: Instant::now(),
            at: Point::new(160.0, 240.0),
        }
    }

    fn wait(&mut self, dt: Duration) {
        self.now += dt;
    }

    fn down(&mut self, region: PressRegion) -> PointerEvent {
        self.at = Point::new(160.0, 240.0);
        PointerEvent::down_on(region, self.at, self.now)
    }

    fn move_by(&mut self, dx: f64, dy: f64, dt: Duration) -> PointerEvent {
        self.wait(dt);
        self.at = Point::new(self.at.x + dx, self.at.y + dy);
        PointerEvent::moved(self.at, self.now)
    }

    fn up(&mut self, dt: Duration) -> PointerEvent {
        self.wait(dt);
        PointerEvent::up(self.at, self.now)
    }
}

struct Session {
    nav: DeckNavigator<Lesson>,
    items: Vec<Lesson>,
    completions: Completions<&'static str>,
    toggles: Rc<RefCell<Vec<(&'static str, bool)>>>,
    finger: Finger,
}

impl Session {
    fn new(config: &DeckConfig) -> Self {
        let toggles = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&toggles);
        let nav = DeckNavigator::new(config)
            .on_open_details(|lesson: &Lesson| info!(slug = lesson.slug, "open details"))
            .on_toggle_complete(move |slug, previous| sink.borrow_mut().push((*slug, previous)))
            .on_interaction_change(|dragging| info!(dragging, "interaction changed"))
            .on_index_change(|from, to| info!(from, to, "index changed"));
        let mut completions = Completions::default();
        completions.insert("ownership", true);
        Self {
            nav,
            items: lessons(),
            completions,
            toggles,
            finger: Finger::new(),
        }
    }

    /// Replay `events`, then run frames until the deck is idle.
    fn gesture(&mut self, label: &str, events: Vec<PointerEvent>) {
        info!(label, "gesture");
        {
            let deck = Deck::new(&self.items)
                .with_segment_boundary(REQUIRED)
                .with_completions(&self.completions);
            for event in &events {
                self.nav.process(&deck, event);
            }
        }
        self.apply_toggles();
        self.settle();
    }

    fn settle(&mut self) {
        let deck = Deck::new(&self.items)
            .with_segment_boundary(REQUIRED)
            .with_completions(&self.completions);
        for _ in 0..MAX_SETTLE_FRAMES {
            if self.nav.state() == DeckState::Idle {
                break;
            }
            self.nav.tick(&deck, FRAME);
            self.finger.wait(FRAME);
        }
        if self.nav.state() != DeckState::Idle {
            warn!(state = ?self.nav.state(), "deck still moving after frame budget");
        }
    }

    /// The host owns completion state; apply the intents the deck reported.
    fn apply_toggles(&mut self) {
        for (slug, previous) in self.toggles.borrow_mut().drain(..) {
            self.completions.insert(slug, !previous);
        }
    }

    fn report(&self) {
        let deck = Deck::new(&self.items)
            .with_segment_boundary(REQUIRED)
            .with_completions(&self.completions);
        let view = self.nav.render(&deck);
        let dots: String = view
            .dots
            .iter()
            .map(|d| match (d.is_active, d.is_complete) {
                (true, _) => '@',
                (false, true) => '*',
                (false, false) => '.',
            })
            .collect();
        let title = view.active().map_or("-", |card| card.item.title);
        info!(
            index = ?view.active_index,
            title,
            dots = %dots,
            required = %format!("{}/{}", view.required.done, view.required.total),
            optional = %format!("{}/{}", view.optional.done, view.optional.total),
            "deck"
        );
    }

    fn run(&mut self) {
        self.report();

        let f = &mut self.finger;
        let events = vec![
            f.down(PressRegion::Card),
            f.move_by(20.0, 1.0, FRAME),
            f.move_by(40.0, 2.0, FRAME * 4),
            f.move_by(30.0, 0.0, FRAME * 4),
            f.up(FRAME * 10),
        ];
        self.gesture("slow drag past threshold", events);
        self.report();

        let f = &mut self.finger;
        let events = vec![
            f.down(PressRegion::Card),
            f.move_by(-14.0, 0.0, FRAME),
            f.move_by(-16.0, 0.0, FRAME),
            f.up(FRAME),
        ];
        self.gesture("short backward flick", events);
        self.report();

        let f = &mut self.finger;
        let events = vec![
            f.down(PressRegion::Card),
            f.move_by(25.0, 0.0, FRAME * 3),
            f.up(FRAME * 12),
        ];
        self.gesture("short drag, no flick", events);
        self.report();

        let f = &mut self.finger;
        let events = vec![
            f.down(PressRegion::CompletionControl),
            f.up(FRAME * 5),
        ];
        self.gesture("tap completion control", events);
        self.report();

        let f = &mut self.finger;
        let events = vec![f.down(PressRegion::Card), f.up(FRAME * 6)];
        self.gesture("tap card", events);

        let f = &mut self.finger;
        let events = vec![
            f.down(PressRegion::Card),
            f.move_by(10.0, 70.0, FRAME * 2),
            f.move_by(90.0, 40.0, FRAME * 2),
            f.up(FRAME),
        ];
        self.gesture("vertical scroll handed to host", events);
        self.report();

        // Programmatic navigation to the end, then a rubber-band.
        {
            let deck = Deck::new(&self.items).with_segment_boundary(REQUIRED);
            self.nav.go_to(&deck, self.items.len() - 1);
        }
        let f = &mut self.finger;
        let events = vec![
            f.down(PressRegion::Card),
            f.move_by(40.0, 0.0, FRAME),
            f.move_by(60.0, 0.0, FRAME),
            f.up(FRAME),
        ];
        self.gesture("rubber-band at last lesson", events);
        self.report();

        // Interrupt a step animation halfway and drag the card back home.
        {
            let deck = Deck::new(&self.items).with_segment_boundary(REQUIRED);
            self.nav.step(&deck, Direction::Backward);
            for _ in 0..5 {
                self.nav.tick(&deck, FRAME);
            }
            info!(offset = self.nav.offset(), "step in flight");
        }
        let back = -self.nav.offset();
        let f = &mut self.finger;
        let events = vec![
            f.down(PressRegion::Card),
            // Activation; the card stays where the animation left it.
            f.move_by(back.signum() * 20.0, 0.0, FRAME),
            f.move_by(back, 0.0, FRAME * 4),
            f.up(FRAME * 12),
        ];
        self.gesture("interrupt step and drag home", events);
        self.report();
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.json);

    let config = match load_config(args.config.as_ref()) {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "failed to load deck config");
            return ExitCode::FAILURE;
        }
    };
    info!(
        card_width = config.card_width,
        threshold = config.threshold(),
        "swipedeck demo"
    );

    Session::new(&config).run();
    ExitCode::SUCCESS
}
