#![forbid(unsafe_code)]

//! Tunables for the deck navigator.
//!
//! [`DeckConfig`] groups every threshold and physics constant into one value
//! that can be built in code or, with the `config` feature, loaded from TOML
//! or JSON at startup.
//!
//! ```toml
//! card_width = 320.0
//!
//! [gesture]
//! activation_distance = 12.0
//! cross_axis_tolerance = 55.0
//!
//! [commit]
//! threshold_fraction = 0.18
//! velocity_threshold = 500.0
//!
//! [spring]
//! stiffness = 170.0
//! damping_ratio = 0.9
//! ```
//!
//! ```rust,ignore
//! let config = DeckConfig::from_toml_file("deck.toml")?;
//! ```
//!
//! Every field has a default, so partial files are fine. Thresholds are
//! tuning values; only their relationships (positive, fractions below one)
//! are validated.

use std::fmt;
use std::time::Duration;

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};
use tracing::warn;

use swipedeck_core::animation::Spring;
use swipedeck_core::geometry::Axis;
use swipedeck_core::gesture::SamplerConfig;

// ---------------------------------------------------------------------------
// Top-level DeckConfig
// ---------------------------------------------------------------------------

/// Complete navigator configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct DeckConfig {
    /// Width of a card along the swipe axis, in logical pixels.
    pub card_width: f64,
    pub gesture: GestureConfig,
    pub commit: CommitConfig,
    pub spring: SpringConfig,
    pub render: RenderConfig,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            card_width: 320.0,
            gesture: GestureConfig::default(),
            commit: CommitConfig::default(),
            spring: SpringConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl DeckConfig {
    /// Builder: set the card width.
    #[must_use]
    pub fn with_card_width(mut self, width: f64) -> Self {
        self.card_width = width;
        self
    }

    /// Commit distance in pixels for the configured card width.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.commit.threshold_fraction * self.card_width
    }

    /// Check every parameter, returning the first violation.
    pub fn validate(&self) -> Result<(), DeckConfigError> {
        positive("card_width", self.card_width)?;

        positive("gesture.activation_distance", self.gesture.activation_distance)?;
        positive("gesture.cross_axis_tolerance", self.gesture.cross_axis_tolerance)?;
        if self.gesture.velocity_window_ms == 0 {
            return Err(DeckConfigError::OutOfRange {
                field: "gesture.velocity_window_ms",
                value: 0.0,
                expected: "> 0",
            });
        }

        unit_open("commit.threshold_fraction", self.commit.threshold_fraction)?;
        positive("commit.velocity_threshold", self.commit.velocity_threshold)?;
        at_least_one("commit.overshoot_allowance", self.commit.overshoot_allowance)?;
        at_least_one("commit.exit_distance", self.commit.exit_distance)?;

        positive("spring.stiffness", self.spring.stiffness)?;
        positive("spring.damping_ratio", self.spring.damping_ratio)?;
        positive("spring.rest_threshold", self.spring.rest_threshold)?;
        positive("spring.velocity_threshold", self.spring.velocity_threshold)?;

        non_negative("render.max_rotation_deg", self.render.max_rotation_deg)?;
        unit_closed("render.active_min_scale", self.render.active_min_scale)?;
        unit_closed("render.peek_scale", self.render.peek_scale)?;
        non_negative("render.peek_offset", self.render.peek_offset)?;
        unit_closed("render.peek_opacity", self.render.peek_opacity)?;
        unit_closed("render.exit_fade", self.render.exit_fade)?;
        Ok(())
    }

    /// A copy with every out-of-range value replaced by its default.
    ///
    /// Constructors run their configuration through this so a hand-built
    /// config with, say, zero damping can never leave a settle running
    /// forever. Each replaced field is logged at WARN.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let mut config = self.clone();
        while let Err(DeckConfigError::OutOfRange { field, value, expected }) = config.validate() {
            warn!(field, value, expected, "deck config value out of range, using default");
            if !config.reset_field(field, &defaults) {
                return defaults;
            }
        }
        config
    }

    fn reset_field(&mut self, field: &str, defaults: &Self) -> bool {
        match field {
            "card_width" => self.card_width = defaults.card_width,
            "gesture.activation_distance" => {
                self.gesture.activation_distance = defaults.gesture.activation_distance;
            }
            "gesture.cross_axis_tolerance" => {
                self.gesture.cross_axis_tolerance = defaults.gesture.cross_axis_tolerance;
            }
            "gesture.velocity_window_ms" => {
                self.gesture.velocity_window_ms = defaults.gesture.velocity_window_ms;
            }
            "commit.threshold_fraction" => {
                self.commit.threshold_fraction = defaults.commit.threshold_fraction;
            }
            "commit.velocity_threshold" => {
                self.commit.velocity_threshold = defaults.commit.velocity_threshold;
            }
            "commit.overshoot_allowance" => {
                self.commit.overshoot_allowance = defaults.commit.overshoot_allowance;
            }
            "commit.exit_distance" => self.commit.exit_distance = defaults.commit.exit_distance,
            "spring.stiffness" => self.spring.stiffness = defaults.spring.stiffness,
            "spring.damping_ratio" => self.spring.damping_ratio = defaults.spring.damping_ratio,
            "spring.rest_threshold" => self.spring.rest_threshold = defaults.spring.rest_threshold,
            "spring.velocity_threshold" => {
                self.spring.velocity_threshold = defaults.spring.velocity_threshold;
            }
            "render.max_rotation_deg" => {
                self.render.max_rotation_deg = defaults.render.max_rotation_deg;
            }
            "render.active_min_scale" => {
                self.render.active_min_scale = defaults.render.active_min_scale;
            }
            "render.peek_scale" => self.render.peek_scale = defaults.render.peek_scale,
            "render.peek_offset" => self.render.peek_offset = defaults.render.peek_offset,
            "render.peek_opacity" => self.render.peek_opacity = defaults.render.peek_opacity,
            "render.exit_fade" => self.render.exit_fade = defaults.render.exit_fade,
            _ => return false,
        }
        true
    }

    /// Load from a TOML string and validate.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigLoadError> {
        let config: Self = toml::from_str(s).map_err(ConfigLoadError::Toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file on disk and validate.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigLoadError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string and validate.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigLoadError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigLoadError::Json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file on disk and validate.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigLoadError::Io)?;
        Self::from_json_str(&content)
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Drag recognition thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct GestureConfig {
    pub axis: Axis,
    /// Primary-axis travel before the deck captures the drag.
    pub activation_distance: f64,
    /// Cross-axis travel that hands the pointer back to the host.
    pub cross_axis_tolerance: f64,
    /// Trailing window for the release velocity estimate.
    pub velocity_window_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        let sampler = SamplerConfig::default();
        Self {
            axis: sampler.axis,
            activation_distance: sampler.activation_distance,
            cross_axis_tolerance: sampler.cross_axis_tolerance,
            velocity_window_ms: sampler.velocity_window.as_millis() as u64,
        }
    }
}

impl GestureConfig {
    #[must_use]
    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            axis: self.axis,
            activation_distance: self.activation_distance,
            cross_axis_tolerance: self.cross_axis_tolerance,
            velocity_window: Duration::from_millis(self.velocity_window_ms),
        }
    }
}

/// Commit policy and drag bounds, expressed relative to card width.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct CommitConfig {
    /// Fraction of card width the drag must cross to commit.
    pub threshold_fraction: f64,
    /// Release speed (px/s) that commits regardless of distance.
    pub velocity_threshold: f64,
    /// Drag offset bound as a multiple of card width.
    pub overshoot_allowance: f64,
    /// Commit-out settle target as a multiple of card width.
    pub exit_distance: f64,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            threshold_fraction: 0.18,
            velocity_threshold: 500.0,
            overshoot_allowance: 1.1,
            exit_distance: 1.15,
        }
    }
}

/// Settle spring parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct SpringConfig {
    pub stiffness: f64,
    /// Damping relative to critical; just under 1.0 gives a faint bounce.
    pub damping_ratio: f64,
    /// Distance (px) from target at which the spring may rest.
    pub rest_threshold: f64,
    /// Speed (px/s) below which the spring may rest.
    pub velocity_threshold: f64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: 170.0,
            damping_ratio: 0.9,
            rest_threshold: 0.25,
            velocity_threshold: 2.0,
        }
    }
}

impl SpringConfig {
    /// A resting spring at `position` carrying these parameters.
    #[must_use]
    pub fn build(&self, position: f64) -> Spring {
        Spring::resting(position)
            .with_stiffness(self.stiffness)
            .with_damping_ratio(self.damping_ratio)
            .with_rest_threshold(self.rest_threshold)
            .with_velocity_threshold(self.velocity_threshold)
    }
}

/// Presentation constants for the card stack.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct RenderConfig {
    /// Tilt of the active card at one full card width of offset.
    pub max_rotation_deg: f64,
    /// Active card scale once the drag reaches the commit threshold.
    pub active_min_scale: f64,
    /// Neighbor scale while peeking.
    pub peek_scale: f64,
    /// Neighbor cross-axis offset (px) while peeking.
    pub peek_offset: f64,
    /// Neighbor opacity while peeking.
    pub peek_opacity: f64,
    /// Opacity lost by the active card as it travels from threshold to exit.
    pub exit_fade: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_rotation_deg: 8.0,
            active_min_scale: 0.96,
            peek_scale: 0.92,
            peek_offset: 14.0,
            peek_opacity: 0.6,
            exit_fade: 0.35,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A configuration value outside its allowed range.
#[derive(Debug, Clone, PartialEq)]
pub enum DeckConfigError {
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },
}

impl fmt::Display for DeckConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange {
                field,
                value,
                expected,
            } => write!(f, "invalid {field} value {value} (expected {expected})"),
        }
    }
}

impl std::error::Error for DeckConfigError {}

/// Errors from loading a configuration file.
#[derive(Debug)]
pub enum ConfigLoadError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config")]
    Json(serde_json::Error),
    /// Parsed, but a value is out of range.
    Validation(DeckConfigError),
}

impl fmt::Display for ConfigLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(e) => write!(f, "validation error: {e}"),
        }
    }
}

impl std::error::Error for ConfigLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Json(e) => Some(e),
            Self::Validation(e) => Some(e),
        }
    }
}

impl From<DeckConfigError> for ConfigLoadError {
    fn from(e: DeckConfigError) -> Self {
        Self::Validation(e)
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), DeckConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(DeckConfigError::OutOfRange {
            field,
            value,
            expected: "> 0",
        })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), DeckConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(DeckConfigError::OutOfRange {
            field,
            value,
            expected: ">= 0",
        })
    }
}

fn at_least_one(field: &'static str, value: f64) -> Result<(), DeckConfigError> {
    if value.is_finite() && value >= 1.0 {
        Ok(())
    } else {
        Err(DeckConfigError::OutOfRange {
            field,
            value,
            expected: ">= 1",
        })
    }
}

fn unit_open(field: &'static str, value: f64) -> Result<(), DeckConfigError> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(DeckConfigError::OutOfRange {
            field,
            value,
            expected: "in (0, 1)",
        })
    }
}

fn unit_closed(field: &'static str, value: f64) -> Result<(), DeckConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(DeckConfigError::OutOfRange {
            field,
            value,
            expected: "in [0, 1]",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(DeckConfig::default().validate(), Ok(()));
    }

    #[test]
    fn threshold_scales_with_width() {
        let narrow = DeckConfig::default().with_card_width(100.0);
        let wide = DeckConfig::default().with_card_width(1000.0);
        assert!((narrow.threshold() - 18.0).abs() < 1e-9);
        assert!((wide.threshold() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_zero_card_width() {
        let err = DeckConfig::default().with_card_width(0.0).validate();
        assert!(matches!(
            err,
            Err(DeckConfigError::OutOfRange {
                field: "card_width",
                ..
            })
        ));
    }

    #[test]
    fn rejects_threshold_fraction_of_one() {
        let mut config = DeckConfig::default();
        config.commit.threshold_fraction = 1.0;
        assert!(matches!(
            config.validate(),
            Err(DeckConfigError::OutOfRange {
                field: "commit.threshold_fraction",
                ..
            })
        ));
    }

    #[test]
    fn rejects_undamped_spring() {
        let mut config = DeckConfig::default();
        config.spring.damping_ratio = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_nan() {
        let mut config = DeckConfig::default();
        config.commit.velocity_threshold = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_exit_inside_card() {
        let mut config = DeckConfig::default();
        config.commit.exit_distance = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn sanitized_keeps_valid_values() {
        let mut config = DeckConfig::default().with_card_width(410.0);
        config.spring.stiffness = 240.0;
        assert_eq!(config.sanitized(), config);
    }

    #[test]
    fn sanitized_replaces_each_bad_field_with_default() {
        let defaults = DeckConfig::default();
        let mut config = DeckConfig::default().with_card_width(f64::NAN);
        config.spring.damping_ratio = 0.0;
        config.commit.threshold_fraction = 2.0;
        config.render.peek_opacity = 0.3;

        let fixed = config.sanitized();
        assert_eq!(fixed.validate(), Ok(()));
        assert_eq!(fixed.card_width, defaults.card_width);
        assert_eq!(fixed.spring.damping_ratio, defaults.spring.damping_ratio);
        assert_eq!(fixed.commit.threshold_fraction, defaults.commit.threshold_fraction);
        assert_eq!(fixed.render.peek_opacity, 0.3);
    }

    #[test]
    fn gesture_section_maps_to_sampler() {
        let gesture = GestureConfig {
            velocity_window_ms: 80,
            ..GestureConfig::default()
        };
        let sampler = gesture.sampler_config();
        assert_eq!(sampler.velocity_window, Duration::from_millis(80));
        assert_eq!(sampler.activation_distance, 12.0);
    }

    #[test]
    fn spring_section_builds_resting_spring() {
        let spring = SpringConfig::default().build(0.0);
        assert!(spring.is_at_rest());
        assert!((spring.damping_ratio() - 0.9).abs() < 1e-9);
    }

    #[test]
    fn error_display() {
        let err = DeckConfigError::OutOfRange {
            field: "card_width",
            value: -1.0,
            expected: "> 0",
        };
        assert_eq!(err.to_string(), "invalid card_width value -1 (expected > 0)");
    }
}
