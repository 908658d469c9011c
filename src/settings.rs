//! Game options and tuning
//!
//! `GameOptions` is what the embedding page hands the facade (mount target,
//! play-area geometry). `Tuning` holds gameplay balance and visual defaults.
//! Both deserialize from JSON with every field optional.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::GameError;
use crate::sim::pop::PopOptions;

/// Length of one play-area axis
///
/// Parsed from strings: `"50%"`, `"320px"`, anything else means the full
/// surface dimension. A malformed percentage counts as 100%.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LengthSpec {
    #[default]
    Auto,
    Percent(f32),
    Pixels(f32),
}

impl LengthSpec {
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if let Some(value) = s.strip_suffix('%') {
            let percent = value.trim().parse::<f32>().ok().filter(|v| v.is_finite());
            return LengthSpec::Percent(percent.unwrap_or(100.0));
        }
        if let Some(value) = s.strip_suffix("px") {
            return match value.trim().parse::<f32>() {
                Ok(px) if px.is_finite() => LengthSpec::Pixels(px),
                _ => LengthSpec::Auto,
            };
        }
        LengthSpec::Auto
    }

    /// Resolve against a surface dimension; never exceeds `total`
    pub fn resolve(&self, total: f32) -> f32 {
        let total = total.max(0.0);
        match *self {
            LengthSpec::Auto => total,
            LengthSpec::Percent(p) => total * p.clamp(0.0, 100.0) / 100.0,
            LengthSpec::Pixels(px) => px.clamp(0.0, total),
        }
    }
}

impl From<String> for LengthSpec {
    fn from(s: String) -> Self {
        LengthSpec::parse(&s)
    }
}

impl From<LengthSpec> for String {
    fn from(spec: LengthSpec) -> Self {
        match spec {
            LengthSpec::Auto => "auto".to_string(),
            LengthSpec::Percent(p) => format!("{}%", p),
            LengthSpec::Pixels(px) => format!("{}px", px),
        }
    }
}

/// Where the play area sits inside the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    #[default]
    Center,
    Left,
    Right,
    Top,
    Bottom,
}

/// Gameplay balance and visual defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Rules ===
    /// Misses that end a run
    pub loss_threshold: u32,
    /// Extra radius granted to clicks when hit-testing globes
    pub touch_buffer: f32,

    // === Globes ===
    pub globe_radius: f32,
    /// Fall speed at run start (pixels/s)
    pub globe_base_speed: f32,
    /// Added fall speed per second of play
    pub globe_speed_ramp: f32,
    pub globe_max_speed: f32,

    // === Effects ===
    pub pop: PopOptions,
    /// Tile-wipe duration (seconds)
    pub transition_duration: f32,
    /// Tiles per row in the wipe grid
    pub horizontal_count: u32,
    /// Longest step simulated per frame (seconds)
    pub max_frame_span: f32,

    // === Look ===
    pub background_color: String,
    pub area_color: String,
    pub menu_background_color: String,
    pub menu_font_color: String,
    pub menu_font_size: f32,
    pub font_family: String,
    /// URL of the play-area tile image, if any
    pub background_image: Option<String>,

    /// RNG seed (None = derive from the clock)
    pub seed: Option<u64>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            loss_threshold: LOSS_THRESHOLD,
            touch_buffer: 0.0,

            globe_radius: GLOBE_RADIUS,
            globe_base_speed: GLOBE_BASE_SPEED,
            globe_speed_ramp: GLOBE_SPEED_RAMP,
            globe_max_speed: GLOBE_MAX_SPEED,

            pop: PopOptions::default(),
            transition_duration: TRANSITION_DURATION,
            horizontal_count: MENU_HORIZONTAL_COUNT,
            max_frame_span: MAX_FRAME_SPAN,

            background_color: "#0b1026".to_string(),
            area_color: "#16214a".to_string(),
            menu_background_color: "#27408b".to_string(),
            menu_font_color: "#ffffff".to_string(),
            menu_font_size: MENU_FONT_SIZE,
            font_family: "sans-serif".to_string(),
            background_image: None,

            seed: None,
        }
    }
}

impl Tuning {
    /// Fall speed for a globe spawned `elapsed` seconds into the run
    pub fn spawn_speed(&self, elapsed: f32) -> f32 {
        (self.globe_base_speed + self.globe_speed_ramp * elapsed.max(0.0)).min(self.globe_max_speed)
    }

    /// Loss threshold, never below one
    pub fn effective_loss_threshold(&self) -> u32 {
        self.loss_threshold.max(1)
    }
}

/// Options accepted by the top-level facade
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameOptions {
    /// Mount target locator (CSS selector)
    pub container: String,
    pub width: LengthSpec,
    pub height: LengthSpec,
    /// Target aspect ratio (width / height); overrides width/height when set
    pub rate: Option<f32>,
    pub anchor: Anchor,
    pub tuning: Tuning,
}

impl GameOptions {
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let options: GameOptions = serde_json::from_str(json)?;
        log::debug!("Parsed options for container '{}'", options.container);
        Ok(options)
    }

    /// Aspect ratio if one was given and it is usable
    pub fn effective_rate(&self) -> Option<f32> {
        self.rate.filter(|r| r.is_finite() && *r > 0.0)
    }
}
