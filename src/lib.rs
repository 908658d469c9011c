//! Collect Energy - a falling-globe arcade game
//!
//! Core modules:
//! - `event`: Publish/subscribe hub every stateful component composes
//! - `task`: Host task queue (deferred fires) and readiness joins
//! - `sim`: Simulation (kinetics, globes, bursts, operational area, game loop)
//! - `ui`: Menu and tile-wipe transitions
//! - `surface`: Render surface contract consumed by the loop and the menu
//! - `assets`: Image loading with per-asset and aggregate signals
//! - `game`: Top-level facade wiring everything together
//! - `platform`: Frame scheduling and browser bindings

pub mod assets;
pub mod error;
pub mod event;
pub mod game;
pub mod platform;
pub mod scoreboard;
pub mod settings;
pub mod sim;
pub mod surface;
pub mod task;
pub mod ui;

pub use error::GameError;
pub use game::Game;
pub use scoreboard::Scoreboard;
pub use settings::{Anchor, GameOptions, LengthSpec, Tuning};

/// Game configuration constants
pub mod consts {
    /// Misses allowed before the run ends
    pub const LOSS_THRESHOLD: u32 = 3;

    /// Globe defaults
    pub const GLOBE_RADIUS: f32 = 30.0;
    /// Fall speed of the first globe of a run (pixels/s)
    pub const GLOBE_BASE_SPEED: f32 = 120.0;
    /// Extra fall speed per second of play (pixels/s per s)
    pub const GLOBE_SPEED_RAMP: f32 = 6.0;
    pub const GLOBE_MAX_SPEED: f32 = 2000.0;

    /// Burst defaults
    pub const POP_RADIUS: f32 = 30.0;
    pub const POP_DURING: f32 = 2.0;
    pub const POP_DISTANCE: f32 = 60.0;
    pub const POP_COUNT: u32 = 3;

    /// Menu defaults
    pub const MENU_HORIZONTAL_COUNT: u32 = 6;
    pub const MENU_FONT_SIZE: f32 = 32.0;
    /// Tile-wipe duration (seconds)
    pub const TRANSITION_DURATION: f32 = 0.8;

    /// Longest simulated step for one frame, so a backgrounded tab does not teleport globes
    pub const MAX_FRAME_SPAN: f32 = 0.1;

    /// Asset name of the operational area tile image
    pub const BACKGROUND_IMAGE: &str = "background";
}
