//! Simulation module
//!
//! Gameplay logic that does not depend on a concrete drawing technology:
//! - Geometry (`rect`, `area`)
//! - Moving entities (`kinetic`, `globe`, `pop`)
//! - The globe arena (`population`) and the game loop (`controller`)
//!
//! Iteration order is by `GlobeId`, so frames are reproducible for a given seed.

pub mod area;
pub mod controller;
pub mod globe;
pub mod kinetic;
pub mod pop;
pub mod population;
pub mod rect;
pub mod state;

pub use area::AreaSpec;
pub use controller::Controller;
pub use globe::{Globe, random_color};
pub use kinetic::{AccelerationOverride, KineticConfig, KineticEntity};
pub use pop::{Pop, PopOptions};
pub use population::{GlobeSlot, Population};
pub use rect::{Coordinate, Rect};
pub use state::{Direction, GameState, GlobeId, IdGenerator};
