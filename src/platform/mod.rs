//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Frame scheduling (`frame`: requestAnimationFrame on web, manual stepping elsewhere)
//! - Canvas 2D surface, `<img>` loading and container mounting (`web`, wasm32 only)

pub mod frame;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use frame::{FrameHandle, FrameScheduler, GameLoop, ManualScheduler};
