//! Menu overlay and tile-wipe transitions

pub mod menu;

pub use menu::{Interface, MenuAction, MenuEntry};
