//! Game state and shared identifiers

use serde::{Deserialize, Serialize};

/// Global game state. The facade holds the authoritative copy and propagates
/// it to the controller and the menu with a `change` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameState {
    /// Before the surface and assets are ready
    #[default]
    Waiting,
    /// Gameplay active
    Running,
    /// Gameplay frozen, nothing advances
    Pausing,
    /// Tile-wipe transition in flight
    Changing,
    /// Menu visible, awaiting a choice
    Selecting,
}

impl GameState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameState::Waiting => "waiting",
            GameState::Running => "running",
            GameState::Pausing => "pausing",
            GameState::Changing => "changing",
            GameState::Selecting => "selecting",
        }
    }
}

/// Tile-wipe direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Tiles shrink to nothing, revealing gameplay
    #[default]
    Close,
    /// Tiles grow to full coverage, concealing gameplay behind the menu
    Open,
}

/// Globe identity. Allocated strictly increasing, so a larger id is a later
/// spawn and wins overlapping hit-tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GlobeId(pub u64);

impl std::fmt::Display for GlobeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic id allocator
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next: u64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdGenerator {
    pub fn next_id(&mut self) -> GlobeId {
        let id = GlobeId(self.next);
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_strictly_increase() {
        let mut ids = IdGenerator::default();
        let a = ids.next_id();
        let b = ids.next_id();
        assert!(b > a);
        assert_eq!(a.to_string(), "1");
        assert_eq!(b.to_string(), "2");
    }

    #[test]
    fn test_state_serde_names() {
        let json = serde_json::to_string(&GameState::Selecting).unwrap();
        assert_eq!(json, "\"selecting\"");
        assert_eq!(GameState::Pausing.as_str(), "pausing");
    }
}
