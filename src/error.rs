//! Error taxonomy
//!
//! Fatal failures (mount, surface) leave an instance inert and are surfaced
//! through the facade's `error` event. Asset failures are reported per asset
//! and do not stop the game.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("can not find element of container '{selector}'")]
    Mount { selector: String },
    #[error("there was an error loading the image '{url}' ({name})")]
    Asset { name: String, url: String },
    #[error("render surface unavailable: {0}")]
    Surface(String),
    #[error("invalid options: {0}")]
    Config(#[from] serde_json::Error),
}
