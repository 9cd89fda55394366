//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::{GameHandle, GameManager};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub game: GameHandle,
}

impl AppState {
    /// Build the state along with the game loop it talks to.
    /// The caller is responsible for spawning `GameManager::run`.
    pub fn new(config: Config) -> (Self, GameManager) {
        let config = Arc::new(config);

        let seed = config.seed.unwrap_or_else(rand::random);
        let (manager, game) = GameManager::new(config.game.clone(), seed);

        (Self { config, game }, manager)
    }
}
