//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::game::constants::{MAX_PLAYERS, MIN_PLAYERS};
use crate::game::GameSettings;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Round tuning
    pub game: GameSettings,
    /// Fixed seed for seeker selection; random when unset
    pub seed: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = match var("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => var("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
        };

        let defaults = GameSettings::default();
        let game = GameSettings {
            min_players: parse(&var, "MIN_PLAYERS")?.unwrap_or(defaults.min_players),
            max_players: parse(&var, "MAX_PLAYERS")?.unwrap_or(defaults.max_players),
            seeker_pause_seconds: parse(&var, "SEEKER_PAUSE_SECONDS")?
                .unwrap_or(defaults.seeker_pause_seconds),
            game_end_reset_seconds: parse(&var, "GAME_END_RESET_SECONDS")?
                .unwrap_or(defaults.game_end_reset_seconds),
            allow_morph_during_starting: parse(&var, "ALLOW_MORPH_DURING_STARTING")?
                .unwrap_or(defaults.allow_morph_during_starting),
        };

        // A round needs a seeker and a hider; every player needs a spawn point
        if game.min_players < MIN_PLAYERS {
            return Err(ConfigError::Invalid("MIN_PLAYERS"));
        }
        if game.max_players > MAX_PLAYERS || game.max_players < game.min_players {
            return Err(ConfigError::Invalid("MAX_PLAYERS"));
        }

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            game,
            seed: parse(&var, "GAME_SEED")?,
        })
    }
}

fn parse<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    var(name)
        .map(|raw| raw.trim().parse().map_err(|_| ConfigError::Invalid(name)))
        .transpose()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
