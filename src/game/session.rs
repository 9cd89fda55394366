//! Game world and round lifecycle

use std::collections::BTreeMap;

use rand::distributions::{Distribution, WeightedIndex};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::game::constants::{
    GAME_END_RESET_SECONDS, MAX_HEALTH, MAX_PLAYERS, MIN_PLAYERS, SEEKER_PAUSE_DURATION_SECONDS,
    SPAWN_POINTS,
};
use crate::ws::protocol::{GamePhase, PlayerId, PlayerSnapshot, Role};

use super::props::PropRegistry;
use super::Player;

/// Weight for the previous round's seeker when picking a new one
const REPEAT_SEEKER_WEIGHT: u32 = 1;
const FRESH_SEEKER_WEIGHT: u32 = 4;

/// Tunable round settings
#[derive(Debug, Clone)]
pub struct GameSettings {
    pub min_players: usize,
    pub max_players: usize,
    pub seeker_pause_seconds: u32,
    pub game_end_reset_seconds: u32,
    /// Accept morph requests while the seeker is still frozen
    pub allow_morph_during_starting: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            min_players: MIN_PLAYERS,
            max_players: MAX_PLAYERS,
            seeker_pause_seconds: SEEKER_PAUSE_DURATION_SECONDS,
            game_end_reset_seconds: GAME_END_RESET_SECONDS,
            allow_morph_during_starting: false,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WorldError {
    #[error("Server is full")]
    ServerFull,

    #[error("Player already connected")]
    AlreadyConnected,
}

/// Why a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    AllHidersCaught,
    HidersLeft,
    SeekerDisconnected,
    NotEnoughPlayers(usize),
}

impl EndReason {
    pub fn message(&self) -> String {
        match self {
            EndReason::AllHidersCaught => "All hiders have been caught!".to_string(),
            EndReason::HidersLeft => "All hiders have left the game.".to_string(),
            EndReason::SeekerDisconnected => "Seeker disconnected.".to_string(),
            EndReason::NotEnoughPlayers(min) => format!("Not enough players (below {}).", min),
        }
    }
}

/// Everything the game loop mutates. Owned by the game manager.
pub struct GameWorld {
    pub settings: GameSettings,
    pub phase: GamePhase,
    pub players: BTreeMap<PlayerId, Player>,
    pub props: PropRegistry,
    pub seeker_id: Option<PlayerId>,
    pub hider_count: usize,
    pub last_seeker_id: Option<PlayerId>,
    spawn_slots: Vec<Option<PlayerId>>,
    rng: ChaCha8Rng,
}

impl GameWorld {
    pub fn new(settings: GameSettings, seed: u64) -> Self {
        let slots = settings.max_players.min(SPAWN_POINTS.len());
        Self {
            settings,
            phase: GamePhase::Lobby,
            players: BTreeMap::new(),
            props: PropRegistry::new(),
            seeker_id: None,
            hider_count: 0,
            last_seeker_id: None,
            spawn_slots: vec![None; slots],
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn player_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn has_min_players(&self) -> bool {
        self.players.len() >= self.settings.min_players
    }

    /// Players still needed before a round can start
    pub fn players_needed(&self) -> usize {
        self.settings.min_players.saturating_sub(self.players.len())
    }

    pub fn snapshots(&self) -> Vec<PlayerSnapshot> {
        self.players.values().map(Player::snapshot).collect()
    }

    /// Add a player on the first free spawn point
    pub fn add_player(&mut self, id: PlayerId) -> Result<&Player, WorldError> {
        if self.players.contains_key(&id) {
            return Err(WorldError::AlreadyConnected);
        }
        let spawn_index = self
            .spawn_slots
            .iter()
            .position(Option::is_none)
            .ok_or(WorldError::ServerFull)?;
        self.spawn_slots[spawn_index] = Some(id);

        let player = self
            .players
            .entry(id)
            .or_insert(Player::new(id, spawn_index, SPAWN_POINTS[spawn_index]));
        Ok(&*player)
    }

    /// Remove a player, releasing its spawn point, prop claim and role.
    pub fn remove_player(&mut self, id: &PlayerId) -> Option<Player> {
        let player = self.players.remove(id)?;

        if let Some(slot) = self.spawn_slots.get_mut(player.spawn_index) {
            *slot = None;
        }
        if let Some(prop_id) = player.morphed_into {
            self.props.release(prop_id);
        }
        if player.is_hider() {
            self.hider_count = self.hider_count.saturating_sub(1);
        }
        if self.seeker_id == Some(player.id) {
            self.seeker_id = None;
        }

        Some(player)
    }

    /// LOBBY -> STARTING. Picks the seeker, makes everyone else a hider and
    /// freezes the seeker for the countdown. Returns the seeker id.
    pub fn begin_round(&mut self) -> Option<PlayerId> {
        if self.phase != GamePhase::Lobby || !self.has_min_players() {
            return None;
        }

        let seeker_id = self.pick_seeker()?;
        self.props.clear();
        self.hider_count = 0;

        for player in self.players.values_mut() {
            let role = if player.id == seeker_id {
                Role::Seeker
            } else {
                Role::Hider
            };
            player.role = Some(role);
            player.health = MAX_HEALTH;
            player.morphed_into = None;
            player.is_frozen = role == Role::Seeker;
            if role == Role::Hider {
                self.hider_count += 1;
            }
        }

        self.seeker_id = Some(seeker_id);
        self.last_seeker_id = Some(seeker_id);
        self.phase = GamePhase::Starting;

        info!(
            seeker_id = %seeker_id,
            hiders = self.hider_count,
            "Roles assigned, round starting"
        );
        Some(seeker_id)
    }

    /// Weighted pick that favours anyone but the previous seeker
    fn pick_seeker(&mut self) -> Option<PlayerId> {
        let candidates: Vec<PlayerId> = self.players.keys().copied().collect();
        match candidates.len() {
            0 => None,
            1 => Some(candidates[0]),
            _ => {
                let weights = candidates.iter().map(|id| {
                    if Some(*id) == self.last_seeker_id {
                        REPEAT_SEEKER_WEIGHT
                    } else {
                        FRESH_SEEKER_WEIGHT
                    }
                });
                let dist = WeightedIndex::new(weights).ok()?;
                Some(candidates[dist.sample(&mut self.rng)])
            }
        }
    }

    /// STARTING -> PLAYING. Unfreezes the seeker and returns its id.
    pub fn release_seeker(&mut self) -> Option<PlayerId> {
        if self.phase != GamePhase::Starting {
            return None;
        }
        self.phase = GamePhase::Playing;

        let seeker_id = self.seeker_id?;
        if let Some(seeker) = self.players.get_mut(&seeker_id) {
            seeker.is_frozen = false;
        }
        Some(seeker_id)
    }

    /// Enter ENDED. Returns false if the round had already ended.
    /// Roles stay visible until the reset, but nobody is the designated
    /// seeker and no hiders are counted any more.
    pub fn finish_round(&mut self) -> bool {
        if self.phase == GamePhase::Ended {
            return false;
        }
        self.phase = GamePhase::Ended;
        self.seeker_id = None;
        self.hider_count = 0;
        true
    }

    /// ENDED -> LOBBY. Clears roles and props and puts everyone back on their spawn.
    pub fn reset_to_lobby(&mut self) {
        self.phase = GamePhase::Lobby;
        self.seeker_id = None;
        self.hider_count = 0;
        let released_props = self.props.claimed_count();
        self.props.clear();
        for player in self.players.values_mut() {
            player.reset(SPAWN_POINTS[player.spawn_index]);
        }
        debug!(players = self.players.len(), released_props, "World reset to lobby");
    }

    /// Round-ending check after a player left. A departed seeker wins over
    /// every other reason.
    pub fn departure_end_reason(&self) -> Option<EndReason> {
        if !matches!(self.phase, GamePhase::Starting | GamePhase::Playing) {
            return None;
        }
        if self.seeker_id.is_none() {
            Some(EndReason::SeekerDisconnected)
        } else if !self.has_min_players() {
            Some(EndReason::NotEnoughPlayers(self.settings.min_players))
        } else if self.hider_count == 0 {
            Some(EndReason::HidersLeft)
        } else {
            None
        }
    }

    pub fn count_role(&self, role: Role) -> usize {
        self.players
            .values()
            .filter(|p| p.role == Some(role))
            .count()
    }
}
