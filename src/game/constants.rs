//! Gameplay constants shared with the client.
//! These must stay identical to the presentation layer's config.

/// Players needed before a round can start
pub const MIN_PLAYERS: usize = 2;
/// Hard cap on concurrent players (one per spawn point)
pub const MAX_PLAYERS: usize = 10;

/// Simulation ticks per second
pub const TICK_RATE_HZ: u32 = 60;

// World and physics
pub const WORLD_BOUNDARY: f32 = 49.0;
/// Height of a player's center above the ground
pub const PLAYER_HEIGHT_OFFSET: f32 = 0.9;
pub const PLAYER_HEIGHT: f32 = 1.8;
pub const PLAYER_WIDTH: f32 = 0.6;
pub const GRAVITY: f32 = -25.0;
pub const JUMP_FORCE: f32 = 8.0;
pub const PLAYER_SPEED: f32 = 5.0;
pub const MOUSE_SENSITIVITY: f32 = 0.0008;

// Gameplay
pub const MAX_HEALTH: i32 = 100;
pub const HIT_DAMAGE: i32 = 25;
/// Max distance a hider can be from a prop to morph (before adding the prop's radius)
pub const MORPH_RANGE: f32 = 2.5;
pub const SEEKER_SWING_HIT_RADIUS: f32 = 1.0;
pub const SEEKER_SWING_DISTANCE: f32 = 2.0;

// Round timers
pub const SEEKER_PAUSE_DURATION_SECONDS: u32 = 10;
pub const GAME_END_RESET_SECONDS: u32 = 5;

/// Fixed spawn points (x, z), one per player slot
pub const SPAWN_POINTS: [(f32, f32); MAX_PLAYERS] = [
    (0.0, 5.0),
    (5.0, 5.0),
    (-5.0, 5.0),
    (5.0, 0.0),
    (-5.0, 0.0),
    (0.0, 10.0),
    (10.0, 10.0),
    (-10.0, 10.0),
    (10.0, -5.0),
    (-10.0, -5.0),
];
