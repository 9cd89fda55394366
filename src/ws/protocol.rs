//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Players are identified by a v4 UUID for the lifetime of their connection
pub type PlayerId = Uuid;

/// World-space vector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Vec3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Look rotation. On the wire `x` is pitch and `y` is yaw.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    #[serde(rename = "x")]
    pub pitch: f32,
    #[serde(rename = "y")]
    pub yaw: f32,
}

/// Player roles within a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Seeker,
    Hider,
}

/// Coarse game lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    /// Waiting for enough players
    Lobby,
    /// Roles assigned, seeker frozen while hiders hide
    Starting,
    /// Seeker released, hits and morphs allowed
    Playing,
    /// Round over, reset countdown running
    Ended,
}

/// Named countdowns driven by the timer service
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerName {
    /// Pre-hunt countdown while the seeker is frozen
    SeekerRelease,
    /// Post-round countdown back to the lobby
    GameReset,
}

/// Accumulated mouse movement since the client's last send
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MouseDelta {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Full keyboard snapshot plus mouse movement
    #[serde(rename_all = "camelCase")]
    PlayerInput {
        /// Key code -> pressed (e.g. "KeyW": true)
        #[serde(default)]
        keyboard: HashMap<String, bool>,
        #[serde(default)]
        mouse_delta: MouseDelta,
    },

    /// Seeker melee swing
    SeekerSwing,

    /// Hider morph into a prop, or back to human form when null
    #[serde(rename_all = "camelCase")]
    HiderMorph { target_prop_id: Option<String> },

    /// Toggle the sender's own frozen flag
    TogglePauseRequest,
}

/// Player state as broadcast to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub player_id: PlayerId,
    pub position: Vec3,
    pub rotation: Rotation,
    pub role: Option<Role>,
    pub morphed_into: Option<String>,
    pub health: i32,
    pub is_frozen: bool,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMsg {
    /// Sent once after the socket is accepted
    #[serde(rename_all = "camelCase")]
    Connected { client_id: PlayerId },

    /// Full world state for a newly connected client
    #[serde(rename_all = "camelCase")]
    InitialState {
        players: Vec<PlayerSnapshot>,
        game_state: GamePhase,
    },

    /// Full roster, every tick
    PlayerUpdateBatch {
        tick: u64,
        players: Vec<PlayerSnapshot>,
    },

    PlayerConnected { player: PlayerSnapshot },

    #[serde(rename_all = "camelCase")]
    PlayerDisconnected { player_id: PlayerId },

    #[serde(rename_all = "camelCase")]
    AssignRole { player_id: PlayerId, role: Role },

    RolesAssigned { players: Vec<PlayerSnapshot> },

    #[serde(rename_all = "camelCase")]
    PlayerHit {
        player_id: PlayerId,
        new_health: i32,
        attacker_id: PlayerId,
    },

    #[serde(rename_all = "camelCase")]
    PlayerCaught {
        caught_hider_id: PlayerId,
        seeker_id: PlayerId,
        new_role: Role,
        caught_prop_id: Option<String>,
    },

    #[serde(rename_all = "camelCase")]
    PlayerMorphed {
        player_id: PlayerId,
        target_prop_id: Option<String>,
    },

    /// Morph refused; the client should reset its predicted form to `current_prop_id`
    #[serde(rename_all = "camelCase")]
    MorphRejected {
        reason: String,
        current_prop_id: Option<String>,
    },

    #[serde(rename_all = "camelCase")]
    PlayerFreezeStateUpdate { is_frozen: bool, message: String },

    GamePauseState { paused: bool, message: String },

    #[serde(rename_all = "camelCase")]
    CountdownUpdate {
        timer_name: TimerName,
        time_left: u32,
        message: String,
    },

    GameStarted { message: String },

    GameEnded { reason: String },

    #[serde(rename_all = "camelCase")]
    GameStateUpdate {
        game_state: GamePhase,
        players: Vec<PlayerSnapshot>,
    },

    GameMessage { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_player_input() {
        let raw = r#"{
            "type": "playerInput",
            "keyboard": {"KeyW": true, "Space": false},
            "mouseDelta": {"x": 4, "y": -2}
        }"#;
        match serde_json::from_str::<ClientMsg>(raw).unwrap() {
            ClientMsg::PlayerInput {
                keyboard,
                mouse_delta,
            } => {
                assert_eq!(keyboard.get("KeyW"), Some(&true));
                assert_eq!(keyboard.get("Space"), Some(&false));
                assert_eq!(mouse_delta.x, 4.0);
                assert_eq!(mouse_delta.y, -2.0);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn player_input_fields_are_optional() {
        let msg: ClientMsg = serde_json::from_str(r#"{"type":"playerInput"}"#).unwrap();
        assert!(matches!(msg, ClientMsg::PlayerInput { ref keyboard, .. } if keyboard.is_empty()));
    }

    #[test]
    fn parses_null_morph_target() {
        let msg: ClientMsg =
            serde_json::from_str(r#"{"type":"hiderMorph","targetPropId":null}"#).unwrap();
        assert!(matches!(msg, ClientMsg::HiderMorph { target_prop_id: None }));
    }

    #[test]
    fn rejects_unknown_type() {
        assert!(serde_json::from_str::<ClientMsg>(r#"{"type":"teleport"}"#).is_err());
        assert!(serde_json::from_str::<ClientMsg>("not json").is_err());
    }

    #[test]
    fn server_messages_use_camel_case_tags() {
        let id = Uuid::new_v4();
        let json = serde_json::to_value(ServerMsg::PlayerHit {
            player_id: id,
            new_health: 75,
            attacker_id: id,
        })
        .unwrap();
        assert_eq!(json["type"], "playerHit");
        assert_eq!(json["newHealth"], 75);

        let json = serde_json::to_value(ServerMsg::CountdownUpdate {
            timer_name: TimerName::SeekerRelease,
            time_left: 3,
            message: "Hunt in: 3s".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "countdownUpdate");
        assert_eq!(json["timerName"], "seekerRelease");
        assert_eq!(json["timeLeft"], 3);
    }

    #[test]
    fn snapshot_rotation_uses_xy() {
        let snapshot = PlayerSnapshot {
            player_id: Uuid::new_v4(),
            position: Vec3::new(1.0, 0.9, -2.0),
            rotation: Rotation {
                pitch: 0.5,
                yaw: 1.5,
            },
            role: Some(Role::Hider),
            morphed_into: None,
            health: 100,
            is_frozen: false,
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["rotation"]["x"], 0.5);
        assert_eq!(json["rotation"]["y"], 1.5);
        assert_eq!(json["role"], "hider");
        assert_eq!(json["isFrozen"], false);
        assert!(json["morphedInto"].is_null());
    }
}
