//! Game simulation modules

pub mod broadcast;
pub mod constants;
pub mod manager;
pub mod physics;
pub mod player;
pub mod props;
pub mod router;
pub mod rules;
pub mod session;
pub mod snapshot;
pub mod timer;

pub use manager::{GameHandle, GameManager};
pub use player::Player;
pub use session::{GameSettings, GameWorld};

use tokio::sync::mpsc;

use crate::ws::protocol::{ClientMsg, PlayerId, ServerMsg};

/// Events from socket tasks into the game loop
#[derive(Debug)]
pub enum GameCommand {
    /// A socket was accepted; `outbound` delivers messages back to it
    Connect {
        player_id: PlayerId,
        outbound: mpsc::Sender<ServerMsg>,
    },
    /// A parsed client message
    Client { player_id: PlayerId, msg: ClientMsg },
    /// The socket closed or errored
    Disconnect { player_id: PlayerId },
}

/// Input applied to a player for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    /// Edge-triggered, cleared once the integrator has seen it
    pub jump_requested: bool,
    pub mouse_dx: f32,
    pub mouse_dy: f32,
}
