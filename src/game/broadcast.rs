//! Addressed delivery of server messages to live connections

use std::collections::HashMap;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

use crate::ws::protocol::{PlayerId, Role, ServerMsg};

use super::GameWorld;

/// Per-connection outbound queue depth
pub const OUTBOUND_BUFFER: usize = 256;

/// Fire-and-forget fan-out keyed by player id.
/// Full or closed connections are skipped, never reported to the caller.
#[derive(Debug, Default)]
pub struct Broadcaster {
    connections: HashMap<PlayerId, mpsc::Sender<ServerMsg>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, player_id: PlayerId, outbound: mpsc::Sender<ServerMsg>) {
        self.connections.insert(player_id, outbound);
    }

    /// Forget a connection. Dropping its sender lets the socket writer finish.
    pub fn unregister(&mut self, player_id: &PlayerId) {
        self.connections.remove(player_id);
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn to_client(&self, player_id: &PlayerId, msg: ServerMsg) {
        if let Some(tx) = self.connections.get(player_id) {
            Self::deliver(player_id, tx, msg);
        }
    }

    pub fn to_all(&self, msg: &ServerMsg) {
        for (id, tx) in &self.connections {
            Self::deliver(id, tx, msg.clone());
        }
    }

    pub fn to_all_except(&self, except: &PlayerId, msg: &ServerMsg) {
        for (id, tx) in self.connections.iter().filter(|(id, _)| *id != except) {
            Self::deliver(id, tx, msg.clone());
        }
    }

    /// Everyone whose current role matches
    pub fn to_role(&self, world: &GameWorld, role: Role, msg: &ServerMsg) {
        for player in world.players.values().filter(|p| p.role == Some(role)) {
            if let Some(tx) = self.connections.get(&player.id) {
                Self::deliver(&player.id, tx, msg.clone());
            }
        }
    }

    fn deliver(player_id: &PlayerId, tx: &mpsc::Sender<ServerMsg>, msg: ServerMsg) {
        match tx.try_send(msg) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                debug!(player_id = %player_id, "Outbound queue full, dropping message");
            }
            Err(TrySendError::Closed(_)) => {
                debug!(player_id = %player_id, "Connection closed, skipping");
            }
        }
    }
}
