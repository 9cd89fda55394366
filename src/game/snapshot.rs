//! Per-tick roster snapshots

use crate::ws::protocol::{PlayerSnapshot, ServerMsg};

use super::GameWorld;

/// Builds the full-roster `playerUpdateBatch` sent every tick
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    tick: u64,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Snapshot the world after this tick's physics
    pub fn build(&mut self, world: &GameWorld) -> ServerMsg {
        self.tick += 1;
        let players: Vec<PlayerSnapshot> = world.snapshots();
        ServerMsg::PlayerUpdateBatch {
            tick: self.tick,
            players,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameSettings;
    use uuid::Uuid;

    #[test]
    fn includes_every_player() {
        let mut world = GameWorld::new(GameSettings::default(), 0);
        world.add_player(Uuid::new_v4()).unwrap();
        world.add_player(Uuid::new_v4()).unwrap();

        let mut builder = SnapshotBuilder::new();
        match builder.build(&world) {
            ServerMsg::PlayerUpdateBatch { tick, players } => {
                assert_eq!(tick, 1);
                assert_eq!(players.len(), 2);
            }
            other => panic!("unexpected: {:?}", other),
        }
        builder.build(&world);
        assert_eq!(builder.tick(), 2);
    }
}
