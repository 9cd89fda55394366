//! Command and client-message dispatch for the game loop

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::ws::protocol::{
    ClientMsg, GamePhase, MouseDelta, PlayerId, Role, ServerMsg, TimerName,
};

use super::player::InputBuffer;
use super::rules::{MorphOutcome, RuleEngine, SwingOutcome};
use super::session::EndReason;
use super::{GameCommand, GameManager};

impl GameManager {
    pub fn handle_command(&mut self, cmd: GameCommand) {
        match cmd {
            GameCommand::Connect {
                player_id,
                outbound,
            } => self.on_connect(player_id, outbound),
            GameCommand::Client { player_id, msg } => self.on_client_msg(player_id, msg),
            GameCommand::Disconnect { player_id } => self.on_disconnect(player_id),
        }
    }

    fn on_connect(&mut self, player_id: PlayerId, outbound: mpsc::Sender<ServerMsg>) {
        let player = match self.world.add_player(player_id) {
            Ok(player) => player.snapshot(),
            Err(e) => {
                warn!(player_id = %player_id, error = %e, "Connection refused");
                // Dropping `outbound` after this closes the socket
                let _ = outbound.try_send(ServerMsg::GameMessage {
                    message: e.to_string(),
                });
                return;
            }
        };

        info!(
            player_id = %player_id,
            players = self.world.player_count(),
            "Player joined"
        );

        self.broadcaster.register(player_id, outbound);
        self.inputs.insert(player_id, InputBuffer::default());
        self.sync_player_count();

        self.broadcaster.to_client(
            &player_id,
            ServerMsg::Connected {
                client_id: player_id,
            },
        );
        self.broadcaster.to_client(
            &player_id,
            ServerMsg::InitialState {
                players: self.world.snapshots(),
                game_state: self.world.phase,
            },
        );
        self.broadcaster
            .to_all_except(&player_id, &ServerMsg::PlayerConnected { player });

        match self.world.phase {
            GamePhase::Lobby if self.world.has_min_players() => self.start_round(),
            GamePhase::Lobby => self.broadcaster.to_all(&self.lobby_wait_msg()),
            _ => {
                let message = match self.timers.time_left(TimerName::GameReset) {
                    Some(secs) => format!("Round over. Next round in {}s.", secs),
                    None => "Game in progress. You will join the next round.".to_string(),
                };
                self.broadcaster
                    .to_client(&player_id, ServerMsg::GameMessage { message });
            }
        }
    }

    fn on_disconnect(&mut self, player_id: PlayerId) {
        self.broadcaster.unregister(&player_id);
        self.inputs.remove(&player_id);

        if self.world.remove_player(&player_id).is_none() {
            return;
        }
        self.sync_player_count();
        info!(
            player_id = %player_id,
            players = self.world.player_count(),
            connections = self.broadcaster.connection_count(),
            "Player left"
        );

        self.broadcaster
            .to_all(&ServerMsg::PlayerDisconnected { player_id });

        if let Some(reason) = self.world.departure_end_reason() {
            self.end_round(reason);
        } else if self.world.phase == GamePhase::Lobby {
            self.broadcaster.to_all(&self.lobby_wait_msg());
        }
    }

    fn on_client_msg(&mut self, player_id: PlayerId, msg: ClientMsg) {
        if self.world.player(&player_id).is_none() {
            debug!(player_id = %player_id, "Message from unknown player");
            return;
        }

        match msg {
            ClientMsg::PlayerInput {
                keyboard,
                mouse_delta,
            } => self.on_player_input(player_id, &keyboard, mouse_delta),
            ClientMsg::SeekerSwing => self.on_seeker_swing(player_id),
            ClientMsg::HiderMorph { target_prop_id } => {
                self.on_hider_morph(player_id, target_prop_id.as_deref())
            }
            ClientMsg::TogglePauseRequest => self.on_toggle_pause(player_id),
        }
    }

    fn on_player_input(
        &mut self,
        player_id: PlayerId,
        keyboard: &std::collections::HashMap<String, bool>,
        mouse_delta: MouseDelta,
    ) {
        self.inputs
            .entry(player_id)
            .or_default()
            .record(keyboard, mouse_delta);
    }

    fn on_seeker_swing(&mut self, seeker_id: PlayerId) {
        let outcome = match RuleEngine::seeker_swing(&mut self.world, seeker_id) {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(player_id = %seeker_id, reason = %e, "Swing rejected");
                return;
            }
        };

        match outcome {
            SwingOutcome::Miss => {
                debug!(player_id = %seeker_id, "Swing missed");
            }
            SwingOutcome::Hit {
                hider_id,
                new_health,
            } => {
                debug!(player_id = %seeker_id, hider_id = %hider_id, new_health, "Hider hit");
                self.broadcaster.to_all(&ServerMsg::PlayerHit {
                    player_id: hider_id,
                    new_health,
                    attacker_id: seeker_id,
                });
            }
            SwingOutcome::Caught {
                hider_id,
                released_prop,
                hiders_left,
            } => {
                info!(
                    player_id = %seeker_id,
                    hider_id = %hider_id,
                    hiders_left,
                    "Hider caught"
                );
                // Health on the wire bottoms out at zero before the conversion
                self.broadcaster.to_all(&ServerMsg::PlayerHit {
                    player_id: hider_id,
                    new_health: 0,
                    attacker_id: seeker_id,
                });
                self.broadcaster.to_all(&ServerMsg::PlayerCaught {
                    caught_hider_id: hider_id,
                    seeker_id,
                    new_role: Role::Seeker,
                    caught_prop_id: released_prop.map(str::to_string),
                });
                self.broadcaster.to_client(
                    &hider_id,
                    ServerMsg::AssignRole {
                        player_id: hider_id,
                        role: Role::Seeker,
                    },
                );

                if hiders_left == 0 {
                    self.end_round(EndReason::AllHidersCaught);
                }
            }
        }
    }

    fn on_hider_morph(&mut self, hider_id: PlayerId, target: Option<&str>) {
        match RuleEngine::hider_morph(&mut self.world, hider_id, target) {
            Ok(MorphOutcome::Morphed { prop_id, released }) => {
                debug!(player_id = %hider_id, prop_id, ?released, "Hider morphed");
                self.broadcaster.to_all(&ServerMsg::PlayerMorphed {
                    player_id: hider_id,
                    target_prop_id: Some(prop_id.to_string()),
                });
            }
            Ok(MorphOutcome::Unmorphed { released }) => {
                debug!(player_id = %hider_id, released, "Hider unmorphed");
                self.broadcaster.to_all(&ServerMsg::PlayerMorphed {
                    player_id: hider_id,
                    target_prop_id: None,
                });
            }
            Ok(MorphOutcome::Unchanged) => {}
            Err(e) => {
                debug!(player_id = %hider_id, reason = %e, "Morph rejected");
                // Correct the client's optimistic prediction
                let current_prop_id = self
                    .world
                    .player(&hider_id)
                    .and_then(|p| p.morphed_into)
                    .map(str::to_string);
                self.broadcaster.to_client(
                    &hider_id,
                    ServerMsg::MorphRejected {
                        reason: e.to_string(),
                        current_prop_id,
                    },
                );
            }
        }
    }

    fn on_toggle_pause(&mut self, player_id: PlayerId) {
        let holding_seeker = self.world.phase == GamePhase::Starting
            && self.world.seeker_id == Some(player_id);
        if holding_seeker {
            self.broadcaster.to_client(
                &player_id,
                ServerMsg::GameMessage {
                    message: "Wait for the countdown to finish.".to_string(),
                },
            );
            return;
        }

        let Some(player) = self.world.player_mut(&player_id) else {
            return;
        };
        player.is_frozen = !player.is_frozen;
        let is_frozen = player.is_frozen;
        debug!(player_id = %player_id, is_frozen, "Pause toggled");

        self.broadcaster.to_client(
            &player_id,
            ServerMsg::PlayerFreezeStateUpdate {
                is_frozen,
                message: if is_frozen { "Game Paused" } else { "Game Resumed" }.to_string(),
            },
        );
    }
}
