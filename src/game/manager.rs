//! Game manager: owns the world and runs the authoritative tick loop

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::util::time::tick_duration;
use crate::ws::protocol::{GamePhase, PlayerId, Role, ServerMsg, TimerName};

use super::broadcast::Broadcaster;
use super::player::InputBuffer;
use super::session::EndReason;
use super::snapshot::SnapshotBuilder;
use super::timer::{TimerEvent, TimerService};
use super::{GameCommand, GameSettings, GameWorld};

/// Command queue depth between socket tasks and the game loop
const COMMAND_BUFFER: usize = 1024;

/// Handle used by socket tasks to reach the game loop
#[derive(Clone)]
pub struct GameHandle {
    pub cmd_tx: mpsc::Sender<GameCommand>,
    pub player_count: Arc<AtomicUsize>,
}

impl GameHandle {
    pub fn player_count(&self) -> usize {
        self.player_count.load(Ordering::Relaxed)
    }
}

/// The single writer of all game state
pub struct GameManager {
    pub(super) world: GameWorld,
    pub(super) broadcaster: Broadcaster,
    pub(super) timers: TimerService,
    /// Most recent input per player, folded in at the next tick
    pub(super) inputs: HashMap<PlayerId, InputBuffer>,
    snapshots: SnapshotBuilder,
    cmd_rx: mpsc::Receiver<GameCommand>,
    player_count: Arc<AtomicUsize>,
}

impl GameManager {
    pub fn new(settings: GameSettings, seed: u64) -> (Self, GameHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
        let player_count = Arc::new(AtomicUsize::new(0));

        let handle = GameHandle {
            cmd_tx,
            player_count: player_count.clone(),
        };

        let manager = Self {
            world: GameWorld::new(settings, seed),
            broadcaster: Broadcaster::new(),
            timers: TimerService::new(),
            inputs: HashMap::new(),
            snapshots: SnapshotBuilder::new(),
            cmd_rx,
            player_count,
        };

        (manager, handle)
    }

    /// Run until every handle is dropped. Commands and ticks never interleave.
    pub async fn run(mut self) {
        info!(
            min_players = self.world.settings.min_players,
            max_players = self.world.settings.max_players,
            "Game loop started"
        );

        let step = tick_duration();
        let mut tick_interval = interval(step);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                _ = tick_interval.tick() => self.run_tick(step),
            }
        }

        self.timers.stop_all();
        info!(ticks = self.snapshots.tick(), "Game loop stopped");
    }

    /// One simulation step: input, physics, timers, then the roster broadcast
    pub fn run_tick(&mut self, dt: Duration) {
        for (id, buffer) in self.inputs.iter_mut() {
            if let Some(player) = self.world.player_mut(id) {
                buffer.fold_into(&mut player.input);
            }
        }

        let dt_secs = dt.as_secs_f32();
        for player in self.world.players.values_mut() {
            player.step(dt_secs);
        }

        for event in self.timers.advance(dt) {
            self.handle_timer_event(event);
        }

        let snapshot = self.snapshots.build(&self.world);
        self.broadcaster.to_all(&snapshot);
    }

    fn handle_timer_event(&mut self, event: TimerEvent) {
        if let Some(msg) = event.countdown_msg() {
            self.broadcaster.to_all(&msg);
            return;
        }
        match event {
            TimerEvent::Complete {
                name: TimerName::SeekerRelease,
            } => self.release_hunt(),
            TimerEvent::Complete {
                name: TimerName::GameReset,
            } => self.return_to_lobby(),
            TimerEvent::Tick { .. } => {}
        }
    }

    pub(super) fn sync_player_count(&self) {
        self.player_count
            .store(self.world.player_count(), Ordering::Relaxed);
    }

    pub(super) fn lobby_wait_msg(&self) -> ServerMsg {
        ServerMsg::GamePauseState {
            paused: true,
            message: format!(
                "Waiting for {} more player(s) to connect...",
                self.world.players_needed()
            ),
        }
    }

    /// LOBBY -> STARTING, with role announcements and the release countdown
    pub(super) fn start_round(&mut self) {
        let Some(seeker_id) = self.world.begin_round() else {
            return;
        };

        for player in self.world.players.values() {
            if let Some(role) = player.role {
                self.broadcaster.to_client(
                    &player.id,
                    ServerMsg::AssignRole {
                        player_id: player.id,
                        role,
                    },
                );
            }
        }
        self.broadcaster.to_all(&ServerMsg::RolesAssigned {
            players: self.world.snapshots(),
        });
        self.broadcaster.to_client(
            &seeker_id,
            ServerMsg::PlayerFreezeStateUpdate {
                is_frozen: true,
                message: "You are the Seeker!".to_string(),
            },
        );
        self.broadcaster.to_role(
            &self.world,
            Role::Hider,
            &ServerMsg::GamePauseState {
                paused: false,
                message: "A seeker has been chosen! Hide!".to_string(),
            },
        );

        self.timers.stop(TimerName::GameReset);
        self.timers.start(
            TimerName::SeekerRelease,
            self.world.settings.seeker_pause_seconds,
            "Hunt in: ",
        );
    }

    /// STARTING -> PLAYING
    fn release_hunt(&mut self) {
        let Some(seeker_id) = self.world.release_seeker() else {
            return;
        };
        info!(seeker_id = %seeker_id, "Seeker released");

        self.broadcaster.to_client(
            &seeker_id,
            ServerMsg::PlayerFreezeStateUpdate {
                is_frozen: false,
                message: "Go! The hunt is on!".to_string(),
            },
        );
        self.broadcaster.to_all(&ServerMsg::GameStarted {
            message: "The seeker has been released!".to_string(),
        });
    }

    /// Any phase -> ENDED. Ending twice is a no-op.
    pub(super) fn end_round(&mut self, reason: EndReason) {
        if !self.world.finish_round() {
            return;
        }
        let reason = reason.message();
        info!(reason = %reason, "Round ended");

        self.timers.stop_all();
        self.broadcaster.to_all(&ServerMsg::GameEnded { reason });
        self.timers.start(
            TimerName::GameReset,
            self.world.settings.game_end_reset_seconds,
            "New game in: ",
        );
    }

    /// ENDED -> LOBBY, and straight into a new round if enough players remain
    fn return_to_lobby(&mut self) {
        self.world.reset_to_lobby();
        for buffer in self.inputs.values_mut() {
            *buffer = InputBuffer::default();
        }

        self.broadcaster.to_all(&ServerMsg::GameStateUpdate {
            game_state: GamePhase::Lobby,
            players: self.world.snapshots(),
        });

        if self.world.has_min_players() {
            self.start_round();
        } else {
            debug!(needed = self.world.players_needed(), "Waiting in lobby");
            self.broadcaster.to_all(&self.lobby_wait_msg());
        }
    }
}
