//! Player record and per-connection input buffering

use std::collections::HashMap;

use crate::game::constants::MAX_HEALTH;
use crate::ws::protocol::{MouseDelta, PlayerId, PlayerSnapshot, Role};

use super::physics::{Kinematics, PhysicsSystem};
use super::TickInput;

/// Player state (authoritative)
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub kinematics: Kinematics,
    pub role: Option<Role>,
    /// Claimed prop archetype id, only while a hider
    pub morphed_into: Option<&'static str>,
    pub health: i32,
    pub is_frozen: bool,
    pub spawn_index: usize,
    pub input: TickInput,
}

impl Player {
    pub fn new(id: PlayerId, spawn_index: usize, spawn: (f32, f32)) -> Self {
        Self {
            id,
            kinematics: Kinematics::at_rest(spawn.0, spawn.1),
            role: None,
            morphed_into: None,
            health: MAX_HEALTH,
            is_frozen: false,
            spawn_index,
            input: TickInput::default(),
        }
    }

    pub fn is_hider(&self) -> bool {
        self.role == Some(Role::Hider)
    }

    /// Run one physics step and consume the per-tick parts of the input
    pub fn step(&mut self, dt: f32) {
        self.kinematics =
            PhysicsSystem::integrate(self.kinematics, &self.input, self.is_frozen, dt);
        self.input.mouse_dx = 0.0;
        self.input.mouse_dy = 0.0;
        self.input.jump_requested = false;
    }

    /// Back to lobby defaults, standing on the given spawn point
    pub fn reset(&mut self, spawn: (f32, f32)) {
        self.kinematics = Kinematics::at_rest(spawn.0, spawn.1);
        self.role = None;
        self.morphed_into = None;
        self.health = MAX_HEALTH;
        self.is_frozen = false;
        self.input = TickInput::default();
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            player_id: self.id,
            position: self.kinematics.position,
            rotation: self.kinematics.rotation,
            role: self.role,
            morphed_into: self.morphed_into.map(str::to_string),
            health: self.health,
            is_frozen: self.is_frozen,
        }
    }
}

/// Latest input received from a client since the last tick.
/// Keys are latest-wins, mouse movement accumulates until folded into a tick.
#[derive(Debug, Clone, Default)]
pub struct InputBuffer {
    keys: TickInput,
    jump_requested: bool,
    mouse: MouseDelta,
}

impl InputBuffer {
    pub fn record(&mut self, keyboard: &HashMap<String, bool>, mouse_delta: MouseDelta) {
        let pressed = |code: &str| keyboard.get(code).copied().unwrap_or(false);
        self.keys.forward = pressed("KeyW");
        self.keys.back = pressed("KeyS");
        self.keys.left = pressed("KeyA");
        self.keys.right = pressed("KeyD");
        self.jump_requested |= pressed("Space");

        if mouse_delta.x.is_finite() && mouse_delta.y.is_finite() {
            self.mouse.x += mouse_delta.x;
            self.mouse.y += mouse_delta.y;
        }
    }

    /// Move buffered input into the player's tick input
    pub fn fold_into(&mut self, input: &mut TickInput) {
        input.forward = self.keys.forward;
        input.back = self.keys.back;
        input.left = self.keys.left;
        input.right = self.keys.right;
        input.jump_requested |= std::mem::take(&mut self.jump_requested);
        input.mouse_dx += self.mouse.x;
        input.mouse_dy += self.mouse.y;
        self.mouse = MouseDelta::default();
    }
}
