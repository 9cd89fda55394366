//! Player movement physics

use crate::game::constants::{
    GRAVITY, JUMP_FORCE, MOUSE_SENSITIVITY, PLAYER_HEIGHT_OFFSET, PLAYER_SPEED, WORLD_BOUNDARY,
};
use crate::ws::protocol::{Rotation, Vec3};

use super::TickInput;

/// Kinematic state of one player (authoritative)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    pub position: Vec3,
    pub rotation: Rotation,
    pub velocity: Vec3,
    pub on_ground: bool,
}

impl Kinematics {
    /// Standing still on the ground at (x, z)
    pub fn at_rest(x: f32, z: f32) -> Self {
        Self {
            position: Vec3::new(x, PLAYER_HEIGHT_OFFSET, z),
            rotation: Rotation::default(),
            velocity: Vec3::default(),
            on_ground: true,
        }
    }
}

/// Physics system for integrating player movement
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Advance one player by `dt` seconds.
    /// Frozen players keep falling but ignore look and movement input.
    pub fn integrate(state: Kinematics, input: &TickInput, frozen: bool, dt: f32) -> Kinematics {
        let mut next = state;

        if !frozen {
            next.rotation.yaw -= input.mouse_dx * MOUSE_SENSITIVITY;
            next.rotation.pitch -= input.mouse_dy * MOUSE_SENSITIVITY;
            next.rotation.pitch = next
                .rotation
                .pitch
                .clamp(-std::f32::consts::FRAC_PI_2, std::f32::consts::FRAC_PI_2);
        }

        let (vel_x, vel_z) = if frozen {
            (0.0, 0.0)
        } else {
            Self::horizontal_velocity(next.rotation.yaw, input)
        };
        next.velocity.x = vel_x;
        next.velocity.z = vel_z;

        if next.on_ground && input.jump_requested && !frozen {
            next.velocity.y = JUMP_FORCE;
            next.on_ground = false;
        }
        next.velocity.y += GRAVITY * dt;

        next.position.x += next.velocity.x * dt;
        next.position.y += next.velocity.y * dt;
        next.position.z += next.velocity.z * dt;

        if next.position.y <= PLAYER_HEIGHT_OFFSET {
            next.position.y = PLAYER_HEIGHT_OFFSET;
            if next.velocity.y < 0.0 {
                next.velocity.y = 0.0;
            }
            next.on_ground = true;
        } else {
            next.on_ground = false;
        }

        next.position.x = next.position.x.clamp(-WORLD_BOUNDARY, WORLD_BOUNDARY);
        next.position.z = next.position.z.clamp(-WORLD_BOUNDARY, WORLD_BOUNDARY);

        next
    }

    /// Normalized WASD movement relative to yaw, scaled to player speed.
    /// Returns (vel_x, vel_z).
    fn horizontal_velocity(yaw: f32, input: &TickInput) -> (f32, f32) {
        let forward = (yaw.sin(), yaw.cos());
        let right = (forward.1, -forward.0);

        let mut move_x = 0.0;
        let mut move_z = 0.0;
        if input.forward {
            move_x -= forward.0;
            move_z -= forward.1;
        }
        if input.back {
            move_x += forward.0;
            move_z += forward.1;
        }
        if input.left {
            move_x -= right.0;
            move_z -= right.1;
        }
        if input.right {
            move_x += right.0;
            move_z += right.1;
        }

        let magnitude = (move_x * move_x + move_z * move_z).sqrt();
        if magnitude > f32::EPSILON {
            (
                move_x / magnitude * PLAYER_SPEED,
                move_z / magnitude * PLAYER_SPEED,
            )
        } else {
            (0.0, 0.0)
        }
    }

    /// Unit vector the player is looking along
    pub fn look_direction(rotation: &Rotation) -> Vec3 {
        let cos_pitch = rotation.pitch.cos();
        Vec3::new(
            -rotation.yaw.sin() * cos_pitch,
            rotation.pitch.sin(),
            -rotation.yaw.cos() * cos_pitch,
        )
    }
}
