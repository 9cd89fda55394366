//! Rule engine - seeker swings and hider morphs

use crate::game::constants::{
    HIT_DAMAGE, MAX_HEALTH, MORPH_RANGE, PLAYER_HEIGHT, PLAYER_HEIGHT_OFFSET, PLAYER_WIDTH,
    SEEKER_SWING_DISTANCE, SEEKER_SWING_HIT_RADIUS,
};
use crate::ws::protocol::{GamePhase, PlayerId, Role, Vec3};

use super::physics::PhysicsSystem;
use super::props::{archetype, Geometry};
use super::{GameWorld, Player};

/// Collision shape of an unmorphed player
const HUMANOID: Geometry = Geometry::Box {
    width: PLAYER_WIDTH,
    height: PLAYER_HEIGHT,
    depth: PLAYER_WIDTH,
};

/// Why an action was refused. Rejected actions never touch the world.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActionRejected {
    #[error("Action not allowed during {0:?}")]
    WrongPhase(GamePhase),

    #[error("Unknown player")]
    UnknownPlayer,

    #[error("Only the seeker can swing")]
    NotSeeker,

    #[error("Only hiders can morph")]
    NotHider,

    #[error("You are frozen")]
    Frozen,

    #[error("Unknown prop: {0}")]
    UnknownProp(String),

    #[error("The {0} is already taken")]
    PropTaken(&'static str),

    #[error("Too far from the prop ({distance:.1} > {limit:.1})")]
    OutOfRange { distance: f32, limit: f32 },
}

/// Result of an accepted swing
#[derive(Debug, Clone, PartialEq)]
pub enum SwingOutcome {
    Miss,
    Hit {
        hider_id: PlayerId,
        new_health: i32,
    },
    /// The hit took the hider to zero health; it is now a seeker
    Caught {
        hider_id: PlayerId,
        released_prop: Option<&'static str>,
        hiders_left: usize,
    },
}

/// Result of an accepted morph request
#[derive(Debug, Clone, PartialEq)]
pub enum MorphOutcome {
    Morphed {
        prop_id: &'static str,
        released: Option<&'static str>,
    },
    Unmorphed {
        released: &'static str,
    },
    /// Nothing changed (already in the requested form)
    Unchanged,
}

/// Stateless gameplay rules applied to the world
pub struct RuleEngine;

impl RuleEngine {
    /// Resolve a seeker swing against every hider, stopping at the first hit
    pub fn seeker_swing(
        world: &mut GameWorld,
        seeker_id: PlayerId,
    ) -> Result<SwingOutcome, ActionRejected> {
        if world.phase != GamePhase::Playing {
            return Err(ActionRejected::WrongPhase(world.phase));
        }
        let seeker = world
            .player(&seeker_id)
            .ok_or(ActionRejected::UnknownPlayer)?;
        if world.seeker_id != Some(seeker_id) {
            return Err(ActionRejected::NotSeeker);
        }
        if seeker.is_frozen {
            return Err(ActionRejected::Frozen);
        }

        let strike = Self::strike_point(seeker);
        let target = world
            .players
            .values()
            .filter(|p| p.is_hider())
            .find(|hider| {
                let (center, radius) = Self::hit_volume(hider);
                strike.distance(&center) <= SEEKER_SWING_HIT_RADIUS + radius
            })
            .map(|hider| hider.id);

        let Some(hider_id) = target else {
            return Ok(SwingOutcome::Miss);
        };
        let Some(hider) = world.player_mut(&hider_id) else {
            return Ok(SwingOutcome::Miss);
        };

        hider.health -= HIT_DAMAGE;
        if hider.health > 0 {
            return Ok(SwingOutcome::Hit {
                hider_id,
                new_health: hider.health,
            });
        }

        let released_prop = hider.morphed_into.take();
        hider.role = Some(Role::Seeker);
        hider.health = MAX_HEALTH;
        if let Some(prop_id) = released_prop {
            world.props.release(prop_id);
        }
        world.hider_count = world.hider_count.saturating_sub(1);

        Ok(SwingOutcome::Caught {
            hider_id,
            released_prop,
            hiders_left: world.hider_count,
        })
    }

    /// Point in front of the seeker where the swing lands
    fn strike_point(seeker: &Player) -> Vec3 {
        let origin = seeker.kinematics.position;
        let dir = PhysicsSystem::look_direction(&seeker.kinematics.rotation);
        Vec3::new(
            origin.x + dir.x * SEEKER_SWING_DISTANCE,
            origin.y + dir.y * SEEKER_SWING_DISTANCE,
            origin.z + dir.z * SEEKER_SWING_DISTANCE,
        )
    }

    /// Effective (center, radius) of a hider's current form
    fn hit_volume(hider: &Player) -> (Vec3, f32) {
        let form = hider
            .morphed_into
            .and_then(archetype)
            .map(|prop| prop.geometry)
            .unwrap_or(HUMANOID);

        let pos = hider.kinematics.position;
        let feet = pos.y - PLAYER_HEIGHT_OFFSET;
        (
            Vec3::new(pos.x, feet + form.center_offset(), pos.z),
            form.approx_radius(),
        )
    }

    /// Morph a hider into a prop, or back to human form with `None`
    pub fn hider_morph(
        world: &mut GameWorld,
        hider_id: PlayerId,
        target: Option<&str>,
    ) -> Result<MorphOutcome, ActionRejected> {
        let phase_ok = match world.phase {
            GamePhase::Playing => true,
            GamePhase::Starting => world.settings.allow_morph_during_starting,
            _ => false,
        };
        if !phase_ok {
            return Err(ActionRejected::WrongPhase(world.phase));
        }

        let hider = world
            .player(&hider_id)
            .ok_or(ActionRejected::UnknownPlayer)?;
        if hider.is_frozen {
            return Err(ActionRejected::Frozen);
        }
        if !hider.is_hider() {
            return Err(ActionRejected::NotHider);
        }

        let Some(target) = target else {
            return Ok(match Self::clear_morph(world, hider_id) {
                Some(released) => MorphOutcome::Unmorphed { released },
                None => MorphOutcome::Unchanged,
            });
        };

        let prop =
            archetype(target).ok_or_else(|| ActionRejected::UnknownProp(target.to_string()))?;
        if hider.morphed_into == Some(prop.id) {
            return Ok(MorphOutcome::Unchanged);
        }
        if !world.props.is_available(prop.id) {
            return Err(ActionRejected::PropTaken(prop.name));
        }

        let distance = hider.kinematics.position.distance(&prop.reference_point);
        let limit = MORPH_RANGE + prop.approx_radius();
        if distance > limit {
            return Err(ActionRejected::OutOfRange { distance, limit });
        }

        let released = Self::clear_morph(world, hider_id);
        world.props.claim(prop.id, hider_id);
        if let Some(hider) = world.player_mut(&hider_id) {
            hider.morphed_into = Some(prop.id);
        }

        Ok(MorphOutcome::Morphed {
            prop_id: prop.id,
            released,
        })
    }

    /// Drop a hider's current prop claim, returning the released id
    fn clear_morph(world: &mut GameWorld, player_id: PlayerId) -> Option<&'static str> {
        let released = world.player_mut(&player_id)?.morphed_into.take()?;
        world.props.release(released);
        Some(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::props::PROP_CATALOG;
    use crate::game::GameSettings;
    use uuid::Uuid;

    /// Two-player world in PLAYING with the seeker at the origin facing -z
    fn playing_world() -> (GameWorld, PlayerId, PlayerId) {
        let mut world = GameWorld::new(GameSettings::default(), 3);
        world.add_player(Uuid::new_v4()).unwrap();
        world.add_player(Uuid::new_v4()).unwrap();
        let seeker = world.begin_round().unwrap();
        world.release_seeker();
        let hider = *world.players.keys().find(|id| **id != seeker).unwrap();

        let s = world.player_mut(&seeker).unwrap();
        s.kinematics.position = Vec3::new(0.0, PLAYER_HEIGHT_OFFSET, 0.0);
        s.kinematics.rotation = Default::default();
        (world, seeker, hider)
    }

    fn place(world: &mut GameWorld, id: PlayerId, x: f32, z: f32) {
        world.player_mut(&id).unwrap().kinematics.position = Vec3::new(x, PLAYER_HEIGHT_OFFSET, z);
    }

    #[test]
    fn swing_hits_hider_in_front() {
        let (mut world, seeker, hider) = playing_world();
        place(&mut world, hider, 0.0, -2.0);

        let outcome = RuleEngine::seeker_swing(&mut world, seeker).unwrap();
        assert_eq!(
            outcome,
            SwingOutcome::Hit {
                hider_id: hider,
                new_health: MAX_HEALTH - HIT_DAMAGE
            }
        );
    }

    #[test]
    fn swing_misses_hider_behind() {
        let (mut world, seeker, hider) = playing_world();
        place(&mut world, hider, 0.0, 3.0);

        assert_eq!(
            RuleEngine::seeker_swing(&mut world, seeker).unwrap(),
            SwingOutcome::Miss
        );
        assert_eq!(world.player(&hider).unwrap().health, MAX_HEALTH);
    }

    #[test]
    fn morphed_form_changes_hit_volume() {
        let (mut world, seeker, hider) = playing_world();
        // Humanoid radius 0.9 reaches a strike 1.8 away; the small box (0.4) does not
        place(&mut world, hider, 0.0, -3.8);
        world.player_mut(&hider).unwrap().morphed_into = Some("yellowBox");
        assert_eq!(
            RuleEngine::seeker_swing(&mut world, seeker).unwrap(),
            SwingOutcome::Miss
        );

        world.player_mut(&hider).unwrap().morphed_into = None;
        assert!(matches!(
            RuleEngine::seeker_swing(&mut world, seeker).unwrap(),
            SwingOutcome::Hit { .. }
        ));
    }

    #[test]
    fn lethal_hit_converts_hider() {
        let (mut world, seeker, hider) = playing_world();
        place(&mut world, hider, 0.0, -2.0);
        world.props.claim("cyanSphere", hider);
        {
            let h = world.player_mut(&hider).unwrap();
            h.health = HIT_DAMAGE;
            h.morphed_into = Some("cyanSphere");
        }

        let outcome = RuleEngine::seeker_swing(&mut world, seeker).unwrap();
        assert_eq!(
            outcome,
            SwingOutcome::Caught {
                hider_id: hider,
                released_prop: Some("cyanSphere"),
                hiders_left: 0
            }
        );
        let h = world.player(&hider).unwrap();
        assert_eq!(h.role, Some(Role::Seeker));
        assert_eq!(h.health, MAX_HEALTH);
        assert_eq!(h.morphed_into, None);
        assert_eq!(world.hider_count, 0);
        assert!(world.props.is_available("cyanSphere"));
    }

    #[test]
    fn swing_preconditions() {
        let (mut world, seeker, hider) = playing_world();
        assert_eq!(
            RuleEngine::seeker_swing(&mut world, hider),
            Err(ActionRejected::NotSeeker)
        );

        world.player_mut(&seeker).unwrap().is_frozen = true;
        assert_eq!(
            RuleEngine::seeker_swing(&mut world, seeker),
            Err(ActionRejected::Frozen)
        );

        world.phase = GamePhase::Starting;
        assert_eq!(
            RuleEngine::seeker_swing(&mut world, seeker),
            Err(ActionRejected::WrongPhase(GamePhase::Starting))
        );
    }

    #[test]
    fn morph_and_unmorph_round_trip() {
        let (mut world, _, hider) = playing_world();
        let prop = PROP_CATALOG[1];
        place(&mut world, hider, prop.reference_point.x + 1.0, prop.reference_point.z);

        assert_eq!(
            RuleEngine::hider_morph(&mut world, hider, Some(prop.id)).unwrap(),
            MorphOutcome::Morphed {
                prop_id: prop.id,
                released: None
            }
        );
        assert!(!world.props.is_available(prop.id));

        assert_eq!(
            RuleEngine::hider_morph(&mut world, hider, None).unwrap(),
            MorphOutcome::Unmorphed { released: prop.id }
        );
        assert_eq!(world.player(&hider).unwrap().morphed_into, None);
        assert!(world.props.is_available(prop.id));
    }

    #[test]
    fn morph_out_of_range_is_rejected() {
        let (mut world, _, hider) = playing_world();
        let prop = PROP_CATALOG[0];
        place(&mut world, hider, prop.reference_point.x + 10.0, prop.reference_point.z);

        let err = RuleEngine::hider_morph(&mut world, hider, Some(prop.id)).unwrap_err();
        assert!(matches!(err, ActionRejected::OutOfRange { .. }));
        assert_eq!(world.player(&hider).unwrap().morphed_into, None);
        assert!(world.props.is_available(prop.id));
    }

    #[test]
    fn morph_switch_releases_previous_prop() {
        let (mut world, _, hider) = playing_world();
        // Between the box (-3) and the cylinder (0)
        place(&mut world, hider, -1.5, -2.0);

        RuleEngine::hider_morph(&mut world, hider, Some("yellowBox")).unwrap();
        let outcome = RuleEngine::hider_morph(&mut world, hider, Some("magentaCylinder")).unwrap();
        assert_eq!(
            outcome,
            MorphOutcome::Morphed {
                prop_id: "magentaCylinder",
                released: Some("yellowBox")
            }
        );
        assert!(world.props.is_available("yellowBox"));
    }

    #[test]
    fn taken_and_unknown_props_are_rejected() {
        let mut world = GameWorld::new(GameSettings::default(), 3);
        for _ in 0..3 {
            world.add_player(Uuid::new_v4()).unwrap();
        }
        let seeker = world.begin_round().unwrap();
        world.release_seeker();
        let hiders: Vec<PlayerId> = world
            .players
            .keys()
            .copied()
            .filter(|id| *id != seeker)
            .collect();
        for id in &hiders {
            place(&mut world, *id, 3.0, -2.0);
        }

        RuleEngine::hider_morph(&mut world, hiders[0], Some("cyanSphere")).unwrap();
        assert_eq!(
            RuleEngine::hider_morph(&mut world, hiders[1], Some("cyanSphere")),
            Err(ActionRejected::PropTaken("Cyan Sphere"))
        );
        assert_eq!(
            ActionRejected::PropTaken("Cyan Sphere").to_string(),
            "The Cyan Sphere is already taken"
        );
        assert_eq!(
            RuleEngine::hider_morph(&mut world, hiders[1], Some("piano")),
            Err(ActionRejected::UnknownProp("piano".to_string()))
        );
        assert_eq!(
            PROP_CATALOG
                .iter()
                .map(|p| world.players.values().filter(|h| h.morphed_into == Some(p.id)).count())
                .max(),
            Some(1)
        );
    }

    #[test]
    fn morph_during_starting_is_configurable() {
        let mut world = GameWorld::new(GameSettings::default(), 3);
        world.add_player(Uuid::new_v4()).unwrap();
        world.add_player(Uuid::new_v4()).unwrap();
        let seeker = world.begin_round().unwrap();
        let hider = *world.players.keys().find(|id| **id != seeker).unwrap();
        place(&mut world, hider, 0.0, -2.0);

        assert_eq!(
            RuleEngine::hider_morph(&mut world, hider, Some("magentaCylinder")),
            Err(ActionRejected::WrongPhase(GamePhase::Starting))
        );

        world.settings.allow_morph_during_starting = true;
        assert!(RuleEngine::hider_morph(&mut world, hider, Some("magentaCylinder")).is_ok());
    }

    #[test]
    fn seeker_cannot_morph() {
        let (mut world, seeker, _) = playing_world();
        place(&mut world, seeker, 0.0, -2.0);
        assert_eq!(
            RuleEngine::hider_morph(&mut world, seeker, Some("magentaCylinder")),
            Err(ActionRejected::NotHider)
        );
    }
}
