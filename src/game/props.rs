//! Morphable prop archetypes and their availability

use std::collections::HashMap;

use crate::ws::protocol::{PlayerId, Vec3};

/// Shape of a prop archetype with kind-specific dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    Box { width: f32, height: f32, depth: f32 },
    Cylinder { radius: f32, height: f32 },
    Sphere { radius: f32 },
}

impl Geometry {
    /// (width, height, depth) of the shape's bounding box
    pub fn extents(&self) -> (f32, f32, f32) {
        match *self {
            Geometry::Box {
                width,
                height,
                depth,
            } => (width, height, depth),
            Geometry::Cylinder { radius, height } => (radius * 2.0, height, radius * 2.0),
            Geometry::Sphere { radius } => (radius * 2.0, radius * 2.0, radius * 2.0),
        }
    }

    /// Half the largest dimension
    pub fn approx_radius(&self) -> f32 {
        let (w, h, d) = self.extents();
        w.max(h).max(d) / 2.0
    }

    /// Height of the shape's center above its base
    pub fn center_offset(&self) -> f32 {
        match *self {
            Geometry::Sphere { radius } => radius,
            _ => self.extents().1 / 2.0,
        }
    }
}

/// A prop shape hiders can morph into
#[derive(Debug, Clone, Copy)]
pub struct PropArchetype {
    pub id: &'static str,
    pub name: &'static str,
    pub geometry: Geometry,
    /// Where the prop stands in the level
    pub reference_point: Vec3,
}

impl PropArchetype {
    pub fn approx_radius(&self) -> f32 {
        self.geometry.approx_radius()
    }
}

/// Static catalog, must match the client's prop config
pub const PROP_CATALOG: [PropArchetype; 3] = [
    PropArchetype {
        id: "yellowBox",
        name: "Yellow Box",
        geometry: Geometry::Box {
            width: 0.8,
            height: 0.8,
            depth: 0.8,
        },
        reference_point: Vec3::new(-3.0, 0.4, -2.0),
    },
    PropArchetype {
        id: "magentaCylinder",
        name: "Magenta Cylinder",
        geometry: Geometry::Cylinder {
            radius: 0.5,
            height: 1.5,
        },
        reference_point: Vec3::new(0.0, 0.75, -2.0),
    },
    PropArchetype {
        id: "cyanSphere",
        name: "Cyan Sphere",
        geometry: Geometry::Sphere { radius: 0.6 },
        reference_point: Vec3::new(3.0, 0.6, -2.0),
    },
];

/// Look up an archetype by its wire id
pub fn archetype(id: &str) -> Option<&'static PropArchetype> {
    PROP_CATALOG.iter().find(|p| p.id == id)
}

/// Tracks which archetypes are currently claimed, and by whom
#[derive(Debug, Default)]
pub struct PropRegistry {
    claims: HashMap<&'static str, PlayerId>,
}

impl PropRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_available(&self, prop_id: &str) -> bool {
        archetype(prop_id).is_some() && !self.claims.contains_key(prop_id)
    }

    pub fn holder(&self, prop_id: &str) -> Option<PlayerId> {
        self.claims.get(prop_id).copied()
    }

    /// Claim an archetype for a player. Fails if unknown or held by someone else.
    pub fn claim(&mut self, prop_id: &str, player_id: PlayerId) -> bool {
        let Some(prop) = archetype(prop_id) else {
            return false;
        };
        match self.holder(prop.id) {
            Some(holder) => holder == player_id,
            None => {
                self.claims.insert(prop.id, player_id);
                true
            }
        }
    }

    pub fn release(&mut self, prop_id: &str) {
        self.claims.remove(prop_id);
    }

    pub fn clear(&mut self) {
        self.claims.clear();
    }

    pub fn claimed_count(&self) -> usize {
        self.claims.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn derived_extents() {
        let cylinder = archetype("magentaCylinder").unwrap();
        assert_eq!(cylinder.geometry.extents(), (1.0, 1.5, 1.0));
        assert_eq!(cylinder.approx_radius(), 0.75);
        assert_eq!(cylinder.geometry.center_offset(), 0.75);

        let sphere = archetype("cyanSphere").unwrap();
        assert_eq!(sphere.approx_radius(), 0.6);
        assert_eq!(sphere.geometry.center_offset(), 0.6);

        let bx = archetype("yellowBox").unwrap();
        assert_eq!(bx.approx_radius(), 0.4);
    }

    #[test]
    fn unknown_archetype() {
        assert!(archetype("piano").is_none());
        assert!(!PropRegistry::new().is_available("piano"));
    }

    #[test]
    fn one_claimant_per_archetype() {
        let mut registry = PropRegistry::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert!(registry.claim("yellowBox", a));
        assert!(!registry.is_available("yellowBox"));
        assert!(!registry.claim("yellowBox", b));
        assert_eq!(registry.holder("yellowBox"), Some(a));

        registry.release("yellowBox");
        assert!(registry.is_available("yellowBox"));
        assert!(registry.claim("yellowBox", b));
        assert_eq!(registry.claimed_count(), 1);
    }
}
