//! Mouth and pellet geometry shared by the food states.

use glam::Vec2;

use super::components::{FoodPellet, Position, Sprite, TankRef};
use crate::world::{EntityId, World};

/// Smallest mouth radius regardless of sprite size.
const MIN_MOUTH_RADIUS: f32 = 4.0;

/// Mouth anchor of a fish whose sprite sits at `pos`.
///
/// Facing comes from `face_right` if given, else from which side of the
/// sprite center `target_x` lies on, else from the sprite's native facing.
pub fn mouth_point(
    pos: Vec2,
    sprite: &Sprite,
    face_right: Option<bool>,
    target_x: Option<f32>,
) -> Vec2 {
    let face_right = face_right
        .or_else(|| target_x.map(|tx| tx >= pos.x + sprite.base_w * 0.5))
        .unwrap_or(sprite.faces_right);
    let fx = if face_right {
        sprite.mouth_fx
    } else {
        1.0 - sprite.mouth_fx
    };
    pos + Vec2::new(sprite.base_w * fx, sprite.base_h * sprite.mouth_fy)
}

pub fn mouth_radius(sprite: &Sprite, factor: f32) -> f32 {
    (sprite.base_w.min(sprite.base_h) * factor * 0.5).max(MIN_MOUTH_RADIUS)
}

/// Half the larger sprite side, before any pellet scaling.
pub fn base_radius(sprite: &Sprite) -> f32 {
    sprite.base_w.max(sprite.base_h) * 0.5
}

pub fn pellet_radius(sprite: &Sprite, pellet: &FoodPellet) -> f32 {
    base_radius(sprite) * pellet.radius_scale
}

/// A pellet located from some vantage point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PelletSighting {
    pub id: EntityId,
    pub center: Vec2,
    pub distance: f32,
    /// Scaled eating radius of the pellet.
    pub radius: f32,
    pub nutrition: f32,
}

/// Nearest pellet center to `from`.
///
/// With `vision` set, a pellet only counts when its center lies within
/// `vision` plus its base radius. Ties keep the earliest-created pellet.
pub fn nearest_pellet(world: &World, from: Vec2, vision: Option<f32>) -> Option<PelletSighting> {
    let mut best: Option<PelletSighting> = None;
    for id in world.query::<(FoodPellet, Position, Sprite, TankRef)>() {
        let (Some(pos), Some(sprite), Some(pellet)) = (
            world.get_component::<Position>(id),
            world.get_component::<Sprite>(id),
            world.get_component::<FoodPellet>(id),
        ) else {
            continue;
        };
        let center = sprite.center(pos.0);
        let distance = center.distance(from);
        if let Some(radius) = vision {
            if distance > radius + base_radius(sprite) {
                continue;
            }
        }
        if best.map_or(true, |b| distance < b.distance) {
            best = Some(PelletSighting {
                id,
                center,
                distance,
                radius: pellet_radius(sprite, pellet),
                nutrition: pellet.nutrition,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fish_sprite() -> Sprite {
        Sprite::new("goldfish", 60.0, 40.0)
    }

    #[test]
    fn mouth_mirrors_when_target_is_behind() {
        let sprite = fish_sprite();
        let pos = Vec2::new(100.0, 100.0);
        let right = mouth_point(pos, &sprite, None, Some(500.0));
        let left = mouth_point(pos, &sprite, None, Some(0.0));
        assert!((right.x - 151.0).abs() < 1e-4);
        assert!((left.x - 109.0).abs() < 1e-4);
        assert_eq!(right.y, 120.0);
        // Explicit facing wins over the target.
        let forced = mouth_point(pos, &sprite, Some(true), Some(0.0));
        assert_eq!(forced, right);
    }

    #[test]
    fn mouth_radius_has_a_floor() {
        let tiny = Sprite::new("fry", 8.0, 6.0);
        assert_eq!(mouth_radius(&tiny, 0.35), MIN_MOUTH_RADIUS);
        assert!((mouth_radius(&fish_sprite(), 0.35) - 7.0).abs() < 1e-4);
    }

    #[test]
    fn nearest_pellet_respects_vision_and_creation_order() {
        let mut world = World::new();
        let tank = world.create_entity();
        let spawn = |world: &mut World, x: f32| {
            let e = world.create_entity();
            world.add_component(e, Position::new(x, 0.0));
            world.add_component(e, Sprite::new("pellet", 10.0, 10.0));
            world.add_component(
                e,
                FoodPellet {
                    nutrition: 10.0,
                    radius_scale: 1.0,
                    center_off: Vec2::ZERO,
                },
            );
            world.add_component(e, TankRef(tank));
            e
        };
        let left = spawn(&mut world, -55.0);
        let right = spawn(&mut world, 45.0);
        let far = spawn(&mut world, 400.0);

        let from = Vec2::new(0.0, 5.0);
        let hit = nearest_pellet(&world, from, None).unwrap();
        assert_eq!(hit.id, left);
        assert_eq!(hit.distance, 50.0);
        assert_eq!(hit.radius, 5.0);
        assert_eq!(hit.nutrition, 10.0);
        assert_ne!(hit.id, right);

        let seen = nearest_pellet(&world, Vec2::new(300.0, 5.0), Some(50.0));
        assert_eq!(seen.map(|s| s.id), None);
        let seen = nearest_pellet(&world, Vec2::new(360.0, 5.0), Some(50.0));
        assert_eq!(seen.map(|s| s.id), Some(far));
    }
}
