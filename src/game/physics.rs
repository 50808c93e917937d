//! Rigidbody physics
//!
//! Semi-implicit integration with axis-independent AABB resolution.
//! Each tick a rigid body computes its step displacement, tests it
//! against every collidable entity, and only then moves: obstacles clamp
//! the step to exact contact, other rigid bodies are detect-only and the
//! combat code decides what the contact means.

use macroquad::prelude::*;

use super::entity::{Body, Entity};
use super::store::{EntityId, EntityStore};
use super::EPSILON;

pub fn sign(value: f32) -> f32 {
    if value < 0.0 {
        -1.0
    } else if value > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Test and optionally resolve `body` moving by `step` against a box.
///
/// The two axes are handled independently: the horizontal pass requires
/// vertical overlap at the stepped position, the vertical pass requires
/// horizontal overlap at the current position, and each direction only
/// triggers when the body starts outside the box on that side. With
/// `resolve` the step is clamped to exact contact and the velocity
/// component zeroed; landing on top of the box sets `is_grounded`.
pub fn box_collision(
    body: &mut Body,
    other_p: Vec2,
    other_size: Vec2,
    step: &mut Vec2,
    resolve: bool,
) -> bool {
    let mut found = false;
    let step_position = body.position + *step;

    if step_position.y + body.size.y > other_p.y && step_position.y < other_p.y + other_size.y {
        if step.x < 0.0 && body.position.x >= other_p.x + other_size.x {
            let x_overlap = other_p.x + other_size.x - step_position.x;
            if x_overlap > 0.0 {
                if resolve {
                    step.x = other_p.x + other_size.x - body.position.x;
                    body.velocity.x = 0.0;
                }
                found = true;
            }
        } else if step.x > 0.0 && body.position.x + body.size.x <= other_p.x {
            let x_overlap = step_position.x - other_p.x + body.size.x;
            if x_overlap > 0.0 {
                if resolve {
                    step.x = other_p.x - body.size.x - body.position.x;
                    body.velocity.x = 0.0;
                }
                found = true;
            }
        }
    }

    if body.position.x + body.size.x > other_p.x && body.position.x < other_p.x + other_size.x {
        if step.y < 0.0
            && body.position.y < other_p.y + other_size.y
            && body.position.y + body.size.y > other_p.y
        {
            let y_overlap = step_position.y - other_p.y + other_size.y;
            if y_overlap > 0.0 {
                if resolve {
                    step.y = other_p.y + other_size.y - body.position.y;
                    body.velocity.y = 0.0;
                }
                found = true;
            }
        } else if step.y > 0.0 && body.position.y + body.size.y <= other_p.y {
            let y_overlap = step_position.y - other_p.y + body.size.y;
            if y_overlap > 0.0 {
                if resolve {
                    step.y = other_p.y - body.size.y - body.position.y;
                    body.velocity.y = 0.0;
                    body.is_grounded = true;
                }
                found = true;
            }
        }
    }

    found
}

/// Run `entity`'s step against every collidable entity in the store,
/// filling the entity's collision cache. Exceptions: the gunner and
/// bullets pass through each other, and dead rigid bodies collide with
/// nothing.
pub fn check_collisions(
    store: &EntityStore,
    self_id: EntityId,
    entity: &mut Entity,
    step: &mut Vec2,
) -> bool {
    let mut result = false;
    entity.body.collided = false;
    entity.body.collided_with = EntityId::NULL;

    for j in 0..store.len() {
        let Some(other_id) = store.id_at(j) else {
            break;
        };
        if other_id == self_id {
            continue;
        }
        let Some(other) = store.at(j) else {
            break;
        };

        if !(other.body.is_rigidbody || other.is_obstacle()) {
            continue;
        }

        if (entity.is_player() && other.is_bullet())
            || (entity.is_bullet() && other.is_player())
            || (entity.body.is_rigidbody && entity.health <= 0)
            || (other.body.is_rigidbody && other.health <= 0)
        {
            continue;
        }

        let resolve = !other.body.is_rigidbody;
        if box_collision(&mut entity.body, other.body.position, other.body.size, step, resolve) {
            entity.body.collided = true;
            entity.body.collided_with = other_id;
            result = true;
        }
    }

    result
}

/// One integration step for a rigid body: collide, move, accelerate,
/// advance the walk animation, then clamp and damp horizontal motion.
pub fn step_rigidbody(store: &EntityStore, self_id: EntityId, entity: &mut Entity, dt: f32) {
    if !entity.body.is_rigidbody {
        return;
    }

    let mut step = entity.body.velocity * dt + entity.body.acceleration * (dt * dt * 0.5);
    entity.body.is_grounded = false;
    check_collisions(store, self_id, entity, &mut step);

    entity.body.position += step;
    entity.body.velocity += entity.body.acceleration * dt;

    if entity.sprite.num_frames > 0 {
        let sprite = &mut entity.sprite;
        sprite.frame += step.x * sprite.frame_advance_rate;
        if step.x.abs() <= 0.01 {
            sprite.frame = 0.0;
        }
        let frames = sprite.num_frames as f32;
        if sprite.frame > frames {
            sprite.frame -= frames;
        }
        if sprite.frame < 0.0 {
            sprite.frame += frames;
        }
    }

    let body = &mut entity.body;
    if body.velocity.x.abs() > body.max_speed.x {
        body.velocity.x = sign(body.velocity.x) * body.max_speed.x;
    }

    // Pushing against the current motion counts double (sharper turns)
    if body.acceleration.x.abs() > EPSILON
        && body.velocity.x.abs() > EPSILON
        && sign(body.acceleration.x) != sign(body.velocity.x)
    {
        body.acceleration.x *= 2.0;
    }

    if body.acceleration.x.abs() < EPSILON {
        body.velocity.x *= 0.8;
    }
}

/// 2D slab test: distance along `direction` where the ray enters the
/// box, if it does. Degenerate directions never hit.
pub fn ray_box_intersection(
    origin: Vec2,
    direction: Vec2,
    box_min: Vec2,
    box_max: Vec2,
) -> Option<f32> {
    if direction.length_squared() < EPSILON {
        return None;
    }

    let t1 = (box_min.x - origin.x) / direction.x;
    let t2 = (box_max.x - origin.x) / direction.x;
    let t3 = (box_min.y - origin.y) / direction.y;
    let t4 = (box_max.y - origin.y) / direction.y;

    let t_min = t1.min(t2).max(t3.min(t4));
    let t_max = t1.max(t2).min(t3.max(t4));

    if t_max < 0.0 || t_min > t_max {
        return None;
    }
    Some(t_min.max(0.0))
}
