//! Per-kind entity behaviors
//!
//! One method per entity kind, called from the tick loop with a copy of
//! the entity being updated. Behaviors may freely mutate *other* entities
//! through the store (damage, knockback, shooting); the entity itself is
//! written back by the caller after physics.
//!
//! The gunner is AI-driven while the dragon is under direct control, and
//! takes keyboard input when control is toggled the other way.

use std::f32::consts::PI;

use macroquad::prelude::*;

use crate::input::{Action, InputState};

use super::entity::{Entity, EntityKind, PlayerState, NUM_ATTACK_SLOTS};
use super::physics::{ray_box_intersection, sign};
use super::state::{ControlMode, GameState};
use super::store::EntityId;

/// Jump arc tuning: apex height in tiles and time to reach it.
pub const JUMP_HEIGHT: f32 = 4.8;
pub const TIME_TO_JUMP_APEX: f32 = 0.9;

impl GameState {
    pub(crate) fn update_player(&mut self, entity: &mut Entity, input: &InputState, dt: f32) {
        let EntityKind::Player(mut state) = entity.kind else {
            return;
        };

        let initial_velocity = (-2.0 * JUMP_HEIGHT) / TIME_TO_JUMP_APEX;
        let jump_gravity = (2.0 * JUMP_HEIGHT) / (TIME_TO_JUMP_APEX * TIME_TO_JUMP_APEX);
        // Falling is heavier than rising, makes the jump feel snappy
        let gravity = jump_gravity * 2.0;

        entity.body.acceleration.y = 0.0;
        entity.body.acceleration.x = 0.0;

        match self.mode {
            ControlMode::IntroCutscene => {
                // Scripted walk-in: back off, then watch the dragon arrive
                if self.cutscene_interval(0.4, 2.5) {
                    entity.body.acceleration.x = -16.0;
                    entity.body.facing = -1.0;
                } else if self.cutscene_interval(3.5, 5.5) {
                    entity.body.facing = 1.0;
                } else {
                    entity.body.facing = -1.0;
                }
            }
            ControlMode::Player => {
                if input.down(Action::Left) {
                    entity.body.acceleration.x = -16.0;
                    entity.body.facing = -1.0;
                }
                if input.down(Action::Right) {
                    entity.body.acceleration.x = 16.0;
                    entity.body.facing = 1.0;
                }

                if entity.body.is_jumping
                    && (entity.body.velocity.y > 0.0 || !input.down(Action::Jump))
                {
                    entity.body.is_jumping = false;
                }

                if entity.body.is_grounded && input.pressed(Action::Jump) {
                    entity.body.velocity.y = initial_velocity;
                    entity.body.is_jumping = true;
                }
            }
            ControlMode::Boss => {
                self.update_player_ai(entity, &mut state, dt, initial_velocity);
            }
        }

        entity.body.acceleration.y = if entity.body.is_jumping {
            jump_gravity
        } else {
            gravity
        };

        entity.kind = EntityKind::Player(state);
    }

    /// Gunner combat AI, active while the dragon is player-controlled.
    fn update_player_ai(
        &mut self,
        entity: &mut Entity,
        state: &mut PlayerState,
        dt: f32,
        initial_velocity: f32,
    ) {
        let Some(boss) = self.store.get(self.boss).copied() else {
            return;
        };

        let dist = entity.body.center() - boss.body.center();
        let boss_attacking = matches!(boss.kind, EntityKind::Boss(b) if b.is_attacking);

        let mut attack = false;
        let mut jump = false;
        let mut move_x = 0.0f32;

        let mut accuracy = 2.0 - dist.x.abs().min(dist.y.abs());
        let charge_accuracy = 4.0 - dist.x.abs().min(dist.y.abs());

        // Too far to hit
        if dist.x.abs().max(dist.y.abs()) > 7.0 {
            accuracy = -1.0;
        }

        // No accuracy when facing away from the dragon
        if dist.y.abs() < 2.0 && entity.body.facing == sign(dist.x) {
            accuracy = -1.0;
        }

        let mut go_to_attack = true;
        if entity.invincibility_frames > 0 || boss_attacking {
            go_to_attack = false;

            // The breath only burns forward, so behind the dragon is safe
            if boss_attacking && sign(dist.x) != boss.body.facing {
                go_to_attack = true;
            }
        }

        // At a safe distance attack anyway
        if dist.x.abs() > 7.0 || dist.y.abs() > 7.0 {
            go_to_attack = true;
        }

        if go_to_attack {
            state.is_cornered = false;
        }

        let mut shoot_upwards = false;
        if go_to_attack {
            attack = accuracy > 0.0;

            if dist.y.abs() > 5.0 {
                shoot_upwards = true;

                if dist.y.abs() > 7.0 {
                    jump = self.rng.next_f32() <= 0.01;
                }

                if dist.x.abs() > 0.5 {
                    move_x = -sign(dist.x);
                }
            } else if dist.x.abs() > 3.0 {
                if dist.y.abs() > 2.0 {
                    jump = true;
                }

                if dist.x.abs() > 7.0 {
                    move_x = -sign(dist.x);
                }
            } else {
                move_x = sign(dist.x);
            }
        } else {
            // Move away from danger
            // TODO: better corner handling
            if entity.body.position.x < 3.0 || entity.body.position.x > 19.0 || state.is_cornered {
                // Head for the middle of the arena until it is safe again
                state.is_cornered = true;
                let escape_x = entity.body.position.x - 11.0;
                move_x = -sign(escape_x);
            } else {
                move_x = sign(dist.x);
            }
        }

        state.is_attacking = false;
        for j in 0..NUM_ATTACK_SLOTS {
            if state.attack[j].time_left > 0.0 {
                state.is_attacking = true;
                state.attack[j].time_left -= dt;

                if j == 1 && entity.invincibility_frames > 0 {
                    // Taking a hit interrupts the charge-up
                    state.attack[1].time_left = 0.0;
                    continue;
                }

                // Charge-up finished, release the big shot
                if j == 1 && state.attack[1].time_left <= 0.0 {
                    self.shoot_bullet(entity, self.charged_bullet, dist.y.abs() > 3.0);
                }
            }

            if state.attack[j].cooldown > 0.0 {
                state.attack[j].cooldown -= dt;
            }
        }

        // In-flight bullets burn down their lifetime
        for id in self.bullets {
            if let Some(bullet) = self.store.get_mut(id) {
                if bullet.health > 0 {
                    bullet.health -= 1;
                }
            }
        }

        let is_charging = state.attack[1].time_left > 0.0;
        if is_charging {
            self.charge_particles.origin = entity.body.position
                + vec2(if entity.body.facing > 0.0 { 1.0 } else { 0.0 }, 1.0);
        }
        self.charge_particles.update(&mut self.rng, is_charging);

        if !state.is_attacking {
            // Initiate a new attack
            if entity.invincibility_frames <= 0 && attack && state.attack[0].cooldown <= 0.0 {
                state.attack[0].time_left = 0.3;
                state.attack[0].cooldown = 0.5;
                state.is_attacking = true;

                let far_dist = dist.x.abs().max(dist.y.abs());

                // Charge the big shot when there is a good chance to land it
                let charged_ready = self
                    .store
                    .get(self.charged_bullet)
                    .map_or(false, |b| b.health <= 0);
                if charge_accuracy > 0.25
                    && (boss_attacking || far_dist > 4.0)
                    && charged_ready
                    && entity.body.is_grounded
                    && state.attack[1].cooldown <= 0.0
                {
                    state.attack[1].time_left = self.rng.next_f32() * 0.6 + 0.5;
                    state.attack[0].cooldown = 2.0;
                    state.attack[1].cooldown = 3.0;
                } else {
                    // Find an available bullet
                    for id in self.bullets {
                        let available = self.store.get(id).map_or(false, |b| b.health <= 0);
                        if available {
                            self.shoot_bullet(entity, id, shoot_upwards);
                            state.attack[0].cooldown = self.rng.next_f32() * 2.0;
                            break;
                        }
                    }
                }
            }

            entity.body.acceleration.x = move_x * 16.0;
            if move_x != 0.0 {
                entity.body.facing = sign(move_x);
            } else {
                entity.body.facing = -sign(dist.x);
            }

            if entity.body.is_grounded && jump {
                entity.body.velocity.y = initial_velocity;
                entity.body.is_jumping = true;
            }
        }
    }

    /// Activate a pooled bullet at the shooter's muzzle. `upward` is the
    /// anti-air variant; facing 0 marks the bullet as travelling up.
    pub(crate) fn shoot_bullet(&mut self, shooter: &Entity, bullet_id: EntityId, upward: bool) {
        let Some(bullet) = self.store.get_mut(bullet_id) else {
            return;
        };

        bullet.health = if matches!(bullet.kind, EntityKind::ChargedBullet) {
            100
        } else {
            30
        };
        let muzzle_x = if upward && shooter.body.facing == 1.0 {
            1.3
        } else {
            0.0
        };
        bullet.body.position = shooter.body.position + vec2(muzzle_x, 0.75);

        if upward {
            bullet.sprite.rotation = 90.0;
            bullet.body.facing = 0.0;
        } else {
            bullet.body.facing = shooter.body.facing;
            bullet.sprite.rotation = 0.0;
        }
    }

    pub(crate) fn update_bullet(&mut self, entity: &mut Entity) {
        // Bullets fly at constant speed, no gravity
        entity.body.velocity = Vec2::ZERO;

        let speed = if matches!(entity.kind, EntityKind::ChargedBullet) {
            20.0
        } else {
            12.0
        };
        if entity.body.facing == 0.0 {
            entity.body.velocity.y = -speed;
        } else {
            entity.body.velocity.x = speed * entity.body.facing;
        }

        if entity.body.collided {
            entity.health = 0;

            if entity.body.collided_with == self.boss {
                if let Some(boss) = self.store.get_mut(self.boss) {
                    if boss.invincibility_frames <= 0 {
                        boss.health -= if matches!(entity.kind, EntityKind::ChargedBullet) {
                            100
                        } else {
                            10
                        };
                        boss.invincibility_frames = 40;
                        boss.body.velocity = if entity.body.facing == 0.0 {
                            vec2(0.0, -3.0)
                        } else {
                            vec2(entity.body.facing * 3.0, 0.0)
                        };
                    }
                }
            }
        }
    }

    /// Doors slide open during the intro and stay open afterwards.
    pub(crate) fn update_door(&mut self, id: EntityId, entity: &mut Entity, dt: f32) {
        let EntityKind::Door(mut state) = entity.kind else {
            return;
        };

        if self.mode == ControlMode::IntroCutscene {
            if id == self.right_door {
                if self.cutscene_interval(3.0, 3.5) {
                    entity.body.size.y += dt * 8.0;
                } else if self.cutscene_interval(3.5, 10.0) {
                    entity.body.size.y = 4.0;
                    state.opened = true;
                }
            } else if id == self.left_door {
                if self.cutscene_interval(6.0, 6.5) {
                    entity.body.size.y += dt * 8.0;
                } else if self.cutscene_interval(6.5, 10.0) {
                    entity.body.size.y = 4.0;
                    state.opened = true;
                }
            }
        } else {
            entity.body.size.y = 4.0;
        }

        entity.kind = EntityKind::Door(state);
    }

    pub(crate) fn update_boss(&mut self, entity: &mut Entity, input: &InputState, dt: f32) {
        let EntityKind::Boss(mut state) = entity.kind else {
            return;
        };

        // The dragon hovers: weak gravity, doubled while flapping upward
        let fly_upward_gravity = 4.25;
        let fly_gravity = fly_upward_gravity * 0.5;
        entity.body.acceleration.x = 0.0;
        entity.body.acceleration.y = if entity.body.is_jumping {
            fly_upward_gravity
        } else {
            fly_gravity
        };

        if entity.body.is_jumping && (entity.body.velocity.y > 0.0 || !input.down(Action::Jump)) {
            entity.body.is_jumping = false;
        }

        // Keep the breath emitter glued to the mouth
        if entity.body.facing > 0.0 {
            self.fire_particles.origin = entity.body.position + vec2(entity.body.size.x - 0.8, 0.8);
            self.fire_particles.min_angle = PI / 4.0 + 0.3;
            self.fire_particles.max_angle = PI / 4.0 - 0.3;
        } else {
            self.fire_particles.origin = entity.body.position + vec2(0.8, 0.8);
            self.fire_particles.min_angle = -PI / 4.0 + PI + 0.3;
            self.fire_particles.max_angle = -PI / 4.0 + PI - 0.3;
        }

        match self.mode {
            ControlMode::IntroCutscene => {
                if self.cutscene_interval(3.5, 6.5) {
                    entity.body.acceleration.x = 16.0;
                    entity.body.facing = 1.0;
                }
            }
            ControlMode::Boss => {
                if entity.body.collided && entity.body.collided_with == self.player {
                    if let Some(player) = self.store.get_mut(self.player) {
                        if player.invincibility_frames <= 0 {
                            player.invincibility_frames = 30;
                            player.health -= 10;
                            player.body.velocity.x = -entity.body.facing * 2.0;
                        }
                    }
                }

                state.is_attacking = false;
                for j in 0..NUM_ATTACK_SLOTS {
                    if state.attack[j].time_left > 0.0 {
                        state.is_attacking = true;
                        state.attack[j].time_left -= dt;
                    }

                    if state.attack[j].cooldown > 0.0 {
                        state.attack[j].cooldown -= dt;
                    }
                }

                if state.is_attacking {
                    // Breathing fire roots the dragon in place
                    entity.body.velocity = Vec2::ZERO;
                    entity.body.acceleration = Vec2::ZERO;
                } else {
                    if entity.invincibility_frames <= 0
                        && input.pressed(Action::Fire)
                        && state.attack[0].cooldown <= 0.0
                    {
                        state.attack[0].time_left = 2.5;
                        state.attack[0].cooldown = 5.0;
                        state.is_attacking = true;
                    }

                    if input.pressed(Action::Down) {
                        entity.body.velocity.y = 1.5;
                    }
                    if input.down(Action::Down) {
                        entity.body.acceleration.y *= 2.0;
                    }
                    if input.down(Action::Left) {
                        entity.body.acceleration.x = -16.0;
                        entity.body.facing = -1.0;
                    }
                    if input.pressed(Action::Jump) {
                        entity.body.velocity.y = -3.0;
                        entity.body.is_jumping = true;
                    }
                    if input.down(Action::Right) {
                        entity.body.acceleration.x = 16.0;
                        entity.body.facing = 1.0;
                    }
                }
            }
            ControlMode::Player => {
                // Hook for dragon AI when the gunner has direct control
            }
        }

        // Fire breathing attack
        let fire_breathing = state.attack[0].time_left > 0.0;
        let spawn_fire = state.attack[0].time_left > 0.5;
        self.fire_particles.update(&mut self.rng, spawn_fire);

        if fire_breathing {
            let origin = self.fire_particles.origin;
            // The flame cone grows out over the first half second
            let t = ((2.0 - state.attack[0].time_left) * 2.0).min(1.0);
            let max_d = t * 5.0;

            if let Some(player) = self.store.get_mut(self.player) {
                let box_min = player.body.position;
                let box_max = player.body.position + player.body.size;

                let mut hit = false;
                for dy in [1.0, 1.6, 0.6] {
                    let dir = vec2(entity.body.facing, dy).normalize_or_zero();
                    if let Some(d) = ray_box_intersection(origin, dir, box_min, box_max) {
                        if d <= max_d {
                            hit = true;
                            break;
                        }
                    }
                }

                if hit && player.invincibility_frames <= 0 {
                    player.health -= 40;
                    player.invincibility_frames = 40;
                }
            }
        }

        entity.kind = EntityKind::Boss(state);
    }
}
