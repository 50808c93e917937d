//! Particle pools for the fire breath and the charged-shot windup.
//!
//! Fixed-capacity Vec pools. Expired particles are swap-removed, so draw
//! order within a system is not stable, which is fine for sparks.

use macroquad::prelude::*;

use super::Rng;

#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    /// 1.0 at spawn, expires at 0
    pub life: f32,
}

pub struct ParticleSystem {
    pub particles: Vec<Particle>,
    pub max_particles: usize,
    /// Emitter position, set by the owning entity each tick
    pub origin: Vec2,
    /// Emission cone in radians
    pub min_angle: f32,
    pub max_angle: f32,
    pub speed: f32,
    /// Chance per spawn attempt, 10 attempts per update
    pub spawn_rate: f32,
    /// Life drained per update (the system's own clock, not frame time)
    pub delta_t: f32,
}

impl ParticleSystem {
    pub fn new(max_particles: usize) -> Self {
        Self {
            particles: Vec::with_capacity(max_particles),
            max_particles,
            origin: Vec2::ZERO,
            min_angle: 0.0,
            max_angle: 0.0,
            speed: 0.0,
            spawn_rate: 0.0,
            delta_t: 0.0,
        }
    }

    pub fn update(&mut self, rng: &mut Rng, spawn_new: bool) {
        let mut i = 0;
        while i < self.particles.len() {
            if self.particles[i].life <= 0.0 {
                self.particles.swap_remove(i);
            } else {
                i += 1;
            }
        }

        if spawn_new {
            for _ in 0..10 {
                if self.particles.len() >= self.max_particles {
                    break;
                }
                if rng.next_f32() < self.spawn_rate {
                    let angle = rng.range(self.min_angle, self.max_angle);
                    self.particles.push(Particle {
                        position: self.origin,
                        velocity: vec2(angle.cos(), angle.sin()) * self.speed,
                        life: 1.0,
                    });
                }
            }
        }

        for particle in &mut self.particles {
            particle.position += particle.velocity;
            particle.life -= self.delta_t;
        }
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}
