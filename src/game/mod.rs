//! Game runtime
//!
//! The whole simulation lives here: entity data and storage, rigidbody
//! physics, the per-kind combat behaviors, particles, and the `GameState`
//! tick that drives them in a single index-ordered pass per frame.
//!
//! Design notes:
//! - Entities are plain `Copy` data; one tick copies each entity out,
//!   updates it, and writes it back, so later entities observe earlier
//!   entities' current-tick state.
//! - World coordinates are tile units (one tile = 16 px on screen).
//! - Entity references are generational handles, never indices alone.

pub mod behavior;
pub mod entity;
pub mod particles;
pub mod physics;
pub mod renderer;
pub mod state;
pub mod store;

pub use entity::{Entity, EntityKind};
pub use state::{ControlMode, GameState};
pub use store::{EntityId, EntityStore};

/// One tile in screen pixels.
pub const TILE_SIZE: f32 = 16.0;
/// Visible playfield in tiles
pub const GAME_WIDTH_TILES: i32 = 22;
pub const GAME_HEIGHT_TILES: i32 = 15;
/// Tolerance for near-zero velocity/acceleration comparisons
pub const EPSILON: f32 = 0.0001;

/// Fast xorshift PRNG (no external deps, deterministic)
pub struct Rng {
    state: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        // Xorshift gets stuck at zero
        Self {
            state: seed.max(1),
        }
    }

    /// Random float in [0, 1]
    pub fn next_f32(&mut self) -> f32 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 17;
        self.state ^= self.state << 5;
        (self.state as f32) / (u32::MAX as f32)
    }

    /// Random float in range [min, max]
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }
}
