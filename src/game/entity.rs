//! Entity data
//!
//! Every simulated object is one `Entity`: a shared `Body` for movement
//! and collision, a `Sprite` for drawing, health/invincibility counters,
//! and a closed `EntityKind` sum for the state only one kind needs
//! (attack slots, the AI cornered flag, the door latch).
//!
//! `health <= 0` means inactive: pooled bullets wait in that state, and
//! dead rigid bodies stop colliding, but nothing is ever removed from the
//! store until the level reloads.

use macroquad::prelude::*;

use super::store::EntityId;

/// Number of attack timer/cooldown slots per combatant.
pub const NUM_ATTACK_SLOTS: usize = 3;

/// Movement and collision state shared by every entity.
#[derive(Debug, Clone, Copy)]
pub struct Body {
    /// Top-left corner in tile units
    pub position: Vec2,
    pub size: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    /// Horizontal speed clamp (y unused)
    pub max_speed: Vec2,
    /// -1 left, 1 right, 0 is the bullets' "straight up" sentinel
    pub facing: f32,
    pub is_rigidbody: bool,
    pub is_grounded: bool,
    pub is_jumping: bool,
    /// Collision cache, valid for the tick it was written in
    pub collided: bool,
    pub collided_with: EntityId,
}

impl Default for Body {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            size: Vec2::ZERO,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            max_speed: Vec2::ZERO,
            facing: 0.0,
            is_rigidbody: false,
            is_grounded: false,
            is_jumping: false,
            collided: false,
            collided_with: EntityId::NULL,
        }
    }
}

impl Body {
    pub fn center(&self) -> Vec2 {
        self.position + self.size / 2.0
    }
}

/// Which texture an entity draws with. The textures themselves live in
/// the renderer; entities only carry the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKey {
    Player,
    Dragon,
    Door,
    Bullet,
    ChargedBullet,
}

/// Drawing state. `frame` accumulates with horizontal movement and wraps
/// at `num_frames`; the integer part picks the atlas column.
#[derive(Debug, Clone, Copy)]
pub struct Sprite {
    pub texture: Option<TextureKey>,
    pub color: Color,
    /// Texture art faces left; flip the facing test
    pub flip_texture: bool,
    /// Rotation in degrees (bullets shot upward use 90)
    pub rotation: f32,
    pub num_frames: u32,
    pub frame_advance_rate: f32,
    pub frame: f32,
}

impl Default for Sprite {
    fn default() -> Self {
        Self {
            texture: None,
            color: WHITE,
            flip_texture: false,
            rotation: 0.0,
            num_frames: 0,
            frame_advance_rate: 0.0,
            frame: 0.0,
        }
    }
}

/// One attack slot: `time_left` counts down while the attack is active,
/// `cooldown` counts down before it can fire again.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttackSlot {
    pub time_left: f32,
    pub cooldown: f32,
}

/// Gunner-only state.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerState {
    pub attack: [AttackSlot; NUM_ATTACK_SLOTS],
    pub is_attacking: bool,
    /// AI escape sub-state, latched until an attack opportunity opens
    pub is_cornered: bool,
}

/// Dragon-only state.
#[derive(Debug, Clone, Copy, Default)]
pub struct BossState {
    pub attack: [AttackSlot; NUM_ATTACK_SLOTS],
    pub is_attacking: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DoorState {
    /// Latched when the intro finishes opening this door
    pub opened: bool,
}

/// Closed set of entity kinds. Adding a kind means touching the behavior
/// dispatch, which is the point.
#[derive(Debug, Clone, Copy)]
pub enum EntityKind {
    /// Inert placeholder (unmapped gid objects)
    None,
    Player(PlayerState),
    Boss(BossState),
    Bullet,
    ChargedBullet,
    Door(DoorState),
    BoxCollider,
}

#[derive(Debug, Clone, Copy)]
pub struct Entity {
    pub kind: EntityKind,
    pub body: Body,
    pub sprite: Sprite,
    pub health: i32,
    pub max_health: i32,
    /// Frames of damage immunity left; also drives the draw flicker
    pub invincibility_frames: i32,
}

impl Entity {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            body: Body::default(),
            sprite: Sprite::default(),
            health: 0,
            max_health: 0,
            invincibility_frames: 0,
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, EntityKind::Player(_))
    }

    pub fn is_bullet(&self) -> bool {
        matches!(self.kind, EntityKind::Bullet | EntityKind::ChargedBullet)
    }

    /// Static obstacles collide with everything without being simulated.
    pub fn is_obstacle(&self) -> bool {
        matches!(self.kind, EntityKind::BoxCollider | EntityKind::Door(_))
    }
}
