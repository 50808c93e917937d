//! Top-level game state and the per-frame tick.
//!
//! `reset` rebuilds the whole entity roster from the loaded level, so a
//! level reload is one `clear` plus respawns and every outstanding
//! `EntityId` from before goes stale. The tick walks entities in spawn
//! order: behavior, invincibility countdown, then physics, writing each
//! entity back before the next one reads the store.

use std::f32::consts::PI;

use macroquad::prelude::*;

use crate::input::{Action, InputState};
use crate::tmx::Level;

use super::entity::{
    BossState, DoorState, Entity, EntityKind, PlayerState, Sprite, TextureKey,
};
use super::particles::ParticleSystem;
use super::physics;
use super::store::{EntityId, EntityStore};
use super::Rng;

/// Size of the regular bullet pool.
pub const MAX_BULLETS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    IntroCutscene,
    /// Direct control of the gunner, dragon idles
    Player,
    /// Direct control of the dragon, gunner is AI-driven
    Boss,
}

pub struct GameState {
    pub mode: ControlMode,
    pub cutscene_time: f32,
    pub level: Level,
    pub store: EntityStore,

    pub player: EntityId,
    pub boss: EntityId,
    pub bullets: [EntityId; MAX_BULLETS],
    pub charged_bullet: EntityId,
    pub left_door: EntityId,
    pub right_door: EntityId,

    pub fire_particles: ParticleSystem,
    pub charge_particles: ParticleSystem,
    pub rng: Rng,

    /// Camera offset in tile units (fixed arena, stays at zero)
    pub camera: Vec2,
}

impl GameState {
    pub fn new(level: Level) -> Self {
        // Fire breath: a narrow cone out of the dragon's mouth
        let mut fire_particles = ParticleSystem::new(500);
        fire_particles.min_angle = PI / 4.0 + 0.3;
        fire_particles.max_angle = PI / 4.0 - 0.3;
        fire_particles.speed = 0.1;
        fire_particles.spawn_rate = 0.6;
        fire_particles.delta_t = 0.015;

        // Charge-up: a full circle of sparks pulled inwards
        let mut charge_particles = ParticleSystem::new(100);
        charge_particles.min_angle = 0.0;
        charge_particles.max_angle = PI * 2.0;
        charge_particles.speed = 0.05;
        charge_particles.spawn_rate = 0.5;
        charge_particles.delta_t = 0.04;

        let mut state = Self {
            mode: ControlMode::IntroCutscene,
            cutscene_time: 0.0,
            level,
            store: EntityStore::new(),
            player: EntityId::NULL,
            boss: EntityId::NULL,
            bullets: [EntityId::NULL; MAX_BULLETS],
            charged_bullet: EntityId::NULL,
            left_door: EntityId::NULL,
            right_door: EntityId::NULL,
            fire_particles,
            charge_particles,
            rng: Rng::new(12345),
            camera: Vec2::ZERO,
        };
        state.reset();
        state
    }

    /// Rebuild the roster from the level. Invalidates every handle.
    pub fn reset(&mut self) {
        self.mode = ControlMode::IntroCutscene;
        self.cutscene_time = 0.0;

        self.store.clear();
        self.fire_particles.clear();
        self.charge_particles.clear();

        for &entity in &self.level.entities {
            self.store.spawn(entity);
        }

        for i in 0..MAX_BULLETS {
            let mut bullet = Entity::new(EntityKind::Bullet);
            bullet.sprite.texture = Some(TextureKey::Bullet);
            bullet.body.max_speed.x = 3.0;
            bullet.body.size = vec2(0.5, 0.5);
            bullet.body.is_rigidbody = true;
            self.bullets[i] = self.store.spawn(bullet);
        }

        let mut charged = Entity::new(EntityKind::ChargedBullet);
        charged.sprite.texture = Some(TextureKey::ChargedBullet);
        charged.body.max_speed.x = 3.0;
        charged.body.size = vec2(0.75, 0.75);
        charged.body.is_rigidbody = true;
        self.charged_bullet = self.store.spawn(charged);

        let mut left_door = Entity::new(EntityKind::Door(DoorState::default()));
        left_door.sprite.texture = Some(TextureKey::Door);
        left_door.health = 1;
        left_door.body.position = vec2(0.0, 10.0);
        left_door.body.size = vec2(1.0, 0.0);
        self.left_door = self.store.spawn(left_door);

        let mut right_door = Entity::new(EntityKind::Door(DoorState::default()));
        right_door.sprite.texture = Some(TextureKey::Door);
        right_door.health = 1;
        right_door.body.position = vec2(21.0, 10.0);
        right_door.body.size = vec2(1.0, 0.0);
        self.right_door = self.store.spawn(right_door);

        let mut player = Entity::new(EntityKind::Player(PlayerState::default()));
        player.sprite.texture = Some(TextureKey::Player);
        player.sprite.color = SKYBLUE;
        // Off-screen right, walks in during the intro
        player.body.position = self.level.player_spawn.unwrap_or(vec2(24.0, 12.0));
        player.body.size = vec2(1.0, 2.0);
        player.body.max_speed.x = 3.0;
        player.body.is_rigidbody = true;
        player.body.facing = 1.0;
        player.max_health = 1000;
        player.health = player.max_health;
        self.player = self.store.spawn(player);

        let mut boss = Entity::new(EntityKind::Boss(BossState::default()));
        boss.sprite = Sprite {
            texture: Some(TextureKey::Dragon),
            color: RED,
            flip_texture: true,
            num_frames: 8,
            frame_advance_rate: 2.5,
            ..Sprite::default()
        };
        boss.body.position = vec2(-5.0, 10.0);
        boss.body.size = vec2(4.0, 4.0);
        boss.body.max_speed.x = 2.5;
        boss.body.is_rigidbody = true;
        boss.max_health = 1000;
        boss.health = boss.max_health;
        self.boss = self.store.spawn(boss);

        println!(
            "Loaded level: {}x{} tiles, {} entities",
            self.level.tile_map.width,
            self.level.tile_map.height,
            self.store.len()
        );
    }

    /// True while `cutscene_time` is in `[start, end)`.
    pub fn cutscene_interval(&self, start: f32, end: f32) -> bool {
        self.cutscene_time >= start && self.cutscene_time < end
    }

    /// Advance the whole simulation by `dt` seconds.
    pub fn tick(&mut self, input: &InputState, dt: f32) {
        if input.pressed(Action::ReloadLevel) {
            self.reset();
        }

        if input.pressed(Action::ToggleControl) {
            self.mode = match self.mode {
                ControlMode::Boss => ControlMode::Player,
                _ => ControlMode::Boss,
            };
        }

        if self.mode == ControlMode::IntroCutscene {
            self.cutscene_time += dt;
            if self.cutscene_time > 8.0 {
                self.mode = ControlMode::Boss;
            }
        }

        for i in 0..self.store.len() {
            let Some(id) = self.store.id_at(i) else {
                break;
            };
            let Some(mut entity) = self.store.at(i).copied() else {
                break;
            };

            match entity.kind {
                EntityKind::Player(_) => self.update_player(&mut entity, input, dt),
                EntityKind::Boss(_) => self.update_boss(&mut entity, input, dt),
                EntityKind::Bullet | EntityKind::ChargedBullet => self.update_bullet(&mut entity),
                EntityKind::Door(_) => self.update_door(id, &mut entity, dt),
                EntityKind::None | EntityKind::BoxCollider => {}
            }

            if entity.invincibility_frames > 0 {
                entity.invincibility_frames -= 1;
            }

            physics::step_rigidbody(&self.store, id, &mut entity, dt);

            if let Some(slot) = self.store.get_mut(id) {
                *slot = entity;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tmx::TileMap;

    const DT: f32 = 1.0 / 60.0;

    /// Bare arena: a floor collider and a spawn point on top of it.
    fn test_level() -> Level {
        let mut floor = Entity::new(EntityKind::BoxCollider);
        floor.body.position = vec2(0.0, 13.0);
        floor.body.size = vec2(22.0, 2.0);

        Level {
            tile_map: TileMap {
                width: 22,
                height: 15,
                tile_width: 16,
                tile_height: 16,
                tiles: vec![0; 22 * 15],
            },
            entities: vec![floor],
            player_spawn: Some(vec2(16.0, 11.0)),
        }
    }

    fn run(state: &mut GameState, input: &InputState, ticks: usize) {
        for _ in 0..ticks {
            state.tick(input, DT);
        }
    }

    #[test]
    fn test_reset_spawns_full_roster() {
        let state = GameState::new(test_level());

        // Floor + 8 bullets + charged + 2 doors + player + boss
        assert_eq!(state.store.len(), 14);
        assert_eq!(state.mode, ControlMode::IntroCutscene);

        let player = state.store.get(state.player).unwrap();
        assert_eq!(player.health, 1000);
        assert_eq!(player.body.position, vec2(16.0, 11.0));

        let boss = state.store.get(state.boss).unwrap();
        assert_eq!(boss.health, 1000);
        assert_eq!(boss.body.size, vec2(4.0, 4.0));

        // Pooled bullets start inactive
        for id in state.bullets {
            assert!(state.store.get(id).unwrap().health <= 0);
        }
    }

    #[test]
    fn test_reset_invalidates_old_handles() {
        let mut state = GameState::new(test_level());
        let old_player = state.player;
        let old_bullet = state.bullets[0];

        state.reset();

        assert!(!state.store.is_alive(old_player));
        assert!(!state.store.is_alive(old_bullet));
        assert!(state.store.is_alive(state.player));
    }

    #[test]
    fn test_intro_cutscene_script() {
        let mut state = GameState::new(test_level());
        let input = InputState::new();

        // ~1s in: the gunner is backing away to the left
        run(&mut state, &input, 60);
        let player = state.store.get(state.player).unwrap();
        assert_eq!(player.body.facing, -1.0);
        assert!(player.body.velocity.x < 0.0);

        // ~5s in: the right door has opened and the dragon is flying in
        run(&mut state, &input, 240);
        let right_door = state.store.get(state.right_door).unwrap();
        assert_eq!(right_door.body.size.y, 4.0);
        assert!(matches!(right_door.kind, EntityKind::Door(d) if d.opened));

        let left_door = state.store.get(state.left_door).unwrap();
        assert!(matches!(left_door.kind, EntityKind::Door(d) if !d.opened));

        let boss = state.store.get(state.boss).unwrap();
        assert!(boss.body.position.x > -4.0);

        // Past 8s: battle begins, both doors done opening
        run(&mut state, &input, 200);
        assert_eq!(state.mode, ControlMode::Boss);
        let left_door = state.store.get(state.left_door).unwrap();
        assert!(matches!(left_door.kind, EntityKind::Door(d) if d.opened));
    }

    #[test]
    fn test_variable_jump_height() {
        let min_y = |hold_ticks: usize| -> f32 {
            let mut state = GameState::new(test_level());
            state.mode = ControlMode::Player;

            // One idle tick to get grounded
            let mut input = InputState::new();
            run(&mut state, &input, 1);

            input.set_pressed(Action::Jump, true);
            state.tick(&input, DT);

            input.clear();
            let mut lowest = f32::MAX;
            for t in 0..120 {
                input.set_down(Action::Jump, t < hold_ticks);
                state.tick(&input, DT);
                let y = state.store.get(state.player).unwrap().body.position.y;
                lowest = lowest.min(y);
            }
            lowest
        };

        let tap = min_y(0);
        let hold = min_y(60);

        // Holding jump floats higher (smaller y)
        assert!(hold < tap - 0.5, "hold {hold} vs tap {tap}");
    }

    #[test]
    fn test_bullet_lifetime_decays() {
        let mut state = GameState::new(test_level());
        state.mode = ControlMode::Boss;

        let mut shooter = *state.store.get(state.player).unwrap();
        shooter.body.facing = -1.0;
        let bullet_id = state.bullets[0];
        state.shoot_bullet(&shooter, bullet_id, false);
        assert_eq!(state.store.get(bullet_id).unwrap().health, 30);

        // The dragon is far off-screen, so the AI holds fire and the
        // bullet expires from age alone
        let input = InputState::new();
        run(&mut state, &input, 29);
        assert!(state.store.get(bullet_id).unwrap().health > 0);

        run(&mut state, &input, 1);
        assert!(state.store.get(bullet_id).unwrap().health <= 0);
    }

    #[test]
    fn test_bullet_impact_damages_boss() {
        let mut state = GameState::new(test_level());
        state.mode = ControlMode::Player;

        let boss = state.store.get_mut(state.boss).unwrap();
        boss.body.position = vec2(10.0, 9.0);

        let bullet_id = state.bullets[0];
        let bullet = state.store.get_mut(bullet_id).unwrap();
        bullet.health = 30;
        bullet.body.position = vec2(9.5, 11.0);
        bullet.body.facing = 1.0;

        let input = InputState::new();
        // First tick detects the contact, second resolves the hit
        run(&mut state, &input, 2);

        let boss = state.store.get(state.boss).unwrap();
        assert_eq!(boss.health, 990);
        assert_eq!(boss.invincibility_frames, 39);
        // Knockback, clamped then damped
        assert!((boss.body.velocity.x - 2.0).abs() < 1e-4);

        assert!(state.store.get(bullet_id).unwrap().health <= 0);
    }

    #[test]
    fn test_gunner_holds_fire_until_cooldown_elapses() {
        let mut state = GameState::new(test_level());
        state.mode = ControlMode::Boss;

        // Dragon parked in range so the AI wants to shoot every tick
        let boss = state.store.get_mut(state.boss).unwrap();
        boss.body.position = vec2(10.0, 9.0);

        let player = state.store.get_mut(state.player).unwrap();
        if let EntityKind::Player(ref mut p) = player.kind {
            p.attack[0].cooldown = 1.0;
            // Keep the charged-shot path out of the way
            p.attack[1].cooldown = 1000.0;
        }

        let active = |state: &GameState| {
            state
                .bullets
                .iter()
                .filter(|&&id| state.store.get(id).unwrap().health > 0)
                .count()
        };

        let input = InputState::new();
        let mut fired_at = None;
        for t in 0..90 {
            state.tick(&input, DT);
            if active(&state) > 0 {
                fired_at = Some(t);
                break;
            }
        }

        // One second of cooldown holds for 60 ticks, then a single shot
        let fired_at = fired_at.expect("the gunner never opened fire");
        assert!(fired_at >= 59, "fired during cooldown at tick {fired_at}");
        assert_eq!(active(&state), 1);
    }

    #[test]
    fn test_dragon_attack_waits_for_cooldown() {
        let mut state = GameState::new(test_level());
        state.mode = ControlMode::Boss;

        let boss = state.store.get_mut(state.boss).unwrap();
        boss.body.position = vec2(2.0, 9.0);
        // Face the wall so the breath cannot reach the gunner
        boss.body.facing = -1.0;
        if let EntityKind::Boss(ref mut b) = boss.kind {
            b.attack[0].cooldown = 0.5;
        }

        let mut input = InputState::new();
        input.set_pressed(Action::Fire, true);
        state.tick(&input, DT);

        // The press lands while cooling down and is dropped
        let boss = state.store.get(state.boss).unwrap();
        assert!(matches!(
            boss.kind,
            EntityKind::Boss(b) if !b.is_attacking && b.attack[0].time_left <= 0.0
        ));

        input.clear();
        run(&mut state, &input, 40);

        input.set_pressed(Action::Fire, true);
        state.tick(&input, DT);

        let boss = state.store.get(state.boss).unwrap();
        assert!(matches!(
            boss.kind,
            EntityKind::Boss(b) if b.is_attacking && b.attack[0].time_left > 0.0
        ));
    }

    #[test]
    fn test_invincible_boss_ignores_bullet() {
        let mut state = GameState::new(test_level());
        state.mode = ControlMode::Player;

        let boss = state.store.get_mut(state.boss).unwrap();
        boss.body.position = vec2(10.0, 9.0);
        boss.invincibility_frames = 50;

        let bullet_id = state.bullets[0];
        let bullet = state.store.get_mut(bullet_id).unwrap();
        bullet.health = 30;
        bullet.body.position = vec2(9.5, 11.0);
        bullet.body.facing = 1.0;

        let input = InputState::new();
        run(&mut state, &input, 2);

        // The bullet is spent but deals no damage and no knockback
        assert!(state.store.get(bullet_id).unwrap().health <= 0);
        let boss = state.store.get(state.boss).unwrap();
        assert_eq!(boss.health, 1000);
        assert_eq!(boss.body.velocity.x, 0.0);
        assert_eq!(boss.invincibility_frames, 48);
    }

    #[test]
    fn test_invincible_player_ignores_contact() {
        let mut state = GameState::new(test_level());
        state.mode = ControlMode::Boss;

        // A wall on the right keeps the fleeing gunner in the dragon's path
        let mut wall = Entity::new(EntityKind::BoxCollider);
        wall.body.position = vec2(17.0, 0.0);
        wall.body.size = vec2(1.0, 15.0);
        state.store.spawn(wall);

        let boss = state.store.get_mut(state.boss).unwrap();
        boss.body.position = vec2(11.0, 9.0);
        boss.body.facing = 1.0;
        boss.body.velocity.x = 2.5;

        let player = state.store.get_mut(state.player).unwrap();
        player.invincibility_frames = 90;
        player.body.max_speed.x = 0.0;

        let input = InputState::new();
        state.tick(&input, 0.5);
        state.tick(&input, DT);

        let player = state.store.get(state.player).unwrap();
        assert_eq!(player.health, 1000);
        assert_eq!(player.body.velocity.x, 0.0);
        assert_eq!(player.invincibility_frames, 88);
    }

    #[test]
    fn test_invincible_player_shrugs_off_fire_breath() {
        let mut state = GameState::new(test_level());
        state.mode = ControlMode::Boss;

        let boss = state.store.get_mut(state.boss).unwrap();
        boss.body.position = vec2(10.0, 8.0);
        boss.body.facing = 1.0;

        let player = state.store.get_mut(state.player).unwrap();
        player.body.position = vec2(14.0, 11.0);
        player.body.max_speed.x = 0.0;
        player.invincibility_frames = 200;

        let mut input = InputState::new();
        input.set_pressed(Action::Fire, true);
        state.tick(&input, 0.1);
        input.clear();

        for _ in 0..9 {
            state.tick(&input, 0.1);
        }

        let player = state.store.get(state.player).unwrap();
        assert_eq!(player.health, 1000);
    }

    #[test]
    fn test_upward_shot_travels_straight_up() {
        let mut state = GameState::new(test_level());
        state.mode = ControlMode::Player;

        let shooter = *state.store.get(state.player).unwrap();
        let bullet_id = state.bullets[0];
        state.shoot_bullet(&shooter, bullet_id, true);

        let bullet = state.store.get(bullet_id).unwrap();
        assert_eq!(bullet.body.facing, 0.0);
        assert_eq!(bullet.sprite.rotation, 90.0);
        // Facing right puts the muzzle offset at the gun barrel
        assert_eq!(
            bullet.body.position,
            shooter.body.position + vec2(1.3, 0.75)
        );

        let input = InputState::new();
        run(&mut state, &input, 1);
        let bullet = state.store.get(bullet_id).unwrap();
        assert_eq!(bullet.body.velocity, vec2(0.0, -12.0));
    }

    #[test]
    fn test_charged_bullet_is_heavier_and_faster() {
        let mut state = GameState::new(test_level());
        state.mode = ControlMode::Player;

        let shooter = *state.store.get(state.player).unwrap();
        state.shoot_bullet(&shooter, state.charged_bullet, false);

        let charged = state.store.get(state.charged_bullet).unwrap();
        assert_eq!(charged.health, 100);

        let input = InputState::new();
        run(&mut state, &input, 1);
        let charged = state.store.get(state.charged_bullet).unwrap();
        // Covers 20 tiles/s regardless of the rigidbody speed clamp
        let expected_x = shooter.body.position.x + 20.0 * DT;
        assert!((charged.body.position.x - expected_x).abs() < 1e-4);
    }

    #[test]
    fn test_toggle_control_and_reload() {
        let mut state = GameState::new(test_level());

        let mut input = InputState::new();
        input.set_pressed(Action::ToggleControl, true);
        state.tick(&input, DT);
        assert_eq!(state.mode, ControlMode::Boss);

        state.tick(&input, DT);
        assert_eq!(state.mode, ControlMode::Player);

        let old_player = state.player;
        input.clear();
        input.set_pressed(Action::ReloadLevel, true);
        state.tick(&input, DT);
        assert_eq!(state.mode, ControlMode::IntroCutscene);
        assert!(!state.store.is_alive(old_player));
    }

    #[test]
    fn test_dragon_contact_damages_player() {
        let mut state = GameState::new(test_level());
        state.mode = ControlMode::Boss;

        let boss = state.store.get_mut(state.boss).unwrap();
        boss.body.position = vec2(11.0, 9.0);
        boss.body.facing = 1.0;
        boss.body.velocity.x = 2.5;

        let input = InputState::new();
        // Big first step rams the dragon into the gunner
        state.tick(&input, 0.5);
        state.tick(&input, DT);

        let player = state.store.get(state.player).unwrap();
        assert_eq!(player.health, 990);
        assert_eq!(player.invincibility_frames, 30);
        assert_eq!(player.body.velocity.x, -2.0);
    }

    #[test]
    fn test_fire_breath_burns_player_in_range() {
        let mut state = GameState::new(test_level());
        state.mode = ControlMode::Boss;

        let boss = state.store.get_mut(state.boss).unwrap();
        boss.body.position = vec2(10.0, 8.0);
        boss.body.facing = 1.0;

        // Pin the gunner under the flame cone
        let player = state.store.get_mut(state.player).unwrap();
        player.body.position = vec2(14.0, 11.0);
        player.body.max_speed.x = 0.0;

        let mut input = InputState::new();
        input.set_pressed(Action::Fire, true);
        state.tick(&input, 0.1);
        input.clear();

        // The cone takes a moment to reach out far enough
        for _ in 0..9 {
            state.tick(&input, 0.1);
        }

        let player = state.store.get(state.player).unwrap();
        assert_eq!(player.health, 960);
        assert!(player.invincibility_frames > 0);
    }

    #[test]
    fn test_doors_full_height_outside_intro() {
        let mut state = GameState::new(test_level());
        state.mode = ControlMode::Boss;

        let input = InputState::new();
        run(&mut state, &input, 1);

        let left = state.store.get(state.left_door).unwrap();
        let right = state.store.get(state.right_door).unwrap();
        assert_eq!(left.body.size.y, 4.0);
        assert_eq!(right.body.size.y, 4.0);
    }
}
