//! Drawing
//!
//! Everything renders into a small offscreen target at native resolution
//! (one tile = 16 px) which `main` scales up to the window. All drawing
//! here is in those native pixels; `to_pixel` converts tile coordinates.

use macroquad::prelude::*;

use super::entity::{Entity, EntityKind, TextureKey};
use super::state::{ControlMode, GameState};
use super::{GAME_HEIGHT_TILES, GAME_WIDTH_TILES, TILE_SIZE};

pub const BACKGROUND_COLOR: Color = Color::new(0.204, 0.110, 0.153, 1.0);

/// Loaded texture set. Any texture may be missing; entities without one
/// fall back to a flat colored rectangle.
pub struct Textures {
    pub tiles: Option<Texture2D>,
    pub background: Option<Texture2D>,
    pub dragon: Option<Texture2D>,
    pub player: Option<Texture2D>,
    pub door: Option<Texture2D>,
    pub bullet: Option<Texture2D>,
    pub charged_bullet: Option<Texture2D>,
}

async fn load_or_warn(path: &str) -> Option<Texture2D> {
    match load_texture(path).await {
        Ok(texture) => {
            texture.set_filter(FilterMode::Nearest);
            Some(texture)
        }
        Err(err) => {
            eprintln!("Failed to load texture {path}: {err}");
            None
        }
    }
}

impl Textures {
    pub async fn load() -> Textures {
        Textures {
            tiles: load_or_warn("assets/tiles.png").await,
            background: load_or_warn("assets/background.png").await,
            dragon: load_or_warn("assets/dragon.png").await,
            player: load_or_warn("assets/player.png").await,
            door: load_or_warn("assets/door.png").await,
            bullet: load_or_warn("assets/bullet.png").await,
            charged_bullet: load_or_warn("assets/charged_bullet.png").await,
        }
    }

    pub fn for_key(&self, key: TextureKey) -> Option<&Texture2D> {
        match key {
            TextureKey::Player => self.player.as_ref(),
            TextureKey::Dragon => self.dragon.as_ref(),
            TextureKey::Door => self.door.as_ref(),
            TextureKey::Bullet => self.bullet.as_ref(),
            TextureKey::ChargedBullet => self.charged_bullet.as_ref(),
        }
    }
}

/// Tile coordinates to native screen pixels, snapped to the pixel grid.
pub fn to_pixel(camera: Vec2, world: Vec2) -> Vec2 {
    vec2(
        ((world.x - camera.x) * TILE_SIZE).round(),
        ((world.y - camera.y) * TILE_SIZE).round(),
    )
}

pub fn draw_game(state: &GameState, textures: &Textures) {
    clear_background(BACKGROUND_COLOR);

    if let Some(background) = &textures.background {
        for y in 0..10 {
            for x in 0..3 {
                let px = (x as f32 * background.width() - state.camera.x * TILE_SIZE).round();
                let py = (y as f32 * background.height() - state.camera.y * TILE_SIZE).round();
                draw_texture(background, px, py, WHITE);
            }
        }
    }

    if let Some(tiles) = &textures.tiles {
        let tile_xcount = (tiles.width() / TILE_SIZE) as u32;
        for y in 0..state.level.tile_map.height {
            for x in 0..state.level.tile_map.width {
                let tile = state.level.tile_map.tile(x, y);
                if tile == 0 {
                    continue;
                }
                // Atlas cells are gid - 1, row-major
                let tile = (tile - 1) as u32;
                let src = Rect::new(
                    (tile % tile_xcount) as f32 * TILE_SIZE,
                    (tile / tile_xcount) as f32 * TILE_SIZE,
                    TILE_SIZE,
                    TILE_SIZE,
                );
                let dest = to_pixel(state.camera, vec2(x as f32, y as f32));
                draw_texture_ex(
                    tiles,
                    dest.x,
                    dest.y,
                    WHITE,
                    DrawTextureParams {
                        source: Some(src),
                        dest_size: Some(vec2(TILE_SIZE, TILE_SIZE)),
                        ..Default::default()
                    },
                );
            }
        }
    }

    for i in 0..state.store.len() {
        let Some(entity) = state.store.at(i) else {
            break;
        };
        if matches!(entity.kind, EntityKind::None) {
            continue;
        }
        if entity.health <= 0 {
            continue;
        }

        draw_entity(state, textures, entity);

        // Attack effects draw over their owner
        match entity.kind {
            EntityKind::Boss(_) => draw_fire_particles(state),
            EntityKind::Player(_) => draw_charge_particles(state),
            _ => {}
        }
    }

    draw_level_bounds(state);

    if state.mode == ControlMode::Boss {
        if let Some(boss) = state.store.get(state.boss) {
            draw_health_bar(boss, RED, false);
        }
        if let Some(player) = state.store.get(state.player) {
            draw_health_bar(player, SKYBLUE, true);
        }
    }
}

fn draw_entity(state: &GameState, textures: &Textures, entity: &Entity) {
    let p = to_pixel(state.camera, entity.body.position);
    let size = entity.body.size * TILE_SIZE;

    match entity.sprite.texture.and_then(|key| textures.for_key(key)) {
        Some(texture) => {
            // Texture art faces left by default
            let mut facing_right = entity.body.facing > 0.0;
            if entity.sprite.flip_texture {
                facing_right = !facing_right;
            }

            let mut src = Rect::new(0.0, 0.0, size.x, size.y);
            if entity.sprite.num_frames > 0 && entity.body.is_grounded {
                let frame_index = entity.sprite.frame as i32;
                src.x += size.x * frame_index as f32;
            }

            // Flicker while invincible
            if entity.invincibility_frames % 2 == 0 {
                draw_texture_ex(
                    texture,
                    p.x,
                    p.y,
                    WHITE,
                    DrawTextureParams {
                        source: Some(src),
                        dest_size: Some(size),
                        rotation: entity.sprite.rotation.to_radians(),
                        flip_x: facing_right,
                        ..Default::default()
                    },
                );
            }
        }
        None => {
            draw_rectangle(p.x, p.y, size.x, size.y, entity.sprite.color);
        }
    }
}

fn draw_fire_particles(state: &GameState) {
    for particle in &state.fire_particles.particles {
        if particle.life <= 0.0 {
            continue;
        }
        let p = to_pixel(state.camera, particle.position);
        let t = particle.life;
        let color = Color::new(ORANGE.r * t, ORANGE.g * t, (50.0 / 255.0) * t, t * t * t);
        draw_circle(p.x, p.y, (1.0 - t * t) * 10.0, color);
    }
}

fn draw_charge_particles(state: &GameState) {
    let origin = to_pixel(state.camera, state.charge_particles.origin);
    for particle in &state.charge_particles.particles {
        if particle.life <= 0.0 {
            continue;
        }
        // Sparks streak inward toward the muzzle as they age
        let p1 = to_pixel(state.camera, particle.position);
        let p0 = origin + (p1 - origin) * (1.0 - particle.life);
        let color = Color::new(YELLOW.r, YELLOW.g, YELLOW.b, 25.0 / 255.0);
        draw_line(p0.x, p0.y, p1.x, p1.y, 1.0, color);
    }
}

/// Fill everything outside the level rectangle with the backdrop color.
fn draw_level_bounds(state: &GameState) {
    let game_width = GAME_WIDTH_TILES as f32 * TILE_SIZE;
    let game_height = GAME_HEIGHT_TILES as f32 * TILE_SIZE;

    let min_p = -state.camera * TILE_SIZE;
    let max_p = min_p
        + vec2(
            state.level.tile_map.width as f32 * TILE_SIZE,
            state.level.tile_map.height as f32 * TILE_SIZE,
        );

    if min_p.x > 0.0 {
        draw_rectangle(0.0, 0.0, min_p.x, game_height, BACKGROUND_COLOR);
    }
    if max_p.x < game_width {
        draw_rectangle(max_p.x, 0.0, game_width - max_p.x, game_height, BACKGROUND_COLOR);
    }
    if min_p.y > 0.0 {
        draw_rectangle(0.0, 0.0, game_width, min_p.y, BACKGROUND_COLOR);
    }
    if max_p.y < game_height {
        draw_rectangle(0.0, max_p.y, game_width, game_height - max_p.y, BACKGROUND_COLOR);
    }
}

fn draw_health_bar(entity: &Entity, color: Color, right: bool) {
    let game_width = GAME_WIDTH_TILES as f32 * TILE_SIZE;

    let frac = (entity.health as f32 / entity.max_health as f32).clamp(0.0, 1.0);
    let width = (game_width / 2.0 - 8.0) * frac;

    let mut xoffset = 0.0;
    let mut xoffset_inner = 0.0;
    if right {
        xoffset = game_width / 2.0 - 7.0;
    } else {
        // Left bar drains toward the edge
        xoffset_inner = game_width / 2.0 - 8.0 - width;
    }

    draw_rectangle(7.0 + xoffset, 7.0, game_width / 2.0 - 6.0, 6.0, BLACK);
    draw_rectangle(8.0 + xoffset + xoffset_inner, 8.0, width, 4.0, color);
}
