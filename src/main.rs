//! Boss-battle arena: a gunner and a dragon square off in a one-room
//! level. The simulation runs at tile granularity and renders to a
//! 352x240 offscreen target that gets integer-ish scaled to the window.

use std::path::Path;

use macroquad::prelude::*;

mod config;
mod game;
mod input;
mod tmx;

use config::SpawnTable;
use game::renderer::{self, Textures, BACKGROUND_COLOR};
use game::{ControlMode, GameState, GAME_HEIGHT_TILES, GAME_WIDTH_TILES, TILE_SIZE};
use input::InputState;
use tmx::Level;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const WINDOW_SCALE: i32 = 4;

fn window_conf() -> Conf {
    Conf {
        window_title: format!("Emberwing v{VERSION}"),
        window_width: GAME_WIDTH_TILES * TILE_SIZE as i32 * WINDOW_SCALE,
        window_height: GAME_HEIGHT_TILES * TILE_SIZE as i32 * WINDOW_SCALE,
        window_resizable: true,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let spawn_table = SpawnTable::load_or_default(Path::new("assets/spawn_table.ron"));
    let level = match Level::from_path(Path::new("assets/interior.tmx"), &spawn_table) {
        Ok(level) => level,
        Err(err) => {
            eprintln!("Failed to load level: {err}");
            return;
        }
    };

    let textures = Textures::load().await;
    let mut state = GameState::new(level);
    let mut input = InputState::new();

    let game_width = GAME_WIDTH_TILES as f32 * TILE_SIZE;
    let game_height = GAME_HEIGHT_TILES as f32 * TILE_SIZE;

    let render_target = render_target(game_width as u32, game_height as u32);
    render_target.texture.set_filter(FilterMode::Nearest);

    loop {
        let dt = get_frame_time();

        input.poll();
        state.tick(&input, dt);

        // Draw the scene at native resolution
        set_camera(&Camera2D {
            zoom: vec2(2.0 / game_width, 2.0 / game_height),
            target: vec2(game_width / 2.0, game_height / 2.0),
            render_target: Some(render_target.clone()),
            ..Default::default()
        });
        renderer::draw_game(&state, &textures);

        // Scale up to the window, letterboxed
        set_default_camera();
        clear_background(BACKGROUND_COLOR);

        let screen_width = screen_width();
        let screen_height = screen_height();
        let aspect_ratio = game_width / game_height;

        let mut dest_width = aspect_ratio * screen_height;
        let mut dest_x = (screen_width - dest_width) / 2.0;
        let mut flip_scene = false;

        if state.mode == ControlMode::IntroCutscene {
            // The intro plays out mirrored, then the view snaps around
            // with a horizontal squeeze
            if state.cutscene_interval(7.0, 7.5) {
                let t = (state.cutscene_time - 7.0) * 4.0;
                let swap = (1.0 - t).abs();
                dest_x += (dest_width / 2.0) * (1.0 - swap);
                dest_width *= swap;
            }

            if state.cutscene_interval(0.0, 7.25) {
                flip_scene = true;
            }
        }

        draw_texture_ex(
            &render_target.texture,
            dest_x,
            0.0,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(dest_width, screen_height)),
                // Render targets come out upside down
                flip_y: true,
                flip_x: flip_scene,
                ..Default::default()
            },
        );

        next_frame().await;
    }
}
