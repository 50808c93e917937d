//! Streaming TMX-subset parser
//!
//! One forward pass over the file bytes. The `<map>` header gives the
//! grid dimensions, CSV tile layers fill it (chunked layers from Tiled's
//! infinite maps stitch into the same grid), and the two known object
//! groups become colliders and spawn markers. Object coordinates are in
//! pixels in the file and converted to tile units here.
//!
//! Malformed input never panics: a broken header or a tile cursor that
//! leaves the grid is a `LevelError`, and unrecognized object groups are
//! skipped so newer level files keep loading.

use std::fs;
use std::path::Path;

use macroquad::prelude::*;

use super::scanner::Scanner;
use crate::config::{SpawnKind, SpawnTable};
use crate::game::entity::{Entity, EntityKind};

/// Validation limits to prevent resource exhaustion from malicious files
pub mod limits {
    /// Maximum tile map dimension (width or height)
    pub const MAX_MAP_DIMENSION: i32 = 4096;
}

/// Error type for level loading
#[derive(Debug)]
pub enum LevelError {
    IoError(std::io::Error),
    CorruptHeader(String),
    TileOutOfBounds { index: i32, capacity: usize },
    ValidationError(String),
}

impl From<std::io::Error> for LevelError {
    fn from(e: std::io::Error) -> Self {
        LevelError::IoError(e)
    }
}

impl std::fmt::Display for LevelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LevelError::IoError(e) => write!(f, "IO error: {}", e),
            LevelError::CorruptHeader(e) => write!(f, "Corrupt map header: {}", e),
            LevelError::TileOutOfBounds { index, capacity } => {
                write!(f, "Tile index {} outside map of {} cells", index, capacity)
            }
            LevelError::ValidationError(e) => write!(f, "Validation error: {}", e),
        }
    }
}

/// Row-major tile grid. Cell values are gid, 0 for empty; the renderer
/// subtracts 1 to index the tileset atlas.
pub struct TileMap {
    pub width: usize,
    pub height: usize,
    /// Tile dimensions in pixels, from the map header
    pub tile_width: i32,
    pub tile_height: i32,
    pub tiles: Vec<u8>,
}

impl TileMap {
    pub fn tile(&self, x: usize, y: usize) -> u8 {
        self.tiles[y * self.width + x]
    }
}

/// Everything a level file contributes: the tile grid, the static
/// entities (colliders and inert markers), and the player spawn point
/// when the file places one.
pub struct Level {
    pub tile_map: TileMap,
    pub entities: Vec<Entity>,
    pub player_spawn: Option<Vec2>,
}

struct ObjectRect {
    position: Vec2,
    size: Vec2,
    gid: Option<i32>,
}

impl Level {
    pub fn from_path(path: &Path, spawn_table: &SpawnTable) -> Result<Level, LevelError> {
        let data = fs::read(path)?;
        Level::from_bytes(&data, spawn_table)
    }

    pub fn from_bytes(data: &[u8], spawn_table: &SpawnTable) -> Result<Level, LevelError> {
        let mut scan = Scanner::new(data);

        let mut width = 0;
        let mut height = 0;
        let mut tile_width = 0;
        let mut tile_height = 0;

        'header: while !scan.is_done() {
            if scan.eat_literal("<map") {
                while !scan.is_done() {
                    if scan.eat_literal(">") {
                        break 'header;
                    }
                    if scan.eat_literal(" width=\"") {
                        width = scan.take_integer();
                    } else if scan.eat_literal(" height=\"") {
                        height = scan.take_integer();
                    } else if scan.eat_literal(" tilewidth=\"") {
                        tile_width = scan.take_integer();
                    } else if scan.eat_literal(" tileheight=\"") {
                        tile_height = scan.take_integer();
                    } else {
                        scan.advance();
                    }
                }
                break;
            }
            scan.advance();
        }

        if width <= 0 || height <= 0 || tile_width <= 0 || tile_height <= 0 {
            return Err(LevelError::CorruptHeader(format!(
                "map is {}x{} with {}x{} px tiles",
                width, height, tile_width, tile_height
            )));
        }
        if width > limits::MAX_MAP_DIMENSION || height > limits::MAX_MAP_DIMENSION {
            return Err(LevelError::ValidationError(format!(
                "map {}x{} exceeds maximum dimension {}",
                width,
                height,
                limits::MAX_MAP_DIMENSION
            )));
        }

        let mut tile_map = TileMap {
            width: width as usize,
            height: height as usize,
            tile_width,
            tile_height,
            tiles: vec![0; (width * height) as usize],
        };
        let mut entities = Vec::new();
        let mut player_spawn = None;

        while !scan.is_done() {
            if scan.eat_literal("<layer") {
                while !scan.is_done() {
                    if scan.eat_literal("</layer>") {
                        break;
                    }
                    if scan.eat_literal("<data encoding=\"csv\">") {
                        read_tile_layer(&mut scan, &mut tile_map)?;
                    } else {
                        scan.advance();
                    }
                }
            } else if scan.eat_literal("<objectgroup") {
                read_object_group(
                    &mut scan,
                    &tile_map,
                    spawn_table,
                    &mut entities,
                    &mut player_spawn,
                );
            } else {
                scan.advance();
            }
        }

        Ok(Level {
            tile_map,
            entities,
            player_spawn,
        })
    }
}

fn checked_index(tile_index: i32, capacity: usize) -> Result<usize, LevelError> {
    if tile_index < 0 || tile_index as usize >= capacity {
        Err(LevelError::TileOutOfBounds {
            index: tile_index,
            capacity,
        })
    } else {
        Ok(tile_index as usize)
    }
}

/// Parse one CSV `<data>` block into the grid.
///
/// The write cursor is a flat cell index. Commas advance it; digits
/// accumulate into the current cell. A `<chunk>` header teleports the
/// cursor to the chunk's top-left cell, and once a chunk row is full the
/// cursor skips ahead by `map_width - chunk_width` so chunk rows land on
/// consecutive grid rows.
fn read_tile_layer(scan: &mut Scanner, tile_map: &mut TileMap) -> Result<(), LevelError> {
    let capacity = tile_map.tiles.len();
    let map_width = tile_map.width as i32;

    let mut tile_index: i32 = 0;
    let mut chunk_width: i32 = 0;

    while !scan.is_done() {
        if scan.eat_literal("</data>") {
            break;
        }
        match scan.peek() {
            Some(b',') => {
                scan.advance();
                tile_index += 1;
                if chunk_width > 0 && tile_index % chunk_width == 0 {
                    tile_index += map_width - chunk_width;
                }
                let idx = checked_index(tile_index, capacity)?;
                tile_map.tiles[idx] = 0;
            }
            Some(b' ' | b'\n' | b'\t' | b'\r') => {
                scan.advance();
            }
            Some(byte) => {
                if scan.eat_literal("</chunk>") {
                    continue;
                }
                if scan.eat_literal("<chunk") {
                    let mut chunk_x = 0;
                    let mut chunk_y = 0;
                    while !scan.is_done() {
                        if scan.eat_literal(">") {
                            break;
                        }
                        if scan.eat_literal(" x=\"") {
                            chunk_x = scan.take_integer();
                        } else if scan.eat_literal(" y=\"") {
                            chunk_y = scan.take_integer();
                        } else if scan.eat_literal(" width=\"") {
                            chunk_width = scan.take_integer();
                        } else {
                            scan.advance();
                        }
                    }
                    if chunk_x < 0 || chunk_y < 0 {
                        return Err(LevelError::ValidationError(format!(
                            "chunk at ({}, {}) is not normalized",
                            chunk_x, chunk_y
                        )));
                    }
                    tile_index = chunk_y * map_width + chunk_x;
                    let idx = checked_index(tile_index, capacity)?;
                    tile_map.tiles[idx] = 0;
                    continue;
                }
                if byte.is_ascii_digit() {
                    let idx = checked_index(tile_index, capacity)?;
                    let cell = tile_map.tiles[idx];
                    tile_map.tiles[idx] = cell.wrapping_mul(10).wrapping_add(byte - b'0');
                }
                scan.advance();
            }
            None => break,
        }
    }

    Ok(())
}

fn read_object_group(
    scan: &mut Scanner,
    tile_map: &TileMap,
    spawn_table: &SpawnTable,
    entities: &mut Vec<Entity>,
    player_spawn: &mut Option<Vec2>,
) {
    while !scan.is_done() {
        if scan.eat_literal(" name=\"") {
            let Some(name) = scan.take_until(b'"') else {
                return;
            };
            match name {
                b"Entities" => read_entities(scan, tile_map, spawn_table, entities, player_spawn),
                b"Collisions" => read_colliders(scan, tile_map, entities),
                _ => {
                    eprintln!(
                        "Skipping unrecognized object group: {}",
                        String::from_utf8_lossy(name)
                    );
                    skip_object_group(scan);
                }
            }
            return;
        }
        if scan.eat_literal("</objectgroup>") {
            return;
        }
        scan.advance();
    }
}

fn skip_object_group(scan: &mut Scanner) {
    while !scan.is_done() {
        if scan.eat_literal("</objectgroup>") {
            return;
        }
        scan.advance();
    }
}

fn read_colliders(scan: &mut Scanner, tile_map: &TileMap, entities: &mut Vec<Entity>) {
    while !scan.is_done() {
        if scan.eat_literal("</objectgroup>") {
            break;
        }
        if scan.eat_literal("<object") {
            let rect = read_object_rect(scan, tile_map);
            let mut collider = Entity::new(EntityKind::BoxCollider);
            collider.body.position = rect.position;
            collider.body.size = rect.size;
            entities.push(collider);
        } else {
            scan.advance();
        }
    }
}

fn read_entities(
    scan: &mut Scanner,
    tile_map: &TileMap,
    spawn_table: &SpawnTable,
    entities: &mut Vec<Entity>,
    player_spawn: &mut Option<Vec2>,
) {
    while !scan.is_done() {
        if scan.eat_literal("</objectgroup>") {
            break;
        }
        if scan.eat_literal("<object") {
            let rect = read_object_rect(scan, tile_map);
            let kind = rect
                .gid
                .filter(|&gid| gid > 0)
                .and_then(|gid| spawn_table.resolve(gid as u32));
            match kind {
                Some(SpawnKind::Player) => {
                    *player_spawn = Some(rect.position);
                }
                None => {
                    // Unmapped gids stay in the store as inert markers
                    let mut marker = Entity::new(EntityKind::None);
                    marker.body.position = rect.position;
                    marker.body.size = rect.size;
                    entities.push(marker);
                }
            }
        } else {
            scan.advance();
        }
    }
}

/// Parse one `<object .../>` element's rectangle, converting pixel
/// coordinates to tile units.
fn read_object_rect(scan: &mut Scanner, tile_map: &TileMap) -> ObjectRect {
    let mut rect = ObjectRect {
        position: Vec2::ZERO,
        size: Vec2::ZERO,
        gid: None,
    };
    while !scan.is_done() {
        if scan.eat_literal("/>") || scan.eat_literal("</object>") {
            break;
        }
        if scan.eat_literal("gid=\"") {
            rect.gid = Some(scan.take_integer());
        } else if scan.eat_literal(" x=\"") {
            rect.position.x = scan.take_integer() as f32 / tile_map.tile_width as f32;
        } else if scan.eat_literal(" y=\"") {
            rect.position.y = scan.take_integer() as f32 / tile_map.tile_height as f32;
        } else if scan.eat_literal(" width=\"") {
            rect.size.x = scan.take_integer() as f32 / tile_map.tile_width as f32;
        } else if scan.eat_literal(" height=\"") {
            rect.size.y = scan.take_integer() as f32 / tile_map.tile_height as f32;
        } else {
            scan.advance();
        }
    }
    rect
}
