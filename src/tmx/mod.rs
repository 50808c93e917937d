//! TMX level loading
//!
//! Parses the subset of Tiled's TMX format the game actually ships with:
//! the `<map>` header, CSV-encoded tile layers (with or without chunks),
//! and the `Entities`/`Collisions` object groups. Everything else in the
//! file is skipped. The parser is a single forward pass over the raw
//! bytes; there is deliberately no XML library behind it.

pub mod loader;
pub mod scanner;

pub use loader::{Level, LevelError, TileMap};
pub use scanner::Scanner;
