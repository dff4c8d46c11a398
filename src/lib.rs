// Tile-based terminal Minesweeper
// The minefield model and session logic know nothing about the terminal;
// tsw_ui is the only module that owns it.

pub mod tsw_color;  // Colour names and terminal colour adaptation
pub mod tsw_config; // User configuration on disk
pub mod tsw_field;  // Minefield grid, mines and danger counts
pub mod tsw_game;   // Session state machine: reveal, flag, win and loss
pub mod tsw_render; // Renderer seam and frame drawing
pub mod tsw_tiles;  // Tileset asset
pub mod tsw_ui;     // Terminal renderer, input translation and frame loop

pub use tsw_field::{Cell, Field, FieldError};
pub use tsw_game::{Button, Session, State};
