// Tileset asset: a grid of glyph tiles addressed by (x, y)
// Layout: (0,0) blank, (1,0) flag, (2,0) mine, (3,0) digit 0,
// digits 1-8 left to right, top to bottom over rows 1 and 2

use ratatui::style::Color;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use unicode_width::UnicodeWidthStr;

use crate::tsw_color::{Adapt, parse_color};
use crate::tsw_render::CELL_WIDTH;

/// Tiles per tileset row
pub const TILES_PER_ROW: usize = 4;
/// Rows needed to hold blank, flag, mine and the nine digits
pub const MIN_ROWS: usize = 3;

/// Default asset location, relative to the working directory
pub const TILESET_PATH: &str = "res/tileset.toml";

#[derive(Debug, Error)]
pub enum TilesetError {
    #[error("failed to read tileset {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse tileset: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("tileset has {found} rows, needs {needed}")]
    TooFewRows { found: usize, needed: usize },
    #[error("tileset row {row} has {found} tiles, needs {needed}")]
    Shape { row: usize, found: usize, needed: usize },
    #[error("tile ({x},{y}) glyph {glyph:?} is {width} columns wide, expected {expected}")]
    GlyphWidth {
        x: usize,
        y: usize,
        glyph: String,
        width: usize,
        expected: usize,
    },
    #[error("tile ({x},{y}) uses unknown colour {name:?}")]
    UnknownColor { x: usize, y: usize, name: String },
}

/// Source rectangle in the tileset, in tile units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub x: u16,
    pub y: u16,
}

impl TileRect {
    pub const BLANK: TileRect = TileRect { x: 0, y: 0 };
    pub const FLAG: TileRect = TileRect { x: 1, y: 0 };
    pub const MINE: TileRect = TileRect { x: 2, y: 0 };

    /// Tile for danger value `n` (0..=8); larger values clamp to 8
    pub fn number(n: u8) -> TileRect {
        match n.min(8) {
            0 => TileRect { x: 3, y: 0 },
            n => {
                let i = (n - 1) as u16;
                TileRect {
                    x: i % TILES_PER_ROW as u16,
                    y: 1 + i / TILES_PER_ROW as u16,
                }
            }
        }
    }
}

/// A loaded tile ready to draw
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub glyph: String,
    pub fg: Color,
    pub bg: Option<Color>, // None draws over whatever is below
}

#[derive(Deserialize)]
struct TileSpec {
    glyph: String,
    fg: String,
    #[serde(default)]
    bg: Option<String>,
}

#[derive(Deserialize)]
struct RowSpec {
    tiles: Vec<TileSpec>,
}

#[derive(Deserialize)]
struct TilesetFile {
    row: Vec<RowSpec>,
}

#[derive(Debug, Clone)]
pub struct Tileset {
    rows: Vec<Vec<Tile>>,
}

impl Tileset {
    /// Read and validate the asset at `path`
    pub fn load(path: &Path) -> Result<Tileset, TilesetError> {
        let text = fs::read_to_string(path).map_err(|source| TilesetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Tileset::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Tileset, TilesetError> {
        let file: TilesetFile = toml::from_str(text)?;
        if file.row.len() < MIN_ROWS {
            return Err(TilesetError::TooFewRows {
                found: file.row.len(),
                needed: MIN_ROWS,
            });
        }

        let mut rows = Vec::with_capacity(file.row.len());
        for (y, row) in file.row.into_iter().enumerate() {
            if row.tiles.len() < TILES_PER_ROW {
                return Err(TilesetError::Shape {
                    row: y,
                    found: row.tiles.len(),
                    needed: TILES_PER_ROW,
                });
            }
            let mut tiles = Vec::with_capacity(row.tiles.len());
            for (x, spec) in row.tiles.into_iter().enumerate() {
                tiles.push(Tile::from_spec(x, y, spec)?);
            }
            rows.push(tiles);
        }
        Ok(Tileset { rows })
    }

    pub fn get(&self, src: TileRect) -> Option<&Tile> {
        self.rows.get(src.y as usize)?.get(src.x as usize)
    }
}

impl Tile {
    fn from_spec(x: usize, y: usize, spec: TileSpec) -> Result<Tile, TilesetError> {
        let width = spec.glyph.as_str().width();
        if width != CELL_WIDTH as usize {
            return Err(TilesetError::GlyphWidth {
                x,
                y,
                glyph: spec.glyph,
                width,
                expected: CELL_WIDTH as usize,
            });
        }
        let color = |name: &str| {
            parse_color(name).map(|c| c.adapt()).ok_or_else(|| TilesetError::UnknownColor {
                x,
                y,
                name: name.to_string(),
            })
        };
        let fg = color(&spec.fg)?;
        let bg = match spec.bg.as_deref() {
            Some(name) => Some(color(name)?),
            None => None,
        };
        Ok(Tile {
            glyph: spec.glyph,
            fg,
            bg,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHIPPED: &str = include_str!("../res/tileset.toml");

    #[test]
    fn shipped_tileset_covers_every_tile() {
        let tiles = Tileset::from_toml(SHIPPED).unwrap();
        for src in [TileRect::BLANK, TileRect::FLAG, TileRect::MINE] {
            assert!(tiles.get(src).is_some());
        }
        for n in 0..=8 {
            assert!(tiles.get(TileRect::number(n)).is_some(), "digit {}", n);
        }
    }

    #[test]
    fn number_layout() {
        assert_eq!(TileRect::number(0), TileRect { x: 3, y: 0 });
        assert_eq!(TileRect::number(1), TileRect { x: 0, y: 1 });
        assert_eq!(TileRect::number(4), TileRect { x: 3, y: 1 });
        assert_eq!(TileRect::number(5), TileRect { x: 0, y: 2 });
        assert_eq!(TileRect::number(8), TileRect { x: 3, y: 2 });
        assert_eq!(TileRect::number(200), TileRect::number(8));
    }

    #[test]
    fn rejects_short_rows() {
        let text = r##"
            [[row]]
            tiles = [{ glyph = "  ", fg = "gray" }]
            [[row]]
            tiles = []
            [[row]]
            tiles = []
        "##;
        assert!(matches!(
            Tileset::from_toml(text),
            Err(TilesetError::Shape { row: 0, found: 1, .. })
        ));
    }

    #[test]
    fn rejects_missing_rows() {
        let text = r##"
            [[row]]
            tiles = []
        "##;
        assert!(matches!(
            Tileset::from_toml(text),
            Err(TilesetError::TooFewRows { found: 1, needed: 3 })
        ));
    }

    #[test]
    fn rejects_wide_glyph_and_bad_colour() {
        let row = |glyph: &str, fg: &str| {
            format!(
                "[[row]]\ntiles = [{t}, {t}, {t}, {t}]\n",
                t = format!("{{ glyph = \"{}\", fg = \"{}\" }}", glyph, fg)
            )
        };
        let wide = format!("{}{}{}", row("abc", "red"), row("ab", "red"), row("ab", "red"));
        assert!(matches!(
            Tileset::from_toml(&wide),
            Err(TilesetError::GlyphWidth { x: 0, y: 0, width: 3, .. })
        ));
        let colour = format!("{}{}{}", row("ab", "red"), row("ab", "mauve"), row("ab", "red"));
        assert!(matches!(
            Tileset::from_toml(&colour),
            Err(TilesetError::UnknownColor { y: 1, .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Tileset::load(Path::new("res/does-not-exist.toml")).unwrap_err();
        assert!(matches!(err, TilesetError::Io { .. }));
    }
}
