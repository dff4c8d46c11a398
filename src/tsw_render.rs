// Drawing of the board and status line through a small renderer seam
// The terminal implementation lives in tsw_ui; tests use a recording one

use ratatui::layout::Rect;
use std::io;
use thiserror::Error;

use crate::tsw_color::{BACKGROUND, Rgba};
use crate::tsw_field::Field;
use crate::tsw_game::{Session, State};
use crate::tsw_tiles::TileRect;

/// Terminal columns per board cell
pub const CELL_WIDTH: u16 = 2;
/// Terminal rows per board cell
pub const CELL_HEIGHT: u16 = 1;
/// Rows reserved under the board for the status line
pub const STATUS_ROWS: u16 = 1;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),
    #[error("board {rows}x{columns} does not fit in a terminal")]
    BoardTooLarge { rows: usize, columns: usize },
    #[error("terminal is {have_w}x{have_h}, board needs {need_w}x{need_h}")]
    WindowTooSmall {
        need_w: u16,
        need_h: u16,
        have_w: u16,
        have_h: u16,
    },
}

/// Top-left corner of the board on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Origin {
    pub x: u16,
    pub y: u16,
}

/// What the frame loop needs from a display
pub trait Renderer {
    /// Fill the whole frame with `color`
    fn clear(&mut self, color: Rgba);
    /// Draw tile `src` of the tileset into `dest`
    fn copy(&mut self, src: TileRect, dest: Rect);
    /// Draw plain text starting at (x, y)
    fn text(&mut self, x: u16, y: u16, text: &str);
    /// Show the composed frame
    fn present(&mut self) -> Result<(), RenderError>;
}

/// Size of the board in terminal cells; fails when it does not fit a terminal
pub fn board_size(field: &Field) -> Result<(u16, u16), RenderError> {
    let too_large = || RenderError::BoardTooLarge {
        rows: field.rows(),
        columns: field.columns(),
    };
    let w = u16::try_from(field.columns())
        .ok()
        .and_then(|c| c.checked_mul(CELL_WIDTH))
        .ok_or_else(too_large)?;
    let h = u16::try_from(field.rows())
        .ok()
        .and_then(|r| r.checked_mul(CELL_HEIGHT))
        .ok_or_else(too_large)?;
    Ok((w, h))
}

/// Size needed for board plus status line
pub fn window_size(field: &Field) -> Result<(u16, u16), RenderError> {
    let (w, h) = board_size(field)?;
    let h = h.checked_add(STATUS_ROWS).ok_or(RenderError::BoardTooLarge {
        rows: field.rows(),
        columns: field.columns(),
    })?;
    Ok((w, h))
}

/// Screen rectangle of cell (r, c); None when it lies past the u16 range
pub fn cell_dest(origin: Origin, r: usize, c: usize) -> Option<Rect> {
    let x = u16::try_from(c).ok()?.checked_mul(CELL_WIDTH)?.checked_add(origin.x)?;
    let y = u16::try_from(r).ok()?.checked_mul(CELL_HEIGHT)?.checked_add(origin.y)?;
    Some(Rect::new(x, y, CELL_WIDTH, CELL_HEIGHT))
}

/// Tile shown for a cell before any flag overlay
pub fn cell_tile(locked: bool, trapped: bool, danger: u8) -> TileRect {
    if locked {
        TileRect::BLANK
    } else if trapped {
        TileRect::MINE
    } else {
        TileRect::number(danger)
    }
}

pub fn render_game<R: Renderer + ?Sized>(renderer: &mut R, origin: Origin, field: &Field) {
    for r in 0..field.rows() {
        for c in 0..field.columns() {
            let Some(cell) = field.cell(r, c) else {
                continue;
            };
            let Some(dest) = cell_dest(origin, r, c) else {
                continue;
            };
            renderer.copy(cell_tile(cell.locked, cell.trapped, cell.danger), dest);
            if cell.flagged {
                renderer.copy(TileRect::FLAG, dest);
            }
        }
    }
}

/// Text for the line under the board
pub fn status_text(session: &Session) -> String {
    match session.state() {
        State::Running | State::Quit => format!("Mines: {}", session.remaining_mines()),
        State::Success => "Cleared! F2: new".to_string(),
        State::Failure => "Boom! F2: new".to_string(),
    }
}

pub fn render_status<R: Renderer + ?Sized>(renderer: &mut R, origin: Origin, session: &Session) {
    let Ok((_, h)) = board_size(session.field()) else {
        return;
    };
    let Some(y) = origin.y.checked_add(h) else {
        return;
    };
    renderer.text(origin.x, y, &status_text(session));
}

/// One full frame: clear, board, status, present
pub fn render_frame<R: Renderer + ?Sized>(
    renderer: &mut R,
    origin: Origin,
    session: &Session,
) -> Result<(), RenderError> {
    renderer.clear(BACKGROUND);
    render_game(renderer, origin, session.field());
    render_status(renderer, origin, session);
    renderer.present()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tsw_game::Button;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[derive(Default)]
    struct Recorder {
        clears: Vec<Rgba>,
        copies: Vec<(TileRect, Rect)>,
        texts: Vec<(u16, u16, String)>,
        presents: usize,
    }

    impl Renderer for Recorder {
        fn clear(&mut self, color: Rgba) {
            self.clears.push(color);
        }
        fn copy(&mut self, src: TileRect, dest: Rect) {
            self.copies.push((src, dest));
        }
        fn text(&mut self, x: u16, y: u16, text: &str) {
            self.texts.push((x, y, text.to_string()));
        }
        fn present(&mut self) -> Result<(), RenderError> {
            self.presents += 1;
            Ok(())
        }
    }

    fn session(seed: u64) -> Session {
        let field = Field::with_rng(4, 5, 3, StdRng::seed_from_u64(seed));
        Session::start(field, false).unwrap()
    }

    #[test]
    fn cell_tile_choice() {
        assert_eq!(cell_tile(true, true, 0), TileRect::BLANK);
        assert_eq!(cell_tile(true, false, 3), TileRect::BLANK);
        assert_eq!(cell_tile(false, true, 0), TileRect::MINE);
        assert_eq!(cell_tile(false, false, 0), TileRect::number(0));
        assert_eq!(cell_tile(false, false, 6), TileRect::number(6));
    }

    #[test]
    fn fresh_board_is_all_blank() {
        let s = session(1);
        let mut rec = Recorder::default();
        render_frame(&mut rec, Origin { x: 3, y: 2 }, &s).unwrap();
        assert_eq!(rec.clears, vec![BACKGROUND]);
        assert_eq!(rec.copies.len(), 20);
        assert!(rec.copies.iter().all(|(src, _)| *src == TileRect::BLANK));
        assert_eq!(rec.copies[0].1, Rect::new(3, 2, CELL_WIDTH, CELL_HEIGHT));
        assert_eq!(rec.copies[19].1, Rect::new(3 + 4 * CELL_WIDTH, 2 + 3 * CELL_HEIGHT, CELL_WIDTH, CELL_HEIGHT));
        assert_eq!(rec.texts, vec![(3, 2 + 4, "Mines: 3".to_string())]);
        assert_eq!(rec.presents, 1);
    }

    #[test]
    fn flag_drawn_over_blank() {
        let mut s = session(2);
        s.click_on_cell(Button::Secondary, 1, 1);
        let mut rec = Recorder::default();
        render_game(&mut rec, Origin::default(), s.field());
        let at = Rect::new(CELL_WIDTH, CELL_HEIGHT, CELL_WIDTH, CELL_HEIGHT);
        let here: Vec<TileRect> = rec.copies.iter().filter(|(_, d)| *d == at).map(|(t, _)| *t).collect();
        assert_eq!(here, vec![TileRect::BLANK, TileRect::FLAG]);
        assert_eq!(rec.copies.len(), 21);
    }

    #[test]
    fn opened_cell_shows_its_number() {
        let mut s = session(3);
        let field = s.field();
        let (r, c) = (0..20)
            .map(|i| (i / 5, i % 5))
            .find(|&(r, c)| !field.cell(r, c).unwrap().trapped)
            .unwrap();
        let danger = field.cell(r, c).unwrap().danger;
        s.click_on_cell(Button::Primary, r, c);

        let mut rec = Recorder::default();
        render_game(&mut rec, Origin::default(), s.field());
        let at = Rect::new(c as u16 * CELL_WIDTH, r as u16 * CELL_HEIGHT, CELL_WIDTH, CELL_HEIGHT);
        assert!(rec.copies.contains(&(TileRect::number(danger), at)));
    }

    #[test]
    fn status_follows_state() {
        let mut s = session(4);
        assert_eq!(status_text(&s), "Mines: 3");
        s.click_on_cell(Button::Secondary, 0, 0);
        s.click_on_cell(Button::Secondary, 0, 1);
        s.click_on_cell(Button::Secondary, 0, 2);
        s.click_on_cell(Button::Secondary, 0, 3);
        assert_eq!(status_text(&s), "Mines: -1");
        s.set_state(State::Failure);
        assert_eq!(status_text(&s), "Boom! F2: new");
        s.set_state(State::Success);
        assert_eq!(status_text(&s), "Cleared! F2: new");
    }

    #[test]
    fn window_includes_status_row() {
        let field = Field::new(12, 10, 20);
        assert_eq!(board_size(&field).unwrap(), (20, 12));
        assert_eq!(window_size(&field).unwrap(), (20, 13));
    }

    #[test]
    fn oversized_boards_are_rejected() {
        // 32768 columns * 2 does not fit in u16
        for (rows, columns) in [(12, 32778), (12, 32768), (70000, 10), (12, usize::MAX)] {
            let field = Field::new(rows, columns, 20);
            assert!(
                matches!(board_size(&field), Err(RenderError::BoardTooLarge { .. })),
                "{}x{}",
                rows,
                columns
            );
            assert!(matches!(window_size(&field), Err(RenderError::BoardTooLarge { .. })));
        }
        // board fits but the status row does not
        let field = Field::new(u16::MAX as usize, 10, 20);
        assert!(board_size(&field).is_ok());
        assert!(matches!(window_size(&field), Err(RenderError::BoardTooLarge { .. })));

        let widest = Field::new(12, 32767, 20);
        assert_eq!(window_size(&widest).unwrap(), (65534, 13));
    }

    #[test]
    fn cell_dest_never_wraps() {
        let origin = Origin { x: 10, y: 4 };
        assert_eq!(cell_dest(origin, 2, 3), Some(Rect::new(16, 6, CELL_WIDTH, CELL_HEIGHT)));
        assert_eq!(cell_dest(origin, 0, 32762), Some(Rect::new(65534, 4, CELL_WIDTH, CELL_HEIGHT)));
        assert_eq!(cell_dest(origin, 0, 32763), None);
        assert_eq!(cell_dest(origin, 0, 40000), None);
        assert_eq!(cell_dest(origin, 70000, 0), None);
    }
}
