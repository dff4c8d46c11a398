use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{cursor, execute, terminal};
use rand::SeedableRng;
use rand::rngs::StdRng;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Clear, Widget};
use std::error::Error;
use std::io::{self, Stdout};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::tsw_color::{Adapt, Rgba};
use crate::tsw_config::Config;
use crate::tsw_field::Field;
use crate::tsw_game::{Button, Session, State};
use crate::tsw_render::{CELL_HEIGHT, CELL_WIDTH, Origin, RenderError, Renderer, render_frame, window_size};
use crate::tsw_tiles::{TileRect, Tileset};

/// Input the game reacts to, already stripped of terminal details
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Quit,
    Restart,
    Resize(u16, u16),
    ButtonUp { x: u16, y: u16, button: Button },
}

/// Map a terminal event to game input; None for anything ignored
pub fn translate(event: Event) -> Option<InputEvent> {
    match event {
        Event::Key(KeyEvent { code, modifiers, kind, .. }) => {
            if kind != KeyEventKind::Press {
                return None;
            }
            match code {
                KeyCode::Esc | KeyCode::Char('q') => Some(InputEvent::Quit),
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(InputEvent::Quit),
                KeyCode::F(2) | KeyCode::Char('n') => Some(InputEvent::Restart),
                _ => None,
            }
        }
        Event::Mouse(MouseEvent { kind: MouseEventKind::Up(b), column, row, .. }) => {
            let button = match b {
                MouseButton::Left => Button::Primary,
                MouseButton::Right => Button::Secondary,
                MouseButton::Middle => return None,
            };
            Some(InputEvent::ButtonUp { x: column, y: row, button })
        }
        Event::Resize(w, h) => Some(InputEvent::Resize(w, h)),
        _ => None,
    }
}

/// Board cell under screen position (x, y), if the position is right of and below the origin.
/// The result may still lie past the last row or column.
pub fn board_cell(origin: Origin, x: u16, y: u16) -> Option<(usize, usize)> {
    if x < origin.x || y < origin.y {
        return None;
    }
    Some((
        ((y - origin.y) / CELL_HEIGHT) as usize,
        ((x - origin.x) / CELL_WIDTH) as usize,
    ))
}

/// Origin that centers a `window` sized board on a `screen`
pub fn centered_origin(window: (u16, u16), screen: (u16, u16)) -> Origin {
    Origin {
        x: screen.0.saturating_sub(window.0) / 2,
        y: screen.1.saturating_sub(window.1) / 2,
    }
}

/// Apply one input event to the session
pub fn handle_event(session: &mut Session, origin: &mut Origin, event: InputEvent) {
    match event {
        InputEvent::Quit => session.set_state(State::Quit),
        InputEvent::Restart => {
            if let Err(e) = session.restart() {
                error!("restart failed: {}", e);
            }
        }
        InputEvent::Resize(w, h) => {
            let Ok(window) = window_size(session.field()) else {
                return;
            };
            if w < window.0 || h < window.1 {
                warn!(w, h, "terminal smaller than the board");
            }
            *origin = centered_origin(window, (w, h));
        }
        InputEvent::ButtonUp { x, y, button } => {
            if session.state() != State::Running {
                return;
            }
            if let Some((r, c)) = board_cell(*origin, x, y) {
                session.click_on_cell(button, r, c);
            }
        }
    }
}

// Restores the terminal when dropped, however far setup got
struct TermGuard;

impl Drop for TermGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, terminal::LeaveAlternateScreen, cursor::Show);
    }
}

enum DrawOp {
    Clear(Color),
    Tile(TileRect, Rect),
    Text(u16, u16, String),
}

// Widget replaying one frame of draw operations
struct FrameLayer<'a> {
    ops: &'a [DrawOp],
    tileset: &'a Tileset,
}

impl Widget for FrameLayer<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for op in self.ops {
            match op {
                DrawOp::Clear(color) => {
                    Clear.render(area, buf);
                    buf.set_style(area, Style::default().bg(*color));
                }
                DrawOp::Tile(src, dest) => {
                    let Some(tile) = self.tileset.get(*src) else {
                        continue;
                    };
                    if dest.x >= area.right() || dest.y >= area.bottom() {
                        continue;
                    }
                    let mut style = Style::default().fg(tile.fg);
                    if let Some(bg) = tile.bg {
                        style = style.bg(bg);
                    }
                    let room = (area.right() - dest.x).min(dest.width) as usize;
                    buf.set_stringn(dest.x, dest.y, &tile.glyph, room, style);
                }
                DrawOp::Text(x, y, text) => {
                    if *x >= area.right() || *y >= area.bottom() {
                        continue;
                    }
                    let room = (area.right() - x) as usize;
                    buf.set_stringn(*x, *y, text, room, Style::default().fg(Color::White.adapt()));
                }
            }
        }
    }
}

/// Renderer drawing tiles into the terminal through ratatui
pub struct TermRenderer {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    tileset: Tileset,
    ops: Vec<DrawOp>,
    _guard: TermGuard,
}

impl TermRenderer {
    /// Take over the terminal for a board of `width` x `height` cells.
    /// Fails without touching the terminal when it is too small.
    pub fn open(width: u16, height: u16, tileset: Tileset) -> Result<Self, RenderError> {
        let (have_w, have_h) = terminal::size()?;
        if have_w < width || have_h < height {
            return Err(RenderError::WindowTooSmall {
                need_w: width,
                need_h: height,
                have_w,
                have_h,
            });
        }

        enable_raw_mode()?;
        let guard = TermGuard;
        let mut stdout = io::stdout();
        execute!(stdout, EnableMouseCapture, terminal::EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.hide_cursor()?;
        info!(have_w, have_h, "terminal opened");

        Ok(TermRenderer {
            terminal,
            tileset,
            ops: Vec::new(),
            _guard: guard,
        })
    }

    pub fn size(&self) -> Result<(u16, u16), RenderError> {
        let area = self.terminal.size()?;
        Ok((area.width, area.height))
    }
}

impl Renderer for TermRenderer {
    fn clear(&mut self, color: Rgba) {
        self.ops.clear();
        self.ops.push(DrawOp::Clear(color.adapt()));
    }

    fn copy(&mut self, src: TileRect, dest: Rect) {
        self.ops.push(DrawOp::Tile(src, dest));
    }

    fn text(&mut self, x: u16, y: u16, text: &str) {
        self.ops.push(DrawOp::Text(x, y, text.to_string()));
    }

    fn present(&mut self) -> Result<(), RenderError> {
        let layer = FrameLayer {
            ops: &self.ops,
            tileset: &self.tileset,
        };
        self.terminal.draw(|f| {
            let area = f.size();
            f.render_widget(layer, area);
        })?;
        self.ops.clear();
        Ok(())
    }
}

/// Set up the field, asset and terminal, then run frames until Quit
pub fn run(cfg: &Config) -> Result<(), Box<dyn Error>> {
    let rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let field = Field::with_rng(cfg.rows, cfg.columns, cfg.mines, rng);
    let mut session = Session::start(field, cfg.cascade)?;
    let tileset = Tileset::load(&cfg.tileset)?;

    let window = window_size(session.field())?;
    let mut renderer = TermRenderer::open(window.0, window.1, tileset)?;
    let mut origin = centered_origin(window, renderer.size()?);
    let frame_delay = Duration::from_millis(cfg.frame_delay_ms());

    while session.state() != State::Quit {
        render_frame(&mut renderer, origin, &session)?;

        // drain everything queued, never block
        while event::poll(Duration::ZERO)? {
            if let Some(input) = translate(event::read()?) {
                debug!(?input, "input");
                handle_event(&mut session, &mut origin, input);
            }
        }

        thread::sleep(frame_delay);
    }
    info!("quit");
    Ok(())
}
