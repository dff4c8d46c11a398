// Minefield model
// Owns the cell grid, mine placement, danger counts and mine reveal on loss

use rand::prelude::*;
use rand::rngs::StdRng;
use thiserror::Error;
use tracing::{debug, error};

/// Highest danger value a cell can carry (all eight neighbours trapped)
pub const MAX_DANGER: u8 = 8;

/// Moore neighbourhood offsets (row, column)
const NEIGHBOUR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

/// Field setup and access failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("invalid minefield size {rows}x{columns}: both sides must be at least 2")]
    InvalidDimensions { rows: usize, columns: usize },
    #[error("invalid mine count {mines}: need at least 2 and fewer than {cells} cells")]
    InvalidMineCount { mines: usize, cells: usize },
    #[error("minefield size {rows}x{columns} is too large")]
    TooLarge { rows: usize, columns: usize },
    #[error("minefield grid is not allocated")]
    NotAllocated,
}

/// A single square of the minefield
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub locked: bool,  // Still hidden from the player
    pub flagged: bool, // Marked as suspected mine (only read while locked)
    pub trapped: bool, // Holds a mine
    pub danger: u8,    // Trapped neighbours, 0..=8; unused on trapped cells
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            locked: true,
            flagged: false,
            trapped: false,
            danger: 0,
        }
    }
}

impl Cell {
    /// Count one more trapped neighbour. Saturates at 8, ignored on mines.
    pub fn raise_danger(&mut self) {
        if self.danger < MAX_DANGER && !self.trapped {
            self.danger += 1;
        }
    }

    /// Locked and safe: still has to be opened to win
    pub fn is_hidden_safe(&self) -> bool {
        self.locked && !self.trapped
    }
}

/// Rectangular minefield with exclusive ownership of its grid
///
/// The grid is a row-major buffer indexed by `r * columns + c`. It is empty
/// until [`Field::alloc`] succeeds and is emptied again by [`Field::dealloc`].
#[derive(Debug)]
pub struct Field {
    rows: usize,
    columns: usize,
    mine_count: usize,
    grid: Vec<Cell>,
    rng: StdRng,
}

impl Field {
    /// Create an unallocated field with an RNG seeded once from OS entropy
    pub fn new(rows: usize, columns: usize, mine_count: usize) -> Self {
        Self::with_rng(rows, columns, mine_count, StdRng::from_entropy())
    }

    /// Create an unallocated field that draws mine positions from `rng`
    pub fn with_rng(rows: usize, columns: usize, mine_count: usize, rng: StdRng) -> Self {
        Field {
            rows,
            columns,
            mine_count,
            grid: Vec::new(),
            rng,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn mine_count(&self) -> usize {
        self.mine_count
    }

    pub fn is_allocated(&self) -> bool {
        !self.grid.is_empty()
    }

    /// Validate the field attributes and allocate the grid.
    /// On failure the grid is left unallocated.
    pub fn alloc(&mut self) -> Result<(), FieldError> {
        if let Err(e) = self.validate() {
            error!("{}", e);
            return Err(e);
        }
        self.grid = vec![Cell::default(); self.rows * self.columns];
        debug!(rows = self.rows, columns = self.columns, "minefield allocated");
        Ok(())
    }

    fn validate(&self) -> Result<(), FieldError> {
        if self.rows < 2 || self.columns < 2 {
            return Err(FieldError::InvalidDimensions {
                rows: self.rows,
                columns: self.columns,
            });
        }
        let Some(cells) = self.rows.checked_mul(self.columns) else {
            return Err(FieldError::TooLarge {
                rows: self.rows,
                columns: self.columns,
            });
        };
        if self.mine_count < 2 || self.mine_count >= cells {
            return Err(FieldError::InvalidMineCount {
                mines: self.mine_count,
                cells,
            });
        }
        Ok(())
    }

    /// Release the grid. Safe on a field that was never allocated.
    pub fn dealloc(&mut self) {
        self.grid = Vec::new();
    }

    pub fn in_bounds(&self, r: isize, c: isize) -> bool {
        r >= 0 && (r as usize) < self.rows && c >= 0 && (c as usize) < self.columns
    }

    fn index(&self, r: usize, c: usize) -> usize {
        r * self.columns + c
    }

    pub fn cell(&self, r: usize, c: usize) -> Option<&Cell> {
        if r < self.rows && c < self.columns {
            self.grid.get(self.index(r, c))
        } else {
            None
        }
    }

    pub fn cell_mut(&mut self, r: usize, c: usize) -> Option<&mut Cell> {
        if r < self.rows && c < self.columns {
            let idx = self.index(r, c);
            self.grid.get_mut(idx)
        } else {
            None
        }
    }

    /// All cells in row-major order; empty when unallocated
    pub fn cells(&self) -> &[Cell] {
        &self.grid
    }

    /// In-bounds Moore neighbours of (r, c)
    pub fn neighbours(&self, r: usize, c: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        NEIGHBOUR_OFFSETS.iter().filter_map(move |&(dr, dc)| {
            let nr = r as isize + dr;
            let nc = c as isize + dc;
            if self.in_bounds(nr, nc) {
                Some((nr as usize, nc as usize))
            } else {
                None
            }
        })
    }

    /// Reset every cell to a fresh hidden state and place `mine_count` mines.
    ///
    /// Positions are drawn uniformly with rejection of already trapped cells.
    /// Each new mine raises the danger of its in-bounds neighbours. The RNG
    /// keeps its state across calls so repeated re-rolls differ.
    pub fn populate_mines(&mut self) -> Result<(), FieldError> {
        if !self.is_allocated() {
            return Err(FieldError::NotAllocated);
        }
        self.grid.fill(Cell::default());

        let mut placed = 0;
        while placed < self.mine_count {
            let r = self.rng.gen_range(0..self.rows);
            let c = self.rng.gen_range(0..self.columns);
            let idx = self.index(r, c);
            if self.grid[idx].trapped {
                continue;
            }
            self.grid[idx].trapped = true;
            self.raise_around(r, c);
            placed += 1;
        }
        debug!(mines = placed, "mines populated");
        Ok(())
    }

    fn raise_around(&mut self, r: usize, c: usize) {
        let around: Vec<(usize, usize)> = self.neighbours(r, c).collect();
        for (nr, nc) in around {
            let idx = self.index(nr, nc);
            self.grid[idx].raise_danger();
        }
    }

    /// Move the mine at (r, c) to a random untrapped cell and recount danger.
    /// Returns false when (r, c) holds no mine.
    pub fn relocate_mine(&mut self, r: usize, c: usize) -> bool {
        let from = match self.cell(r, c) {
            Some(cell) if cell.trapped => self.index(r, c),
            _ => return false,
        };
        let free: Vec<usize> = (0..self.grid.len())
            .filter(|&i| i != from && !self.grid[i].trapped)
            .collect();
        let Some(&to) = free.choose(&mut self.rng) else {
            return false;
        };
        self.grid[from].trapped = false;
        self.grid[to].trapped = true;
        self.recount_danger();
        true
    }

    fn recount_danger(&mut self) {
        for cell in self.grid.iter_mut() {
            cell.danger = 0;
        }
        for r in 0..self.rows {
            for c in 0..self.columns {
                if self.grid[self.index(r, c)].trapped {
                    self.raise_around(r, c);
                }
            }
        }
    }

    /// Unlock every trapped cell; other cells keep their state
    pub fn reveal_mines(&mut self) {
        for cell in self.grid.iter_mut().filter(|cell| cell.trapped) {
            cell.locked = false;
        }
    }

    pub fn flag_count(&self) -> usize {
        self.grid.iter().filter(|cell| cell.locked && cell.flagged).count()
    }

    pub fn hidden_safe_count(&self) -> usize {
        self.grid.iter().filter(|cell| cell.is_hidden_safe()).count()
    }
}
