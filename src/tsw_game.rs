// Game session: reveal/flag interaction, first-click safety and end states

use tracing::{debug, info, warn};

use crate::tsw_field::{Field, FieldError};

/// Upper bound on board re-rolls for a first click that lands on a mine
pub const MAX_REROLLS: u32 = 32;

/// Session state driven by the frame loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Quit,
    Success,
    Failure,
}

/// Mouse action on a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Primary,   // reveal
    Secondary, // toggle flag
}

/// One play session on one field
#[derive(Debug)]
pub struct Session {
    field: Field,
    state: State,
    unlocks: u32,
    cascade: bool,
    max_rerolls: u32,
}

impl Session {
    /// Allocate and populate `field`, then start running
    pub fn start(mut field: Field, cascade: bool) -> Result<Self, FieldError> {
        field.alloc()?;
        field.populate_mines()?;
        info!(
            rows = field.rows(),
            columns = field.columns(),
            mines = field.mine_count(),
            cascade,
            "session started"
        );
        Ok(Session {
            field,
            state: State::Running,
            unlocks: 0,
            cascade,
            max_rerolls: MAX_REROLLS,
        })
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn set_state(&mut self, state: State) {
        self.state = state;
    }

    /// Player reveals counted since the board was last rolled
    pub fn unlocks(&self) -> u32 {
        self.unlocks
    }

    /// Mine counter for the status line; negative when over-flagged
    pub fn remaining_mines(&self) -> isize {
        self.field.mine_count() as isize - self.field.flag_count() as isize
    }

    /// Fresh board on the same field, back to Running
    pub fn restart(&mut self) -> Result<(), FieldError> {
        self.field.populate_mines()?;
        self.unlocks = 0;
        self.state = State::Running;
        info!("session restarted");
        Ok(())
    }

    /// Apply a click at (r, c). Ignored outside the board or when not Running.
    pub fn click_on_cell(&mut self, button: Button, r: usize, c: usize) {
        if self.state != State::Running || self.field.cell(r, c).is_none() {
            return;
        }
        debug!(?button, r, c, "click");
        match button {
            Button::Primary => self.reveal(r, c),
            Button::Secondary => {
                if let Some(cell) = self.field.cell_mut(r, c) {
                    if cell.locked {
                        cell.flagged = !cell.flagged;
                    }
                }
            }
        }
    }

    fn reveal(&mut self, r: usize, c: usize) {
        let mut rerolls = 0;
        loop {
            let Some(cell) = self.field.cell_mut(r, c) else {
                return;
            };
            if !cell.locked || cell.flagged {
                return;
            }
            self.unlocks += 1;
            cell.locked = false;
            if !cell.trapped {
                break;
            }

            if self.unlocks >= 2 {
                info!(r, c, "mine hit");
                self.state = State::Failure;
                self.field.reveal_mines();
                return;
            }

            // first unlock of the session landed on a mine
            if rerolls < self.max_rerolls {
                rerolls += 1;
                self.unlocks = 0;
                if self.field.populate_mines().is_err() {
                    return;
                }
                continue;
            }
            warn!(rerolls, "re-roll limit reached, moving mine off first click");
            self.field.relocate_mine(r, c);
            break;
        }
        if rerolls > 0 {
            info!(rerolls, "first click re-rolled the board");
        }

        if self.cascade {
            self.open_around(r, c);
        }
        if self.field.hidden_safe_count() == 0 {
            self.win();
        }
    }

    /// Open the neighbourhood of zero-danger cells starting at (r, c)
    fn open_around(&mut self, r: usize, c: usize) {
        let mut pending = vec![(r, c)];
        while let Some((cr, cc)) = pending.pop() {
            let zero = self
                .field
                .cell(cr, cc)
                .map_or(false, |cell| !cell.trapped && cell.danger == 0);
            if !zero {
                continue;
            }
            let around: Vec<(usize, usize)> = self.field.neighbours(cr, cc).collect();
            for (nr, nc) in around {
                if let Some(cell) = self.field.cell_mut(nr, nc) {
                    if cell.locked && !cell.flagged && !cell.trapped {
                        cell.locked = false;
                        pending.push((nr, nc));
                    }
                }
            }
        }
    }

    fn win(&mut self) {
        self.state = State::Success;
        for r in 0..self.field.rows() {
            for c in 0..self.field.columns() {
                if let Some(cell) = self.field.cell_mut(r, c) {
                    if cell.trapped {
                        cell.flagged = true;
                    }
                }
            }
        }
        info!(unlocks = self.unlocks, "all safe cells opened");
    }

    #[cfg(test)]
    pub(crate) fn field_mut(&mut self) -> &mut Field {
        &mut self.field
    }

    #[cfg(test)]
    pub(crate) fn set_max_rerolls(&mut self, max_rerolls: u32) {
        self.max_rerolls = max_rerolls;
    }
}
