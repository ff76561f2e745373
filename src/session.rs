//! Session controller: owns one game's oracle, selection state and status,
//! and dispatches pointer/keyboard commands to them.
//!
//! One [`Session`] is one game. It is an explicit object rather than global
//! state, so multiple independent games can coexist (and tests construct
//! them freely). The controller never draws; it hands the render model a
//! snapshot via [`Session::scene`], which is idempotent and side-effect
//! free, so redraws can be triggered as often as convenient.

use crate::game_repr::{GameStatus, Square};
use crate::input::{ClickOutcome, InputState};
use crate::oracle::{Oracle, OracleError};
use crate::scene::{self, DrawCmd};

/// Discrete commands bound to control triggers by the embedding shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start over from the initial position.
    Reset,
    /// Revert the most recent move.
    Undo,
    /// Drop the current selection.
    Cancel,
}

/// Per-game state: rules oracle, input state machine and derived status.
pub struct Session {
    oracle: Oracle,
    input: InputState,
    status: GameStatus,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Start a session at the standard initial position.
    pub fn new() -> Self {
        Self {
            oracle: Oracle::new(),
            input: InputState::new(),
            status: GameStatus::InProgress,
        }
    }

    /// Start a session from a FEN string. The status is recomputed once up
    /// front so that a terminal position loads frozen.
    pub fn from_fen(fen: &str) -> Result<Self, OracleError> {
        let oracle = Oracle::from_fen(fen)?;
        let status = derive_status(&oracle);
        Ok(Self {
            oracle,
            input: InputState::new(),
            status,
        })
    }

    // ===========================
    // State access
    // ===========================

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn oracle(&self) -> &Oracle {
        &self.oracle
    }

    pub fn selected(&self) -> Option<Square> {
        self.input.selected()
    }

    // ===========================
    // Input dispatch
    // ===========================

    /// Handle a pointer-down at viewport pixel coordinates.
    ///
    /// The pixel-to-square conversion uses the same `floor(min / 8)` square
    /// size as the render model, so clicks and drawing stay aligned under
    /// resizes. Out-of-board coordinates are ignored, as is all pointer
    /// input once the game is over.
    pub fn pointer_down(&mut self, pos: (f64, f64), viewport: (u32, u32)) {
        if self.status.is_terminal() {
            log::debug!("pointer input ignored: game over");
            return;
        }

        let square = match pointer_to_square(pos, viewport) {
            Some(square) => square,
            None => {
                log::debug!("pointer input ignored: ({:.0}, {:.0}) outside board", pos.0, pos.1);
                return;
            }
        };

        match self.input.handle_click(&mut self.oracle, square) {
            ClickOutcome::Committed(mv) => {
                log::info!("move committed: {}", mv);
                self.status = derive_status(&self.oracle);
                if self.status.is_terminal() {
                    log::info!("game over: {}", self.status.message());
                }
            }
            ClickOutcome::Selected(square) => log::debug!("selected {}", square),
            ClickOutcome::Cleared | ClickOutcome::Ignored => {}
        }
    }

    /// Handle a discrete command.
    pub fn handle_command(&mut self, command: Command) {
        match command {
            Command::Reset => {
                log::info!("session reset");
                self.oracle.reset();
                self.input.clear();
                self.status = GameStatus::InProgress;
            }
            Command::Undo => {
                if self.status.is_terminal() {
                    log::debug!("undo ignored: game over");
                    return;
                }
                match self.oracle.undo() {
                    Ok(mv) => {
                        log::info!("undid move {}", mv);
                        self.input.clear();
                        // The oracle reverted, so the status is implicitly
                        // non-terminal again.
                        self.status = GameStatus::InProgress;
                    }
                    Err(OracleError::EmptyHistory) => log::debug!("undo ignored: no history"),
                    Err(err) => log::debug!("undo ignored: {}", err),
                }
            }
            Command::Cancel => {
                if !self.status.is_terminal() {
                    self.input.clear();
                }
            }
        }
    }

    // ===========================
    // Rendering
    // ===========================

    /// Build the draw-primitive list for the current state.
    pub fn scene(&self, viewport: (u32, u32)) -> Vec<DrawCmd> {
        scene::build_scene(&self.oracle, &self.input, &self.status, viewport)
    }
}

/// Convert viewport pixel coordinates to a board square, or `None` when the
/// point falls outside the 8x8 grid.
fn pointer_to_square(pos: (f64, f64), viewport: (u32, u32)) -> Option<Square> {
    let size = (viewport.0.min(viewport.1) / 8) as f64;
    if size <= 0.0 || pos.0 < 0.0 || pos.1 < 0.0 {
        return None;
    }

    let col = (pos.0 / size).floor() as i64;
    let row_from_top = (pos.1 / size).floor() as i64;
    if !(0..8).contains(&col) || !(0..8).contains(&row_from_top) {
        return None;
    }

    Some(Square::new(col as u8, (7 - row_from_top) as u8))
}

/// Recompute game status from the oracle's terminal-condition queries.
/// Called exactly once per committed move; first matching condition wins.
fn derive_status(oracle: &Oracle) -> GameStatus {
    if oracle.is_checkmate() {
        GameStatus::Checkmate {
            winner: oracle.side_to_move().opposite(),
        }
    } else if oracle.is_stalemate() {
        GameStatus::Stalemate
    } else if oracle.insufficient_material() {
        GameStatus::InsufficientMaterial
    } else if oracle.fifty_move_rule() {
        GameStatus::FiftyMoveRule
    } else if oracle.repetition() {
        GameStatus::Repetition
    } else {
        GameStatus::InProgress
    }
}
