//! Selection and move-input state machine.
//!
//! Interprets board-square clicks against the oracle. The machine is either
//! `Idle` (no selection) or holds a selected square together with the cached
//! legal moves originating there.
//!
//! # Click handling rules
//!
//! - **No piece selected + click on own piece**: select it, cache its legal
//!   destinations.
//! - **Piece selected + click on a cached destination**: commit the move and
//!   deselect.
//! - **Piece selected + click on a different own piece**: re-select directly.
//! - **Piece selected + pawn clicked onto the far rank**: no enumerated
//!   non-promotion move can match, so a queen-promotion candidate is built
//!   and validated with the oracle before committing. Under-promotion is
//!   never offered; an illegal candidate is silently dropped.
//! - **Anything else**: clear the selection, no move.

use crate::game_repr::{Move, PieceKind, Square};
use crate::oracle::Oracle;
use smallvec::SmallVec;

/// What a single click did to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A piece was selected (or re-selected).
    Selected(Square),
    /// A move was validated and applied to the oracle.
    Committed(Move),
    /// The selection was cleared without a move.
    Cleared,
    /// The click changed nothing.
    Ignored,
}

/// Transient selection state for one session.
///
/// Invariant: `selected` is `Some` iff `destinations` was populated from a
/// piece belonging to the side to move at selection time.
#[derive(Debug, Default)]
pub struct InputState {
    selected: Option<Square>,
    destinations: SmallVec<[Move; 32]>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently selected square, if any.
    pub fn selected(&self) -> Option<Square> {
        self.selected
    }

    /// Cached legal moves originating at the selected square. Empty when idle.
    pub fn destinations(&self) -> &[Move] {
        &self.destinations
    }

    /// Explicit cancel: drop any selection without consulting the oracle.
    pub fn clear(&mut self) {
        self.selected = None;
        self.destinations.clear();
    }

    /// Process a click that resolved to a board square.
    ///
    /// On a committed move the oracle has already been advanced when this
    /// returns; the caller is responsible for recomputing game status.
    pub fn handle_click(&mut self, oracle: &mut Oracle, square: Square) -> ClickOutcome {
        if let Some(from) = self.selected {
            // Commit path: a cached non-promotion move targeting this square.
            if let Some(mv) = self
                .destinations
                .iter()
                .copied()
                .find(|m| m.to == square && m.promotion.is_none())
            {
                oracle.apply(mv);
                self.clear();
                return ClickOutcome::Committed(mv);
            }

            // Re-select path: another piece of the side to move. Checked
            // before the promotion candidate because an occupied own square
            // can never be a legal pawn destination.
            if self.try_select(oracle, square) {
                return ClickOutcome::Selected(square);
            }

            // Auto-queen path: the cached list only carries promotion moves
            // for this target, so build the queen candidate and let the
            // oracle judge it.
            let side = oracle.side_to_move();
            if oracle.piece_at(from).map(|p| p.kind) == Some(PieceKind::Pawn)
                && square.row == side.promotion_row()
            {
                let candidate = Move::promoting(from, square, PieceKind::Queen);
                if oracle.is_legal(candidate) {
                    oracle.apply(candidate);
                    self.clear();
                    return ClickOutcome::Committed(candidate);
                }
                log::debug!("discarding illegal promotion candidate {}", candidate);
            }

            // Not a destination, not a friendly piece: deselect.
            self.clear();
            return ClickOutcome::Cleared;
        }

        if self.try_select(oracle, square) {
            ClickOutcome::Selected(square)
        } else {
            ClickOutcome::Ignored
        }
    }

    /// Select `square` if it holds a piece of the side to move, caching the
    /// legal moves whose origin is that square.
    fn try_select(&mut self, oracle: &Oracle, square: Square) -> bool {
        let owns_piece = oracle
            .piece_at(square)
            .map(|p| p.side == oracle.side_to_move())
            .unwrap_or(false);
        if !owns_piece {
            return false;
        }

        self.selected = Some(square);
        self.destinations = oracle
            .legal_moves()
            .into_iter()
            .filter(|m| m.from == square)
            .collect();
        true
    }
}
