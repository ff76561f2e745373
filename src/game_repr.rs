//! Plain value types shared between the oracle, input handling and rendering.
//!
//! Everything here is a small `Copy` struct or enum with explicit fields and
//! derived equality, so selection state and moves can be compared directly in
//! tests without going through the rules library's own types.

use std::fmt;

/// One of the two sides in a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// The rank a pawn of this side promotes on (rank 7 for White, 0 for Black).
    pub fn promotion_row(self) -> u8 {
        match self {
            Side::White => 7,
            Side::Black => 0,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => write!(f, "White"),
            Side::Black => write!(f, "Black"),
        }
    }
}

/// Kind of a chess piece, without side information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

/// A piece on the board: kind plus owning side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub side: Side,
}

/// A board coordinate: file (`col`) and rank (`row`), both in `[0, 8)`.
///
/// `col = 0` is the a-file, `row = 0` is rank 1. The linear index used by the
/// rules library is `row * 8 + col`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Square {
    pub col: u8,
    pub row: u8,
}

impl Square {
    pub fn new(col: u8, row: u8) -> Self {
        debug_assert!(col < 8 && row < 8, "square ({}, {}) out of range", col, row);
        Self { col, row }
    }

    /// Linear index in `[0, 64)`, rank-major from a1.
    pub fn index(self) -> u8 {
        self.row * 8 + self.col
    }

    pub fn from_index(idx: u8) -> Self {
        debug_assert!(idx < 64, "square index {} out of range", idx);
        Self {
            col: idx % 8,
            row: idx / 8,
        }
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.col) as char, self.row + 1)
    }
}

/// A move: origin, target and an optional promotion piece.
///
/// Two moves are equal iff all three fields match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub fn promoting(from: Square, to: Square, kind: PieceKind) -> Self {
        Self {
            from,
            to,
            promotion: Some(kind),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            let c = match kind {
                PieceKind::Knight => 'n',
                PieceKind::Bishop => 'b',
                PieceKind::Rook => 'r',
                PieceKind::Queen => 'q',
                _ => '?',
            };
            write!(f, "={}", c)?;
        }
        Ok(())
    }
}

/// Outcome state of a session, recomputed once after every committed move.
///
/// Once any terminal variant is reached the session freezes and accepts only
/// a reset command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Checkmate { winner: Side },
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
    Repetition,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        self != GameStatus::InProgress
    }

    /// Human-readable result line shown by the game-over overlay.
    pub fn message(self) -> String {
        match self {
            GameStatus::InProgress => String::new(),
            GameStatus::Checkmate { winner } => format!("Checkmate! {} wins", winner),
            GameStatus::Stalemate => "Stalemate".to_string(),
            GameStatus::InsufficientMaterial => "Draw: insufficient material".to_string(),
            GameStatus::FiftyMoveRule => "Draw: fifty-move rule".to_string(),
            GameStatus::Repetition => "Draw: threefold repetition".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_index_roundtrip() {
        for idx in 0..64u8 {
            let sq = Square::from_index(idx);
            assert_eq!(sq.index(), idx);
        }

        // e4 = file 4, rank 3
        let e4 = Square::new(4, 3);
        assert_eq!(e4.index(), 28);
        assert_eq!(e4.to_string(), "e4");
    }

    #[test]
    fn test_move_equality() {
        let e2 = Square::new(4, 1);
        let e4 = Square::new(4, 3);

        assert_eq!(Move::new(e2, e4), Move::new(e2, e4));
        assert_ne!(Move::new(e2, e4), Move::new(e4, e2));
        assert_ne!(
            Move::new(e2, e4),
            Move::promoting(e2, e4, PieceKind::Queen)
        );
    }

    #[test]
    fn test_promotion_rows() {
        assert_eq!(Side::White.promotion_row(), 7);
        assert_eq!(Side::Black.promotion_row(), 0);
    }

    #[test]
    fn test_status_messages() {
        assert!(!GameStatus::InProgress.is_terminal());
        assert!(GameStatus::Stalemate.is_terminal());

        let mate = GameStatus::Checkmate {
            winner: Side::Black,
        };
        assert!(mate.is_terminal());
        assert_eq!(mate.message(), "Checkmate! Black wins");
    }
}
