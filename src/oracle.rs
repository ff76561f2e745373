//! Rules oracle: a thin wrapper around the `chess` crate.
//!
//! The oracle owns the authoritative position and everything the `chess`
//! crate's `Board` does not track itself: the move history (for undo), the
//! position-hash history (for repetition detection) and the halfmove clock
//! (for the fifty-move rule). All legality questions are answered by the
//! library; nothing in this crate second-guesses it.
//!
//! # Usage
//!
//! ```rust
//! use chess_gui::game_repr::{Move, Square};
//! use chess_gui::oracle::Oracle;
//!
//! let mut oracle = Oracle::new();
//! let e2e4 = Move::new(Square::new(4, 1), Square::new(4, 3));
//! assert!(oracle.is_legal(e2e4));
//! oracle.apply(e2e4);
//! let undone = oracle.undo().unwrap();
//! assert_eq!(undone, e2e4);
//! ```

use crate::game_repr::{Move, Piece, PieceKind, Side, Square};
use std::str::FromStr;
use thiserror::Error;

/// Errors surfaced by the oracle. Everything else that can go wrong during
/// normal play (clicking an unreachable square, for instance) is absorbed
/// before it reaches this type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OracleError {
    #[error("invalid FEN string: {fen}")]
    InvalidFen { fen: String },

    #[error("cannot undo: move history is empty")]
    EmptyHistory,
}

/// Number of identical positions that ends the game by repetition.
pub const DEFAULT_REPETITION_THRESHOLD: u32 = 3;

/// One applied move together with the state needed to revert it.
#[derive(Debug, Clone, Copy)]
struct HistoryEntry {
    mv: Move,
    board_before: chess::Board,
    halfmove_clock_before: u32,
}

/// Authoritative game state and rules authority for one session.
///
/// Mutated only through [`apply`](Oracle::apply), [`undo`](Oracle::undo) and
/// [`reset`](Oracle::reset); every query is synchronous and non-blocking.
pub struct Oracle {
    board: chess::Board,

    /// Applied moves, most recent last.
    history: Vec<HistoryEntry>,

    /// Zobrist hash of every position seen this game, starting position
    /// included. Scanned by [`repetition`](Oracle::repetition).
    seen_hashes: Vec<u64>,

    /// Plies since the last pawn move or capture. The `chess` crate's
    /// `Board` drops this FEN field, so it is tracked here.
    halfmove_clock: u32,

    /// N in "N-fold repetition".
    repetition_threshold: u32,
}

impl Default for Oracle {
    fn default() -> Self {
        Self::new()
    }
}

impl Oracle {
    /// Create an oracle holding the standard initial position.
    pub fn new() -> Self {
        Self::from_board(chess::Board::default(), 0)
    }

    /// Create an oracle from a FEN string.
    ///
    /// The halfmove-clock field of the FEN seeds the fifty-move counter.
    pub fn from_fen(fen: &str) -> Result<Self, OracleError> {
        let board = chess::Board::from_str(fen).map_err(|_| OracleError::InvalidFen {
            fen: fen.to_string(),
        })?;
        let halfmove_clock = fen
            .split_whitespace()
            .nth(4)
            .and_then(|field| field.parse().ok())
            .unwrap_or(0);
        Ok(Self::from_board(board, halfmove_clock))
    }

    fn from_board(board: chess::Board, halfmove_clock: u32) -> Self {
        Self {
            board,
            history: Vec::new(),
            seen_hashes: vec![board.get_hash()],
            halfmove_clock,
            repetition_threshold: DEFAULT_REPETITION_THRESHOLD,
        }
    }

    /// Override the repetition threshold (default 3).
    pub fn set_repetition_threshold(&mut self, threshold: u32) {
        debug_assert!(threshold >= 2);
        self.repetition_threshold = threshold;
    }

    // ===========================
    // Position queries
    // ===========================

    /// The piece occupying `square`, if any.
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        let sq = to_chess_square(square);
        let kind = from_chess_piece(self.board.piece_on(sq)?);
        let side = from_chess_color(self.board.color_on(sq)?);
        Some(Piece { kind, side })
    }

    pub fn side_to_move(&self) -> Side {
        from_chess_color(self.board.side_to_move())
    }

    /// The square occupied by `side`'s king.
    pub fn king_square(&self, side: Side) -> Square {
        from_chess_square(self.board.king_square(to_chess_color(side)))
    }

    /// Every legal move in the current position, for the side to move.
    pub fn legal_moves(&self) -> Vec<Move> {
        chess::MoveGen::new_legal(&self.board)
            .map(from_chess_move)
            .collect()
    }

    /// Validate a constructed candidate move without applying it.
    pub fn is_legal(&self, mv: Move) -> bool {
        self.board.legal(to_chess_move(mv))
    }

    // ===========================
    // Mutation
    // ===========================

    /// Apply an already-validated move, advancing position and history.
    ///
    /// # Panics
    ///
    /// Panics if the move is illegal. Callers validate through
    /// [`legal_moves`](Oracle::legal_moves) or [`is_legal`](Oracle::is_legal)
    /// first, so an illegal move here is a logic defect, not user input.
    pub fn apply(&mut self, mv: Move) {
        let cmv = to_chess_move(mv);
        assert!(
            self.board.legal(cmv),
            "illegal move {} applied to oracle",
            mv
        );

        // The fifty-move clock resets on any pawn move or capture. En passant
        // is a pawn move, so checking the destination square is enough for
        // the capture half.
        let is_pawn_move = self.board.piece_on(cmv.get_source()) == Some(chess::Piece::Pawn);
        let is_capture = self.board.piece_on(cmv.get_dest()).is_some();

        self.history.push(HistoryEntry {
            mv,
            board_before: self.board,
            halfmove_clock_before: self.halfmove_clock,
        });

        self.board = self.board.make_move_new(cmv);
        self.halfmove_clock = if is_pawn_move || is_capture {
            0
        } else {
            self.halfmove_clock + 1
        };
        self.seen_hashes.push(self.board.get_hash());
    }

    /// Revert the most recent move, returning it.
    pub fn undo(&mut self) -> Result<Move, OracleError> {
        let entry = self.history.pop().ok_or(OracleError::EmptyHistory)?;
        self.board = entry.board_before;
        self.halfmove_clock = entry.halfmove_clock_before;
        self.seen_hashes.pop();
        Ok(entry.mv)
    }

    /// Reinitialize to the standard starting position, clearing all history.
    pub fn reset(&mut self) {
        let threshold = self.repetition_threshold;
        *self = Self::new();
        self.repetition_threshold = threshold;
    }

    /// Number of moves committed so far.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    // ===========================
    // Terminal-condition queries
    // ===========================

    /// Whether the side to move is in check.
    pub fn in_check(&self) -> bool {
        self.board.checkers().popcnt() != 0
    }

    pub fn is_checkmate(&self) -> bool {
        self.board.status() == chess::BoardStatus::Checkmate
    }

    pub fn is_stalemate(&self) -> bool {
        self.board.status() == chess::BoardStatus::Stalemate
    }

    /// Draw by insufficient material: bare kings, or king and one minor
    /// piece against a bare king. Like-colored-bishop endings are rare
    /// enough that they are not detected.
    pub fn insufficient_material(&self) -> bool {
        match self.board.combined().popcnt() {
            2 => true,
            3 => {
                let minors = *self.board.pieces(chess::Piece::Bishop)
                    | *self.board.pieces(chess::Piece::Knight);
                minors.popcnt() == 1
            }
            _ => false,
        }
    }

    /// Fifty full moves (100 plies) without a pawn move or capture.
    pub fn fifty_move_rule(&self) -> bool {
        self.halfmove_clock >= 100
    }

    /// The current position has occurred `repetition_threshold` times.
    pub fn repetition(&self) -> bool {
        let current = self.board.get_hash();
        let count = self
            .seen_hashes
            .iter()
            .filter(|&&hash| hash == current)
            .count();
        count as u32 >= self.repetition_threshold
    }

    /// Halfmove clock, exposed for the fifty-move tests.
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }
}

// ===========================
// chess-crate conversions
// ===========================

fn to_chess_square(square: Square) -> chess::Square {
    chess::Square::make_square(
        chess::Rank::from_index(square.row as usize),
        chess::File::from_index(square.col as usize),
    )
}

fn from_chess_square(sq: chess::Square) -> Square {
    Square::new(sq.get_file().to_index() as u8, sq.get_rank().to_index() as u8)
}

fn to_chess_color(side: Side) -> chess::Color {
    match side {
        Side::White => chess::Color::White,
        Side::Black => chess::Color::Black,
    }
}

fn from_chess_color(color: chess::Color) -> Side {
    match color {
        chess::Color::White => Side::White,
        chess::Color::Black => Side::Black,
    }
}

fn to_chess_piece(kind: PieceKind) -> chess::Piece {
    match kind {
        PieceKind::Pawn => chess::Piece::Pawn,
        PieceKind::Knight => chess::Piece::Knight,
        PieceKind::Bishop => chess::Piece::Bishop,
        PieceKind::Rook => chess::Piece::Rook,
        PieceKind::Queen => chess::Piece::Queen,
        PieceKind::King => chess::Piece::King,
    }
}

fn from_chess_piece(piece: chess::Piece) -> PieceKind {
    match piece {
        chess::Piece::Pawn => PieceKind::Pawn,
        chess::Piece::Knight => PieceKind::Knight,
        chess::Piece::Bishop => PieceKind::Bishop,
        chess::Piece::Rook => PieceKind::Rook,
        chess::Piece::Queen => PieceKind::Queen,
        chess::Piece::King => PieceKind::King,
    }
}

fn to_chess_move(mv: Move) -> chess::ChessMove {
    chess::ChessMove::new(
        to_chess_square(mv.from),
        to_chess_square(mv.to),
        mv.promotion.map(to_chess_piece),
    )
}

fn from_chess_move(cmv: chess::ChessMove) -> Move {
    Move {
        from: from_chess_square(cmv.get_source()),
        to: from_chess_square(cmv.get_dest()),
        promotion: cmv.get_promotion().map(from_chess_piece),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        let bytes = name.as_bytes();
        Square::new(bytes[0] - b'a', bytes[1] - b'1')
    }

    #[test]
    fn test_starting_position() {
        let oracle = Oracle::new();

        assert_eq!(oracle.side_to_move(), Side::White);
        assert_eq!(
            oracle.piece_at(sq("a1")),
            Some(Piece {
                kind: PieceKind::Rook,
                side: Side::White,
            })
        );
        assert_eq!(oracle.piece_at(sq("e4")), None);
        assert_eq!(oracle.king_square(Side::White), sq("e1"));
        assert_eq!(oracle.king_square(Side::Black), sq("e8"));

        // 16 pawn moves plus 4 knight moves
        assert_eq!(oracle.legal_moves().len(), 20);

        assert!(!oracle.in_check());
        assert!(!oracle.is_checkmate());
        assert!(!oracle.is_stalemate());
        assert!(!oracle.insufficient_material());
        assert!(!oracle.fifty_move_rule());
        assert!(!oracle.repetition());
    }

    #[test]
    fn test_apply_and_undo() {
        let mut oracle = Oracle::new();
        let e2e4 = Move::new(sq("e2"), sq("e4"));

        oracle.apply(e2e4);
        assert_eq!(oracle.side_to_move(), Side::Black);
        assert_eq!(oracle.piece_at(sq("e2")), None);
        assert_eq!(
            oracle.piece_at(sq("e4")).map(|p| p.kind),
            Some(PieceKind::Pawn)
        );
        assert_eq!(oracle.history_len(), 1);

        let undone = oracle.undo().unwrap();
        assert_eq!(undone, e2e4);
        assert_eq!(oracle.side_to_move(), Side::White);
        assert_eq!(
            oracle.piece_at(sq("e2")).map(|p| p.kind),
            Some(PieceKind::Pawn)
        );
        assert_eq!(oracle.history_len(), 0);

        assert_eq!(oracle.undo(), Err(OracleError::EmptyHistory));
    }

    #[test]
    fn test_reset_restores_initial_position() {
        let mut oracle = Oracle::new();
        oracle.apply(Move::new(sq("e2"), sq("e4")));
        oracle.apply(Move::new(sq("e7"), sq("e5")));

        oracle.reset();
        assert_eq!(oracle.history_len(), 0);
        assert_eq!(oracle.side_to_move(), Side::White);
        assert_eq!(oracle.legal_moves().len(), 20);
        assert_eq!(oracle.undo(), Err(OracleError::EmptyHistory));
    }

    #[test]
    fn test_halfmove_clock_resets_on_pawn_move_and_capture() {
        let mut oracle = Oracle::new();

        oracle.apply(Move::new(sq("g1"), sq("f3")));
        oracle.apply(Move::new(sq("g8"), sq("f6")));
        assert_eq!(oracle.halfmove_clock(), 2);

        // Pawn move resets
        oracle.apply(Move::new(sq("e2"), sq("e4")));
        assert_eq!(oracle.halfmove_clock(), 0);

        oracle.apply(Move::new(sq("b8"), sq("c6")));
        assert_eq!(oracle.halfmove_clock(), 1);

        // Knight capture on e4 resets
        oracle.apply(Move::new(sq("b1"), sq("c3")));
        oracle.apply(Move::new(sq("f6"), sq("e4")));
        assert_eq!(oracle.halfmove_clock(), 0);
    }

    #[test]
    fn test_fifty_move_rule_from_fen_clock() {
        let oracle = Oracle::from_fen("8/8/8/4k3/8/4K3/8/7R w - - 99 80").unwrap();
        assert!(!oracle.fifty_move_rule());

        let oracle = Oracle::from_fen("8/8/8/4k3/8/4K3/8/7R w - - 100 80").unwrap();
        assert!(oracle.fifty_move_rule());
    }

    #[test]
    fn test_threefold_repetition_by_knight_shuffle() {
        let mut oracle = Oracle::new();

        // Each four-ply shuffle returns to the starting position.
        for _ in 0..2 {
            oracle.apply(Move::new(sq("g1"), sq("f3")));
            oracle.apply(Move::new(sq("g8"), sq("f6")));
            oracle.apply(Move::new(sq("f3"), sq("g1")));
            oracle.apply(Move::new(sq("f6"), sq("g8")));
        }

        // Starting position has now occurred three times.
        assert!(oracle.repetition());

        // Undo one ply and the count drops back under the threshold.
        oracle.undo().unwrap();
        assert!(!oracle.repetition());
    }

    #[test]
    fn test_repetition_threshold_configurable() {
        let mut oracle = Oracle::new();
        oracle.set_repetition_threshold(2);

        oracle.apply(Move::new(sq("g1"), sq("f3")));
        oracle.apply(Move::new(sq("g8"), sq("f6")));
        oracle.apply(Move::new(sq("f3"), sq("g1")));
        assert!(!oracle.repetition());
        oracle.apply(Move::new(sq("f6"), sq("g8")));
        assert!(oracle.repetition());
    }

    #[test]
    fn test_insufficient_material() {
        // Bare kings
        let oracle = Oracle::from_fen("k7/8/8/8/8/8/8/K7 w - - 0 1").unwrap();
        assert!(oracle.insufficient_material());

        // King and bishop vs king
        let oracle = Oracle::from_fen("k7/8/8/8/8/8/8/KB6 w - - 0 1").unwrap();
        assert!(oracle.insufficient_material());

        // King and knight vs king
        let oracle = Oracle::from_fen("kn6/8/8/8/8/8/8/K7 w - - 0 1").unwrap();
        assert!(oracle.insufficient_material());

        // A rook is mating material
        let oracle = Oracle::from_fen("k7/8/8/8/8/8/8/KR6 w - - 0 1").unwrap();
        assert!(!oracle.insufficient_material());

        // So is a pawn
        let oracle = Oracle::from_fen("k7/8/8/8/8/8/P7/K7 w - - 0 1").unwrap();
        assert!(!oracle.insufficient_material());
    }

    #[test]
    fn test_checkmate_detection() {
        // Fool's mate
        let oracle =
            Oracle::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .unwrap();
        assert!(oracle.in_check());
        assert!(oracle.is_checkmate());
        assert!(!oracle.is_stalemate());
    }

    #[test]
    fn test_stalemate_detection() {
        let oracle = Oracle::from_fen("k7/8/1Q6/8/8/8/8/7K b - - 0 1").unwrap();
        assert!(!oracle.in_check());
        assert!(oracle.is_stalemate());
    }

    #[test]
    fn test_promotion_legality() {
        let oracle = Oracle::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();

        let bare = Move::new(sq("a7"), sq("a8"));
        let queen = Move::promoting(sq("a7"), sq("a8"), PieceKind::Queen);

        // A pawn push to the last rank must carry a promotion piece.
        assert!(!oracle.is_legal(bare));
        assert!(oracle.is_legal(queen));

        let mut oracle = oracle;
        oracle.apply(queen);
        assert_eq!(
            oracle.piece_at(sq("a8")),
            Some(Piece {
                kind: PieceKind::Queen,
                side: Side::White,
            })
        );
    }

    #[test]
    fn test_invalid_fen_rejected() {
        assert!(matches!(
            Oracle::from_fen("not a fen"),
            Err(OracleError::InvalidFen { .. })
        ));
    }
}
