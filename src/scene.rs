//! Render model: derives an ordered list of draw primitives from oracle
//! state, selection state and game status.
//!
//! `build_scene` is a pure function; consuming the primitives is the
//! presentation layer's job. Later commands paint over earlier ones, so the
//! list order is the draw order.
//!
//! Scene coordinates are pixels, origin at the top-left, y growing downward.
//! Rank 7 renders at the top row of the board, matching the usual "White at
//! the bottom" orientation.

use crate::game_repr::{GameStatus, Piece, PieceKind, Side, Square};
use crate::input::InputState;
use crate::oracle::Oracle;

pub type Rgba = [f32; 4];

/// How a text primitive is positioned relative to its coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    TopLeft,
    Center,
}

/// One draw primitive. The presentation layer consumes these in order.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Polygon {
        points: Vec<[f32; 2]>,
        color: Rgba,
    },
    Circle {
        center: [f32; 2],
        radius: f32,
        color: Rgba,
    },
    Text {
        text: String,
        position: [f32; 2],
        color: Rgba,
        size: f32,
        anchor: Anchor,
    },
}

// Board palette plus overlay and text colors.
pub const LIGHT_SQUARE: Rgba = [0.89, 0.89, 0.89, 1.0];
pub const DARK_SQUARE: Rgba = [0.47, 0.61, 0.68, 1.0];
pub const SELECTION: Rgba = [0.84, 0.72, 0.56, 0.55];
pub const MOVE_MARKER: Rgba = [0.25, 0.25, 0.25, 0.45];
pub const CHECK_OVERLAY: Rgba = [0.86, 0.25, 0.25, 0.45];
pub const WHITE_PIECE: Rgba = [1.0, 1.0, 1.0, 1.0];
pub const BLACK_PIECE: Rgba = [0.0, 0.0, 0.0, 1.0];
pub const STATUS_TEXT: Rgba = [1.0, 1.0, 1.0, 1.0];
pub const CHECK_TEXT: Rgba = [0.95, 0.85, 0.2, 1.0];
pub const RESULT_TEXT: Rgba = [0.9, 0.2, 0.2, 1.0];
pub const SCRIM: Rgba = [0.0, 0.0, 0.0, 0.55];

/// Side length in pixels of one board square for the given viewport: the
/// board is the largest 8x8 grid fitting the smaller viewport dimension.
pub fn square_size(viewport: (u32, u32)) -> f32 {
    (viewport.0.min(viewport.1) / 8) as f32
}

/// Unicode glyph for a piece, one per (kind, side) pair.
pub fn piece_glyph(piece: Piece) -> &'static str {
    match (piece.side, piece.kind) {
        (Side::White, PieceKind::Pawn) => "\u{2659}",
        (Side::White, PieceKind::Rook) => "\u{2656}",
        (Side::White, PieceKind::Knight) => "\u{2658}",
        (Side::White, PieceKind::Bishop) => "\u{2657}",
        (Side::White, PieceKind::Queen) => "\u{2655}",
        (Side::White, PieceKind::King) => "\u{2654}",
        (Side::Black, PieceKind::Pawn) => "\u{265F}",
        (Side::Black, PieceKind::Rook) => "\u{265C}",
        (Side::Black, PieceKind::Knight) => "\u{265E}",
        (Side::Black, PieceKind::Bishop) => "\u{265D}",
        (Side::Black, PieceKind::Queen) => "\u{265B}",
        (Side::Black, PieceKind::King) => "\u{265A}",
    }
}

/// Pixel rectangle of a square, as polygon corner points.
fn square_polygon(square: Square, s: f32) -> Vec<[f32; 2]> {
    let x = square.col as f32 * s;
    let y = (7 - square.row) as f32 * s;
    vec![[x, y], [x + s, y], [x + s, y + s], [x, y + s]]
}

fn square_center(square: Square, s: f32) -> [f32; 2] {
    let x = square.col as f32 * s;
    let y = (7 - square.row) as f32 * s;
    [x + s / 2.0, y + s / 2.0]
}

/// Build the full scene for one frame.
pub fn build_scene(
    oracle: &Oracle,
    selection: &InputState,
    status: &GameStatus,
    viewport: (u32, u32),
) -> Vec<DrawCmd> {
    let s = square_size(viewport);
    let board_px = s * 8.0;
    let mut scene = Vec::with_capacity(110);

    // 1. Checkerboard.
    for row in 0..8u8 {
        for col in 0..8u8 {
            let color = if (row + col) % 2 == 0 {
                LIGHT_SQUARE
            } else {
                DARK_SQUARE
            };
            scene.push(DrawCmd::Polygon {
                points: square_polygon(Square::new(col, row), s),
                color,
            });
        }
    }

    // 2. Selection overlay and legal-destination markers.
    if let Some(selected) = selection.selected() {
        scene.push(DrawCmd::Polygon {
            points: square_polygon(selected, s),
            color: SELECTION,
        });
        for mv in selection.destinations() {
            scene.push(DrawCmd::Circle {
                center: square_center(mv.to, s),
                radius: s / 6.0,
                color: MOVE_MARKER,
            });
        }
    }

    // 3. Check highlight on the threatened king, unless the game is over.
    if oracle.in_check() && !status.is_terminal() {
        let king = oracle.king_square(oracle.side_to_move());
        scene.push(DrawCmd::Polygon {
            points: square_polygon(king, s),
            color: CHECK_OVERLAY,
        });
    }

    // 4. Piece glyphs.
    for idx in 0..64u8 {
        let square = Square::from_index(idx);
        if let Some(piece) = oracle.piece_at(square) {
            let color = match piece.side {
                Side::White => WHITE_PIECE,
                Side::Black => BLACK_PIECE,
            };
            scene.push(DrawCmd::Text {
                text: piece_glyph(piece).to_string(),
                position: square_center(square, s),
                color,
                size: s / 2.0 - 2.0,
                anchor: Anchor::Center,
            });
        }
    }

    // 5. Side-to-move status line.
    scene.push(DrawCmd::Text {
        text: format!("{} to move", oracle.side_to_move()),
        position: [5.0, 5.0],
        color: STATUS_TEXT,
        size: 15.0,
        anchor: Anchor::TopLeft,
    });

    // 6. Check indicator.
    if oracle.in_check() && !status.is_terminal() {
        scene.push(DrawCmd::Text {
            text: "Check!".to_string(),
            position: [board_px / 2.0, 35.0],
            color: CHECK_TEXT,
            size: 18.0,
            anchor: Anchor::Center,
        });
    }

    // 7. Game-over overlay, always drawn last.
    if status.is_terminal() {
        scene.push(DrawCmd::Polygon {
            points: vec![
                [0.0, 0.0],
                [board_px, 0.0],
                [board_px, board_px],
                [0.0, board_px],
            ],
            color: SCRIM,
        });
        scene.push(DrawCmd::Text {
            text: status.message(),
            position: [board_px / 2.0, board_px / 2.0],
            color: RESULT_TEXT,
            size: 32.0,
            anchor: Anchor::Center,
        });
        scene.push(DrawCmd::Text {
            text: "Press R for a new game".to_string(),
            position: [board_px / 2.0, board_px / 2.0 + 40.0],
            color: STATUS_TEXT,
            size: 18.0,
            anchor: Anchor::Center,
        });
    }

    scene
}
