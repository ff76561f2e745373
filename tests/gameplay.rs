//! End-to-end gameplay scenarios driven through pixel-level pointer input,
//! rendered headlessly via a recording `Renderer`.

use chess_gui::game_repr::{GameStatus, PieceKind, Side, Square};
use chess_gui::renderer::Renderer;
use chess_gui::scene::DrawCmd;
use chess_gui::session::{Command, Session};

/// Records every scene it is asked to present; stands in for the GPU layer.
struct RecordingRenderer {
    size: (u32, u32),
    frames: Vec<Vec<DrawCmd>>,
}

impl RecordingRenderer {
    fn new(size: (u32, u32)) -> Self {
        Self {
            size,
            frames: Vec::new(),
        }
    }

    fn last_frame(&self) -> &[DrawCmd] {
        self.frames.last().expect("at least one frame rendered")
    }
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, scene: &[DrawCmd]) {
        self.frames.push(scene.to_vec());
    }

    fn resize(&mut self, new_size: (u32, u32)) {
        self.size = new_size;
    }

    fn viewport(&self) -> (u32, u32) {
        self.size
    }
}

fn sq(name: &str) -> Square {
    let bytes = name.as_bytes();
    Square::new(bytes[0] - b'a', bytes[1] - b'1')
}

/// Click the center of a square for the given viewport.
fn click(session: &mut Session, renderer: &RecordingRenderer, name: &str) {
    let square = sq(name);
    let s = (renderer.viewport().0.min(renderer.viewport().1) / 8) as f64;
    let pos = (
        square.col as f64 * s + s / 2.0,
        (7 - square.row) as f64 * s + s / 2.0,
    );
    session.pointer_down(pos, renderer.viewport());
}

fn frame_texts(frame: &[DrawCmd]) -> Vec<&str> {
    frame
        .iter()
        .filter_map(|cmd| match cmd {
            DrawCmd::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn fools_mate_end_to_end() {
    let mut session = Session::new();
    let mut renderer = RecordingRenderer::new((640, 640));

    for name in ["f2", "f3", "e7", "e5", "g2", "g4", "d8", "h4"] {
        click(&mut session, &renderer, name);
        let scene = session.scene(renderer.viewport());
        renderer.render(&scene);
    }

    assert_eq!(
        session.status(),
        GameStatus::Checkmate {
            winner: Side::Black,
        }
    );

    let texts = frame_texts(renderer.last_frame());
    assert!(texts.contains(&"Checkmate! Black wins"));
    assert!(texts.contains(&"Press R for a new game"));

    // Frozen session: clicks do nothing until reset.
    click(&mut session, &renderer, "e2");
    click(&mut session, &renderer, "e4");
    assert_eq!(session.oracle().history_len(), 4);

    session.handle_command(Command::Reset);
    assert_eq!(session.status(), GameStatus::InProgress);
    assert_eq!(session.oracle().side_to_move(), Side::White);

    let scene = session.scene(renderer.viewport());
    renderer.render(&scene);
    let texts = frame_texts(renderer.last_frame());
    assert!(texts.contains(&"White to move"));
    assert!(!texts.contains(&"Checkmate! Black wins"));
}

#[test]
fn promotion_through_ui_is_always_a_queen() {
    let mut session = Session::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
    let renderer = RecordingRenderer::new((640, 640));

    click(&mut session, &renderer, "a7");
    click(&mut session, &renderer, "a8");

    assert_eq!(
        session.oracle().piece_at(sq("a8")).map(|p| p.kind),
        Some(PieceKind::Queen)
    );
    assert_eq!(session.oracle().side_to_move(), Side::Black);

    // The new queen's glyph shows up in the next frame.
    let scene = session.scene(renderer.viewport());
    assert!(frame_texts(&scene).contains(&"\u{2655}"));
}

#[test]
fn pointer_math_follows_viewport_resizes() {
    let mut session = Session::new();
    let mut renderer = RecordingRenderer::new((640, 640));

    click(&mut session, &renderer, "e2");
    assert_eq!(session.selected(), Some(sq("e2")));
    session.handle_command(Command::Cancel);

    // Shrink the viewport; square centers move but clicks still land.
    renderer.resize((320, 400));
    click(&mut session, &renderer, "e2");
    assert_eq!(session.selected(), Some(sq("e2")));
    click(&mut session, &renderer, "e4");
    assert_eq!(session.oracle().side_to_move(), Side::Black);

    // A click in the dead zone right of the 320px board is ignored.
    session.pointer_down((330.0, 100.0), renderer.viewport());
    assert_eq!(session.selected(), None);
    assert_eq!(session.oracle().history_len(), 1);
}

#[test]
fn undo_reverts_last_move_and_allows_replay() {
    let mut session = Session::new();
    let renderer = RecordingRenderer::new((640, 640));

    click(&mut session, &renderer, "e2");
    click(&mut session, &renderer, "e4");
    click(&mut session, &renderer, "e7");
    click(&mut session, &renderer, "e5");

    session.handle_command(Command::Undo);
    assert_eq!(session.oracle().history_len(), 1);
    assert_eq!(session.oracle().side_to_move(), Side::Black);

    // The reverted move can be replayed.
    click(&mut session, &renderer, "e7");
    click(&mut session, &renderer, "e5");
    assert_eq!(session.oracle().history_len(), 2);
}

#[test]
fn repetition_draw_needs_no_claim() {
    let mut session = Session::new();
    let mut renderer = RecordingRenderer::new((640, 640));

    for _ in 0..2 {
        for pair in [("g1", "f3"), ("g8", "f6"), ("f3", "g1"), ("f6", "g8")] {
            click(&mut session, &renderer, pair.0);
            click(&mut session, &renderer, pair.1);
        }
    }

    assert_eq!(session.status(), GameStatus::Repetition);

    let scene = session.scene(renderer.viewport());
    renderer.render(&scene);
    assert!(frame_texts(renderer.last_frame()).contains(&"Draw: threefold repetition"));
}
