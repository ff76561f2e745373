//! Windowed two-player chess. All game state lives in a [`Session`]; this
//! binary only wires winit events to it and presents the resulting scene.
//!
//! Controls: left click to select/move, `R` resets, `U` undoes the last
//! move, `Escape` cancels the current selection.

use chess_gui::renderer::wgpu_renderer::WgpuRenderer;
use chess_gui::renderer::Renderer;
use chess_gui::session::{Command, Session};
use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

struct App {
    window: Option<Arc<Window>>,
    renderer: Option<WgpuRenderer>,
    session: Session,
    cursor: PhysicalPosition<f64>,
}

impl App {
    fn new() -> Self {
        Self {
            window: None,
            renderer: None,
            session: Session::new(),
            cursor: PhysicalPosition::new(0.0, 0.0),
        }
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Chess")
            .with_inner_size(LogicalSize::new(650.0, 650.0));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .expect("failed to create window"),
        );

        let renderer = pollster::block_on(WgpuRenderer::new(window.clone()));
        self.window = Some(window);
        self.renderer = Some(renderer);
        self.request_redraw();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(new_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize((new_size.width, new_size.height));
                }
                self.request_redraw();
            }

            WindowEvent::RedrawRequested => {
                if let Some(renderer) = &mut self.renderer {
                    let scene = self.session.scene(renderer.viewport());
                    renderer.render(&scene);
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = position;
            }

            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if let Some(renderer) = &self.renderer {
                    self.session
                        .pointer_down((self.cursor.x, self.cursor.y), renderer.viewport());
                    self.request_redraw();
                }
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        logical_key,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                let command = match &logical_key {
                    Key::Named(NamedKey::Escape) => Some(Command::Cancel),
                    Key::Character(c) => match c.as_str() {
                        "r" | "R" => Some(Command::Reset),
                        "u" | "U" => Some(Command::Undo),
                        _ => None,
                    },
                    _ => None,
                };
                if let Some(command) = command {
                    self.session.handle_command(command);
                    self.request_redraw();
                }
            }

            _ => {}
        }
    }
}

fn main() {
    env_logger::init();

    let event_loop = EventLoop::new().expect("failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new();
    event_loop
        .run_app(&mut app)
        .expect("event loop terminated abnormally");
}
