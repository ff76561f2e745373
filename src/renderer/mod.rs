use crate::scene::DrawCmd;

pub mod wgpu_renderer;

/// Trait for presenting a scene's draw primitives.
/// This abstraction keeps the session and render model testable without a
/// GPU; tests substitute a recording implementation.
pub trait Renderer {
    /// Present one frame: consume the ordered primitive list, later commands
    /// drawn over earlier ones.
    fn render(&mut self, scene: &[DrawCmd]);

    /// Handle window resize events.
    fn resize(&mut self, new_size: (u32, u32));

    /// Current viewport dimensions in pixels.
    fn viewport(&self) -> (u32, u32);
}
