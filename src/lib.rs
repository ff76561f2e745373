pub mod game_repr;
pub mod input;
pub mod oracle;
pub mod renderer;
pub mod scene;
pub mod session;
