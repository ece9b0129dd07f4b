mod components;
mod scene;
mod systems;

pub use components::{Control, InputCmd, Space, Viewer, WallShape};
pub use scene::{EYE_HEIGHT, Scene, WALL_HEIGHT};
pub use systems::control_system;
