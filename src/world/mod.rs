mod camera;
mod geometry;

pub use camera::Camera;

pub use geometry::{Color, LineSegment, Wall, WallId, pack_color, set_slot, unpack_color};
