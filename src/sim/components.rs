use glam::Vec2;

use crate::world::{Color, LineSegment};

/// Placement of anything that lives on the floor plane.
#[derive(Debug, Clone, Copy, Default)]
pub struct Space {
    pub position: Vec2,
    pub rotation: f32, // degrees
    pub height: f32,
}

/// Movement tuning for an entity driven by [`InputCmd`]s.
#[derive(Debug, Clone, Copy)]
pub struct Control {
    pub speed: f32,     // map units / s
    pub rot_speed: f32, // degrees / s
}

/// Marks the entity whose eyes the view is rendered from.
#[derive(Debug, Clone, Copy, Default)]
pub struct Viewer;

/// Static wall geometry attached to a level entity.
#[derive(Debug, Clone, Copy)]
pub struct WallShape {
    pub line: LineSegment,
    pub height: f32,
    pub color: Color,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct InputCmd {
    pub forward: f32, // –1 … +1
    pub strafe: f32,  // –1 … +1  (left / right)
    pub turn: f32,    // –1 … +1  (right / left)
}
