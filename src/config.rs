//! Tunables for the view pipeline.
//!
//! `near_plane` and `clamp_floor` are calibration constants, not values
//! derived from the viewport.

use glam::Vec2;

/// Projection knobs shared by every wall.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewConfig {
    /// Focal scale applied to `x / depth` and `z / depth`.
    pub fov: f32,
    /// Depth below which a point is treated as behind the viewer.
    pub near_plane: f32,
    /// Lowest screen coordinate a projected vertex may take.
    pub clamp_floor: f32,
    /// Colour each corner differently instead of the wall tint.
    pub debug_colors: bool,
    /// Window-level scale multiplied into each wall's model matrix.
    pub global_scale: Vec2,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            fov: 200.0,
            near_plane: 1.0,
            clamp_floor: 10.0,
            debug_colors: false,
            global_scale: Vec2::ONE,
        }
    }
}

/// Screen dimensions the frame is laid out for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Logical game resolution; the projector always works in these units.
    pub game_width: f32,
    pub game_height: f32,
    /// Physical canvas, only used when `scale_on_resize` is off.
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub canvas_scale: f32,
    pub scale_on_resize: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::fixed(640.0, 360.0)
    }
}

impl Viewport {
    /// A viewport whose canvas matches the game resolution and stretches on
    /// resize.
    pub fn fixed(width: f32, height: f32) -> Self {
        Self {
            game_width: width,
            game_height: height,
            canvas_width: width,
            canvas_height: height,
            canvas_scale: 1.0,
            scale_on_resize: true,
        }
    }

    #[inline]
    pub fn half(&self) -> Vec2 {
        Vec2::new(self.game_width * 0.5, self.game_height * 0.5)
    }
}
