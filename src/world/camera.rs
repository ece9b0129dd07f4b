use glam::{Vec2, vec2};

/// Viewer state the projector reads every frame.
///
/// * `rotation` is in **degrees** and always kept in `[0, 360)`.
/// * `height` is the eye height above the floor.
/// * `offset` shifts the eye relative to the tracked player position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec2,
    rotation: f32,
    pub height: f32,
    pub offset: Vec2,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec2::ZERO, 0.0, 0.0)
    }
}

impl Camera {
    pub fn new(position: Vec2, rotation: f32, height: f32) -> Self {
        Self {
            position,
            rotation: wrap_degrees(rotation),
            height,
            offset: Vec2::ZERO,
        }
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    #[inline]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, degrees: f32) {
        self.rotation = wrap_degrees(degrees);
    }

    /// Rotate by `delta` degrees (positive = counter-clockwise).
    pub fn turn(&mut self, delta: f32) {
        self.set_rotation(self.rotation + delta);
    }

    /// Point the camera space is centred on.
    #[inline]
    pub fn eye(&self) -> Vec2 {
        self.position - self.offset
    }

    /// Transform a floor point into camera space:
    ///  .x = lateral offset
    ///  .y = depth along the view direction
    #[inline]
    pub fn to_cam(&self, p: Vec2) -> Vec2 {
        let rel = p - self.eye();
        let (s, c) = self.rotation.to_radians().sin_cos();
        // rotate by -rotation
        vec2(rel.x * c + rel.y * s, -rel.x * s + rel.y * c)
    }

    /// Unit vector along +depth in world space.
    #[inline]
    pub fn forward(&self) -> Vec2 {
        let (s, c) = self.rotation.to_radians().sin_cos();
        vec2(-s, c)
    }
}

#[inline]
fn wrap_degrees(deg: f32) -> f32 {
    let w = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if w >= 360.0 { 0.0 } else { w }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
