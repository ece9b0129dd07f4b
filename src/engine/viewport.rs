use glam::{Mat3, Vec2, Vec3};

use crate::config::Viewport;

/// Projection / view / model matrices fed to the program every frame.
///
/// All three are 2-D homogeneous, column-major. `projection · view` maps
/// pixel `(0, 0)` to NDC `(-1, 1)` and `(w, h)` to `(1, -1)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportTransform {
    pub projection: Mat3,
    pub view: Mat3,
    pub model: Mat3,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self {
            projection: Mat3::from_cols(Vec3::ZERO, Vec3::ZERO, Vec3::Z),
            view: Mat3::IDENTITY,
            model: Mat3::IDENTITY,
        }
    }
}

impl ViewportTransform {
    /// Rebuild projection scale and view translation for `vp`.
    pub fn update(&mut self, vp: &Viewport) {
        let (half_w, half_h) = if vp.scale_on_resize {
            (vp.game_width / 2.0, vp.game_height / 2.0)
        } else {
            (
                vp.canvas_width / (2.0 * vp.canvas_scale),
                vp.canvas_height / (2.0 * vp.canvas_scale),
            )
        };
        self.projection.x_axis.x = 1.0 / half_w;
        self.projection.y_axis.y = 1.0 / -half_h;

        self.view.z_axis.x = -1.0 / self.projection.x_axis.x;
        self.view.z_axis.y = 1.0 / self.projection.y_axis.y;
    }

    /// Overwrite the model's linear part with a pure scale.
    pub fn set_model_scale(&mut self, scale: Vec2) {
        self.model.x_axis.x = scale.x;
        self.model.x_axis.y = 0.0;
        self.model.y_axis.x = 0.0;
        self.model.y_axis.y = scale.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;

    fn ndc(t: &ViewportTransform, p: Vec2) -> Vec2 {
        let v = t.projection * t.view * t.model * p.extend(1.0);
        v.truncate() / v.z
    }

    #[test]
    fn pixel_corners_map_to_ndc_corners() {
        let mut t = ViewportTransform::default();
        t.update(&Viewport::fixed(640.0, 360.0));
        assert!((ndc(&t, vec2(0.0, 0.0)) - vec2(-1.0, 1.0)).length() < 1e-6);
        assert!((ndc(&t, vec2(640.0, 360.0)) - vec2(1.0, -1.0)).length() < 1e-6);
        assert!(ndc(&t, vec2(320.0, 180.0)).length() < 1e-6);
    }

    #[test]
    fn canvas_mode_divides_by_scale() {
        let vp = Viewport {
            canvas_width: 1280.0,
            canvas_height: 720.0,
            canvas_scale: 2.0,
            scale_on_resize: false,
            ..Viewport::fixed(640.0, 360.0)
        };
        let mut t = ViewportTransform::default();
        t.update(&vp);
        assert!((t.projection.x_axis.x - 1.0 / 320.0).abs() < 1e-9);
        assert!((t.projection.y_axis.y + 1.0 / 180.0).abs() < 1e-9);
    }

    #[test]
    fn model_scale_only_touches_diagonal() {
        let mut t = ViewportTransform::default();
        t.set_model_scale(vec2(2.0, 3.0));
        assert_eq!(t.model.to_cols_array(), [2.0, 0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 1.0]);
    }
}
