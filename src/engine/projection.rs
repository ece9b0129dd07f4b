use glam::{Vec2, Vec3, vec3};

use crate::{
    config::{ViewConfig, Viewport},
    engine::types::{ProjectedQuad, Vertex},
    world::{Camera, Color, Wall, pack_color},
};

/// Per-corner palette used when `ViewConfig::debug_colors` is on.
const DEBUG_CORNERS: [Color; 4] = [Color::RED, Color::GREEN, Color::BLUE, Color::YELLOW];

/// Project one wall into a screen-space quad.
///
/// Camera-space points are `Vec3(x, depth, z)`. The result is always six
/// finite, clamped vertices, even for walls entirely behind the viewer.
pub fn project_wall(
    wall: &Wall,
    camera: &Camera,
    config: &ViewConfig,
    viewport: &Viewport,
) -> ProjectedQuad {
    // ──────────────────────────────────────────────────────────────────────
    // 1. camera-space endpoints
    // ──────────────────────────────────────────────────────────────────────
    let a = camera.to_cam(wall.line.p1);
    let b = camera.to_cam(wall.line.p2);

    // ──────────────────────────────────────────────────────────────────────
    // 2. extrude to base / top corners
    // ──────────────────────────────────────────────────────────────────────
    let base_z = -camera.height;
    let top_z = base_z + wall.height;
    let mut corners = [
        vec3(a.x, a.y, base_z),
        vec3(b.x, b.y, base_z),
        vec3(a.x, a.y, top_z),
        vec3(b.x, b.y, top_z),
    ];

    // ──────────────────────────────────────────────────────────────────────
    // 3. near-plane clip
    // ──────────────────────────────────────────────────────────────────────
    clip_corners(&mut corners, config.near_plane);

    // ──────────────────────────────────────────────────────────────────────
    // 4-5. perspective divide + clamp to the viewport
    // ──────────────────────────────────────────────────────────────────────
    let colors = if config.debug_colors {
        DEBUG_CORNERS.map(pack_color)
    } else {
        [pack_color(wall.color); 4]
    };
    let mut out = [Vertex {
        x: 0.0,
        y: 0.0,
        color: 0.0,
    }; 4];
    for ((v, p), color) in out.iter_mut().zip(corners).zip(colors) {
        let s = project_point(p, config, viewport);
        *v = Vertex {
            x: s.x,
            y: s.y,
            color,
        };
    }

    // ──────────────────────────────────────────────────────────────────────
    // 6. two triangles
    // ──────────────────────────────────────────────────────────────────────
    ProjectedQuad::from_corners(out)
}

/// Clip corners `[base_a, base_b, top_a, top_b]` against the near plane.
///
/// Both endpoints behind → every corner collapses onto `(0, near, 0)`; the
/// quad is still emitted so buffer layout never changes.
fn clip_corners(c: &mut [Vec3; 4], near: f32) {
    let behind_a = c[0].y < near;
    let behind_b = c[1].y < near;
    match (behind_a, behind_b) {
        (true, true) => *c = [vec3(0.0, near, 0.0); 4],
        (true, false) => {
            c[0] = clip_behind_viewer(c[0], c[1], near);
            c[2] = clip_behind_viewer(c[2], c[3], near);
        }
        (false, true) => {
            c[1] = clip_behind_viewer(c[1], c[0], near);
            c[3] = clip_behind_viewer(c[3], c[2], near);
        }
        (false, false) => {}
    }
}

/// Slide `behind` toward `front` on all three axes by
/// `s = d_behind / (d_behind - d_front)`, then lift its depth to `near`.
pub fn clip_behind_viewer(behind: Vec3, front: Vec3, near: f32) -> Vec3 {
    let mut d = behind.y - front.y;
    if d == 0.0 {
        d = 1.0;
    }
    let s = behind.y / d;
    let mut p = behind + (front - behind) * s;
    p.y = p.y.max(near);
    p
}

/// `(x, depth, z)` → clamped screen pixels.
pub fn project_point(p: Vec3, config: &ViewConfig, viewport: &Viewport) -> Vec2 {
    let depth = if p.y == 0.0 { 1.0 } else { p.y };
    let half = viewport.half();
    let sx = p.x * config.fov / depth + half.x;
    let sy = p.z * config.fov / depth + half.y;
    // upper bound wins on viewports narrower than the floor; NaN lands on the floor
    Vec2::new(
        sx.max(config.clamp_floor).min(viewport.game_width),
        sy.max(config.clamp_floor).min(viewport.game_height),
    )
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{LineSegment, WallId};
    use glam::vec2;

    fn wall(p1: Vec2, p2: Vec2, h: f32) -> Wall {
        Wall::new(WallId(1), LineSegment::new(p1, p2), h, Color::BLUE)
    }

    fn corners(q: &ProjectedQuad) -> [Vec2; 4] {
        let v = q.vertices;
        [v[0], v[1], v[2], v[5]].map(|v| vec2(v.x, v.y))
    }

    #[test]
    fn straight_ahead_wall_matches_hand_computation() {
        let cam = Camera::new(Vec2::ZERO, 0.0, 0.0);
        let cfg = ViewConfig::default();
        let vp = Viewport::fixed(640.0, 360.0);
        let q = project_wall(&wall(vec2(0.0, 10.0), vec2(100.0, 10.0), 60.0), &cam, &cfg, &vp);
        let [bl, br, tl, tr] = corners(&q);

        assert_eq!(bl, vec2(320.0, 180.0));
        assert_eq!(br, vec2(640.0, 180.0)); // 2320 clamped
        assert_eq!(tl, vec2(320.0, 360.0)); // 1380 clamped
        assert_eq!(tr, vec2(640.0, 360.0));
    }

    #[test]
    fn unclamped_values_follow_formula() {
        let cam = Camera::new(Vec2::ZERO, 0.0, 0.0);
        let cfg = ViewConfig::default();
        let vp = Viewport::fixed(10_000.0, 10_000.0);
        let q = project_wall(&wall(vec2(0.0, 10.0), vec2(100.0, 10.0), 60.0), &cam, &cfg, &vp);
        let [bl, br, tl, _] = corners(&q);
        assert_eq!(bl, vec2(5000.0, 5000.0));
        assert_eq!(br.x, 100.0 * 200.0 / 10.0 + 5000.0);
        assert_eq!(tl.y, 60.0 * 200.0 / 10.0 + 5000.0);
    }

    #[test]
    fn vertex_order_reuses_shared_diagonal() {
        let cam = Camera::new(Vec2::ZERO, 0.0, 20.0);
        let cfg = ViewConfig::default();
        let vp = Viewport::default();
        let q = project_wall(&wall(vec2(-20.0, 50.0), vec2(20.0, 60.0), 30.0), &cam, &cfg, &vp);
        let v = q.vertices;
        assert_eq!(v[2], v[3]);
        assert_eq!(v[1], v[4]);
        assert_ne!(v[0], v[5]);
    }

    #[test]
    fn projection_is_deterministic() {
        let cam = Camera::new(vec2(3.0, -4.0), 12.5, 8.0);
        let cfg = ViewConfig::default();
        let vp = Viewport::default();
        let w = wall(vec2(-30.0, 40.0), vec2(50.0, 90.0), 60.0);
        let first = project_wall(&w, &cam, &cfg, &vp);
        for _ in 0..4 {
            assert_eq!(project_wall(&w, &cam, &cfg, &vp), first);
        }
    }

    #[test]
    fn wall_behind_viewer_collapses_to_one_point() {
        let cam = Camera::new(Vec2::ZERO, 180.0, 0.0);
        let cfg = ViewConfig::default();
        let vp = Viewport::fixed(640.0, 360.0);
        let q = project_wall(&wall(vec2(0.0, 10.0), vec2(100.0, 10.0), 60.0), &cam, &cfg, &vp);
        for v in q.vertices {
            assert_eq!((v.x, v.y), (320.0, 180.0));
        }
    }

    #[test]
    fn clip_straddling_near_plane() {
        let behind = vec3(0.0, -2.0, 0.0);
        let front = vec3(6.0, 4.0, 3.0);
        let p = clip_behind_viewer(behind, front, 1.0);
        let s = -2.0 / (-2.0 - 4.0);
        assert_eq!(p.y, 1.0);
        assert!((p.x - 6.0 * s).abs() < 1e-5);
        assert!((p.z - 3.0 * s).abs() < 1e-5);
    }

    fn assert_near(got: Vec2, want: Vec2) {
        assert!((got - want).length() < 1e-2, "got {got:?}, want {want:?}");
    }

    // eye at the origin, 10 units up; a 30-high wall from depth -2 to depth 6
    // clips at s = 0.25, so the behind end lands on (x = 20, depth = near)
    fn straddling_setup() -> (Camera, ViewConfig, Viewport) {
        (
            Camera::new(Vec2::ZERO, 0.0, 10.0),
            ViewConfig::default(),
            Viewport::fixed(10_000.0, 10_000.0),
        )
    }

    #[test]
    fn first_endpoint_behind_is_clipped_toward_second() {
        let (cam, cfg, vp) = straddling_setup();
        let q = project_wall(&wall(vec2(0.0, -2.0), vec2(80.0, 6.0), 30.0), &cam, &cfg, &vp);
        let [bl, br, tl, tr] = corners(&q);

        // clipped end: (20, 1, -10) and (20, 1, 20)
        assert_near(bl, vec2(20.0 * 200.0 + 5000.0, -10.0 * 200.0 + 5000.0));
        assert_near(tl, vec2(20.0 * 200.0 + 5000.0, 20.0 * 200.0 + 5000.0));
        assert_eq!(bl.x, tl.x);
        // untouched end at depth 6
        assert_near(br, vec2(80.0 * 200.0 / 6.0 + 5000.0, -10.0 * 200.0 / 6.0 + 5000.0));
        assert_near(tr, vec2(80.0 * 200.0 / 6.0 + 5000.0, 20.0 * 200.0 / 6.0 + 5000.0));
    }

    #[test]
    fn second_endpoint_behind_is_clipped_toward_first() {
        let (cam, cfg, vp) = straddling_setup();
        let q = project_wall(&wall(vec2(80.0, 6.0), vec2(0.0, -2.0), 30.0), &cam, &cfg, &vp);
        let [bl, br, tl, tr] = corners(&q);

        assert_near(bl, vec2(80.0 * 200.0 / 6.0 + 5000.0, -10.0 * 200.0 / 6.0 + 5000.0));
        assert_near(tl, vec2(80.0 * 200.0 / 6.0 + 5000.0, 20.0 * 200.0 / 6.0 + 5000.0));
        assert_near(br, vec2(20.0 * 200.0 + 5000.0, -10.0 * 200.0 + 5000.0));
        assert_near(tr, vec2(20.0 * 200.0 + 5000.0, 20.0 * 200.0 + 5000.0));
        assert_eq!(br.x, tr.x);
    }

    #[test]
    fn camera_offset_shifts_the_eye_before_projection() {
        let cfg = ViewConfig::default();
        let vp = Viewport::fixed(10_000.0, 10_000.0);
        let w = wall(vec2(0.0, 20.0), vec2(100.0, 20.0), 60.0);

        // eye sits at (0, 10), so the wall is 10 deep
        let shifted = Camera::new(vec2(30.0, 20.0), 0.0, 0.0).with_offset(vec2(30.0, 10.0));
        let [bl, br, tl, tr] = corners(&project_wall(&w, &shifted, &cfg, &vp));
        assert_eq!(bl, vec2(5000.0, 5000.0));
        assert_eq!(br, vec2(100.0 * 20.0 + 5000.0, 5000.0));
        assert_eq!(tl, vec2(5000.0, 60.0 * 20.0 + 5000.0));
        assert_eq!(tr, vec2(100.0 * 20.0 + 5000.0, 60.0 * 20.0 + 5000.0));

        let plain = Camera::new(vec2(30.0, 20.0), 0.0, 0.0);
        assert_ne!(project_wall(&w, &plain, &cfg, &vp), project_wall(&w, &shifted, &cfg, &vp));
    }

    #[test]
    fn clip_with_equal_depths_uses_unit_denominator() {
        let p = clip_behind_viewer(vec3(1.0, 0.0, 0.0), vec3(5.0, 0.0, 2.0), 1.0);
        // s = 0 / 1 → point unchanged apart from the depth floor
        assert_eq!(p, vec3(1.0, 1.0, 0.0));
    }

    #[test]
    fn zero_depth_endpoint_stays_finite() {
        let cam = Camera::new(Vec2::ZERO, 0.0, 10.0);
        let cfg = ViewConfig::default();
        let vp = Viewport::default();
        let q = project_wall(&wall(vec2(-5.0, 0.0), vec2(40.0, 30.0), 60.0), &cam, &cfg, &vp);
        for v in q.vertices {
            assert!(v.x.is_finite() && v.y.is_finite());
        }
    }

    #[test]
    fn clamp_holds_for_every_heading() {
        let cfg = ViewConfig::default();
        let vp = Viewport::fixed(640.0, 360.0);
        let walls = [
            wall(vec2(-25.0, 0.0), vec2(100.0, 0.0), 60.0),
            wall(vec2(15.0, 15.0), vec2(200.0, 250.0), 60.0),
            wall(vec2(150.0, 50.0), vec2(250.0, -25.0), 60.0),
            wall(vec2(150.0, 50.0), vec2(150.0, -25.0), 60.0),
            wall(vec2(0.5, 0.5), vec2(0.5, 0.5), 60.0), // zero length
        ];
        let mut rot = 0.0;
        while rot < 360.0 {
            let cam = Camera::new(vec2(10.0, -40.0), rot, 25.0);
            for w in &walls {
                for v in project_wall(w, &cam, &cfg, &vp).vertices {
                    assert!((10.0..=640.0).contains(&v.x), "x={} rot={rot}", v.x);
                    assert!((10.0..=360.0).contains(&v.y), "y={} rot={rot}", v.y);
                }
            }
            rot += 7.5;
        }
    }

    #[test]
    fn tiny_viewport_does_not_panic() {
        let cfg = ViewConfig::default();
        let vp = Viewport::fixed(4.0, 4.0);
        let cam = Camera::default();
        let q = project_wall(&wall(vec2(0.0, 10.0), vec2(1.0, 10.0), 1.0), &cam, &cfg, &vp);
        assert!(q.vertices.iter().all(|v| v.x <= 4.0 && v.y <= 4.0));
    }

    #[test]
    fn debug_colors_differ_per_corner() {
        let cfg = ViewConfig {
            debug_colors: true,
            ..ViewConfig::default()
        };
        let q = project_wall(
            &wall(vec2(0.0, 10.0), vec2(10.0, 10.0), 5.0),
            &Camera::default(),
            &cfg,
            &Viewport::default(),
        );
        let v = q.vertices;
        assert_eq!(v[0].color, pack_color(Color::RED));
        assert_eq!(v[1].color, pack_color(Color::GREEN));
        assert_eq!(v[2].color, pack_color(Color::BLUE));
        assert_eq!(v[5].color, pack_color(Color::YELLOW));
    }
}
