use glam::Vec2;
use hecs::World;

use super::components::{Control, InputCmd, Space};

/* ── Control system ───────────────────────────────────────────────── */

/// Apply one input command to every controllable entity.
///
/// The move vector is normalised so diagonals are not faster, scaled by
/// `speed · dt`, then rotated from the entity's local frame (+y forward,
/// +x right) into the world.
pub fn control_system(world: &mut World, cmd: InputCmd, dt: f32) {
    for (_, (space, control)) in world.query_mut::<(&mut Space, &Control)>() {
        space.rotation =
            (space.rotation + cmd.turn * control.rot_speed * dt).rem_euclid(360.0);

        let local = Vec2::new(cmd.strafe, cmd.forward).normalize_or_zero() * control.speed * dt;
        let (s, c) = space.rotation.to_radians().sin_cos();
        space.position += Vec2::new(local.x * c - local.y * s, local.x * s + local.y * c);
    }
}
