use glam::{Vec2, vec2};
use hecs::{Entity, World};

use super::{
    components::{Control, InputCmd, Space, Viewer, WallShape},
    systems,
};
use crate::world::{Camera, Color, LineSegment, Wall, WallId};

pub const WALL_HEIGHT: f32 = 60.0;
pub const EYE_HEIGHT: f32 = 10.0;

/// Owns the ECS world and turns it into plain values for the renderer.
pub struct Scene {
    world: World,
    viewer: Option<Entity>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            viewer: None,
        }
    }

    /// The starting level: four blue walls and a viewer looking at them.
    pub fn start() -> Self {
        let mut scene = Self::new();
        scene.spawn_viewer(
            Space {
                position: vec2(60.0, -120.0),
                rotation: 0.0,
                height: EYE_HEIGHT,
            },
            Control {
                speed: 150.0,
                rot_speed: 90.0,
            },
        );
        let walls = [
            (vec2(-25.0, 0.0), vec2(100.0, 0.0)),
            (vec2(15.0, 15.0), vec2(200.0, 250.0)),
            (vec2(150.0, 50.0), vec2(250.0, -25.0)),
            (vec2(150.0, 50.0), vec2(150.0, -25.0)),
        ];
        for (p1, p2) in walls {
            scene.spawn_wall(LineSegment::new(p1, p2), WALL_HEIGHT, Color::BLUE);
        }
        scene
    }

    /// Spawn the (single) viewer; a previous one loses its [`Viewer`] tag.
    pub fn spawn_viewer(&mut self, space: Space, control: Control) -> Entity {
        if let Some(old) = self.viewer.take() {
            let _ = self.world.remove_one::<Viewer>(old);
        }
        let e = self.world.spawn((space, control, Viewer));
        self.viewer = Some(e);
        e
    }

    pub fn spawn_wall(&mut self, line: LineSegment, height: f32, color: Color) -> WallId {
        let e = self.world.spawn((WallShape {
            line,
            height,
            color,
        },));
        wall_id(e)
    }

    /// Remove a wall from the level. The renderer keeps its cached geometry
    /// until told via `FrameDriver::forget_wall`.
    pub fn despawn_wall(&mut self, id: WallId) -> bool {
        let Some(e) = Entity::from_bits(id.0) else {
            return false;
        };
        let is_wall = self.world.entity(e).is_ok_and(|r| r.has::<WallShape>());
        is_wall && self.world.despawn(e).is_ok()
    }

    /// Advance the simulation by one step of `dt` seconds.
    pub fn step(&mut self, cmd: InputCmd, dt: f32) {
        systems::control_system(&mut self.world, cmd, dt);
    }

    /// Camera matching the viewer's current placement, if there is one.
    pub fn camera(&self) -> Option<Camera> {
        let space = *self.world.get::<&Space>(self.viewer?).ok()?;
        Some(Camera::new(space.position, space.rotation, space.height))
    }

    /// All walls, ordered by id so frames iterate them stably.
    pub fn walls(&self) -> Vec<Wall> {
        let mut query = self.world.query::<&WallShape>();
        let mut walls: Vec<Wall> = query
            .iter()
            .map(|(e, shape)| Wall::new(wall_id(e), shape.line, shape.height, shape.color))
            .collect();
        walls.sort_by_key(|w| w.id);
        walls
    }

    pub fn viewer_position(&self) -> Option<Vec2> {
        self.camera().map(|c| c.position)
    }
}

#[inline]
fn wall_id(e: Entity) -> WallId {
    WallId(e.to_bits().get())
}
