use crate::world::{Wall, set_slot};

/// Vertices per projected wall (two triangles, no index buffer).
pub const VERTEX_COUNT: usize = 6;

/// `x`, `y`, packed colour.
pub const FLOATS_PER_VERTEX: usize = 3;

/// Float count of one wall's vertex buffer.
pub const WALL_BUFFER_LEN: usize = VERTEX_COUNT * FLOATS_PER_VERTEX;

/// One screen-space vertex as laid out in the vertex buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub color: f32, // see `world::pack_color`
}

/// A wall's on-screen footprint for one camera state.
///
/// Corners are `v0` base-left, `v1` base-right, `v2` top-left, `v3` top-right
/// and the emitted order is `[v0, v1, v2, v2, v1, v3]`. The second triangle
/// reuses `v1`/`v2`; do not reorder into a strip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectedQuad {
    pub vertices: [Vertex; VERTEX_COUNT],
}

impl ProjectedQuad {
    /// Build the six-vertex list from the four corners.
    pub fn from_corners(c: [Vertex; 4]) -> Self {
        Self {
            vertices: [c[0], c[1], c[2], c[2], c[1], c[3]],
        }
    }

    /// Write the interleaved floats into `buffer` through [`set_slot`].
    /// Returns `true` if any slot changed.
    pub fn write_into(&self, buffer: &mut [f32]) -> bool {
        let mut changed = false;
        for (i, v) in self.vertices.iter().enumerate() {
            let base = i * FLOATS_PER_VERTEX;
            if base + FLOATS_PER_VERTEX > buffer.len() {
                break;
            }
            set_slot(buffer, base, v.x, &mut changed);
            set_slot(buffer, base + 1, v.y, &mut changed);
            set_slot(buffer, base + 2, v.color, &mut changed);
        }
        changed
    }
}

/*--------------------------- drawables ------------------------------*/

/// Everything a render record can carry. The view pipeline only knows how to
/// project walls; rectangles and triangles belong to 2-D overlay pipelines.
#[derive(Clone, Debug, PartialEq)]
pub enum Drawable {
    Wall(Wall),
    Rectangle,
    Triangle,
}

impl Drawable {
    /// Floats the view pipeline needs for this drawable; `0` when it cannot
    /// draw it at all.
    pub fn buffer_len(&self) -> usize {
        match self {
            Drawable::Wall(_) => WALL_BUFFER_LEN,
            Drawable::Rectangle | Drawable::Triangle => 0,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Drawable::Wall(_) => "Wall",
            Drawable::Rectangle => "Rectangle",
            Drawable::Triangle => "Triangle",
        }
    }
}

impl From<Wall> for Drawable {
    fn from(w: Wall) -> Self {
        Drawable::Wall(w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32) -> Vertex {
        Vertex { x, y: 0.0, color: 0.0 }
    }

    #[test]
    fn quad_order_shares_the_diagonal() {
        let q = ProjectedQuad::from_corners([v(0.0), v(1.0), v(2.0), v(3.0)]);
        let xs = q.vertices.map(|v| v.x);
        assert_eq!(xs, [0.0, 1.0, 2.0, 2.0, 1.0, 3.0]);
    }

    #[test]
    fn write_into_reports_changes_only_once() {
        let q = ProjectedQuad::from_corners([v(4.0), v(5.0), v(6.0), v(7.0)]);
        let mut buf = [0.0; WALL_BUFFER_LEN];
        assert!(q.write_into(&mut buf));
        assert!(!q.write_into(&mut buf));
        assert_eq!(buf[15], 7.0);
    }

    #[test]
    fn only_walls_need_vertex_floats() {
        assert_eq!(Drawable::Rectangle.buffer_len(), 0);
        assert_eq!(Drawable::Triangle.kind_name(), "Triangle");
    }
}
