pub mod cache;
pub mod driver;
pub mod projection;
pub mod types;
pub mod viewport;

pub use cache::{CacheEntry, GeometryCache, Refresh};
pub use driver::{DrawOutcome, FrameContext, FrameDriver, FrameStats};
pub use projection::{clip_behind_viewer, project_point, project_wall};
pub use types::{
    Drawable, FLOATS_PER_VERTEX, ProjectedQuad, VERTEX_COUNT, Vertex, WALL_BUFFER_LEN,
};
pub use viewport::ViewportTransform;
