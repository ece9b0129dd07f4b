//! Pseudo-3D wall projector.
//!
//! Walls are 2-D line segments extruded to a uniform height. Every frame the
//! [`engine::FrameDriver`] projects each wall through the current
//! [`world::Camera`] into a six-vertex screen-space quad, diffs it against the
//! cached copy and only re-uploads to the [`renderer::DrawBackend`] when
//! something actually moved.

pub mod config;
pub mod engine;
pub mod error;
pub mod renderer;
pub mod sim;
pub mod world;

pub use config::{ViewConfig, Viewport};
pub use error::{BackendError, SetupError};
