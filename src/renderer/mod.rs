//! Draw-backend abstraction layer.
//!
//! *The projection engine never touches pixels or a graphics API directly.*
//! It talks to a type implementing [`DrawBackend`], a small GL-shaped
//! contract: programs, buffers, attribute pointers, 3×3 uniform
//! matrices and `draw_triangles`.
//!
//! * [`Software`] rasterises into a `0x00RRGGBB` frame-buffer on the CPU.
//! * [`Recording`] only logs calls; tests use it to observe uploads/binds.

use bitflags::bitflags;

use crate::error::BackendError;

pub mod recording;
pub mod software;

pub use recording::{Call, Recording};
pub use software::Software;

/// Pixel format of the software frame-buffer (0x00RRGGBB).
pub type Rgba = u32;

/*──────────────────────────── handles ────────────────────────────────*/

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AttribSlot(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UniformSlot(pub u32);

/*──────────────────────────── enums ──────────────────────────────────*/

/// Binding point for [`DrawBackend::bind_buffer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Array,
    ElementArray,
}

/// Upload frequency hint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Usage {
    Static,
}

/// Element type of a vertex attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentType {
    Float,
    UnsignedByte,
}

impl ComponentType {
    #[inline]
    pub fn size(self) -> usize {
        match self {
            ComponentType::Float => 4,
            ComponentType::UnsignedByte => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendFactor {
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
}

bitflags! {
    /// Fixed-function state toggled with `enable` / `disable`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Capability: u8 {
        const BLEND = 0x01;
    }
}

/// Borrowed payload for [`DrawBackend::upload_data`].
#[derive(Clone, Copy, Debug)]
pub enum BufferData<'a> {
    F32(&'a [f32]),
    U16(&'a [u16]),
}

impl BufferData<'_> {
    /// Raw bytes in native order, the way a GPU driver would receive them.
    pub fn as_bytes(&self) -> &[u8] {
        match *self {
            BufferData::F32(v) => bytemuck::cast_slice(v),
            BufferData::U16(v) => bytemuck::cast_slice(v),
        }
    }
}

/// Description of one vertex attribute inside an interleaved buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttribPointer {
    pub components: usize,
    pub kind: ComponentType,
    pub normalize: bool,
    pub stride: usize, // bytes
    pub offset: usize, // bytes
}

/*──────────────────────────── trait ──────────────────────────────────*/

/// The graphics-API-like contract the frame driver emits into.
///
/// Calls are issued from a single thread in frame order; implementations
/// may keep plain mutable state.
pub trait DrawBackend {
    /// Compile and link a program from vertex + fragment sources.
    fn compile_program(
        &mut self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<ProgramHandle, BackendError>;

    fn use_program(&mut self, program: ProgramHandle);

    /// `None` when the program has no attribute with that name.
    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<AttribSlot>;

    /// `None` when the program has no uniform with that name.
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformSlot>;

    fn create_buffer(&mut self) -> BufferHandle;

    /// Bind `buffer` to `target`; `None` unbinds.
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferHandle>);

    /// Replace the contents of the buffer currently bound to `target`.
    fn upload_data(&mut self, target: BufferTarget, data: BufferData<'_>, usage: Usage);

    /// Column-major 3×3 matrix.
    fn set_uniform_matrix3(&mut self, slot: UniformSlot, matrix: &[f32; 9]);

    fn vertex_attrib_pointer(&mut self, slot: AttribSlot, pointer: AttribPointer);

    fn enable_vertex_attrib(&mut self, slot: AttribSlot);

    fn disable_vertex_attrib(&mut self, slot: AttribSlot);

    fn enable(&mut self, cap: Capability);

    fn disable(&mut self, cap: Capability);

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor);

    /// Draw `count` vertices of the bound array buffer as a triangle list.
    fn draw_triangles(&mut self, first: usize, count: usize);
}
