//! Backend that draws nothing and remembers everything.

use std::collections::HashMap;

use crate::{
    error::BackendError,
    renderer::{
        AttribPointer, AttribSlot, BlendFactor, BufferData, BufferHandle, BufferTarget,
        Capability, DrawBackend, ProgramHandle, UniformSlot, Usage,
    },
};

/// One logged backend call.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    CompileProgram(ProgramHandle),
    UseProgram(ProgramHandle),
    CreateBuffer(BufferHandle),
    BindBuffer(BufferTarget, Option<BufferHandle>),
    /// Target, bound buffer at upload time, payload as floats (index data is widened).
    Upload(BufferTarget, Option<BufferHandle>, Vec<f32>, Usage),
    UniformMatrix3(UniformSlot, [f32; 9]),
    AttribPointer(AttribSlot, AttribPointer),
    EnableAttrib(AttribSlot),
    DisableAttrib(AttribSlot),
    Enable(Capability),
    Disable(Capability),
    BlendFunc(BlendFactor, BlendFactor),
    DrawTriangles(usize, usize),
}

/// Call-recording [`DrawBackend`].
pub struct Recording {
    calls: Vec<Call>,
    attributes: HashMap<String, AttribSlot>,
    uniforms: HashMap<String, UniformSlot>,
    compile_error: Option<BackendError>,
    bound: HashMap<BufferTarget, Option<BufferHandle>>,
    next_buffer: u32,
    next_program: u32,
}

impl Default for Recording {
    fn default() -> Self {
        let attributes = ["in_Position", "in_Color"]
            .iter()
            .enumerate()
            .map(|(i, n)| (n.to_string(), AttribSlot(i as u32)))
            .collect();
        let uniforms = ["matrixProjection", "matrixView", "matrixModel"]
            .iter()
            .enumerate()
            .map(|(i, n)| (n.to_string(), UniformSlot(i as u32)))
            .collect();
        Self {
            calls: Vec::new(),
            attributes,
            uniforms,
            compile_error: None,
            bound: HashMap::new(),
            next_buffer: 1,
            next_program: 1,
        }
    }
}

impl Recording {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subsequent `compile_program` fails with `err`.
    pub fn failing_compile(err: BackendError) -> Self {
        Self {
            compile_error: Some(err),
            ..Self::default()
        }
    }

    /// Pretend the program lacks attribute `name`.
    pub fn without_attribute(mut self, name: &str) -> Self {
        self.attributes.remove(name);
        self
    }

    /// Pretend the program lacks uniform `name`.
    pub fn without_uniform(mut self, name: &str) -> Self {
        self.uniforms.remove(name);
        self
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Number of uploads to `target` recorded so far.
    pub fn upload_count(&self, target: BufferTarget) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Upload(t, ..) if *t == target))
            .count()
    }

    /// Payload of the most recent array-buffer upload.
    pub fn last_vertex_upload(&self) -> Option<&[f32]> {
        self.calls.iter().rev().find_map(|c| match c {
            Call::Upload(BufferTarget::Array, _, data, _) => Some(data.as_slice()),
            _ => None,
        })
    }

    pub fn draw_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::DrawTriangles(..)))
            .count()
    }

    /// How many times an array buffer was bound to something non-empty.
    pub fn array_bind_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::BindBuffer(BufferTarget::Array, Some(_))))
            .count()
    }
}

impl DrawBackend for Recording {
    fn compile_program(&mut self, _vs: &str, _fs: &str) -> Result<ProgramHandle, BackendError> {
        if let Some(err) = &self.compile_error {
            return Err(err.clone());
        }
        let p = ProgramHandle(self.next_program);
        self.next_program += 1;
        self.calls.push(Call::CompileProgram(p));
        Ok(p)
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.calls.push(Call::UseProgram(program));
    }

    fn attribute_location(&self, _program: ProgramHandle, name: &str) -> Option<AttribSlot> {
        self.attributes.get(name).copied()
    }

    fn uniform_location(&self, _program: ProgramHandle, name: &str) -> Option<UniformSlot> {
        self.uniforms.get(name).copied()
    }

    fn create_buffer(&mut self) -> BufferHandle {
        let b = BufferHandle(self.next_buffer);
        self.next_buffer += 1;
        self.calls.push(Call::CreateBuffer(b));
        b
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferHandle>) {
        self.bound.insert(target, buffer);
        self.calls.push(Call::BindBuffer(target, buffer));
    }

    fn upload_data(&mut self, target: BufferTarget, data: BufferData<'_>, usage: Usage) {
        let values = match data {
            BufferData::F32(v) => v.to_vec(),
            BufferData::U16(v) => v.iter().map(|&i| i as f32).collect(),
        };
        let bound = self.bound.get(&target).copied().flatten();
        self.calls.push(Call::Upload(target, bound, values, usage));
    }

    fn set_uniform_matrix3(&mut self, slot: UniformSlot, matrix: &[f32; 9]) {
        self.calls.push(Call::UniformMatrix3(slot, *matrix));
    }

    fn vertex_attrib_pointer(&mut self, slot: AttribSlot, pointer: AttribPointer) {
        self.calls.push(Call::AttribPointer(slot, pointer));
    }

    fn enable_vertex_attrib(&mut self, slot: AttribSlot) {
        self.calls.push(Call::EnableAttrib(slot));
    }

    fn disable_vertex_attrib(&mut self, slot: AttribSlot) {
        self.calls.push(Call::DisableAttrib(slot));
    }

    fn enable(&mut self, cap: Capability) {
        self.calls.push(Call::Enable(cap));
    }

    fn disable(&mut self, cap: Capability) {
        self.calls.push(Call::Disable(cap));
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.calls.push(Call::BlendFunc(src, dst));
    }

    fn draw_triangles(&mut self, first: usize, count: usize) {
        self.calls.push(Call::DrawTriangles(first, count));
    }
}
