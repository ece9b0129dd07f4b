//! ---------------------------------------------------------------------------
//! CPU implementation of [`DrawBackend`]
//!
//! * Fills a `Vec<u32>` frame-buffer in **0x00RRGGBB** format, ready for
//!   `minifb::Window::update_with_buffer`.
//! * Executes one fixed program shape: the first attribute is a `vec2`
//!   position, the second a `vec4` colour, and the position is transformed by
//!   the product of the program's `mat3` uniforms in declaration order
//!   (`P · V · M · (x, y, 1)`) followed by a divide by the third component.
//! * "Compilation" is a declaration scan: sources must declare `main`, the
//!   attribute/uniform names become slots in declaration order, and every
//!   `varying` the fragment stage reads must be written by the vertex stage.
//! ---------------------------------------------------------------------------

use std::collections::{HashMap, HashSet};

use glam::{Mat3, Vec2, Vec3, Vec4};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::BackendError,
    renderer::{
        AttribPointer, AttribSlot, BlendFactor, BufferData, BufferHandle, BufferTarget,
        Capability, ComponentType, DrawBackend, ProgramHandle, Rgba, UniformSlot, Usage,
    },
};

static MAIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bvoid\s+main\s*\(").unwrap());
static ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*attribute\s+\w+\s+(\w+)\s*;").unwrap());
static UNIFORM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*uniform\s+(\w+)\s+(\w+)\s*;").unwrap());
static VARYING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*varying\s+\w+\s+(\w+)\s*;").unwrap());

const CLEAR: Rgba = 0x00_55_55_55;

/// A "linked" program: declared names plus current uniform values.
struct Program {
    attributes: Vec<String>,
    uniforms: Vec<String>,
    mat3_uniforms: Vec<usize>, // indices into `uniforms` that are mat3, in order
    values: Vec<Mat3>,
}

/// Projected vertex ready for rasterisation.
#[derive(Clone, Copy)]
struct ScreenVertex {
    pos: Vec2,
    color: Vec4,
}

/*───────────────────────────────────────────────────────────────────────*/
/*                              Backend                                 */
/*───────────────────────────────────────────────────────────────────────*/

pub struct Software {
    scratch: Vec<Rgba>,
    width: usize,
    height: usize,

    programs: Vec<Program>,
    current: Option<ProgramHandle>,

    buffers: HashMap<BufferHandle, Vec<u8>>,
    next_buffer: u32,
    bound: HashMap<BufferTarget, BufferHandle>,

    pointers: HashMap<AttribSlot, AttribPointer>,
    enabled_attribs: HashSet<AttribSlot>,

    caps: Capability,
    blend: (BlendFactor, BlendFactor),
}

impl Default for Software {
    fn default() -> Self {
        Self {
            scratch: Vec::new(),
            width: 0,
            height: 0,
            programs: Vec::new(),
            current: None,
            buffers: HashMap::new(),
            next_buffer: 1,
            bound: HashMap::new(),
            pointers: HashMap::new(),
            enabled_attribs: HashSet::new(),
            caps: Capability::empty(),
            blend: (BlendFactor::One, BlendFactor::OneMinusSrcAlpha),
        }
    }
}

impl Software {
    /// (Re)allocate the frame-buffer for the requested resolution and clear it.
    pub fn begin_frame(&mut self, w: usize, h: usize) {
        if w != self.width || h != self.height {
            self.width = w;
            self.height = h;
            self.scratch.resize(w * h, 0);
        }
        self.scratch.fill(CLEAR);
    }

    /// Finish the frame and **loan** the finished buffer to `submit`.
    pub fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize),
    {
        submit(&self.scratch, self.width, self.height);
    }

    pub fn frame(&self) -> &[Rgba] {
        &self.scratch
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        (x < self.width && y < self.height).then(|| self.scratch[y * self.width + x])
    }

    fn program(&self, handle: ProgramHandle) -> Option<&Program> {
        (handle.0 as usize)
            .checked_sub(1)
            .and_then(|i| self.programs.get(i))
    }

    fn current_program_mut(&mut self) -> Option<&mut Program> {
        let idx = (self.current?.0 as usize).checked_sub(1)?;
        self.programs.get_mut(idx)
    }
}

/*──────────────────────── shader "compiler" ──────────────────────────*/

fn check_stage(stage: &'static str, src: &str) -> Result<(), BackendError> {
    if src.trim().is_empty() {
        return Err(BackendError::Compile {
            stage,
            reason: "empty source".into(),
        });
    }
    if !MAIN.is_match(src) {
        return Err(BackendError::Compile {
            stage,
            reason: "no `void main()` entry point".into(),
        });
    }
    Ok(())
}

fn link(vertex_src: &str, fragment_src: &str) -> Result<Program, BackendError> {
    check_stage("vertex", vertex_src)?;
    check_stage("fragment", fragment_src)?;

    let written: HashSet<&str> = VARYING
        .captures_iter(vertex_src)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    for cap in VARYING.captures_iter(fragment_src) {
        let name = &cap[1];
        if !written.contains(name) {
            return Err(BackendError::Link(format!(
                "varying `{name}` is read by the fragment stage but never written"
            )));
        }
    }

    let attributes: Vec<String> = ATTRIBUTE
        .captures_iter(vertex_src)
        .map(|c| c[1].to_string())
        .collect();
    if attributes.is_empty() {
        return Err(BackendError::Link("vertex stage declares no attributes".into()));
    }

    let mut uniforms = Vec::new();
    let mut mat3_uniforms = Vec::new();
    for cap in UNIFORM.captures_iter(vertex_src) {
        if &cap[1] == "mat3" {
            mat3_uniforms.push(uniforms.len());
        }
        uniforms.push(cap[2].to_string());
    }
    let values = vec![Mat3::IDENTITY; uniforms.len()];

    Ok(Program {
        attributes,
        uniforms,
        mat3_uniforms,
        values,
    })
}

/*──────────────────────── Backend trait impl ─────────────────────────*/

impl DrawBackend for Software {
    fn compile_program(
        &mut self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<ProgramHandle, BackendError> {
        let program = link(vertex_src, fragment_src)?;
        self.programs.push(program);
        Ok(ProgramHandle(self.programs.len() as u32))
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.current = self.program(program).map(|_| program);
    }

    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<AttribSlot> {
        let p = self.program(program)?;
        let idx = p.attributes.iter().position(|a| a == name)?;
        Some(AttribSlot(idx as u32))
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformSlot> {
        let p = self.program(program)?;
        let idx = p.uniforms.iter().position(|u| u == name)?;
        Some(UniformSlot(idx as u32))
    }

    fn create_buffer(&mut self) -> BufferHandle {
        let b = BufferHandle(self.next_buffer);
        self.next_buffer += 1;
        self.buffers.insert(b, Vec::new());
        b
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferHandle>) {
        match buffer {
            Some(b) => self.bound.insert(target, b),
            None => self.bound.remove(&target),
        };
    }

    fn upload_data(&mut self, target: BufferTarget, data: BufferData<'_>, _usage: Usage) {
        if let Some(store) = self
            .bound
            .get(&target)
            .and_then(|b| self.buffers.get_mut(b))
        {
            store.clear();
            store.extend_from_slice(data.as_bytes());
        }
    }

    fn set_uniform_matrix3(&mut self, slot: UniformSlot, matrix: &[f32; 9]) {
        if let Some(v) = self
            .current_program_mut()
            .and_then(|p| p.values.get_mut(slot.0 as usize))
        {
            *v = Mat3::from_cols_array(matrix);
        }
    }

    fn vertex_attrib_pointer(&mut self, slot: AttribSlot, pointer: AttribPointer) {
        self.pointers.insert(slot, pointer);
    }

    fn enable_vertex_attrib(&mut self, slot: AttribSlot) {
        self.enabled_attribs.insert(slot);
    }

    fn disable_vertex_attrib(&mut self, slot: AttribSlot) {
        self.enabled_attribs.remove(&slot);
    }

    fn enable(&mut self, cap: Capability) {
        self.caps |= cap;
    }

    fn disable(&mut self, cap: Capability) {
        self.caps &= !cap;
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.blend = (src, dst);
    }

    fn draw_triangles(&mut self, first: usize, count: usize) {
        let Some(verts) = self.shade_vertices(first, count) else {
            return;
        };
        for tri in verts.chunks_exact(3) {
            self.fill_triangle(tri[0], tri[1], tri[2]);
        }
    }
}

/*──────────────────────── vertex stage ───────────────────────────────*/

/// Read one attribute of vertex `index`; missing components default to
/// `(0, 0, 0, 1)` like GL.
fn fetch(bytes: &[u8], ptr: &AttribPointer, index: usize) -> Option<Vec4> {
    let size = ptr.kind.size();
    let stride = if ptr.stride == 0 {
        ptr.components * size
    } else {
        ptr.stride
    };
    let base = index * stride + ptr.offset;
    let mut out = [0.0, 0.0, 0.0, 1.0];
    for (c, slot) in out.iter_mut().enumerate().take(ptr.components.min(4)) {
        let at = base + c * size;
        let raw = bytes.get(at..at + size)?;
        *slot = match ptr.kind {
            ComponentType::Float => bytemuck::pod_read_unaligned::<f32>(raw),
            ComponentType::UnsignedByte if ptr.normalize => raw[0] as f32 / 255.0,
            ComponentType::UnsignedByte => raw[0] as f32,
        };
    }
    Some(Vec4::from_array(out))
}

impl Software {
    fn shade_vertices(&self, first: usize, count: usize) -> Option<Vec<ScreenVertex>> {
        let program = self.program(self.current?)?;
        let bytes = self.buffers.get(self.bound.get(&BufferTarget::Array)?)?;

        let pos_slot = AttribSlot(0);
        let col_slot = AttribSlot(1);
        if !self.enabled_attribs.contains(&pos_slot) {
            return None;
        }
        let pos_ptr = self.pointers.get(&pos_slot)?;
        let col_ptr = (program.attributes.len() > 1 && self.enabled_attribs.contains(&col_slot))
            .then(|| self.pointers.get(&col_slot))
            .flatten();

        let transform = program
            .mat3_uniforms
            .iter()
            .fold(Mat3::IDENTITY, |acc, &i| acc * program.values[i]);

        let (w, h) = (self.width as f32, self.height as f32);
        let mut out = Vec::with_capacity(count);
        for i in first..first + count {
            let p = fetch(bytes, pos_ptr, i)?;
            let color = match col_ptr {
                Some(ptr) => fetch(bytes, ptr, i)?,
                None => Vec4::ONE,
            };
            let clip = transform * Vec3::new(p.x, p.y, 1.0);
            if clip.z.abs() < f32::EPSILON {
                return None;
            }
            let ndc = clip.truncate() / clip.z;
            out.push(ScreenVertex {
                pos: Vec2::new((ndc.x + 1.0) * 0.5 * w, (1.0 - ndc.y) * 0.5 * h),
                color,
            });
        }
        Some(out)
    }
}

/*──────────────────────── raster stage ───────────────────────────────*/

#[inline]
fn factor(f: BlendFactor, src_alpha: f32) -> f32 {
    match f {
        BlendFactor::One => 1.0,
        BlendFactor::SrcAlpha => src_alpha,
        BlendFactor::OneMinusSrcAlpha => 1.0 - src_alpha,
    }
}

#[inline]
fn unpack_rgb(px: Rgba) -> Vec3 {
    Vec3::new(
        ((px >> 16) & 0xFF) as f32,
        ((px >> 8) & 0xFF) as f32,
        (px & 0xFF) as f32,
    ) / 255.0
}

#[inline]
fn pack_rgb(c: Vec3) -> Rgba {
    let c = (c.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
    (c.x as u32) << 16 | (c.y as u32) << 8 | c.z as u32
}

impl Software {
    /// Gouraud-shaded triangle fill using barycentric weights at pixel centres.
    fn fill_triangle(&mut self, a: ScreenVertex, b: ScreenVertex, c: ScreenVertex) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let (p0, p1, p2) = (a.pos, b.pos, c.pos);

        let min_x = p0.x.min(p1.x).min(p2.x).max(0.0) as usize;
        let max_x = p0.x.max(p1.x).max(p2.x).min(self.width as f32 - 1.0);
        let min_y = p0.y.min(p1.y).min(p2.y).max(0.0) as usize;
        let max_y = p0.y.max(p1.y).max(p2.y).min(self.height as f32 - 1.0);
        if max_x < 0.0 || max_y < 0.0 {
            return;
        }
        let (max_x, max_y) = (max_x as usize, max_y as usize);

        let denom = (p1.y - p2.y) * (p0.x - p2.x) + (p2.x - p1.x) * (p0.y - p2.y);
        if denom.abs() < 1e-4 {
            return; // degenerate
        }
        let inv = 1.0 / denom;
        let blending = self.caps.contains(Capability::BLEND);
        let (src_f, dst_f) = self.blend;

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;
                let w0 = ((p1.y - p2.y) * (px - p2.x) + (p2.x - p1.x) * (py - p2.y)) * inv;
                let w1 = ((p2.y - p0.y) * (px - p2.x) + (p0.x - p2.x) * (py - p2.y)) * inv;
                let w2 = 1.0 - w0 - w1;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let col = a.color * w0 + b.color * w1 + c.color * w2;
                let idx = y * self.width + x;
                self.scratch[idx] = if blending {
                    let dst = unpack_rgb(self.scratch[idx]);
                    let src = col.truncate();
                    pack_rgb(src * factor(src_f, col.w) + dst * factor(dst_f, col.w))
                } else {
                    pack_rgb(col.truncate())
                };
            }
        }
    }
}

/*──────────────────────────────── Tests ───────────────────────────────*/
#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = "
attribute vec2 in_Position;
attribute vec4 in_Color;
uniform mat3 matrixProjection;
uniform mat3 matrixView;
varying vec4 var_Color;
void main() { var_Color = in_Color; }
";
    const FS: &str = "
varying vec4 var_Color;
void main (void) { gl_FragColor = var_Color; }
";

    /// Pixel-space → NDC, the same mapping the frame driver builds.
    fn pixel_matrices(w: f32, h: f32) -> ([f32; 9], [f32; 9]) {
        let proj = Mat3::from_cols_array(&[2.0 / w, 0.0, 0.0, 0.0, -2.0 / h, 0.0, 0.0, 0.0, 1.0]);
        let view = Mat3::from_cols_array(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, -w / 2.0, -h / 2.0, 1.0]);
        (proj.to_cols_array(), view.to_cols_array())
    }

    fn setup(sw: &mut Software, w: usize, h: usize, verts: &[f32]) {
        sw.begin_frame(w, h);
        let prog = sw.compile_program(VS, FS).unwrap();
        sw.use_program(prog);
        let (p, v) = pixel_matrices(w as f32, h as f32);
        sw.set_uniform_matrix3(sw.uniform_location(prog, "matrixProjection").unwrap(), &p);
        sw.set_uniform_matrix3(sw.uniform_location(prog, "matrixView").unwrap(), &v);

        let buf = sw.create_buffer();
        sw.bind_buffer(BufferTarget::Array, Some(buf));
        sw.upload_data(BufferTarget::Array, BufferData::F32(verts), Usage::Static);

        let pos = sw.attribute_location(prog, "in_Position").unwrap();
        let col = sw.attribute_location(prog, "in_Color").unwrap();
        sw.enable_vertex_attrib(pos);
        sw.enable_vertex_attrib(col);
        sw.vertex_attrib_pointer(
            pos,
            AttribPointer {
                components: 2,
                kind: ComponentType::Float,
                normalize: false,
                stride: 12,
                offset: 0,
            },
        );
        sw.vertex_attrib_pointer(
            col,
            AttribPointer {
                components: 4,
                kind: ComponentType::UnsignedByte,
                normalize: true,
                stride: 12,
                offset: 8,
            },
        );
    }

    fn red() -> f32 {
        crate::world::pack_color(crate::world::Color::RED)
    }

    #[test]
    fn locations_follow_declaration_order() {
        let mut sw = Software::default();
        let prog = sw.compile_program(VS, FS).unwrap();
        assert_eq!(sw.attribute_location(prog, "in_Position"), Some(AttribSlot(0)));
        assert_eq!(sw.attribute_location(prog, "in_Color"), Some(AttribSlot(1)));
        assert_eq!(sw.uniform_location(prog, "matrixView"), Some(UniformSlot(1)));
        assert_eq!(sw.uniform_location(prog, "nope"), None);
    }

    #[test]
    fn compile_rejects_missing_main() {
        let mut sw = Software::default();
        let err = sw.compile_program("attribute vec2 a;", FS).unwrap_err();
        assert!(matches!(err, BackendError::Compile { stage: "vertex", .. }));
    }

    #[test]
    fn link_rejects_unwritten_varying() {
        let mut sw = Software::default();
        let vs = "attribute vec2 p;\nvoid main() {}";
        let err = sw.compile_program(vs, FS).unwrap_err();
        assert!(matches!(err, BackendError::Link(_)));
    }

    #[test]
    fn fills_triangle_in_pixel_space() {
        let r = red();
        let verts = [0.0, 0.0, r, 16.0, 0.0, r, 0.0, 16.0, r];
        let mut sw = Software::default();
        setup(&mut sw, 16, 16, &verts);
        sw.draw_triangles(0, 3);

        assert_eq!(sw.pixel(1, 1), Some(0x00_FF_00_00));
        // far corner lies outside the triangle
        assert_eq!(sw.pixel(15, 15), Some(CLEAR));
    }

    #[test]
    fn disabled_position_draws_nothing() {
        let r = red();
        let verts = [0.0, 0.0, r, 16.0, 0.0, r, 0.0, 16.0, r];
        let mut sw = Software::default();
        setup(&mut sw, 16, 16, &verts);
        sw.disable_vertex_attrib(AttribSlot(0));
        sw.draw_triangles(0, 3);
        assert!(sw.frame().iter().all(|&px| px == CLEAR));
    }

    #[test]
    fn blending_mixes_with_background() {
        use crate::world::{Color, pack_color};
        let half = pack_color(Color::rgba(0xFF, 0xFF, 0xFF, 0x80));
        let verts = [0.0, 0.0, half, 16.0, 0.0, half, 0.0, 16.0, half];
        let mut sw = Software::default();
        setup(&mut sw, 16, 16, &verts);
        sw.enable(Capability::BLEND);
        sw.blend_func(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);
        sw.draw_triangles(0, 3);

        let px = sw.pixel(1, 1).unwrap();
        let g = (px >> 8) & 0xFF;
        assert!(g > 0x55 && g < 0xFF, "expected a blend, got {px:#08x}");
    }
}
