//! Frame driver: Setup → (Pre → Draw* → Post)*.
//!
//! Setup runs once and fails hard. Pre/Draw/Post repeat every frame on the
//! rendering thread; per-frame bookkeeping lives in an explicit
//! [`FrameContext`] the caller threads through the three phases.

use tracing::{debug, info, warn};

use crate::{
    config::{ViewConfig, Viewport},
    engine::{
        cache::GeometryCache,
        projection::project_wall,
        types::{Drawable, FLOATS_PER_VERTEX, VERTEX_COUNT},
        viewport::ViewportTransform,
    },
    error::SetupError,
    renderer::{
        AttribPointer, AttribSlot, BlendFactor, BufferData, BufferHandle, BufferTarget,
        Capability, ComponentType, DrawBackend, ProgramHandle, UniformSlot, Usage,
    },
    world::{Camera, Wall, WallId},
};

pub const VERTEX_SHADER: &str = r#"
attribute vec2 in_Position;
attribute vec4 in_Color;

uniform mat3 matrixProjection;
uniform mat3 matrixView;
uniform mat3 matrixModel;

varying vec4 var_Color;

void main() {
  var_Color = in_Color;

  vec3 matr = matrixProjection * matrixView * matrixModel * vec3(in_Position, 1.0);
  gl_Position = vec4(matr.xy, 0, matr.z);
}
"#;

pub const FRAGMENT_SHADER: &str = r#"
#ifdef GL_ES
#define LOWP lowp
precision mediump float;
#else
#define LOWP
#endif

varying vec4 var_Color;

void main (void) {
  gl_FragColor = var_Color;
}
"#;

/// Shared rectangle index list, uploaded once at setup.
const RECT_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

const STRIDE: usize = FLOATS_PER_VERTEX * 4;

const POSITION_POINTER: AttribPointer = AttribPointer {
    components: 2,
    kind: ComponentType::Float,
    normalize: false,
    stride: STRIDE,
    offset: 0,
};

const COLOR_POINTER: AttribPointer = AttribPointer {
    components: 4,
    kind: ComponentType::UnsignedByte,
    normalize: true,
    stride: STRIDE,
    offset: 8,
};

/// Counters for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub drawn: usize,
    pub uploaded: usize,
    pub skipped: usize,
}

/// Per-frame state. Reset by [`FrameDriver::post`].
#[derive(Debug, Default)]
pub struct FrameContext {
    last_buffer: Option<BufferHandle>,
    stats: FrameStats,
}

impl FrameContext {
    pub fn last_buffer(&self) -> Option<BufferHandle> {
        self.last_buffer
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}

/// What happened to one drawable in the Draw phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawOutcome {
    Drawn { uploaded: bool },
    /// No camera registered yet.
    NothingToDraw,
    /// The view pipeline cannot draw this kind; a warning was logged.
    Unsupported,
}

pub struct FrameDriver {
    program: ProgramHandle,
    index_buffer: BufferHandle,

    in_position: AttribSlot,
    in_color: AttribSlot,
    matrix_projection: UniformSlot,
    matrix_view: UniformSlot,
    matrix_model: UniformSlot,

    transform: ViewportTransform,
    config: ViewConfig,
    viewport: Viewport,

    camera: Option<Camera>,
    cache: GeometryCache,
}

impl FrameDriver {
    /*──────────────────────────── Setup ──────────────────────────────*/

    /// Compile the view program, resolve its slots and upload the shared
    /// index buffer. Any failure is fatal for the view pipeline.
    pub fn setup<B: DrawBackend + ?Sized>(
        backend: &mut B,
        config: ViewConfig,
        viewport: Viewport,
    ) -> Result<Self, SetupError> {
        let program = backend.compile_program(VERTEX_SHADER, FRAGMENT_SHADER)?;

        let attr = |b: &B, name: &'static str| {
            b.attribute_location(program, name)
                .ok_or(SetupError::MissingAttribute(name))
        };
        let uni = |b: &B, name: &'static str| {
            b.uniform_location(program, name)
                .ok_or(SetupError::MissingUniform(name))
        };

        let in_position = attr(&*backend, "in_Position")?;
        let in_color = attr(&*backend, "in_Color")?;
        let matrix_projection = uni(&*backend, "matrixProjection")?;
        let matrix_view = uni(&*backend, "matrixView")?;
        let matrix_model = uni(&*backend, "matrixModel")?;

        // slots resolved; nothing is allocated on a failed setup
        let index_buffer = backend.create_buffer();
        backend.bind_buffer(BufferTarget::ElementArray, Some(index_buffer));
        backend.upload_data(
            BufferTarget::ElementArray,
            BufferData::U16(&RECT_INDICES),
            Usage::Static,
        );

        let driver = Self {
            program,
            index_buffer,
            in_position,
            in_color,
            matrix_projection,
            matrix_view,
            matrix_model,
            transform: ViewportTransform::default(),
            config,
            viewport,
            camera: None,
            cache: GeometryCache::new(),
        };
        info!(
            program = program.0,
            fov = config.fov,
            width = viewport.game_width,
            height = viewport.game_height,
            "view pipeline ready"
        );
        Ok(driver)
    }

    /*──────────────────────────── accessors ──────────────────────────*/

    /// Start drawing from `camera`'s point of view. Until this is called
    /// every Draw reports [`DrawOutcome::NothingToDraw`].
    pub fn register_camera(&mut self, camera: Camera) {
        debug!(x = camera.position.x, y = camera.position.y, "camera registered");
        self.camera = Some(camera);
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        self.camera.as_mut()
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn transform(&self) -> &ViewportTransform {
        &self.transform
    }

    pub fn cache(&self) -> &GeometryCache {
        &self.cache
    }

    pub fn index_buffer(&self) -> BufferHandle {
        self.index_buffer
    }

    /// Forget the cached geometry of a wall that no longer exists.
    pub fn forget_wall(&mut self, id: WallId) -> Option<BufferHandle> {
        let buffer = self.cache.remove(id);
        debug!(wall = id.0, "wall dropped from cache");
        buffer
    }

    /*──────────────────────────── Pre ────────────────────────────────*/

    pub fn pre<B: DrawBackend + ?Sized>(&mut self, backend: &mut B, ctx: &mut FrameContext) {
        backend.enable(Capability::BLEND);
        backend.blend_func(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);

        backend.use_program(self.program);
        backend.enable_vertex_attrib(self.in_position);
        backend.enable_vertex_attrib(self.in_color);

        self.transform.update(&self.viewport);
        backend.set_uniform_matrix3(
            self.matrix_projection,
            &self.transform.projection.to_cols_array(),
        );
        backend.set_uniform_matrix3(self.matrix_view, &self.transform.view.to_cols_array());

        ctx.last_buffer = None;
    }

    /*──────────────────────────── Draw ───────────────────────────────*/

    pub fn draw<B: DrawBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        ctx: &mut FrameContext,
        drawable: &Drawable,
    ) -> DrawOutcome {
        let outcome = match drawable {
            Drawable::Wall(wall) => self.draw_wall(backend, ctx, wall, drawable.buffer_len()),
            other => {
                warn!(kind = other.kind_name(), "drawable type not supported by the view pipeline");
                DrawOutcome::Unsupported
            }
        };

        match outcome {
            DrawOutcome::Drawn { uploaded } => {
                ctx.stats.drawn += 1;
                ctx.stats.uploaded += uploaded as usize;
            }
            DrawOutcome::NothingToDraw | DrawOutcome::Unsupported => ctx.stats.skipped += 1,
        }
        outcome
    }

    fn draw_wall<B: DrawBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        ctx: &mut FrameContext,
        wall: &Wall,
        len: usize,
    ) -> DrawOutcome {
        let Some(camera) = self.camera else {
            return DrawOutcome::NothingToDraw;
        };

        let quad = project_wall(wall, &camera, &self.config, &self.viewport);
        let refresh = self.cache.refresh(backend, wall.id, len, &quad);

        if ctx.last_buffer != Some(refresh.buffer) {
            backend.bind_buffer(BufferTarget::Array, Some(refresh.buffer));
            backend.vertex_attrib_pointer(self.in_position, POSITION_POINTER);
            backend.vertex_attrib_pointer(self.in_color, COLOR_POINTER);
            ctx.last_buffer = Some(refresh.buffer);
        }

        self.transform
            .set_model_scale(wall.scale * self.config.global_scale);
        backend.set_uniform_matrix3(self.matrix_model, &self.transform.model.to_cols_array());

        backend.draw_triangles(0, VERTEX_COUNT);

        DrawOutcome::Drawn {
            uploaded: refresh.uploaded,
        }
    }

    /*──────────────────────────── Post ───────────────────────────────*/

    /// Undo Pre's state, forget the last bound buffer and hand back the
    /// frame's counters.
    pub fn post<B: DrawBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        ctx: &mut FrameContext,
    ) -> FrameStats {
        ctx.last_buffer = None;

        backend.disable_vertex_attrib(self.in_position);
        backend.disable_vertex_attrib(self.in_color);

        backend.bind_buffer(BufferTarget::Array, None);
        backend.bind_buffer(BufferTarget::ElementArray, None);

        backend.disable(Capability::BLEND);

        std::mem::take(&mut ctx.stats)
    }

    /// One full Pre → Draw (each drawable) → Post cycle.
    pub fn render_frame<B: DrawBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        drawables: &[Drawable],
    ) -> FrameStats {
        let mut ctx = FrameContext::default();
        self.pre(backend, &mut ctx);
        for d in drawables {
            self.draw(backend, &mut ctx, d);
        }
        self.post(backend, &mut ctx)
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
