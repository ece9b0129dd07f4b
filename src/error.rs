use thiserror::Error;

/// Failures reported by a [`DrawBackend`](crate::renderer::DrawBackend).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// A shader stage was rejected.
    #[error("{stage} shader failed to compile: {reason}")]
    Compile { stage: &'static str, reason: String },

    /// Both stages compiled but could not be linked into one program.
    #[error("program failed to link: {0}")]
    Link(String),
}

/// Fatal errors while binding the view pipeline. There is no fallback path:
/// a driver that failed setup never renders.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error(transparent)]
    Program(#[from] BackendError),

    /// The linked program does not expose a required vertex attribute.
    #[error("attribute `{0}` not found in program")]
    MissingAttribute(&'static str),

    /// The linked program does not expose a required uniform.
    #[error("uniform `{0}` not found in program")]
    MissingUniform(&'static str),
}
