//! The seam between [`ShaderProgram`](crate::ShaderProgram) and the GPU.
//!
//! `Backend` is the handful of driver calls a program needs. `RenderContext`
//! owns a backend and tracks which program is bound, so "what is currently
//! active" is a field that can be queried instead of hidden driver state.
use std::cell::Cell;
use std::fmt;

use crate::stage::StageKind;
use crate::uniform::{ActiveUniform, UniformValue};

/// Driver calls issued by a shader program.
///
/// Every method requires the context the backend was built for to be current
/// on the calling thread. Failures carrying a `String` return the driver's
/// info log verbatim.
pub trait Backend {
    type Program: Copy + Eq + fmt::Debug;
    type Shader: Copy + Eq + fmt::Debug;
    type UniformLocation: Clone + fmt::Debug;

    fn create_program(&self) -> Result<Self::Program, String>;

    fn delete_program(&self, program: Self::Program);

    /// Creates and compiles a shader object. On failure the object is already
    /// deleted and the compile log is returned.
    fn compile_shader(&self, kind: StageKind, source: &str) -> Result<Self::Shader, String>;

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);

    fn delete_shader(&self, shader: Self::Shader);

    fn link_program(&self, program: Self::Program) -> Result<(), String>;

    fn use_program(&self, program: Option<Self::Program>);

    fn uniform_location(&self, program: Self::Program, name: &str)
        -> Option<Self::UniformLocation>;

    /// Uploads to the currently bound program.
    fn upload_uniform(&self, location: &Self::UniformLocation, value: &UniformValue);

    fn active_uniforms(&self, program: Self::Program) -> Vec<ActiveUniform>;
}

/// A backend plus the program currently bound on it.
pub struct RenderContext<B: Backend> {
    backend: B,
    active: Cell<Option<B::Program>>,
}

impl<B: Backend> RenderContext<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            active: Cell::new(None),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The program subsequent draw calls will execute, if any.
    pub fn active_program(&self) -> Option<B::Program> {
        self.active.get()
    }

    pub fn is_active(&self, program: B::Program) -> bool {
        self.active.get() == Some(program)
    }

    /// Binds `program` (or clears the binding). Redundant binds are skipped.
    pub fn bind_program(&self, program: Option<B::Program>) {
        if self.active.get() == program {
            return;
        }
        self.backend.use_program(program);
        self.active.set(program);
    }

    /// Runs `f` with `program` bound, restoring the previous binding afterwards.
    pub(crate) fn with_program<R>(&self, program: B::Program, f: impl FnOnce(&B) -> R) -> R {
        let previous = self.active.get();
        self.bind_program(Some(program));
        let result = f(&self.backend);
        self.bind_program(previous);
        result
    }
}

impl<B: Backend + fmt::Debug> fmt::Debug for RenderContext<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("backend", &self.backend)
            .field("active", &self.active.get())
            .finish()
    }
}
