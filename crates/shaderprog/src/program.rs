use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use crate::context::{Backend, RenderContext};
use crate::error::ProgramError;
use crate::stage::StageKind;
use crate::uniform::{ActiveUniform, UniformValue};

/// Outcome of the most recent link attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Unlinked,
    Linked,
    LinkFailed,
}

/// A GPU program object plus the stages waiting to be linked into it.
///
/// Stages are single-use: every [`compile`](Self::compile) releases them, so
/// a kind can be attached again afterwards. The program object itself lives
/// until the wrapper is dropped.
pub struct ShaderProgram<B: Backend> {
    ctx: Rc<RenderContext<B>>,
    handle: B::Program,
    stages: BTreeMap<StageKind, B::Shader>,
    status: LinkStatus,
}

impl<B: Backend> ShaderProgram<B> {
    /// Allocates an empty program on `ctx`.
    pub fn new(ctx: &Rc<RenderContext<B>>) -> Result<Self, ProgramError> {
        let handle = ctx
            .backend()
            .create_program()
            .map_err(ProgramError::Context)?;
        tracing::debug!(program = ?handle, "created shader program");
        Ok(Self {
            ctx: Rc::clone(ctx),
            handle,
            stages: BTreeMap::new(),
            status: LinkStatus::Unlinked,
        })
    }

    /// Builds and links a vertex + fragment program in one call.
    pub fn from_sources(
        ctx: &Rc<RenderContext<B>>,
        vertex: &str,
        fragment: &str,
    ) -> Result<Self, ProgramError> {
        let mut program = Self::new(ctx)?;
        program.attach_source(StageKind::Vertex, vertex)?;
        program.attach_source(StageKind::Fragment, fragment)?;
        program.compile()?;
        Ok(program)
    }

    /// Like [`from_sources`](Self::from_sources) but panics with the driver
    /// diagnostic on any failure. For callers that treat a broken built-in
    /// shader as a programming error.
    pub fn from_sources_strict(ctx: &Rc<RenderContext<B>>, vertex: &str, fragment: &str) -> Self {
        match Self::from_sources(ctx, vertex, fragment) {
            Ok(program) => program,
            Err(err) => panic!("built-in shader program is invalid: {err}"),
        }
    }

    /// Compiles `source` as a `kind` stage and attaches it for the next link.
    pub fn attach_source(&mut self, kind: StageKind, source: &str) -> Result<(), ProgramError> {
        if self.stages.contains_key(&kind) {
            return Err(ProgramError::DuplicateStage(kind));
        }

        let backend = self.ctx.backend();
        let shader = backend
            .compile_shader(kind, source)
            .map_err(|log| ProgramError::Compile { kind, log })?;
        backend.attach_shader(self.handle, shader);
        self.stages.insert(kind, shader);
        tracing::debug!(program = ?self.handle, %kind, "attached shader stage");
        Ok(())
    }

    /// Reads `path` fully and attaches its contents as a `kind` stage.
    pub fn attach_file(
        &mut self,
        kind: StageKind,
        path: impl AsRef<Path>,
    ) -> Result<(), ProgramError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ProgramError::FileNotFound(path.to_path_buf()));
        }
        let source = fs::read_to_string(path).map_err(|source| ProgramError::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;
        if source.is_empty() {
            return Err(ProgramError::FileEmpty(path.to_path_buf()));
        }
        self.attach_source(kind, &source)
    }

    /// Links the attached stages, then releases them whatever the outcome.
    ///
    /// With nothing attached the call fails with [`ProgramError::NoStages`]
    /// and leaves the program untouched.
    pub fn compile(&mut self) -> Result<(), ProgramError> {
        if self.stages.is_empty() {
            return Err(ProgramError::NoStages);
        }

        let linked = self.ctx.backend().link_program(self.handle);
        self.release_stages();

        match linked {
            Ok(()) => {
                self.status = LinkStatus::Linked;
                tracing::debug!(program = ?self.handle, "linked shader program");
                Ok(())
            }
            Err(log) => {
                self.status = LinkStatus::LinkFailed;
                tracing::warn!(program = ?self.handle, "shader program failed to link");
                Err(ProgramError::Link(log))
            }
        }
    }

    /// Makes this program the target of subsequent draw calls.
    pub fn use_program(&self) -> Result<(), ProgramError> {
        if self.status != LinkStatus::Linked {
            return Err(ProgramError::NotLinked);
        }
        self.ctx.bind_program(Some(self.handle));
        Ok(())
    }

    /// Clears the active program on the context.
    pub fn unuse_program(&self) {
        self.ctx.bind_program(None);
    }

    pub fn uniform_location(&self, name: &str) -> Option<B::UniformLocation> {
        self.ctx.backend().uniform_location(self.handle, name)
    }

    /// Uploads `value` to the uniform called `name`.
    ///
    /// Returns `false` without touching the GPU when the name does not
    /// resolve, which is routine for unused or optimized-out uniforms.
    pub fn set_uniform(&self, name: &str, value: impl Into<UniformValue>) -> bool {
        let location = self.uniform_location(name);
        self.set_uniform_at(location.as_ref(), value)
    }

    /// Uploads `value` to a location resolved earlier with
    /// [`uniform_location`](Self::uniform_location).
    pub fn set_uniform_at(
        &self,
        location: Option<&B::UniformLocation>,
        value: impl Into<UniformValue>,
    ) -> bool {
        let Some(location) = location else {
            return false;
        };
        let value = value.into();
        self.ctx
            .with_program(self.handle, |backend| backend.upload_uniform(location, &value));
        true
    }

    /// Active uniforms of the linked program; empty before a successful link.
    pub fn active_uniforms(&self) -> Vec<ActiveUniform> {
        if self.status != LinkStatus::Linked {
            return Vec::new();
        }
        self.ctx.backend().active_uniforms(self.handle)
    }

    pub fn status(&self) -> LinkStatus {
        self.status
    }

    pub fn is_linked(&self) -> bool {
        self.status == LinkStatus::Linked
    }

    pub fn handle(&self) -> B::Program {
        self.handle
    }

    /// Stage kinds attached since the last link attempt.
    pub fn attached_stages(&self) -> impl Iterator<Item = StageKind> + '_ {
        self.stages.keys().copied()
    }

    fn release_stages(&mut self) {
        let backend = self.ctx.backend();
        for (_, shader) in std::mem::take(&mut self.stages) {
            backend.detach_shader(self.handle, shader);
            backend.delete_shader(shader);
        }
    }
}

impl<B: Backend> Drop for ShaderProgram<B> {
    fn drop(&mut self) {
        self.release_stages();
        if self.ctx.is_active(self.handle) {
            self.ctx.bind_program(None);
        }
        self.ctx.backend().delete_program(self.handle);
    }
}

impl<B: Backend> std::fmt::Debug for ShaderProgram<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("handle", &self.handle)
            .field("stages", &self.stages.keys().collect::<Vec<_>>())
            .field("status", &self.status)
            .finish()
    }
}
