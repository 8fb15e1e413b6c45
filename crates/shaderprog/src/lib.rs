//! Shader program wrapper.
//!
//! A [`ShaderProgram`] owns one GPU program object. Stage sources are compiled
//! and attached one kind at a time, linked with [`ShaderProgram::compile`],
//! then bound and fed uniforms every frame:
//!
//! ```text
//!   attach_source / attach_file (one per StageKind)
//!          │
//!          ▼
//!   compile() ──▶ Linked | LinkFailed      (stages released either way)
//!          │
//!          ▼
//!   use_program() ─▶ set_uniform(..) ─▶ draw ─▶ unuse_program()
//! ```
//!
//! All driver calls go through a [`RenderContext`], which also records the
//! active program. Two backends ship with the crate:
//!
//! - [`GlBackend`] (feature `gl`) issues OpenGL calls through `glow` on a
//!   context the caller made current.
//! - [`HeadlessBackend`] (feature `headless`) compiles the same OpenGL GLSL
//!   through naga and links without a GPU, for offline checks and tests.
//!
//! [`ProgramManifest`] describes a program in TOML (stage files plus uniform
//! defaults) and builds it on any backend.

mod context;
#[cfg(feature = "headless")]
mod dialect;
mod error;
#[cfg(feature = "gl")]
mod gl;
#[cfg(feature = "headless")]
mod headless;
mod manifest;
mod program;
mod stage;
mod uniform;

pub use context::{Backend, RenderContext};
pub use error::ProgramError;
#[cfg(feature = "gl")]
pub use gl::GlBackend;
#[cfg(feature = "headless")]
pub use headless::{
    HeadlessBackend, HeadlessLocation, HeadlessProgram, HeadlessShader, HeadlessStats,
};
pub use manifest::{BuiltProgram, ManifestError, ProgramManifest, UniformDefault};
pub use program::{LinkStatus, ShaderProgram};
pub use stage::{StageKind, UnknownStageKind};
pub use uniform::{ActiveUniform, UniformType, UniformValue};

pub use glam;
