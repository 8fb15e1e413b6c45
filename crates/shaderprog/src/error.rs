use std::io;
use std::path::PathBuf;

use crate::stage::StageKind;

/// Failures surfaced by [`ShaderProgram`](crate::ShaderProgram).
///
/// A missing uniform location is deliberately absent: uploads to unknown or
/// optimized-out uniforms report `false` instead.
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    #[error("failed to create GPU object: {0}")]
    Context(String),
    #[error("{0} stage already attached")]
    DuplicateStage(StageKind),
    #[error("{kind} stage failed to compile:\n{log}")]
    Compile { kind: StageKind, log: String },
    #[error("shader file {} does not exist", .0.display())]
    FileNotFound(PathBuf),
    #[error("failed to open shader file {}", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("shader file {} is empty", .0.display())]
    FileEmpty(PathBuf),
    #[error("program has no attached stages")]
    NoStages,
    #[error("program failed to link:\n{0}")]
    Link(String),
    #[error("program is not linked")]
    NotLinked,
}

impl ProgramError {
    /// Driver diagnostic text for compile and link failures.
    pub fn log(&self) -> Option<&str> {
        match self {
            ProgramError::Compile { log, .. } | ProgramError::Link(log) => Some(log),
            _ => None,
        }
    }
}
