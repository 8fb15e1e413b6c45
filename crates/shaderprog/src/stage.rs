use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Pipeline stage a shader source is compiled for.
///
/// The declaration order doubles as link order: stages are walked vertex
/// first, compute last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Vertex,
    TessControl,
    TessEvaluation,
    Geometry,
    Fragment,
    Compute,
}

impl StageKind {
    /// The `GL_*_SHADER` enum passed to `glCreateShader`.
    pub fn gl_enum(self) -> u32 {
        match self {
            StageKind::Vertex => 0x8B31,
            StageKind::TessControl => 0x8E88,
            StageKind::TessEvaluation => 0x8E87,
            StageKind::Geometry => 0x8DD9,
            StageKind::Fragment => 0x8B30,
            StageKind::Compute => 0x91B9,
        }
    }

    pub fn is_graphics(self) -> bool {
        !matches!(self, StageKind::Compute)
    }

    /// Infers the stage from conventional file extensions (`.vert`, `.frag`, ...).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "vert" | "vs" => Some(StageKind::Vertex),
            "tesc" => Some(StageKind::TessControl),
            "tese" => Some(StageKind::TessEvaluation),
            "geom" | "gs" => Some(StageKind::Geometry),
            "frag" | "fs" => Some(StageKind::Fragment),
            "comp" | "cs" => Some(StageKind::Compute),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StageKind::Vertex => "vertex",
            StageKind::TessControl => "tess_control",
            StageKind::TessEvaluation => "tess_evaluation",
            StageKind::Geometry => "geometry",
            StageKind::Fragment => "fragment",
            StageKind::Compute => "compute",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stage kind '{0}'")]
pub struct UnknownStageKind(pub String);

/// Accepts the full names (`tess_control`, `tess-control`) and the file
/// extension short forms (`tesc`), in any case.
impl FromStr for StageKind {
    type Err = UnknownStageKind;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "vertex" | "vert" => Ok(StageKind::Vertex),
            "tess_control" | "tesc" => Ok(StageKind::TessControl),
            "tess_evaluation" | "tese" => Ok(StageKind::TessEvaluation),
            "geometry" | "geom" => Ok(StageKind::Geometry),
            "fragment" | "frag" => Ok(StageKind::Fragment),
            "compute" | "comp" => Ok(StageKind::Compute),
            _ => Err(UnknownStageKind(raw.trim().to_string())),
        }
    }
}
