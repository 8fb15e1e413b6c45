//! TOML description of a shader program: which file feeds which stage and
//! the uniform values to upload right after linking.
//!
//! ```toml
//! name = "lighting"
//!
//! [stages]
//! vertex = "light.vert"
//! fragment = "light.frag"
//!
//! [uniforms]
//! objectColor = [1.0, 0.5, 0.31]
//! texture1 = 0
//! ```
//!
//! Stage paths are resolved against the directory passed to
//! [`ProgramManifest::build`], normally the manifest's own directory.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::context::{Backend, RenderContext};
use crate::error::ProgramError;
use crate::program::ShaderProgram;
use crate::stage::StageKind;
use crate::uniform::UniformValue;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read manifest {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid manifest: {0}")]
    Invalid(String),
    #[error(transparent)]
    Program(#[from] ProgramError),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProgramManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub stages: BTreeMap<StageKind, PathBuf>,
    #[serde(default)]
    pub uniforms: BTreeMap<String, UniformDefault>,
}

/// A uniform value as written in TOML.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum UniformDefault {
    Int(i64),
    Float(f64),
    Floats(Vec<f64>),
}

impl UniformDefault {
    pub fn to_value(&self) -> Result<UniformValue, String> {
        match self {
            UniformDefault::Int(value) => i32::try_from(*value)
                .map(UniformValue::Int)
                .map_err(|_| format!("integer {value} does not fit in a GLSL int")),
            UniformDefault::Float(value) => Ok(UniformValue::Float(*value as f32)),
            UniformDefault::Floats(values) => {
                let floats: Vec<f32> = values.iter().map(|value| *value as f32).collect();
                match floats.len() {
                    2 => Ok(UniformValue::Vec2([floats[0], floats[1]])),
                    3 => Ok(UniformValue::Vec3([floats[0], floats[1], floats[2]])),
                    4 => Ok(UniformValue::Vec4([
                        floats[0], floats[1], floats[2], floats[3],
                    ])),
                    16 => {
                        let mut columns = [0.0; 16];
                        columns.copy_from_slice(&floats);
                        Ok(UniformValue::Mat4 {
                            columns,
                            transpose: false,
                        })
                    }
                    other => Err(format!(
                        "expected 2, 3, 4 or 16 components, found {other}"
                    )),
                }
            }
        }
    }
}

/// Result of [`ProgramManifest::build`].
#[derive(Debug)]
pub struct BuiltProgram<B: Backend> {
    pub program: ShaderProgram<B>,
    /// Uniform defaults that did not resolve to an active uniform.
    pub unresolved: Vec<String>,
}

impl ProgramManifest {
    pub fn from_toml_str(input: &str) -> Result<Self, ManifestError> {
        let manifest: ProgramManifest = toml::from_str(input)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let input = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.stages.is_empty() {
            return Err(ManifestError::Invalid(
                "manifest must declare at least one stage".into(),
            ));
        }

        for (kind, path) in &self.stages {
            if path.as_os_str().is_empty() {
                return Err(ManifestError::Invalid(format!(
                    "stage '{kind}' has an empty path"
                )));
            }
        }

        for (name, value) in &self.uniforms {
            if name.trim().is_empty() {
                return Err(ManifestError::Invalid(
                    "uniform names may not be empty".into(),
                ));
            }
            value
                .to_value()
                .map_err(|err| ManifestError::Invalid(format!("uniform '{name}': {err}")))?;
        }

        Ok(())
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    /// Attaches every stage, links, and uploads the uniform defaults.
    pub fn build<B: Backend>(
        &self,
        ctx: &Rc<RenderContext<B>>,
        base_dir: &Path,
    ) -> Result<BuiltProgram<B>, ManifestError> {
        let mut program = ShaderProgram::new(ctx)?;
        for (kind, path) in &self.stages {
            program.attach_file(*kind, base_dir.join(path))?;
        }
        program.compile()?;

        let mut unresolved = Vec::new();
        for (name, value) in &self.uniforms {
            let value = value.to_value().map_err(ManifestError::Invalid)?;
            if !program.set_uniform(name, value) {
                unresolved.push(name.clone());
            }
        }
        if !unresolved.is_empty() {
            tracing::debug!(
                program = self.display_name(),
                ?unresolved,
                "uniform defaults without an active uniform"
            );
        }

        Ok(BuiltProgram {
            program,
            unresolved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
name = "lighting"

[stages]
vertex = "light.vert"
fragment = "light.frag"

[uniforms]
objectColor = [1.0, 0.5, 0.31]
lightColor = [1, 1, 1]
texture1 = 0
scale = 0.5
"#;

    #[test]
    fn parses_sample_manifest() {
        let manifest = ProgramManifest::from_toml_str(SAMPLE).expect("parse manifest");
        assert_eq!(manifest.display_name(), "lighting");
        assert_eq!(
            manifest.stages.get(&StageKind::Vertex),
            Some(&PathBuf::from("light.vert"))
        );
        assert_eq!(
            manifest.uniforms["objectColor"].to_value().unwrap(),
            UniformValue::Vec3([1.0, 0.5, 0.31])
        );
        assert_eq!(
            manifest.uniforms["texture1"].to_value().unwrap(),
            UniformValue::Int(0)
        );
        assert_eq!(
            manifest.uniforms["scale"].to_value().unwrap(),
            UniformValue::Float(0.5)
        );
    }

    #[test]
    fn integer_arrays_become_float_vectors() {
        let manifest = ProgramManifest::from_toml_str(SAMPLE).unwrap();
        assert_eq!(
            manifest.uniforms["lightColor"].to_value().unwrap(),
            UniformValue::Vec3([1.0, 1.0, 1.0])
        );
    }

    #[test]
    fn rejects_manifest_without_stages() {
        let err = ProgramManifest::from_toml_str("name = \"empty\"").unwrap_err();
        assert!(matches!(err, ManifestError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_stage_names() {
        let err = ProgramManifest::from_toml_str("[stages]\npixel = \"a.frag\"\n").unwrap_err();
        assert!(matches!(err, ManifestError::Parse(_)));
    }

    #[test]
    fn rejects_odd_vector_lengths() {
        let err = ProgramManifest::from_toml_str(
            r#"
[stages]
vertex = "a.vert"

[uniforms]
weights = [1.0, 2.0, 3.0, 4.0, 5.0]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ManifestError::Invalid(ref msg) if msg.contains("weights")));
    }

    #[test]
    fn accepts_column_major_matrices() {
        let identity: Vec<String> = (0..16)
            .map(|i| if i % 5 == 0 { "1.0" } else { "0.0" }.to_string())
            .collect();
        let input = format!(
            "[stages]\nvertex = \"a.vert\"\n\n[uniforms]\nmodel = [{}]\n",
            identity.join(", ")
        );
        let manifest = ProgramManifest::from_toml_str(&input).unwrap();
        assert_eq!(
            manifest.uniforms["model"].to_value().unwrap(),
            UniformValue::from(glam::Mat4::IDENTITY)
        );
    }
}
