use std::fmt;

use glam::{Mat4, Vec2, Vec3, Vec4};

/// A typed value uploaded to a uniform location.
///
/// Matrices are stored column-major, the layout `glam` and GL both use.
/// `transpose` asks the driver to transpose on upload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4 { columns: [f32; 16], transpose: bool },
}

impl UniformValue {
    /// A matrix the driver transposes on upload.
    pub fn mat4_transposed(matrix: Mat4) -> Self {
        UniformValue::Mat4 {
            columns: matrix.to_cols_array(),
            transpose: true,
        }
    }

    pub fn uniform_type(&self) -> UniformType {
        match self {
            UniformValue::Int(_) => UniformType::Int,
            UniformValue::Float(_) => UniformType::Float,
            UniformValue::Vec2(_) => UniformType::Vec2,
            UniformValue::Vec3(_) => UniformType::Vec3,
            UniformValue::Vec4(_) => UniformType::Vec4,
            UniformValue::Mat4 { .. } => UniformType::Mat4,
        }
    }

    /// Whether uploading `self` to a uniform of type `target` is well-formed.
    ///
    /// Samplers take the texture unit as an integer.
    pub fn fits(&self, target: UniformType) -> bool {
        let own = self.uniform_type();
        own == target || (own == UniformType::Int && target == UniformType::Sampler)
    }
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        UniformValue::Int(value)
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        UniformValue::Float(value)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(value: [f32; 2]) -> Self {
        UniformValue::Vec2(value)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(value: [f32; 3]) -> Self {
        UniformValue::Vec3(value)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(value: [f32; 4]) -> Self {
        UniformValue::Vec4(value)
    }
}

impl From<Vec2> for UniformValue {
    fn from(value: Vec2) -> Self {
        UniformValue::Vec2(value.to_array())
    }
}

impl From<Vec3> for UniformValue {
    fn from(value: Vec3) -> Self {
        UniformValue::Vec3(value.to_array())
    }
}

impl From<Vec4> for UniformValue {
    fn from(value: Vec4) -> Self {
        UniformValue::Vec4(value.to_array())
    }
}

impl From<Mat4> for UniformValue {
    fn from(value: Mat4) -> Self {
        UniformValue::Mat4 {
            columns: value.to_cols_array(),
            transpose: false,
        }
    }
}

/// Declared type of an active uniform as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    Int,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    Sampler,
    /// Any type this wrapper has no upload path for (ivec3, mat3, ...).
    Other,
}

impl UniformType {
    pub fn name(self) -> &'static str {
        match self {
            UniformType::Int => "int",
            UniformType::Float => "float",
            UniformType::Vec2 => "vec2",
            UniformType::Vec3 => "vec3",
            UniformType::Vec4 => "vec4",
            UniformType::Mat4 => "mat4",
            UniformType::Sampler => "sampler",
            UniformType::Other => "other",
        }
    }
}

impl fmt::Display for UniformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// One entry of a linked program's active uniform table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveUniform {
    pub name: String,
    pub ty: UniformType,
    /// Element count; 1 for non-array uniforms.
    pub size: u32,
}
