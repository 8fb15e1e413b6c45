//! OpenGL backend over `glow`.
//!
//! The caller owns window and context creation; this module only needs a
//! loaded `glow::Context` that is current on the calling thread.
use std::ffi::c_void;
use std::fmt;

use glow::HasContext;

use crate::context::Backend;
use crate::stage::StageKind;
use crate::uniform::{ActiveUniform, UniformType, UniformValue};

pub struct GlBackend {
    gl: glow::Context,
}

impl GlBackend {
    pub fn new(gl: glow::Context) -> Self {
        Self { gl }
    }

    /// Loads GL entry points through `loader` (e.g. `glfwGetProcAddress`).
    ///
    /// # Safety
    ///
    /// The context the loader resolves against must be current and must
    /// outlive the backend.
    pub unsafe fn from_loader_function<F>(loader: F) -> Self
    where
        F: FnMut(&str) -> *const c_void,
    {
        Self::new(glow::Context::from_loader_function(loader))
    }
}

impl fmt::Debug for GlBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlBackend").finish_non_exhaustive()
    }
}

impl Backend for GlBackend {
    type Program = glow::Program;
    type Shader = glow::Shader;
    type UniformLocation = glow::UniformLocation;

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { self.gl.create_program() }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn compile_shader(&self, kind: StageKind, source: &str) -> Result<Self::Shader, String> {
        unsafe {
            let shader = self.gl.create_shader(kind.gl_enum())?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if self.gl.get_shader_compile_status(shader) {
                Ok(shader)
            } else {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                Err(log)
            }
        }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.attach_shader(program, shader) }
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.detach_shader(program, shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn link_program(&self, program: Self::Program) -> Result<(), String> {
        unsafe {
            self.gl.link_program(program);
            if self.gl.get_program_link_status(program) {
                Ok(())
            } else {
                Err(self.gl.get_program_info_log(program))
            }
        }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { self.gl.use_program(program) }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn upload_uniform(&self, location: &Self::UniformLocation, value: &UniformValue) {
        let location = Some(location);
        unsafe {
            match *value {
                UniformValue::Int(v) => self.gl.uniform_1_i32(location, v),
                UniformValue::Float(v) => self.gl.uniform_1_f32(location, v),
                UniformValue::Vec2([x, y]) => self.gl.uniform_2_f32(location, x, y),
                UniformValue::Vec3([x, y, z]) => self.gl.uniform_3_f32(location, x, y, z),
                UniformValue::Vec4([x, y, z, w]) => self.gl.uniform_4_f32(location, x, y, z, w),
                UniformValue::Mat4 { columns, transpose } => {
                    self.gl
                        .uniform_matrix_4_f32_slice(location, transpose, &columns)
                }
            }
        }
    }

    fn active_uniforms(&self, program: Self::Program) -> Vec<ActiveUniform> {
        unsafe {
            let count = self.gl.get_active_uniforms(program);
            (0..count)
                .filter_map(|index| self.gl.get_active_uniform(program, index))
                .map(|uniform| ActiveUniform {
                    name: uniform.name,
                    ty: uniform_type(uniform.utype),
                    size: uniform.size.max(0) as u32,
                })
                .collect()
        }
    }
}

fn uniform_type(utype: u32) -> UniformType {
    match utype {
        glow::INT | glow::BOOL => UniformType::Int,
        glow::FLOAT => UniformType::Float,
        glow::FLOAT_VEC2 => UniformType::Vec2,
        glow::FLOAT_VEC3 => UniformType::Vec3,
        glow::FLOAT_VEC4 => UniformType::Vec4,
        glow::FLOAT_MAT4 => UniformType::Mat4,
        glow::SAMPLER_1D
        | glow::SAMPLER_2D
        | glow::SAMPLER_3D
        | glow::SAMPLER_CUBE
        | glow::SAMPLER_2D_ARRAY
        | glow::SAMPLER_2D_SHADOW
        | glow::INT_SAMPLER_2D
        | glow::UNSIGNED_INT_SAMPLER_2D => UniformType::Sampler,
        _ => UniformType::Other,
    }
}
