//! A [`Backend`] that needs no GPU.
//!
//! Stages are written for OpenGL, rewritten into the GLSL dialect naga
//! accepts (see `dialect`), then parsed with naga's GLSL frontend and
//! validated. Linking checks what a GL driver checks at link time that naga
//! can see: stage mix, the vertex to fragment interface (by name, or by
//! location where the source gives one) and uniform agreement across stages.
//! Active uniforms are the default-block `uniform`s and samplers an entry
//! point actually reads, numbered in stage order, so unused declarations get
//! no location just like on a real driver.
//!
//! Uploaded values are kept per location and every driver call is counted,
//! which makes the backend usable for offline shader checks and for tests.
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use wgpu::naga;

use naga::front::glsl;
use naga::valid::{Capabilities, ModuleInfo, ValidationFlags, Validator};
use naga::{AddressSpace, ArraySize, Module, Scalar, TypeInner, VectorSize};

use crate::context::Backend;
use crate::dialect::{self, Direction, Varying};
use crate::stage::StageKind;
use crate::uniform::{ActiveUniform, UniformType, UniformValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeadlessProgram(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeadlessShader(u32);

/// A uniform location; like WebGL locations it is only valid for the program
/// it was queried from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeadlessLocation {
    program: HeadlessProgram,
    index: u32,
}

/// Number of driver calls issued, by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadlessStats {
    pub compiles: usize,
    pub links: usize,
    pub binds: usize,
    pub uploads: usize,
}

struct CompiledShader {
    kind: StageKind,
    module: Module,
    info: ModuleInfo,
    varyings: Vec<Varying>,
    /// Default-block uniforms as declared, before naga drops unused ones.
    uniforms: Vec<String>,
    delete_pending: bool,
}

#[derive(Default)]
struct ProgramObject {
    attached: Vec<HeadlessShader>,
    uniforms: Option<Vec<ActiveUniform>>,
}

#[derive(Default)]
struct State {
    next_id: u32,
    programs: HashMap<HeadlessProgram, ProgramObject>,
    shaders: HashMap<HeadlessShader, CompiledShader>,
    bound: Option<HeadlessProgram>,
    values: HashMap<HeadlessLocation, UniformValue>,
    stats: HeadlessStats,
}

impl State {
    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn is_attached(&self, shader: HeadlessShader) -> bool {
        self.programs
            .values()
            .any(|program| program.attached.contains(&shader))
    }
}

#[derive(Default)]
pub struct HeadlessBackend {
    state: RefCell<State>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> HeadlessStats {
        self.state.borrow().stats
    }

    /// The last value successfully uploaded to `location`.
    pub fn uniform_value(&self, location: &HeadlessLocation) -> Option<UniformValue> {
        self.state.borrow().values.get(location).copied()
    }

    pub fn bound_program(&self) -> Option<HeadlessProgram> {
        self.state.borrow().bound
    }

    /// Shader objects not yet deleted, including ones pending deletion.
    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }
}

impl fmt::Debug for HeadlessBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("HeadlessBackend")
            .field("programs", &state.programs.len())
            .field("shaders", &state.shaders.len())
            .field("bound", &state.bound)
            .field("stats", &state.stats)
            .finish()
    }
}

impl Backend for HeadlessBackend {
    type Program = HeadlessProgram;
    type Shader = HeadlessShader;
    type UniformLocation = HeadlessLocation;

    fn create_program(&self) -> Result<Self::Program, String> {
        let mut state = self.state.borrow_mut();
        let program = HeadlessProgram(state.allocate());
        state.programs.insert(program, ProgramObject::default());
        Ok(program)
    }

    fn delete_program(&self, program: Self::Program) {
        let mut state = self.state.borrow_mut();
        if let Some(object) = state.programs.remove(&program) {
            for shader in object.attached {
                let orphaned = state
                    .shaders
                    .get(&shader)
                    .is_some_and(|compiled| compiled.delete_pending);
                if orphaned && !state.is_attached(shader) {
                    state.shaders.remove(&shader);
                }
            }
        }
        state.values.retain(|location, _| location.program != program);
    }

    fn compile_shader(&self, kind: StageKind, source: &str) -> Result<Self::Shader, String> {
        self.state.borrow_mut().stats.compiles += 1;
        let compiled = compile_glsl(kind, source)?;

        let mut state = self.state.borrow_mut();
        let shader = HeadlessShader(state.allocate());
        state.shaders.insert(shader, compiled);
        Ok(shader)
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        let mut state = self.state.borrow_mut();
        if !state.shaders.contains_key(&shader) {
            tracing::warn!(?shader, "attach of unknown shader object ignored");
            return;
        }
        if let Some(object) = state.programs.get_mut(&program) {
            if !object.attached.contains(&shader) {
                object.attached.push(shader);
            }
        }
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        let mut state = self.state.borrow_mut();
        if let Some(object) = state.programs.get_mut(&program) {
            object.attached.retain(|attached| *attached != shader);
        }
        let pending = state
            .shaders
            .get(&shader)
            .is_some_and(|compiled| compiled.delete_pending);
        if pending && !state.is_attached(shader) {
            state.shaders.remove(&shader);
        }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        let mut state = self.state.borrow_mut();
        if state.is_attached(shader) {
            if let Some(compiled) = state.shaders.get_mut(&shader) {
                compiled.delete_pending = true;
            }
        } else {
            state.shaders.remove(&shader);
        }
    }

    fn link_program(&self, program: Self::Program) -> Result<(), String> {
        let mut state = self.state.borrow_mut();
        state.stats.links += 1;
        state.values.retain(|location, _| location.program != program);

        let State {
            programs, shaders, ..
        } = &mut *state;
        let object = programs
            .get_mut(&program)
            .ok_or_else(|| format!("{program:?} is not a program object"))?;
        let mut stages: Vec<&CompiledShader> = object
            .attached
            .iter()
            .filter_map(|shader| shaders.get(shader))
            .collect();
        stages.sort_by_key(|stage| stage.kind);

        match link(&stages) {
            Ok(uniforms) => {
                object.uniforms = Some(uniforms);
                Ok(())
            }
            Err(log) => {
                object.uniforms = None;
                Err(log)
            }
        }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        let mut state = self.state.borrow_mut();
        state.stats.binds += 1;
        state.bound = program;
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        let state = self.state.borrow();
        let uniforms = state.programs.get(&program)?.uniforms.as_ref()?;
        let name = name.strip_suffix("[0]").unwrap_or(name);
        let index = uniforms.iter().position(|uniform| uniform.name == name)?;
        Some(HeadlessLocation {
            program,
            index: index as u32,
        })
    }

    fn upload_uniform(&self, location: &Self::UniformLocation, value: &UniformValue) {
        let mut state = self.state.borrow_mut();
        state.stats.uploads += 1;

        if state.bound != Some(location.program) {
            tracing::warn!(?location, "uniform upload to a program that is not bound");
            return;
        }
        let declared = state
            .programs
            .get(&location.program)
            .and_then(|object| object.uniforms.as_ref())
            .and_then(|uniforms| uniforms.get(location.index as usize))
            .map(|uniform| uniform.ty);
        match declared {
            Some(ty) if value.fits(ty) => {
                state.values.insert(*location, *value);
            }
            Some(ty) => {
                tracing::warn!(
                    ?location,
                    declared = %ty,
                    uploaded = %value.uniform_type(),
                    "uniform upload type mismatch"
                );
            }
            None => tracing::warn!(?location, "uniform upload to a stale location"),
        }
    }

    fn active_uniforms(&self, program: Self::Program) -> Vec<ActiveUniform> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .and_then(|object| object.uniforms.clone())
            .unwrap_or_default()
    }
}

fn compile_glsl(kind: StageKind, source: &str) -> Result<CompiledShader, String> {
    let stage = match kind {
        StageKind::Vertex => naga::ShaderStage::Vertex,
        StageKind::Fragment => naga::ShaderStage::Fragment,
        StageKind::Compute => naga::ShaderStage::Compute,
        other => return Err(format!("{other} shaders are not supported without a GPU")),
    };

    let translated = dialect::translate(kind, source)?;
    let module = glsl::Frontend::default()
        .parse(&glsl::Options::from(stage), &translated.source)
        .map_err(|err| err.emit_to_string(&translated.source))?;
    let info = Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|err| describe(&err.into_inner()))?;
    Ok(CompiledShader {
        kind,
        module,
        info,
        varyings: translated.varyings,
        uniforms: translated.uniforms,
        delete_pending: false,
    })
}

/// The error's message followed by each underlying cause.
fn describe(err: &dyn std::error::Error) -> String {
    let mut log = err.to_string();
    let mut cause = err.source();
    while let Some(inner) = cause {
        log.push_str(": ");
        log.push_str(&inner.to_string());
        cause = inner.source();
    }
    log
}

fn link(stages: &[&CompiledShader]) -> Result<Vec<ActiveUniform>, String> {
    if stages.is_empty() {
        return Err("no shader objects attached".into());
    }
    let has_compute = stages.iter().any(|stage| stage.kind == StageKind::Compute);
    let has_graphics = stages.iter().any(|stage| stage.kind.is_graphics());
    if has_compute && has_graphics {
        return Err("compute shaders cannot be linked with graphics stages".into());
    }

    let find = |kind| stages.iter().copied().find(|stage| stage.kind == kind);
    if has_graphics && find(StageKind::Vertex).is_none() {
        return Err("graphics program has no vertex stage".into());
    }
    if let (Some(vertex), Some(fragment)) = (find(StageKind::Vertex), find(StageKind::Fragment)) {
        check_interface(vertex, fragment)?;
    }

    let mut uniforms: Vec<ActiveUniform> = Vec::new();
    for stage in stages {
        for uniform in stage_uniforms(stage) {
            match uniforms.iter().find(|known| known.name == uniform.name) {
                Some(known) if known.ty != uniform.ty || known.size != uniform.size => {
                    return Err(format!(
                        "uniform `{}` is declared with different types across stages",
                        uniform.name
                    ));
                }
                Some(_) => {}
                None => uniforms.push(uniform),
            }
        }
    }
    Ok(uniforms)
}

/// Every fragment input must be written by the vertex stage with the same
/// type. Inputs with an explicit location match by location, the rest by name.
fn check_interface(vertex: &CompiledShader, fragment: &CompiledShader) -> Result<(), String> {
    let outputs: Vec<&Varying> = vertex
        .varyings
        .iter()
        .filter(|varying| varying.direction == Direction::Out)
        .collect();

    for input in fragment
        .varyings
        .iter()
        .filter(|varying| varying.direction == Direction::In)
    {
        let written = match input.explicit_location {
            Some(location) => outputs
                .iter()
                .find(|output| output.explicit_location == Some(location)),
            None => outputs.iter().find(|output| output.name == input.name),
        };
        let described = match input.explicit_location {
            Some(location) => format!("`{}` at location {location}", input.name),
            None => format!("`{}`", input.name),
        };
        match written {
            None => {
                return Err(format!(
                    "fragment input {described} is not written by the vertex stage"
                ))
            }
            Some(output) if output.ty != input.ty => {
                return Err(format!(
                    "fragment input {described} is {} but the vertex stage writes {}",
                    input.ty, output.ty
                ))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn stage_uniforms(stage: &CompiledShader) -> Vec<ActiveUniform> {
    if stage.module.entry_points.is_empty() {
        return Vec::new();
    }
    let usage = stage.info.get_entry_point(0);
    let module = &stage.module;

    let mut uniforms = Vec::new();
    for (handle, var) in module.global_variables.iter() {
        let Some(name) = var.name.as_deref() else {
            continue;
        };
        if usage[handle].is_empty() {
            continue;
        }
        let inner = &module.types[var.ty].inner;
        match var.space {
            AddressSpace::Uniform if stage.uniforms.iter().any(|declared| declared == name) => {
                if let TypeInner::Struct { members, .. } = inner {
                    for member in members {
                        let Some(member_name) = member.name.as_deref() else {
                            continue;
                        };
                        let (ty, size) = classify(module, &module.types[member.ty].inner);
                        uniforms.push(ActiveUniform {
                            name: format!("{name}.{member_name}"),
                            ty,
                            size,
                        });
                    }
                } else {
                    let (ty, size) = classify(module, inner);
                    uniforms.push(ActiveUniform {
                        name: name.to_string(),
                        ty,
                        size,
                    });
                }
            }
            // The sampler half of a split combined sampler is not a GL uniform.
            AddressSpace::Handle if matches!(inner, TypeInner::Image { .. }) => {
                uniforms.push(ActiveUniform {
                    name: name.to_string(),
                    ty: UniformType::Sampler,
                    size: 1,
                });
            }
            _ => {}
        }
    }
    uniforms
}

fn classify(module: &Module, inner: &TypeInner) -> (UniformType, u32) {
    match *inner {
        TypeInner::Scalar(scalar) if scalar == Scalar::I32 => (UniformType::Int, 1),
        TypeInner::Scalar(scalar) if scalar == Scalar::F32 => (UniformType::Float, 1),
        TypeInner::Vector { size, scalar } if scalar == Scalar::F32 => {
            let ty = match size {
                VectorSize::Bi => UniformType::Vec2,
                VectorSize::Tri => UniformType::Vec3,
                VectorSize::Quad => UniformType::Vec4,
            };
            (ty, 1)
        }
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            scalar,
        } if scalar == Scalar::F32 => (UniformType::Mat4, 1),
        TypeInner::Array {
            base,
            size: ArraySize::Constant(count),
            ..
        } => {
            let (ty, _) = classify(module, &module.types[base].inner);
            (ty, count.get())
        }
        _ => (UniformType::Other, 1),
    }
}
