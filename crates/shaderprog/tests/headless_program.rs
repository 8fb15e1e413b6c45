#![cfg(feature = "headless")]

use std::fs;
use std::rc::Rc;

use shaderprog::glam::{Mat4, Vec3, Vec4};
use shaderprog::{
    Backend, HeadlessBackend, LinkStatus, ProgramError, ProgramManifest, RenderContext,
    ShaderProgram, StageKind, UniformType, UniformValue,
};
use tempfile::TempDir;

const VERTEX: &str = r"
    #version 460 core
    layout (location = 0) in vec3 aPos;
    void main()
    {
        gl_Position = vec4(aPos.x, aPos.y, aPos.z, 1.0);
    }
";

const FRAGMENT: &str = r"
    #version 460 core
    out vec4 FragColor;

    uniform vec4 ourColor;

    void main()
    {
        FragColor = ourColor;
    }
";

const TEXTURED_VERTEX: &str = r"
    #version 460 core
    layout (location = 0) in vec3 aPos;
    layout (location = 1) in vec3 aColor;
    layout (location = 2) in vec2 aTexCoord;

    out vec3 ourColor;
    out vec2 TexCoord;

    void main()
    {
        gl_Position = vec4(aPos, 1.0);
        ourColor = aColor;
        TexCoord = aTexCoord;
    }
";

const TEXTURED_FRAGMENT: &str = r"
    #version 460 core
    out vec4 FragColor;

    in vec3 ourColor;
    in vec2 TexCoord;

    uniform sampler2D texture1;
    uniform sampler2D texture2;

    void main()
    {
        FragColor = mix(texture(texture1, TexCoord), texture(texture2, TexCoord), 0.2);
    }
";

const TRANSFORM_VERTEX: &str = r"#version 330 core
layout (location = 0) in vec3 aPos;
out vec3 vColor;
uniform mat4 model;
uniform mat4 projection;

void main() {
    vColor = aPos * 0.5 + vec3(0.5);
    gl_Position = projection * model * vec4(aPos, 1.0);
}
";

const TRANSFORM_FRAGMENT: &str = r"#version 330 core
in vec3 vColor;
out vec4 FragColor;
uniform vec3 objectColor;
uniform float unusedScale;

void main() {
    FragColor = vec4(vColor * objectColor, 1.0);
}
";

fn context() -> Rc<RenderContext<HeadlessBackend>> {
    Rc::new(RenderContext::new(HeadlessBackend::new()))
}

#[test]
fn solid_color_program_receives_uniform() {
    let ctx = context();
    let mut program = ShaderProgram::new(&ctx).unwrap();
    program.attach_source(StageKind::Vertex, VERTEX).unwrap();
    program.attach_source(StageKind::Fragment, FRAGMENT).unwrap();
    program.compile().unwrap();

    program.use_program().unwrap();
    assert!(program.set_uniform("ourColor", Vec4::new(1.0, 0.0, 0.0, 1.0)));

    let backend = ctx.backend();
    assert_eq!(backend.bound_program(), Some(program.handle()));
    let location = program.uniform_location("ourColor").unwrap();
    assert_eq!(
        backend.uniform_value(&location),
        Some(UniformValue::Vec4([1.0, 0.0, 0.0, 1.0]))
    );
}

#[test]
fn stages_are_released_after_link() {
    let ctx = context();
    let mut program = ShaderProgram::new(&ctx).unwrap();
    program.attach_source(StageKind::Vertex, VERTEX).unwrap();
    program.attach_source(StageKind::Fragment, FRAGMENT).unwrap();
    assert_eq!(ctx.backend().live_shaders(), 2);

    program.compile().unwrap();
    assert_eq!(ctx.backend().live_shaders(), 0);
    program.attach_source(StageKind::Vertex, VERTEX).unwrap();
}

#[test]
fn failed_link_releases_stages_and_allows_retry() {
    let ctx = context();
    let mut program = ShaderProgram::new(&ctx).unwrap();
    program.attach_source(StageKind::Fragment, FRAGMENT).unwrap();

    let err = program.compile().unwrap_err();
    assert!(matches!(err, ProgramError::Link(_)));
    assert_eq!(program.status(), LinkStatus::LinkFailed);
    assert_eq!(ctx.backend().live_shaders(), 0);

    program.attach_source(StageKind::Vertex, VERTEX).unwrap();
    program.attach_source(StageKind::Fragment, FRAGMENT).unwrap();
    program.compile().unwrap();
    assert!(program.is_linked());
}

#[test]
fn duplicate_stage_fails_even_with_valid_source() {
    let ctx = context();
    let mut program = ShaderProgram::new(&ctx).unwrap();
    program.attach_source(StageKind::Vertex, VERTEX).unwrap();

    let err = program
        .attach_source(StageKind::Vertex, VERTEX)
        .unwrap_err();
    assert!(matches!(err, ProgramError::DuplicateStage(StageKind::Vertex)));
    assert_eq!(ctx.backend().stats().compiles, 1);
}

#[test]
fn compile_errors_carry_the_diagnostic() {
    let ctx = context();
    let mut program = ShaderProgram::new(&ctx).unwrap();
    let err = program
        .attach_source(
            StageKind::Fragment,
            "#version 450\nvoid main() { undefined_call(); }\n",
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ProgramError::Compile {
            kind: StageKind::Fragment,
            ..
        }
    ));
    assert!(!err.log().unwrap_or_default().is_empty());
}

#[test]
fn missing_and_empty_files_never_compile() {
    let ctx = context();
    let mut program = ShaderProgram::new(&ctx).unwrap();
    let dir = TempDir::new().unwrap();

    let err = program
        .attach_file(StageKind::Vertex, dir.path().join("missing.vert"))
        .unwrap_err();
    assert!(matches!(err, ProgramError::FileNotFound(_)));

    let empty = dir.path().join("empty.frag");
    fs::write(&empty, "").unwrap();
    let err = program.attach_file(StageKind::Fragment, &empty).unwrap_err();
    assert!(matches!(err, ProgramError::FileEmpty(_)));

    assert_eq!(ctx.backend().stats().compiles, 0);
}

#[test]
fn optimized_out_and_misspelled_uniforms_are_silent() {
    let ctx = context();
    let program = ShaderProgram::from_sources(&ctx, TRANSFORM_VERTEX, TRANSFORM_FRAGMENT).unwrap();
    program.use_program().unwrap();

    assert!(!program.set_uniform("unusedScale", 2.0));
    assert!(!program.set_uniform("objectColour", Vec3::ONE));
    assert_eq!(ctx.backend().stats().uploads, 0);

    assert!(program.set_uniform("objectColor", Vec3::new(1.0, 0.5, 0.31)));
    assert!(program.set_uniform("model", Mat4::from_scale(Vec3::splat(0.2))));
    assert_eq!(ctx.backend().stats().uploads, 2);
}

#[test]
fn active_uniforms_span_both_stages() {
    let ctx = context();
    let program = ShaderProgram::from_sources(&ctx, TRANSFORM_VERTEX, TRANSFORM_FRAGMENT).unwrap();

    let uniforms = program.active_uniforms();
    let summary: Vec<_> = uniforms
        .iter()
        .map(|uniform| (uniform.name.as_str(), uniform.ty))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("model", UniformType::Mat4),
            ("projection", UniformType::Mat4),
            ("objectColor", UniformType::Vec3),
        ]
    );
}

#[test]
fn mismatched_stage_interface_fails_to_link() {
    let fragment = r"#version 330 core
in vec4 vColor;
out vec4 FragColor;

void main() {
    FragColor = vColor;
}
";
    let ctx = context();
    let err = ShaderProgram::from_sources(&ctx, TRANSFORM_VERTEX, fragment).unwrap_err();
    let log = err.log().unwrap_or_default();
    assert!(log.contains("`vColor`"), "{log}");
}

#[test]
fn textured_program_takes_texture_units() {
    let ctx = context();
    let program =
        ShaderProgram::from_sources(&ctx, TEXTURED_VERTEX, TEXTURED_FRAGMENT).unwrap();
    program.use_program().unwrap();

    assert!(program.set_uniform("texture1", 0));
    assert!(program.set_uniform("texture2", 1));
    let location = program.uniform_location("texture2").unwrap();
    assert_eq!(
        ctx.backend().uniform_value(&location),
        Some(UniformValue::Int(1))
    );
    let samplers = program
        .active_uniforms()
        .iter()
        .filter(|uniform| uniform.ty == UniformType::Sampler)
        .count();
    assert_eq!(samplers, 2);
}

#[test]
fn dropping_program_releases_gpu_objects() {
    let ctx = context();
    {
        let program = ShaderProgram::from_sources(&ctx, VERTEX, FRAGMENT).unwrap();
        program.use_program().unwrap();
        assert_eq!(ctx.backend().live_programs(), 1);
    }
    assert_eq!(ctx.backend().live_programs(), 0);
    assert_eq!(ctx.active_program(), None);
    assert_eq!(ctx.backend().bound_program(), None);
}

#[test]
fn manifest_builds_program_and_applies_defaults() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("transform.vert"), TRANSFORM_VERTEX).unwrap();
    fs::write(dir.path().join("transform.frag"), TRANSFORM_FRAGMENT).unwrap();
    let manifest = ProgramManifest::from_toml_str(
        r#"
name = "transform"

[stages]
vertex = "transform.vert"
fragment = "transform.frag"

[uniforms]
objectColor = [1.0, 0.5, 0.31]
unusedScale = 0.5
"#,
    )
    .unwrap();

    let ctx = context();
    let built = manifest.build(&ctx, dir.path()).unwrap();
    assert!(built.program.is_linked());
    assert_eq!(built.unresolved, vec!["unusedScale".to_string()]);

    let location = built.program.uniform_location("objectColor").unwrap();
    assert_eq!(
        ctx.backend().uniform_value(&location),
        Some(UniformValue::Vec3([1.0, 0.5, 0.31]))
    );
    assert_eq!(ctx.active_program(), None);
}

#[test]
fn context_binding_is_restored_after_foreign_upload() {
    let ctx = context();
    let first = ShaderProgram::from_sources(&ctx, VERTEX, FRAGMENT).unwrap();
    let second = ShaderProgram::from_sources(&ctx, VERTEX, FRAGMENT).unwrap();
    first.use_program().unwrap();

    assert!(second.set_uniform("ourColor", [0.0, 0.0, 1.0, 1.0]));
    assert_eq!(ctx.active_program(), Some(first.handle()));
    assert_eq!(ctx.backend().bound_program(), Some(first.handle()));

    let location = ctx
        .backend()
        .uniform_location(second.handle(), "ourColor")
        .unwrap();
    assert_eq!(
        ctx.backend().uniform_value(&location),
        Some(UniformValue::Vec4([0.0, 0.0, 1.0, 1.0]))
    );
}
