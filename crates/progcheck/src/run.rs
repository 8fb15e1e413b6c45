use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use shaderprog::{
    HeadlessBackend, ProgramError, ProgramManifest, RenderContext, ShaderProgram, StageKind,
};
use tracing_subscriber::EnvFilter;

use crate::cli::{LinkArgs, ManifestArgs};

type Program = ShaderProgram<HeadlessBackend>;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn link(args: LinkArgs) -> Result<()> {
    let stages = collect_stages(args)?;
    tracing::debug!(stages = stages.len(), "linking shader files");

    let ctx = Rc::new(RenderContext::new(HeadlessBackend::new()));
    let mut program = ShaderProgram::new(&ctx)?;

    let mut failed = 0;
    for (kind, path) in &stages {
        match program.attach_file(*kind, path) {
            Ok(()) => println!("  {kind:<15} ok      {}", path.display()),
            Err(err) => {
                failed += 1;
                println!("  {kind:<15} FAILED  {}", path.display());
                print_error(&err);
            }
        }
    }
    if failed > 0 {
        bail!("{failed} stage(s) failed to compile");
    }

    link_and_report(&mut program)?;
    print_uniforms(&program);
    Ok(())
}

pub fn manifest(args: ManifestArgs) -> Result<()> {
    let manifest = ProgramManifest::load(&args.manifest)
        .with_context(|| format!("failed to load {}", args.manifest.display()))?;
    let base_dir = args
        .manifest
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    println!("Program: {}", manifest.display_name());
    for (kind, path) in &manifest.stages {
        println!("  {kind:<15} {}", base_dir.join(path).display());
    }

    let ctx = Rc::new(RenderContext::new(HeadlessBackend::new()));
    let built = match manifest.build(&ctx, &base_dir) {
        Ok(built) => built,
        Err(err) => {
            if let shaderprog::ManifestError::Program(program_err) = &err {
                print_error(program_err);
            }
            return Err(err).context("failed to build program");
        }
    };

    println!("Link: ok");
    print_uniforms(&built.program);
    if !built.unresolved.is_empty() {
        println!("Unresolved uniform defaults:");
        for name in &built.unresolved {
            println!("  {name}");
        }
    }
    Ok(())
}

fn collect_stages(args: LinkArgs) -> Result<Vec<(StageKind, PathBuf)>> {
    let mut stages = Vec::with_capacity(args.files.len() + args.stages.len());
    for path in args.files {
        let kind = StageKind::from_path(&path).with_context(|| {
            format!(
                "cannot infer shader stage from {}; use --stage KIND=PATH",
                path.display()
            )
        })?;
        stages.push((kind, path));
    }
    stages.extend(args.stages);

    if stages.is_empty() {
        bail!("no shader files given");
    }
    Ok(stages)
}

fn link_and_report(program: &mut Program) -> Result<()> {
    match program.compile() {
        Ok(()) => {
            println!("Link: ok");
            Ok(())
        }
        Err(err) => {
            println!("Link: FAILED");
            print_error(&err);
            Err(err).context("program failed to link")
        }
    }
}

fn print_error(err: &ProgramError) {
    match err.log() {
        Some(log) => {
            for line in log.lines().filter(|line| !line.trim().is_empty()) {
                println!("    {line}");
            }
        }
        None => println!("    {err}"),
    }
}

fn print_uniforms(program: &Program) {
    let uniforms = program.active_uniforms();
    if uniforms.is_empty() {
        println!("Active uniforms: none");
        return;
    }
    println!("Active uniforms:");
    for uniform in uniforms {
        if uniform.size > 1 {
            println!("  {:<8} {}[{}]", uniform.ty, uniform.name, uniform.size);
        } else {
            println!("  {:<8} {}", uniform.ty, uniform.name);
        }
    }
}
