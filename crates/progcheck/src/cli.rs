use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use shaderprog::{StageKind, UnknownStageKind};

#[derive(Parser, Debug)]
#[command(
    name = "progcheck",
    author,
    version,
    about = "Compile and link GLSL shader programs without a GPU"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Link shader files into one program; stages are inferred from extensions.
    Link(LinkArgs),
    /// Build the program described by a TOML manifest.
    Manifest(ManifestArgs),
}

#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Shader files (`.vert`, `.frag`, `.comp`, ...).
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Attach a file under an explicit stage, e.g. `fragment=shaders/color.glsl`.
    #[arg(long = "stage", value_name = "KIND=PATH", value_parser = parse_stage_arg)]
    pub stages: Vec<(StageKind, PathBuf)>,
}

#[derive(Args, Debug)]
pub struct ManifestArgs {
    /// Program manifest; stage paths are resolved relative to its directory.
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,
}

pub fn parse() -> Cli {
    Cli::parse()
}

fn parse_stage_arg(raw: &str) -> Result<(StageKind, PathBuf), String> {
    let (kind, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KIND=PATH, got '{raw}'"))?;
    let kind: StageKind = kind.parse().map_err(|err: UnknownStageKind| err.to_string())?;
    if path.trim().is_empty() {
        return Err(format!("stage '{kind}' needs a file path"));
    }
    Ok((kind, PathBuf::from(path)))
}
