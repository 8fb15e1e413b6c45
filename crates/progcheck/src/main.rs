mod cli;
mod run;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Command::Link(args) => run::link(args),
        Command::Manifest(args) => run::manifest(args),
    }
}
