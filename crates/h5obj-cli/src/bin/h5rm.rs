//! Remove datasets and groups.

use std::process::ExitCode;

use clap::Parser;
use h5obj_cli::{commands, logging, prompt_confirm, Common};

#[derive(Parser, Debug)]
#[command(name = "h5rm", version, about = "Remove datasets from HDF5 files")]
struct Args {
    /// Combined address patterns, <file>/<path in file>
    #[arg(required = true)]
    patterns: Vec<String>,

    /// Never prompt
    #[arg(short, long)]
    force: bool,

    /// Remove groups and their contents recursively
    #[arg(short, long)]
    recursive: bool,

    #[command(flatten)]
    common: Common,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::run(args.common.verbose, || {
        let mut confirm = |prompt: &str| prompt_confirm(prompt);
        for pattern in &args.patterns {
            commands::rm(pattern, args.force, args.recursive, &mut confirm)?;
        }
        Ok(())
    })
}
