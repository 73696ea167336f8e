//! Copy datasets and groups, within a file or between files.

use std::process::ExitCode;

use clap::Parser;
use h5obj_cli::{commands, logging, Common};

#[derive(Parser, Debug)]
#[command(name = "h5cp", version, about = "Copy datasets and groups in HDF5 files")]
struct Args {
    /// Combined address of the source
    source: String,

    /// Combined address of the destination (a group receives the source under its own name)
    dest: String,

    /// Overwrite an existing dataset
    #[arg(short, long)]
    force: bool,

    /// Copy groups recursively
    #[arg(short, long)]
    recursive: bool,

    #[command(flatten)]
    common: Common,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::run(args.common.verbose, || {
        commands::cp(&args.source, &args.dest, args.force, args.recursive)?;
        Ok(())
    })
}
