//! Move (rename) datasets and groups.

use std::process::ExitCode;

use clap::Parser;
use h5obj_cli::{commands, logging, Common};

#[derive(Parser, Debug)]
#[command(name = "h5mv", version, about = "Move datasets and groups in HDF5 files")]
struct Args {
    /// Combined address of the source
    source: String,

    /// Combined address of the destination
    dest: String,

    /// Move groups
    #[arg(short, long)]
    recursive: bool,

    #[command(flatten)]
    common: Common,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::run(args.common.verbose, || {
        commands::mv(&args.source, &args.dest, args.recursive)?;
        Ok(())
    })
}
