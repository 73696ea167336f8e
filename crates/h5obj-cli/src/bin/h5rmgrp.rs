//! Remove empty groups.

use std::process::ExitCode;

use clap::Parser;
use h5obj_cli::{commands, logging, Common};

#[derive(Parser, Debug)]
#[command(name = "h5rmgrp", version, about = "Remove empty groups from HDF5 files")]
struct Args {
    /// Combined address patterns, <file>/<group path>
    #[arg(required = true)]
    patterns: Vec<String>,

    /// Skip groups that are not empty instead of failing
    #[arg(long)]
    ignore_fail_on_non_empty: bool,

    #[command(flatten)]
    common: Common,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::run(args.common.verbose, || {
        for pattern in &args.patterns {
            commands::rmgrp(pattern, args.ignore_fail_on_non_empty)?;
        }
        Ok(())
    })
}
