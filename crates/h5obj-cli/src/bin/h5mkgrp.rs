//! Create groups.

use std::process::ExitCode;

use clap::Parser;
use h5obj_cli::{commands, logging, Common};

#[derive(Parser, Debug)]
#[command(name = "h5mkgrp", version, about = "Create groups in HDF5 files")]
struct Args {
    /// Combined addresses, <file>/<group path>
    #[arg(required = true)]
    addresses: Vec<String>,

    #[command(flatten)]
    common: Common,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::run(args.common.verbose, || {
        for address in &args.addresses {
            commands::mkgrp(address)?;
        }
        Ok(())
    })
}
