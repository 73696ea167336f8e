//! Print completions for a partly typed address, one per line.

use std::process::ExitCode;

use clap::Parser;
use h5obj_cli::address::h5complete;
use h5obj_cli::{logging, Common};

#[derive(Parser, Debug)]
#[command(name = "h5complete", version, about = "Complete combined HDF5 addresses")]
struct Args {
    /// Partly typed address
    #[arg(default_value = "")]
    partial: String,

    #[command(flatten)]
    common: Common,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::run(args.common.verbose, || {
        for candidate in h5complete(&args.partial) {
            println!("{candidate}");
        }
        Ok(())
    })
}
