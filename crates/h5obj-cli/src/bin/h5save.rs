//! Save a value, written as a literal, into an HDF5 file.

use std::process::ExitCode;

use anyhow::anyhow;
use clap::Parser;
use h5obj::{literal, Value};
use h5obj_cli::{commands, logging, Common};

#[derive(Parser, Debug)]
#[command(name = "h5save", version, about = "Save a value to an HDF5 file")]
struct Args {
    /// Combined address, <file>/<path in file>
    address: String,

    /// Value to save, e.g. "[1, 2.5, 'a']" (default: None)
    #[arg(short, long)]
    data: Option<String>,

    /// Overwrite an existing dataset
    #[arg(short, long)]
    force: bool,

    /// Fail instead of pickling values with no native form
    #[arg(long)]
    no_pickle: bool,

    #[command(flatten)]
    common: Common,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let options = args.common.options().with_pickle(!args.no_pickle);
    logging::run(args.common.verbose, || {
        let value = match &args.data {
            Some(text) => literal::parse(text)
                .map_err(|err| anyhow!("h5save: invalid data {text:?}: {err}"))?,

            None => Value::None,
        };
        commands::save(&args.address, &value, args.force, options)
    })
}
