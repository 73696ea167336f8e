//! Set one item of stored values.

use std::process::ExitCode;

use anyhow::anyhow;
use clap::Parser;
use h5obj::literal;
use h5obj_cli::{commands, logging, Common};

#[derive(Parser, Debug)]
#[command(name = "h5setitem", version, about = "Set an item of stored values")]
struct Args {
    /// Combined address pattern, <file>/<path in file>
    pattern: String,

    /// Key or index to set
    key: String,

    /// New item, as a literal
    #[arg(allow_hyphen_values = true)]
    value: String,

    #[command(flatten)]
    common: Common,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let options = args.common.options();
    logging::run(args.common.verbose, || {
        let item = literal::parse(&args.value)
            .map_err(|err| anyhow!("h5setitem: invalid value {:?}: {err}", args.value))?;
        commands::setitem(&args.pattern, &args.key, &item, options)?;
        Ok(())
    })
}
