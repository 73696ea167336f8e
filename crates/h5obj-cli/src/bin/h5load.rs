//! Load a stored value and print it.

use std::process::ExitCode;

use clap::Parser;
use h5obj_cli::project::Projection;
use h5obj_cli::{commands, logging, Common};

#[derive(Parser, Debug)]
#[command(name = "h5load", version, about = "Load a value from an HDF5 file and print it")]
struct Args {
    /// Combined address, <file>/<path in file>
    address: String,

    /// Print the type of the value
    #[arg(short = 't', long)]
    dtype: bool,

    /// Print the length of the value
    #[arg(short = 'l', long)]
    len: bool,

    /// Take the "x" argument of a function
    #[arg(long)]
    x: bool,

    /// Take the "y" argument of a function
    #[arg(long)]
    y: bool,

    /// Take the attributes of a function
    #[arg(long)]
    attrs: bool,

    /// Take one item (negative counts from the end)
    #[arg(long, allow_negative_numbers = true)]
    item: Option<i64>,

    /// Print the maximum of the value
    #[arg(short = 'm', long)]
    max: bool,

    /// Print the minimum of the value
    #[arg(short = 'n', long)]
    min: bool,

    /// Print pickled values as raw bytes
    #[arg(long)]
    no_unpickle: bool,

    #[command(flatten)]
    common: Common,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let projection = Projection {
        dtype: args.dtype,
        x: args.x,
        y: args.y,
        attrs: args.attrs,
        item: args.item,
        max: args.max,
        min: args.min,
        len: args.len,
    };
    let options = args.common.options().with_unpickle(!args.no_unpickle);
    logging::run(args.common.verbose, || {
        let value = commands::load(&args.address, &projection, options)?;
        println!("{value}");
        Ok(())
    })
}
