//! List the contents of a file or group.

use std::process::ExitCode;

use clap::Parser;
use h5obj_cli::{commands, logging, Common};

#[derive(Parser, Debug)]
#[command(name = "h5ls", version, about = "List contents of HDF5 files and groups")]
struct Args {
    /// Combined addresses, <file>/<path in file>
    #[arg(required = true)]
    addresses: Vec<String>,

    #[command(flatten)]
    common: Common,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::run(args.common.verbose, || {
        let many = args.addresses.len() > 1;
        for address in &args.addresses {
            let names = commands::ls(address)?;
            if many {
                println!("{address}:");
            }
            for name in names {
                println!("{name}");
            }
        }
        Ok(())
    })
}
