//! Shell tools for HDF5 files of stored values.
//!
//! Every tool takes combined addresses, `<file>/<path in file>`; see
//! [`address`]. The verbs live in [`commands`] so they can be called
//! without a process; the binaries in `src/bin` only parse arguments and
//! print.

pub mod address;
pub mod commands;
pub mod logging;
pub mod project;

use h5obj::{Options, Profile};

/// Arguments shared by every tool.
#[derive(clap::Args, Debug, Clone)]
pub struct Common {
    /// Log at debug level (overrides H5OBJ_LOG)
    #[arg(short, long)]
    pub verbose: bool,

    /// Persistence profile: tagged or pickle-first
    #[arg(long, env = "H5OBJ_PROFILE", default_value = "tagged")]
    pub profile: Profile,
}

impl Common {
    pub fn options(&self) -> Options {
        Options::default().with_profile(self.profile)
    }
}

/// Ask a yes/no question on the terminal. Anything but yes declines.
pub fn prompt_confirm(prompt: &str) -> anyhow::Result<bool> {
    Ok(dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}
