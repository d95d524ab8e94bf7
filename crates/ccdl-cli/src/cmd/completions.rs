//! Completions command

use clap::CommandFactory;
use clap_complete::{Shell, generate};

use crate::Cli;

/// Write shell completions for `shell` to stdout.
pub fn completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "ccdl", &mut std::io::stdout());
}
