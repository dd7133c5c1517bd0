//! Available subcommands.

use std::path::PathBuf;

use clap::Subcommand;

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// List the tools a server script exposes
    Tools {
        /// Path to the server script (.js, .mjs or .py)
        script: PathBuf,
        /// Print the tool directory as JSON
        #[arg(long)]
        json: bool,
    },

    /// Invoke one tool on a server script
    Call {
        /// Path to the server script (.js, .mjs or .py)
        script: PathBuf,
        /// Name of the tool to invoke
        tool: String,
        /// Tool arguments as a JSON object
        #[arg(long)]
        args: Option<String>,
    },
}
