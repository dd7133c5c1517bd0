//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for MCP tool servers.
#[derive(Parser)]
#[command(name = "focusdesk")]
#[command(about = "Inspect and invoke MCP tool server scripts")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Seconds to wait for each server response (1-600)
    #[arg(
        long = "timeout",
        global = true,
        env = "FOCUSDESK_REQUEST_TIMEOUT_SECS",
        value_parser = clap::value_parser!(u64).range(1..=600)
    )]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::try_parse_from([
            "focusdesk",
            "tools",
            "server.py",
            "--verbose",
            "--timeout",
            "5",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.timeout, Some(5));
    }

    #[test]
    fn test_timeout_out_of_range_rejected() {
        assert!(Cli::try_parse_from(["focusdesk", "--timeout", "0", "tools", "a.py"]).is_err());
        assert!(Cli::try_parse_from(["focusdesk", "--timeout", "601", "tools", "a.py"]).is_err());
    }

    #[test]
    fn test_command_required() {
        assert!(Cli::try_parse_from(["focusdesk"]).is_err());
    }
}
