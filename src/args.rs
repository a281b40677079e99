//! Command-line argument parsing and processing.
//!
//! This module handles parsing of command-line arguments and provides a clean
//! interface for the main application logic. It supports the standard help,
//! version, and debug flags plus the single `now` subcommand.

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the daemon with these settings
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
        log_file: Option<String>,
    },
    /// Resolve location and schedule once, print them, and exit
    Now {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown or malformed arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse command-line arguments into a structured result.
    ///
    /// The first item is the program name and is skipped. Version wins over
    /// help, and help wins over any parse error.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut debug_enabled = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut run_now = false;
        let mut config_dir: Option<String> = None;
        let mut log_file: Option<String> = None;
        let mut error: Option<String> = None;

        let mut iter = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string());

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--debug" | "-d" => debug_enabled = true,
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--config" | "-c" => match iter.next() {
                    Some(dir) if !dir.starts_with('-') => config_dir = Some(dir),
                    _ => {
                        error.get_or_insert_with(|| "--config requires a directory".into());
                    }
                },
                "--log" | "-l" => match iter.next() {
                    Some(path) if !path.starts_with('-') => log_file = Some(path),
                    _ => {
                        error.get_or_insert_with(|| "--log requires a file path".into());
                    }
                },
                "now" | "n" if !run_now => run_now = true,
                _ => {
                    error.get_or_insert_with(|| format!("Unknown argument: {arg}"));
                }
            }
        }

        if run_now && log_file.is_some() && error.is_none() {
            error = Some("--log only applies when running the daemon".into());
        }

        let action = if display_version {
            CliAction::ShowVersion
        } else if display_help {
            CliAction::ShowHelp
        } else if let Some(message) = error {
            log_warning!("{}", message);
            CliAction::ShowHelpDueToError
        } else if run_now {
            CliAction::Now {
                debug_enabled,
                config_dir,
            }
        } else {
            CliAction::Run {
                debug_enabled,
                config_dir,
                log_file,
            }
        };

        ParsedArgs { action }
    }

    /// Convenience method to parse from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    crate::logger::write_output(&format!("┗ {}\n", env!("CARGO_PKG_DESCRIPTION")));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("autotemp [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-h, --help             Print help information");
    log_indented!("-l, --log <file>       Also write output to <file>");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("now, n                 Show today's schedule and target, then exit");
    log_block_start!("Signals:");
    log_indented!("SIGUSR1                Toggle between automatic and manual mode");
    log_indented!("SIGINT, SIGTERM        Stop the daemon");
    log_end!();
}
