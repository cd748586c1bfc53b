//! # Blackjack CLI Library
//!
//! Terminal front-end for the blackjack engine: play rounds against the
//! house, inspect and reset the saved profile, and show configuration.
//!
//! ## Main Entry Point
//!
//! [`run`] parses arguments and dispatches to a subcommand, writing to the
//! given streams and returning the process exit code. [`run_with_input`] is
//! the same with an explicit input stream for `play`.
//!
//! ```no_run
//! use std::io;
//! let args = vec!["blackjack", "play", "--rounds", "3"];
//! let code = blackjack_cli::run(args, &mut io::stdout(), &mut io::stderr());
//! assert_eq!(code, 0);
//! ```
//!
//! ## Available Subcommands
//!
//! - `play`: Bet and play rounds interactively
//! - `stats`: Lifetime statistics and achievements of a profile
//! - `reset`: Wipe a profile back to the starting stack
//! - `cfg`: Display current configuration settings

use clap::Parser;
use std::io::{BufRead, Write};

pub mod cli;
mod commands;
mod config;
mod error;
pub mod formatters;
pub mod io_utils;
pub mod ui;
pub mod validation;

use cli::{BlackjackCli, Commands};
use commands::{
    handle_cfg_command, handle_play_command, handle_reset_command, handle_stats_command,
};

pub use commands::{ProfileRepository, SessionSummary, play_session};
pub use error::CliError;

const COMMANDS: &[&str] = &["play", "stats", "reset", "cfg"];

/// Main entry point for the CLI application.
///
/// Returns the exit code: `0` for success (including `--help` and
/// `--version`), `2` for any error.
///
/// ```
/// use std::io;
/// let code = blackjack_cli::run(["blackjack", "--version"], &mut io::stdout(), &mut io::stderr());
/// assert_eq!(code, 0);
/// ```
pub fn run<I, S>(args: I, out: &mut dyn Write, err: &mut dyn Write) -> i32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let stdin = std::io::stdin();
    let mut stdin_lock = stdin.lock();
    run_with_input(args, out, err, &mut stdin_lock)
}

/// [`run`] reading interactive input from `stdin` instead of the process's.
pub fn run_with_input<I, S>(
    args: I,
    out: &mut dyn Write,
    err: &mut dyn Write,
    stdin: &mut dyn BufRead,
) -> i32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let argv: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

    let cli = match BlackjackCli::try_parse_from(&argv) {
        Ok(cli) => cli,
        Err(e) => return report_parse_error(e, out, err),
    };

    let result = match cli.cmd {
        Commands::Play {
            rounds,
            seed,
            profile,
        } => handle_play_command(rounds, seed, profile, out, err, stdin),
        Commands::Stats { profile } => handle_stats_command(profile, out, err),
        Commands::Reset { profile } => handle_reset_command(profile, out, err),
        Commands::Cfg => handle_cfg_command(out, err),
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            if ui::write_error(err, &e.to_string()).is_err() {
                return 2;
            }
            2
        }
    }
}

fn report_parse_error(e: clap::Error, out: &mut dyn Write, err: &mut dyn Write) -> i32 {
    use clap::error::ErrorKind;

    // Help and version print to stdout and succeed
    if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
        if write!(out, "{}", e).is_err() {
            return 2;
        }
        return 0;
    }

    if writeln!(err, "{}", e).is_err()
        || writeln!(err).is_err()
        || writeln!(err, "Blackjack CLI").is_err()
        || writeln!(err, "Usage: blackjack <command> [options]\n").is_err()
        || writeln!(err, "Commands:").is_err()
    {
        return 2;
    }
    for c in COMMANDS {
        if writeln!(err, "  {}", c).is_err() {
            return 2;
        }
    }
    if writeln!(err, "\nFor full help, run: blackjack --help").is_err() {
        return 2;
    }
    2
}
