//! Command handler modules for the blackjack CLI.
//!
//! Each subcommand lives in its own file and exposes one
//! `handle_COMMAND_command(...) -> Result<(), CliError>` function. Output
//! streams (and stdin, for `play`) are passed in so the handlers can be
//! driven from tests with in-memory buffers.

mod cfg;
mod play;
mod reset;
mod stats;

pub use cfg::handle_cfg_command;
pub use play::{SessionSummary, handle_play_command, play_session};
pub use reset::handle_reset_command;
pub use stats::handle_stats_command;

use crate::config::Config;
use crate::error::CliError;
use blackjack_engine::store::{FileStore, KvStatsRepository};
use std::path::{Path, PathBuf};

/// Progress repository backed by a profile file on disk.
pub type ProfileRepository = KvStatsRepository<FileStore>;

/// `--profile` when given, otherwise the configured path.
fn profile_path(flag: Option<PathBuf>, config: &Config) -> PathBuf {
    flag.unwrap_or_else(|| config.profile_path.clone())
}

/// Opens the profile at `path`. A missing file is an empty profile and is
/// only created by the first save.
fn open_profile(path: &Path) -> Result<ProfileRepository, CliError> {
    let store = FileStore::open(path)?;
    Ok(KvStatsRepository::new(store))
}
