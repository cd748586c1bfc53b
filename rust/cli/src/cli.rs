//! Command-line surface: argument definitions parsed by clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "blackjack",
    version,
    about = "Single-seat blackjack against the house, with saved stats and achievements"
)]
pub struct BlackjackCli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Play rounds at the table, betting and deciding from the terminal
    Play {
        /// Stop after this many rounds (default: until you quit or go broke)
        #[arg(long)]
        rounds: Option<u32>,
        /// Shuffle seed for a reproducible shoe
        #[arg(long)]
        seed: Option<u64>,
        /// Profile file holding chips, stats and achievements
        #[arg(long)]
        profile: Option<PathBuf>,
    },
    /// Show lifetime statistics and achievements for a profile
    Stats {
        #[arg(long)]
        profile: Option<PathBuf>,
    },
    /// Wipe a profile back to 1000 chips with no stats or achievements
    Reset {
        #[arg(long)]
        profile: Option<PathBuf>,
    },
    /// Display resolved configuration and where each value came from
    Cfg,
}
