//! Lifetime statistics and achievements for a saved profile.

use super::{open_profile, profile_path};
use crate::config;
use crate::error::CliError;
use crate::formatters::{format_achievement, format_streak};
use blackjack_engine::achievements::AchievementTracker;
use blackjack_engine::player::{Player, PlayerRecord};
use blackjack_engine::store::StatsRepository;
use std::io::Write;
use std::path::PathBuf;

/// Prints the profile's chips, record, streaks and achievement checklist.
///
/// Reads only: a profile that does not exist yet is reported as a fresh one
/// and no file is created.
pub fn handle_stats_command(
    profile: Option<PathBuf>,
    out: &mut dyn Write,
    _err: &mut dyn Write,
) -> Result<(), CliError> {
    let config = config::load()?;
    let path = profile_path(profile, &config);
    let repository = open_profile(&path)?;

    let saved = repository.load_player()?;
    let fresh = saved.is_none();
    let player = Player::restore(config.player_name, saved.unwrap_or_default());
    let tracker = match repository.load_achievements()? {
        Some(record) => AchievementTracker::restore(&record),
        None => AchievementTracker::new(),
    };
    let stats = player.stats();

    writeln!(out, "Profile: {}", path.display())?;
    if fresh {
        writeln!(out, "No saved progress yet.")?;
    }
    writeln!(out, "Chips: {}", player.chips())?;
    writeln!(out, "Games played: {}", stats.games_played)?;
    writeln!(
        out,
        "Won: {}  Lost: {}  Pushed: {}",
        stats.games_won, stats.games_lost, stats.games_tied
    )?;
    writeln!(out, "Win rate: {:.1}%", player.win_rate())?;
    writeln!(out, "Total winnings: {}", stats.total_winnings)?;
    writeln!(
        out,
        "Streak: {}  (best win run {}, worst losing run {})",
        format_streak(stats.current_streak),
        stats.longest_win_streak,
        stats.longest_lose_streak
    )?;
    writeln!(out, "Blackjacks: {}  Busts: {}", stats.blackjacks, stats.busts)?;
    if let Some(saved_at) = repository.last_saved()? {
        writeln!(out, "Last saved: {}", saved_at)?;
    }

    let achievements = tracker.achievements();
    writeln!(
        out,
        "Achievements ({}/{}):",
        tracker.unlocked_count(),
        achievements.len()
    )?;
    for achievement in achievements {
        writeln!(out, "  {}", format_achievement(achievement))?;
    }
    Ok(())
}
