use super::{open_profile, profile_path};
use crate::config;
use crate::error::CliError;
use blackjack_engine::engine::RoundEngine;
use blackjack_engine::shoe::Shoe;
use std::io::Write;
use std::path::PathBuf;

/// Wipes the profile's stats and achievements and restores the starting
/// stack, through the same engine operation the table uses.
pub fn handle_reset_command(
    profile: Option<PathBuf>,
    out: &mut dyn Write,
    _err: &mut dyn Write,
) -> Result<(), CliError> {
    let config = config::load()?;
    let path = profile_path(profile, &config);
    let repository = open_profile(&path)?;

    let mut engine = RoundEngine::with_player_name(repository, Shoe::new(), config.player_name);
    engine.reset_progress();
    if engine.persistence_failures() > 0 {
        return Err(CliError::Io(std::io::Error::other(format!(
            "could not write {}",
            path.display()
        ))));
    }

    writeln!(out, "Profile reset: {}", path.display())?;
    writeln!(
        out,
        "Chips: {}  Achievements: 0/{}",
        engine.player().chips(),
        engine.achievements().len()
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blackjack_engine::store::{FileStore, KvStatsRepository, StatsRepository};
    use serial_test::serial;

    #[test]
    #[serial]
    fn reset_writes_a_fresh_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("me.json");
        let mut out = Vec::new();
        let mut err = Vec::new();

        handle_reset_command(Some(path.clone()), &mut out, &mut err).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Chips: 1000  Achievements: 0/8"), "{}", text);
        let repo = KvStatsRepository::new(FileStore::open(&path).unwrap());
        let record = repo.load_player().unwrap().expect("saved record");
        assert_eq!(record.chips, 1000);
        assert_eq!(record.stats.games_played, 0);
    }
}
