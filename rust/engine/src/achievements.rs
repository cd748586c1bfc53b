use serde::{Deserialize, Serialize};

use crate::player::PlayerStats;

/// Chip balance below which a settlement marks the player as having been low.
pub const LOW_CHIPS_THRESHOLD: u32 = 100;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementId {
    FirstWin,
    BlackjackMaster,
    WinStreak5,
    WinStreak10,
    BigWinner,
    HighRoller,
    Experienced,
    ComebackKing,
}

/// Declaration order; newly unlocked achievements are reported in this order.
pub const CATALOG: [AchievementId; 8] = [
    AchievementId::FirstWin,
    AchievementId::BlackjackMaster,
    AchievementId::WinStreak5,
    AchievementId::WinStreak10,
    AchievementId::BigWinner,
    AchievementId::HighRoller,
    AchievementId::Experienced,
    AchievementId::ComebackKing,
];

impl AchievementId {
    pub fn as_str(self) -> &'static str {
        match self {
            AchievementId::FirstWin => "first_win",
            AchievementId::BlackjackMaster => "blackjack_master",
            AchievementId::WinStreak5 => "win_streak_5",
            AchievementId::WinStreak10 => "win_streak_10",
            AchievementId::BigWinner => "big_winner",
            AchievementId::HighRoller => "high_roller",
            AchievementId::Experienced => "experienced",
            AchievementId::ComebackKing => "comeback_king",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        CATALOG.into_iter().find(|id| id.as_str() == raw)
    }

    pub fn title(self) -> &'static str {
        match self {
            AchievementId::FirstWin => "🎉 First Victory",
            AchievementId::BlackjackMaster => "🃏 Blackjack Master",
            AchievementId::WinStreak5 => "🔥 Hot Streak",
            AchievementId::WinStreak10 => "⚡ Lightning Strike",
            AchievementId::BigWinner => "💰 Big Winner",
            AchievementId::HighRoller => "🎰 High Roller",
            AchievementId::Experienced => "🎯 Experienced Player",
            AchievementId::ComebackKing => "👑 Comeback King",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            AchievementId::FirstWin => "Win your first hand",
            AchievementId::BlackjackMaster => "Get 5 blackjacks",
            AchievementId::WinStreak5 => "Win 5 games in a row",
            AchievementId::WinStreak10 => "Win 10 games in a row",
            AchievementId::BigWinner => "Win $2000 or more in total",
            AchievementId::HighRoller => "Accumulate 5000 chips",
            AchievementId::Experienced => "Play 100 games",
            AchievementId::ComebackKing => "Come back from having less than $100",
        }
    }
}

/// History-dependent facts that predicates may consult.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AchievementFlags {
    pub has_reached_low_chips: bool,
}

/// Unlock condition for `id`. Pure: depends only on its arguments.
pub fn is_met(id: AchievementId, stats: &PlayerStats, chips: u32, flags: AchievementFlags) -> bool {
    match id {
        AchievementId::FirstWin => stats.games_won >= 1,
        AchievementId::BlackjackMaster => stats.blackjacks >= 5,
        AchievementId::WinStreak5 => stats.longest_win_streak >= 5,
        AchievementId::WinStreak10 => stats.longest_win_streak >= 10,
        AchievementId::BigWinner => stats.total_winnings >= 2_000,
        AchievementId::HighRoller => chips >= 5_000,
        AchievementId::Experienced => stats.games_played >= 100,
        AchievementId::ComebackKing => chips >= 1_000 && flags.has_reached_low_chips,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: AchievementId,
    pub title: String,
    pub description: String,
    pub unlocked: bool,
}

impl Achievement {
    fn locked(id: AchievementId) -> Self {
        Self {
            id,
            title: id.title().to_string(),
            description: id.description().to_string(),
            unlocked: false,
        }
    }
}

/// Stored unlock state. Ids are kept as strings so that entries written by
/// other versions of the catalog load without error and are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementRecord {
    #[serde(default)]
    pub achievements: Vec<AchievementEntry>,
    #[serde(default, rename = "hasHadLowChips")]
    pub has_had_low_chips: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementEntry {
    pub id: String,
    pub unlocked: bool,
}

/// Tracks which milestones are unlocked. Unlocks are a one-way ratchet.
#[derive(Debug, Clone)]
pub struct AchievementTracker {
    achievements: Vec<Achievement>,
    flags: AchievementFlags,
}

impl Default for AchievementTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl AchievementTracker {
    pub fn new() -> Self {
        Self {
            achievements: CATALOG.into_iter().map(Achievement::locked).collect(),
            flags: AchievementFlags::default(),
        }
    }

    pub fn restore(record: &AchievementRecord) -> Self {
        let mut tracker = Self::new();
        tracker.flags.has_reached_low_chips = record.has_had_low_chips;
        for entry in &record.achievements {
            let Some(id) = AchievementId::parse(&entry.id) else {
                tracing::debug!(id = %entry.id, "ignoring unknown stored achievement");
                continue;
            };
            if let Some(a) = tracker.achievements.iter_mut().find(|a| a.id == id) {
                a.unlocked = entry.unlocked;
            }
        }
        tracker
    }

    pub fn record(&self) -> AchievementRecord {
        AchievementRecord {
            achievements: self
                .achievements
                .iter()
                .map(|a| AchievementEntry {
                    id: a.id.as_str().to_string(),
                    unlocked: a.unlocked,
                })
                .collect(),
            has_had_low_chips: self.flags.has_reached_low_chips,
        }
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    pub fn flags(&self) -> AchievementFlags {
        self.flags
    }

    pub fn unlocked_count(&self) -> usize {
        self.achievements.iter().filter(|a| a.unlocked).count()
    }

    pub fn is_unlocked(&self, id: AchievementId) -> bool {
        self.achievements.iter().any(|a| a.id == id && a.unlocked)
    }

    /// Records the low-chips flag, then unlocks every locked achievement whose
    /// condition now holds. Returns only the ones unlocked by this call.
    pub fn evaluate(&mut self, stats: &PlayerStats, chips: u32) -> Vec<Achievement> {
        if chips < LOW_CHIPS_THRESHOLD {
            self.flags.has_reached_low_chips = true;
        }

        let flags = self.flags;
        let mut unlocked = Vec::new();
        for achievement in self.achievements.iter_mut().filter(|a| !a.unlocked) {
            if is_met(achievement.id, stats, chips, flags) {
                achievement.unlocked = true;
                unlocked.push(achievement.clone());
            }
        }
        unlocked
    }

    /// Relocks everything and forgets the low-chips history.
    pub fn reset(&mut self) {
        for a in &mut self.achievements {
            a.unlocked = false;
        }
        self.flags = AchievementFlags::default();
    }
}
