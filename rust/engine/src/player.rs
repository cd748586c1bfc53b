use crate::hand::Hand;
use serde::{Deserialize, Serialize};

/// Chips a new (or reset) player sits down with.
pub const STARTING_CHIPS: u32 = 1_000;

/// Result of a settled round from the player's point of view.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundOutcome {
    Win,
    Lose,
    Tie,
}

/// Lifetime statistics, persisted across sessions.
///
/// Field names serialize in camelCase and missing fields fall back to zero,
/// so partially written documents still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerStats {
    pub games_played: u32,
    pub games_won: u32,
    pub games_lost: u32,
    pub games_tied: u32,
    /// Signed running total of win payouts minus lost bets
    pub total_winnings: i64,
    /// Positive for a win streak, negative for a losing streak, 0 after a tie
    pub current_streak: i32,
    pub longest_win_streak: u32,
    pub longest_lose_streak: u32,
    pub blackjacks: u32,
    pub busts: u32,
}

/// What gets written to storage for a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub stats: PlayerStats,
    pub chips: u32,
}

impl Default for PlayerRecord {
    fn default() -> Self {
        Self {
            stats: PlayerStats::default(),
            chips: STARTING_CHIPS,
        }
    }
}

/// The seated player: chip balance, pending bet, active hand and statistics.
#[derive(Debug, Clone)]
pub struct Player {
    name: String,
    chips: u32,
    bet: u32,
    hand: Hand,
    stats: PlayerStats,
}

impl Player {
    pub fn new(name: impl Into<String>, chips: u32) -> Self {
        Self {
            name: name.into(),
            chips,
            bet: 0,
            hand: Hand::new(),
            stats: PlayerStats::default(),
        }
    }

    /// Player rebuilt from a stored record.
    pub fn restore(name: impl Into<String>, record: PlayerRecord) -> Self {
        let mut player = Self::new(name, record.chips);
        player.stats = record.stats;
        player
    }

    pub fn record(&self) -> PlayerRecord {
        PlayerRecord {
            stats: self.stats.clone(),
            chips: self.chips,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn chips(&self) -> u32 {
        self.chips
    }
    pub fn bet(&self) -> u32 {
        self.bet
    }
    pub fn hand(&self) -> &Hand {
        &self.hand
    }
    pub fn hand_mut(&mut self) -> &mut Hand {
        &mut self.hand
    }
    pub fn stats(&self) -> &PlayerStats {
        &self.stats
    }

    /// Sets the bet when `0 < amount <= chips` and a 3:2 win on it could be
    /// credited. Leaves everything untouched otherwise.
    pub fn place_bet(&mut self, amount: u32) -> bool {
        if amount > 0 && amount <= self.chips && natural_credit_fits(self.chips, amount) {
            self.bet = amount;
            true
        } else {
            false
        }
    }

    /// Raises the pending bet by `amount` as long as the total stays covered by chips.
    pub fn add_to_bet(&mut self, amount: u32) -> bool {
        match self.bet.checked_add(amount) {
            Some(total)
                if amount > 0 && total <= self.chips && natural_credit_fits(self.chips, total) =>
            {
                self.bet = total;
                true
            }
            _ => false,
        }
    }

    pub fn clear_bet(&mut self) {
        self.bet = 0;
    }

    /// Credits a settlement payout. Bets are capped so that no payout can
    /// take the stack past `u32::MAX`.
    pub fn add_chips(&mut self, amount: u32) {
        self.chips = self.chips.saturating_add(amount);
    }

    /// Credits `amount` unless the stack, or the best win on `pending_bet`
    /// on top of it, would no longer fit. Returns whether it happened.
    pub fn grant_chips(&mut self, amount: u32, pending_bet: u32) -> bool {
        match self.chips.checked_add(amount) {
            Some(total) if natural_credit_fits(total, pending_bet) => {
                self.chips = total;
                true
            }
            _ => false,
        }
    }

    pub fn remove_chips(&mut self, amount: u32) {
        self.chips = self.chips.saturating_sub(amount);
    }

    pub fn can_double_down(&self) -> bool {
        // the doubled stake wins back 4x the original bet
        let best = u64::from(self.chips) + 3 * u64::from(self.bet);
        self.chips >= self.bet && self.hand.len() == 2 && best <= u64::from(u32::MAX)
    }

    /// Takes a second stake equal to the current bet. Returns whether it happened.
    pub fn double_down(&mut self) -> bool {
        if !self.can_double_down() {
            return false;
        }
        self.chips -= self.bet;
        self.bet *= 2;
        true
    }

    /// Folds a finished round into the statistics.
    ///
    /// Chips are not touched here; the caller credits payouts separately.
    /// Blackjack and bust counters look at the hand as it stands at settlement,
    /// whatever the outcome was.
    pub fn settle_round(&mut self, outcome: RoundOutcome, win_amount: u32) {
        let stats = &mut self.stats;
        stats.games_played += 1;

        match outcome {
            RoundOutcome::Win => {
                stats.games_won += 1;
                stats.total_winnings += i64::from(win_amount);
                stats.current_streak = stats.current_streak.max(0) + 1;
                stats.longest_win_streak = stats
                    .longest_win_streak
                    .max(stats.current_streak.unsigned_abs());
            }
            RoundOutcome::Lose => {
                stats.games_lost += 1;
                stats.total_winnings -= i64::from(self.bet);
                stats.current_streak = stats.current_streak.min(0) - 1;
                stats.longest_lose_streak = stats
                    .longest_lose_streak
                    .max(stats.current_streak.unsigned_abs());
            }
            RoundOutcome::Tie => {
                stats.games_tied += 1;
                stats.current_streak = 0;
            }
        }

        if self.hand.is_natural() {
            stats.blackjacks += 1;
        }
        if self.hand.is_bust() {
            stats.busts += 1;
        }
    }

    /// Percentage of decided (non-tied) games won, 0 when none were decided.
    pub fn win_rate(&self) -> f64 {
        let decided = self.stats.games_won + self.stats.games_lost;
        if decided == 0 {
            0.0
        } else {
            f64::from(self.stats.games_won) / f64::from(decided) * 100.0
        }
    }

    /// Back to a blank profile: zeroed stats and the starting chip stack.
    pub fn reset_progress(&mut self) {
        self.stats = PlayerStats::default();
        self.chips = STARTING_CHIPS;
        self.bet = 0;
        self.hand.reset();
    }
}

/// Whether `chips` (bet included) plus a 3:2 win on `bet` still fits in `u32`.
fn natural_credit_fits(chips: u32, bet: u32) -> bool {
    u64::from(chips) + u64::from(bet) * 3 / 2 <= u64::from(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Card, Rank, Suit};

    #[test]
    fn add_to_bet_accumulates_within_chips() {
        let mut p = Player::new("p", 100);
        assert!(p.add_to_bet(25));
        assert!(p.add_to_bet(50));
        assert_eq!(p.bet(), 75);
        assert!(!p.add_to_bet(50));
        assert_eq!(p.bet(), 75);
        assert!(!p.add_to_bet(0));
    }

    #[test]
    fn bets_and_grants_keep_the_best_payout_in_range() {
        let mut p = Player::new("p", u32::MAX - 10);
        assert!(!p.place_bet(100));
        assert!(p.place_bet(6));
        assert!(!p.add_to_bet(2));
        assert_eq!(p.bet(), 6);

        assert!(!p.grant_chips(5, p.bet()));
        assert!(p.grant_chips(1, p.bet()));
        assert!(!p.grant_chips(u32::MAX, 0));
        assert_eq!(p.chips(), u32::MAX - 9);
    }

    #[test]
    fn remove_chips_saturates_at_zero() {
        let mut p = Player::new("p", 10);
        p.remove_chips(50);
        assert_eq!(p.chips(), 0);
    }

    #[test]
    fn lose_debits_the_current_bet() {
        let mut p = Player::new("p", 100);
        p.place_bet(40);
        p.settle_round(RoundOutcome::Lose, 0);
        assert_eq!(p.stats().total_winnings, -40);
        assert_eq!(p.stats().current_streak, -1);
        assert_eq!(p.stats().longest_lose_streak, 1);
    }

    #[test]
    fn tie_resets_streak() {
        let mut p = Player::new("p", 100);
        p.settle_round(RoundOutcome::Win, 20);
        p.settle_round(RoundOutcome::Tie, 0);
        assert_eq!(p.stats().current_streak, 0);
        assert_eq!(p.stats().games_tied, 1);
        assert_eq!(p.stats().games_played, 2);
    }

    #[test]
    fn tie_with_natural_still_counts_blackjack() {
        let mut p = Player::new("p", 100);
        p.hand_mut().add(Card::new(Suit::Hearts, Rank::Ace));
        p.hand_mut().add(Card::new(Suit::Hearts, Rank::King));
        p.settle_round(RoundOutcome::Tie, 0);
        assert_eq!(p.stats().blackjacks, 1);
    }

    #[test]
    fn win_rate_ignores_ties() {
        let mut p = Player::new("p", 100);
        assert_eq!(p.win_rate(), 0.0);
        p.settle_round(RoundOutcome::Win, 10);
        p.settle_round(RoundOutcome::Tie, 0);
        p.settle_round(RoundOutcome::Win, 10);
        p.settle_round(RoundOutcome::Lose, 0);
        assert!((p.win_rate() - 66.666).abs() < 0.01);
    }

    #[test]
    fn stats_deserialize_with_missing_fields() {
        let stats: PlayerStats = serde_json::from_str(r#"{"gamesWon":3}"#).unwrap();
        assert_eq!(stats.games_won, 3);
        assert_eq!(stats.games_played, 0);
    }
}
