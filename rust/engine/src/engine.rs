use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::achievements::{Achievement, AchievementTracker};
use crate::dealer::Dealer;
use crate::errors::GameError;
use crate::events::{RoundEvent, RoundResult, Seat};
use crate::game::{AvailableAction, Phase};
use crate::hand::BLACKJACK;
use crate::player::{Player, PlayerRecord, PlayerStats, RoundOutcome};
use crate::shoe::Shoe;
use crate::store::StatsRepository;

pub const DEFAULT_PLAYER_NAME: &str = "Player";

/// A command issued by a front-end.
///
/// Serialized with a `command` tag so it can travel as
/// `{"command": "bet", "amount": 25}` over the wire.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Set the pending bet outright
    Bet { amount: u32 },
    /// Add a chip to the pending bet
    AddChip { amount: u32 },
    ClearBet,
    Deal,
    Hit,
    Stand,
    DoubleDown,
    NewRound,
    GrantChips { amount: u32 },
    ResetProgress,
}

/// Core round orchestrator: owns the shoe, both hands, the player's chips and
/// statistics, and the achievement tracker for one seat.
///
/// Every command runs to completion before returning. Dealing and the dealer's
/// draw sequence are instantaneous; the returned [`RoundEvent`]s describe each
/// step so a front-end can animate them however it likes.
///
/// # Examples
///
/// ```
/// use blackjack_engine::engine::RoundEngine;
/// use blackjack_engine::game::Phase;
/// use blackjack_engine::shoe::Shoe;
/// use blackjack_engine::store::{KvStatsRepository, MemoryStore};
///
/// let repo = KvStatsRepository::new(MemoryStore::new());
/// let mut engine = RoundEngine::new(repo, Shoe::new_with_seed(42));
///
/// engine.place_bet(50).expect("bet within chips");
/// engine.deal().expect("deal with a bet placed");
/// assert!(matches!(engine.phase(), Phase::Playing | Phase::GameOver));
/// ```
#[derive(Debug)]
pub struct RoundEngine<R> {
    player: Player,
    dealer: Dealer,
    shoe: Shoe,
    achievements: AchievementTracker,
    repository: R,
    phase: Phase,
    last_result: Option<RoundResult>,
    round_log: Vec<RoundEvent>,
    persistence_failures: u32,
}

impl<R: StatsRepository> RoundEngine<R> {
    pub fn new(repository: R, shoe: Shoe) -> Self {
        Self::with_player_name(repository, shoe, DEFAULT_PLAYER_NAME)
    }

    /// Builds the engine and restores saved chips, stats and achievements.
    ///
    /// Unreadable saved data is logged and replaced by a fresh profile.
    pub fn with_player_name(repository: R, shoe: Shoe, name: impl Into<String>) -> Self {
        let name = name.into();
        let record = match repository.load_player() {
            Ok(Some(record)) => record,
            Ok(None) => PlayerRecord::default(),
            Err(err) => {
                warn!(error = %err, "failed to load player progress, starting fresh");
                PlayerRecord::default()
            }
        };
        let achievements = match repository.load_achievements() {
            Ok(Some(record)) => AchievementTracker::restore(&record),
            Ok(None) => AchievementTracker::new(),
            Err(err) => {
                warn!(error = %err, "failed to load achievements, starting fresh");
                AchievementTracker::new()
            }
        };

        debug!(
            player = %name,
            chips = record.chips,
            games_played = record.stats.games_played,
            unlocked = achievements.unlocked_count(),
            "round engine ready"
        );

        Self {
            player: Player::restore(name, record),
            dealer: Dealer::new(),
            shoe,
            achievements,
            repository,
            phase: Phase::Betting,
            last_result: None,
            round_log: Vec::new(),
            persistence_failures: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
    pub fn player(&self) -> &Player {
        &self.player
    }
    pub fn dealer(&self) -> &Dealer {
        &self.dealer
    }
    pub fn stats(&self) -> &PlayerStats {
        self.player.stats()
    }
    pub fn achievements(&self) -> &[Achievement] {
        self.achievements.achievements()
    }
    pub fn achievement_tracker(&self) -> &AchievementTracker {
        &self.achievements
    }
    pub fn shoe_remaining(&self) -> usize {
        self.shoe.remaining()
    }
    pub fn last_result(&self) -> Option<&RoundResult> {
        self.last_result.as_ref()
    }
    pub fn repository(&self) -> &R {
        &self.repository
    }
    /// Saves that failed since construction. Failures never abort a command.
    pub fn persistence_failures(&self) -> u32 {
        self.persistence_failures
    }

    /// Everything that happened since the current round's betting opened.
    pub fn round_events(&self) -> &[RoundEvent] {
        &self.round_log
    }

    pub fn available_actions(&self) -> Vec<AvailableAction> {
        match self.phase {
            Phase::Betting => {
                let mut actions = vec![AvailableAction::Bet, AvailableAction::ClearBet];
                if self.player.bet() > 0 && self.player.bet() <= self.player.chips() {
                    actions.push(AvailableAction::Deal);
                }
                actions
            }
            Phase::Playing => {
                let mut actions = vec![AvailableAction::Hit, AvailableAction::Stand];
                if self.player.can_double_down() {
                    actions.push(AvailableAction::DoubleDown);
                }
                actions
            }
            Phase::GameOver if self.player.chips() > 0 => vec![AvailableAction::NewRound],
            _ => Vec::new(),
        }
    }

    pub fn apply(&mut self, command: Command) -> Result<Vec<RoundEvent>, GameError> {
        match command {
            Command::Bet { amount } => self.place_bet(amount),
            Command::AddChip { amount } => self.add_to_bet(amount),
            Command::ClearBet => self.clear_bet(),
            Command::Deal => self.deal(),
            Command::Hit => self.hit(),
            Command::Stand => self.stand(),
            Command::DoubleDown => self.double_down(),
            Command::NewRound => self.new_round(),
            Command::GrantChips { amount } => self.grant_chips(amount),
            Command::ResetProgress => Ok(self.reset_progress()),
        }
    }

    /// Sets the pending bet. Requires `0 < amount <= chips`.
    pub fn place_bet(&mut self, amount: u32) -> Result<Vec<RoundEvent>, GameError> {
        self.require(Phase::Betting, "bet")?;
        if !self.player.place_bet(amount) {
            return Err(self.invalid_bet(amount));
        }
        Ok(self.record(vec![self.bet_changed()]))
    }

    /// Adds `amount` to the pending bet as long as the total stays within chips.
    pub fn add_to_bet(&mut self, amount: u32) -> Result<Vec<RoundEvent>, GameError> {
        self.require(Phase::Betting, "add_chip")?;
        if !self.player.add_to_bet(amount) {
            return Err(self.invalid_bet(amount));
        }
        Ok(self.record(vec![self.bet_changed()]))
    }

    pub fn clear_bet(&mut self) -> Result<Vec<RoundEvent>, GameError> {
        self.require(Phase::Betting, "clear_bet")?;
        self.player.clear_bet();
        Ok(self.record(vec![self.bet_changed()]))
    }

    /// Takes the bet and deals player, dealer (up), player, dealer (hole).
    ///
    /// A natural on either side settles the round on the spot; otherwise the
    /// table moves on to the player's turn.
    pub fn deal(&mut self) -> Result<Vec<RoundEvent>, GameError> {
        self.require(Phase::Betting, "deal")?;
        let bet = self.player.bet();
        let chips = self.player.chips();
        if bet == 0 {
            return Err(GameError::NoBetPlaced);
        }
        if bet > chips {
            return Err(GameError::InsufficientChips { bet, chips });
        }

        let mut events = Vec::new();
        self.transition(Phase::Dealing, &mut events);
        self.player.remove_chips(bet);
        events.push(self.bet_changed());
        self.player.hand_mut().reset();
        self.dealer.reset();

        self.deal_to(Seat::Player, &mut events);
        self.deal_to(Seat::Dealer, &mut events);
        self.deal_to(Seat::Player, &mut events);
        self.deal_to(Seat::Dealer, &mut events);

        let player_natural = self.player.hand().is_natural();
        let dealer_natural = self.dealer.hand().is_natural();
        if player_natural || dealer_natural {
            self.reveal_hole(&mut events);
            match (player_natural, dealer_natural) {
                (true, true) => self.settle(
                    RoundOutcome::Tie,
                    "Both have Blackjack - Push!",
                    0,
                    &mut events,
                ),
                (true, false) => {
                    let win = win_payout(bet, 5);
                    self.settle(RoundOutcome::Win, "Blackjack! You win!", win, &mut events)
                }
                _ => self.settle(RoundOutcome::Lose, "Dealer has Blackjack!", 0, &mut events),
            }
        } else {
            self.transition(Phase::Playing, &mut events);
        }

        Ok(self.record(events))
    }

    /// One more card. Busting loses; reaching 21 stands automatically.
    pub fn hit(&mut self) -> Result<Vec<RoundEvent>, GameError> {
        self.require(Phase::Playing, "hit")?;
        let mut events = Vec::new();
        self.deal_to(Seat::Player, &mut events);

        let hand = self.player.hand();
        if hand.is_bust() {
            self.settle(RoundOutcome::Lose, "Bust! You went over 21!", 0, &mut events);
        } else if hand.score() == BLACKJACK {
            self.stand_and_resolve(&mut events);
        }
        Ok(self.record(events))
    }

    pub fn stand(&mut self) -> Result<Vec<RoundEvent>, GameError> {
        self.require(Phase::Playing, "stand")?;
        let mut events = Vec::new();
        self.stand_and_resolve(&mut events);
        Ok(self.record(events))
    }

    /// Doubles the bet, takes exactly one card, then stands unless busted.
    pub fn double_down(&mut self) -> Result<Vec<RoundEvent>, GameError> {
        self.require(Phase::Playing, "double_down")?;
        if !self.player.double_down() {
            return Err(GameError::CannotDoubleDown);
        }

        let mut events = vec![RoundEvent::DoubledDown {
            bet: self.player.bet(),
            chips: self.player.chips(),
        }];
        self.deal_to(Seat::Player, &mut events);
        if self.player.hand().is_bust() {
            self.settle(RoundOutcome::Lose, "Bust after double down!", 0, &mut events);
        } else {
            self.stand_and_resolve(&mut events);
        }
        Ok(self.record(events))
    }

    /// Clears the table for the next round. Only after a settled round, and
    /// only while the player still has chips.
    pub fn new_round(&mut self) -> Result<Vec<RoundEvent>, GameError> {
        self.require(Phase::GameOver, "new_round")?;
        if self.player.chips() == 0 {
            return Err(GameError::OutOfChips);
        }

        self.round_log.clear();
        self.player.clear_bet();
        self.player.hand_mut().reset();
        self.dealer.reset();
        self.last_result = None;

        let mut events = Vec::new();
        self.transition(Phase::Betting, &mut events);
        events.push(self.bet_changed());
        Ok(self.record(events))
    }

    /// Credits chips outside of play. Only between rounds.
    pub fn grant_chips(&mut self, amount: u32) -> Result<Vec<RoundEvent>, GameError> {
        if !matches!(self.phase, Phase::Betting | Phase::GameOver) {
            return Err(GameError::InvalidCommand {
                command: "grant_chips",
                phase: self.phase,
            });
        }
        if amount == 0 {
            return Err(GameError::InvalidGrant);
        }
        let pending = if self.phase == Phase::Betting {
            self.player.bet()
        } else {
            0
        };
        if !self.player.grant_chips(amount, pending) {
            return Err(GameError::ChipLimit {
                amount,
                chips: self.player.chips(),
            });
        }
        self.persist_player();
        info!(amount, chips = self.player.chips(), "chips granted");
        Ok(self.record(vec![RoundEvent::ChipsGranted {
            amount,
            chips: self.player.chips(),
        }]))
    }

    /// Wipes stats and achievements, restores the starting stack and reopens
    /// betting. Allowed at any point; a round in progress is abandoned.
    pub fn reset_progress(&mut self) -> Vec<RoundEvent> {
        self.player.reset_progress();
        self.dealer.reset();
        self.achievements.reset();
        self.last_result = None;
        self.round_log.clear();
        self.persist_player();
        self.persist_achievements();

        let mut events = Vec::new();
        if self.phase != Phase::Betting {
            events.push(RoundEvent::PhaseChanged {
                from: self.phase,
                to: Phase::Betting,
            });
            self.phase = Phase::Betting;
        }
        events.push(RoundEvent::ProgressReset {
            chips: self.player.chips(),
        });
        info!(chips = self.player.chips(), "player progress reset");
        self.record(events)
    }

    fn stand_and_resolve(&mut self, events: &mut Vec<RoundEvent>) {
        self.reveal_hole(events);
        self.transition(Phase::DealerTurn, events);
        while self.dealer.should_draw() {
            self.deal_to(Seat::Dealer, events);
        }

        let bet = self.player.bet();
        let player_score = self.player.hand().score();
        let dealer_score = self.dealer.score();
        if self.dealer.hand().is_bust() {
            self.settle(RoundOutcome::Win, "Dealer busts! You win!", win_payout(bet, 4), events);
        } else if player_score > dealer_score {
            self.settle(
                RoundOutcome::Win,
                "You win with a higher score!",
                win_payout(bet, 4),
                events,
            );
        } else if dealer_score > player_score {
            self.settle(
                RoundOutcome::Lose,
                "Dealer wins with a higher score!",
                0,
                events,
            );
        } else {
            self.settle(RoundOutcome::Tie, "Push! Same score.", 0, events);
        }
    }

    fn settle(
        &mut self,
        outcome: RoundOutcome,
        message: &str,
        win_amount: u32,
        events: &mut Vec<RoundEvent>,
    ) {
        self.transition(Phase::GameOver, events);

        let bet = self.player.bet();
        let payout = match outcome {
            RoundOutcome::Win => win_amount,
            RoundOutcome::Tie => bet,
            RoundOutcome::Lose => 0,
        };
        self.player.add_chips(payout);
        self.player.settle_round(outcome, win_amount);

        let flags_before = self.achievements.flags();
        let unlocked = self
            .achievements
            .evaluate(self.player.stats(), self.player.chips());

        self.persist_player();
        if !unlocked.is_empty() || self.achievements.flags() != flags_before {
            self.persist_achievements();
        }

        let result = RoundResult {
            outcome,
            message: message.to_string(),
            payout,
            bet,
            player_score: self.player.hand().score(),
            dealer_score: self.dealer.score(),
            unlocked: unlocked.clone(),
        };

        info!(
            outcome = ?outcome,
            bet,
            payout,
            chips = self.player.chips(),
            player_score = result.player_score,
            dealer_score = result.dealer_score,
            unlocked = unlocked.len(),
            "round settled"
        );

        events.push(RoundEvent::RoundSettled {
            result: result.clone(),
        });
        events.extend(
            unlocked
                .into_iter()
                .map(|achievement| RoundEvent::AchievementUnlocked { achievement }),
        );
        self.last_result = Some(result);
    }

    fn deal_to(&mut self, seat: Seat, events: &mut Vec<RoundEvent>) {
        let card = self.shoe.draw();
        let event = match seat {
            Seat::Player => {
                self.player.hand_mut().add(card);
                RoundEvent::CardDealt {
                    seat,
                    card: Some(card),
                    visible_score: Some(self.player.hand().score()),
                }
            }
            Seat::Dealer => {
                self.dealer.take(card);
                let face_down = self.dealer.is_hole_hidden() && self.dealer.hand().len() == 2;
                RoundEvent::CardDealt {
                    seat,
                    card: if face_down { None } else { Some(card) },
                    visible_score: self.dealer.visible_score(),
                }
            }
        };
        events.push(event);
    }

    fn reveal_hole(&mut self, events: &mut Vec<RoundEvent>) {
        if !self.dealer.is_hole_hidden() {
            return;
        }
        if let Some(card) = self.dealer.reveal_hole() {
            events.push(RoundEvent::HoleCardRevealed {
                card,
                dealer_score: self.dealer.score(),
            });
        }
    }

    fn transition(&mut self, next: Phase, events: &mut Vec<RoundEvent>) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal transition {} -> {}",
            self.phase,
            next
        );
        debug!(from = %self.phase, to = %next, "phase transition");
        events.push(RoundEvent::PhaseChanged {
            from: self.phase,
            to: next,
        });
        self.phase = next;
    }

    fn require(&self, phase: Phase, command: &'static str) -> Result<(), GameError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(GameError::InvalidCommand {
                command,
                phase: self.phase,
            })
        }
    }

    fn invalid_bet(&self, amount: u32) -> GameError {
        GameError::InvalidBetAmount {
            amount,
            chips: self.player.chips(),
        }
    }

    fn bet_changed(&self) -> RoundEvent {
        RoundEvent::BetChanged {
            bet: self.player.bet(),
            chips: self.player.chips(),
        }
    }

    fn record(&mut self, events: Vec<RoundEvent>) -> Vec<RoundEvent> {
        self.round_log.extend(events.iter().cloned());
        events
    }

    fn persist_player(&mut self) {
        if let Err(err) = self.repository.save_player(&self.player.record()) {
            self.persistence_failures += 1;
            warn!(error = %err, "failed to save player progress");
        }
    }

    fn persist_achievements(&mut self) {
        if let Err(err) = self.repository.save_achievements(&self.achievements.record()) {
            self.persistence_failures += 1;
            warn!(error = %err, "failed to save achievements");
        }
    }
}

/// Gross return on a winning `bet`, in halves of the stake: 4 is even money,
/// 5 is 3:2. Bets are capped so the result fits in `u32`.
fn win_payout(bet: u32, halves: u64) -> u32 {
    u32::try_from(u64::from(bet) * halves / 2).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Card, Rank, Suit};
    use crate::store::{KvStatsRepository, MemoryStore};

    fn engine_with(ranks: &[Rank]) -> RoundEngine<KvStatsRepository<MemoryStore>> {
        let cards = ranks.iter().map(|&r| Card::new(Suit::Diamonds, r));
        RoundEngine::new(
            KvStatsRepository::new(MemoryStore::new()),
            Shoe::stacked(cards, 1),
        )
    }

    #[test]
    fn starts_in_betting_with_starting_chips() {
        let engine = engine_with(&[]);
        assert_eq!(engine.phase(), Phase::Betting);
        assert_eq!(engine.player().chips(), 1_000);
        assert_eq!(
            engine.available_actions(),
            vec![AvailableAction::Bet, AvailableAction::ClearBet]
        );
    }

    #[test]
    fn hole_card_event_is_face_down() {
        let mut engine = engine_with(&[Rank::Ten, Rank::Nine, Rank::Five, Rank::Seven]);
        engine.place_bet(10).unwrap();
        let events = engine.deal().unwrap();
        let dealt: Vec<_> = events.iter().filter_map(|e| e.dealt_card()).collect();
        assert_eq!(dealt.len(), 4);
        assert_eq!(dealt[1].0, Seat::Dealer);
        assert!(dealt[1].1.is_some());
        assert_eq!(dealt[3], (Seat::Dealer, None));
    }

    #[test]
    fn double_down_is_offered_only_with_two_cards() {
        let mut engine = engine_with(&[Rank::Five, Rank::Nine, Rank::Four, Rank::Eight, Rank::Two]);
        engine.place_bet(10).unwrap();
        engine.deal().unwrap();
        assert!(engine
            .available_actions()
            .contains(&AvailableAction::DoubleDown));
        engine.hit().unwrap();
        assert_eq!(
            engine.available_actions(),
            vec![AvailableAction::Hit, AvailableAction::Stand]
        );
    }

    #[test]
    fn round_events_cover_the_whole_round() {
        let mut engine = engine_with(&[Rank::Ten, Rank::Nine, Rank::Eight, Rank::Seven]);
        engine.place_bet(10).unwrap();
        engine.deal().unwrap();
        engine.stand().unwrap();
        let log = engine.round_events();
        assert!(matches!(log.first(), Some(RoundEvent::BetChanged { .. })));
        assert!(log
            .iter()
            .any(|e| matches!(e, RoundEvent::RoundSettled { .. })));

        engine.new_round().unwrap();
        assert_eq!(engine.round_events().len(), 2);
    }
}
