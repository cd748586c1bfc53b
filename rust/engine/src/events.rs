use serde::{Deserialize, Serialize};

use crate::achievements::Achievement;
use crate::cards::Card;
use crate::game::Phase;
use crate::player::RoundOutcome;

/// Which side of the table a card went to.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seat {
    Player,
    Dealer,
}

/// Final word on a round, handed to the front-end for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub outcome: RoundOutcome,
    pub message: String,
    /// Chips credited back to the player at settlement (0 on a loss)
    pub payout: u32,
    /// Bet at settlement, doubled if the player doubled down
    pub bet: u32,
    pub player_score: u8,
    pub dealer_score: u8,
    /// Achievements this settlement unlocked, in catalog order
    pub unlocked: Vec<Achievement>,
}

/// Discrete things that happened at the table, in the order they happened.
///
/// Commands return the events they produced; the engine also keeps the events
/// of the current round so a renderer can replay them with its own pacing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoundEvent {
    PhaseChanged {
        from: Phase,
        to: Phase,
    },
    BetChanged {
        bet: u32,
        chips: u32,
    },
    CardDealt {
        seat: Seat,
        /// `None` for the dealer's face-down hole card
        card: Option<Card>,
        /// Score the seat now shows (dealer: up-card value while the hole is hidden)
        visible_score: Option<u8>,
    },
    HoleCardRevealed {
        card: Card,
        dealer_score: u8,
    },
    DoubledDown {
        bet: u32,
        chips: u32,
    },
    RoundSettled {
        result: RoundResult,
    },
    AchievementUnlocked {
        achievement: Achievement,
    },
    ChipsGranted {
        amount: u32,
        chips: u32,
    },
    ProgressReset {
        chips: u32,
    },
}

impl RoundEvent {
    /// Cards dealt in this event, if any, as the player is allowed to see them.
    pub fn dealt_card(&self) -> Option<(Seat, Option<Card>)> {
        match self {
            RoundEvent::CardDealt { seat, card, .. } => Some((*seat, *card)),
            _ => None,
        }
    }
}
