use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of the round state machine.
///
/// `Betting → Dealing → Playing → DealerTurn → GameOver → Betting`, with
/// shortcuts from `Dealing` and `Playing` straight to `GameOver` when a
/// natural or a bust settles the round early.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Betting,
    Dealing,
    Playing,
    DealerTurn,
    GameOver,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Betting => "betting",
            Phase::Dealing => "dealing",
            Phase::Playing => "playing",
            Phase::DealerTurn => "dealer_turn",
            Phase::GameOver => "game_over",
        }
    }

    /// Whether the state machine has an edge from `self` to `next`.
    pub fn can_transition_to(self, next: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, next),
            (Betting, Dealing)
                | (Dealing, Playing)
                | (Dealing, GameOver)
                | (Playing, DealerTurn)
                | (Playing, GameOver)
                | (DealerTurn, GameOver)
                | (GameOver, Betting)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A command a front-end may currently offer the player.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailableAction {
    Bet,
    ClearBet,
    Deal,
    Hit,
    Stand,
    DoubleDown,
    NewRound,
}
