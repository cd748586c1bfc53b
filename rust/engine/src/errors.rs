use thiserror::Error;

use crate::game::Phase;

/// Rejections for table commands. Every variant is a recoverable user error:
/// the engine state is left exactly as it was before the command.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid bet amount: {amount} (available chips: {chips})")]
    InvalidBetAmount { amount: u32, chips: u32 },
    #[error("Please place a bet first")]
    NoBetPlaced,
    #[error("Insufficient chips: bet {bet}, available {chips}")]
    InsufficientChips { bet: u32, chips: u32 },
    #[error("`{command}` is not available while {phase}")]
    InvalidCommand { command: &'static str, phase: Phase },
    #[error("Double down needs exactly two cards and chips to cover the bet")]
    CannotDoubleDown,
    #[error("You're out of chips! Game over.")]
    OutOfChips,
    #[error("Chip grant must be a positive amount")]
    InvalidGrant,
    #[error("Chip grant of {amount} would exceed the table limit (current chips: {chips})")]
    ChipLimit { amount: u32, chips: u32 },
}
