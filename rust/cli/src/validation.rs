//! Parsing of what the player types at the table.
//!
//! Both prompts answer with a [`ParseResult`]: a value, a request to quit,
//! or a message explaining what was wrong with the input.

use blackjack_engine::engine::Command;

#[derive(Debug, PartialEq)]
pub enum ParseResult<T> {
    /// Valid input
    Value(T),
    /// User entered quit command (q or quit)
    Quit,
    /// Invalid input with error message
    Invalid(String),
}

fn is_quit(input: &str) -> bool {
    input == "q" || input == "quit"
}

/// Parse a wager typed at the betting prompt.
///
/// The amount is only checked for being a positive integer; whether the
/// player can cover it is the table's call.
///
/// ```rust
/// # use blackjack_cli::validation::{parse_bet_input, ParseResult};
/// assert_eq!(parse_bet_input("50"), ParseResult::Value(50));
/// assert_eq!(parse_bet_input("$25"), ParseResult::Value(25));
/// assert_eq!(parse_bet_input("Q"), ParseResult::Quit);
/// assert!(matches!(parse_bet_input("lots"), ParseResult::Invalid(_)));
/// ```
pub fn parse_bet_input(input: &str) -> ParseResult<u32> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return ParseResult::Invalid("Empty input".to_string());
    }
    if is_quit(&input) {
        return ParseResult::Quit;
    }

    let digits = input.strip_prefix('$').unwrap_or(&input);
    match digits.parse::<u32>() {
        Ok(0) => ParseResult::Invalid("Bet amount must be positive".to_string()),
        Ok(amount) => ParseResult::Value(amount),
        Err(_) => ParseResult::Invalid(format!(
            "Invalid bet amount '{}'. Enter a whole number of chips or q",
            input
        )),
    }
}

/// Parse a playing decision: h/hit, s/stand, d/double, or q/quit.
///
/// ```rust
/// # use blackjack_cli::validation::{parse_round_action, ParseResult};
/// use blackjack_engine::engine::Command;
///
/// assert_eq!(parse_round_action("h"), ParseResult::Value(Command::Hit));
/// assert_eq!(parse_round_action("double"), ParseResult::Value(Command::DoubleDown));
/// assert_eq!(parse_round_action("quit"), ParseResult::Quit);
/// ```
pub fn parse_round_action(input: &str) -> ParseResult<Command> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return ParseResult::Invalid("Empty input".to_string());
    }
    if is_quit(&input) {
        return ParseResult::Quit;
    }

    match input.as_str() {
        "h" | "hit" => ParseResult::Value(Command::Hit),
        "s" | "stand" => ParseResult::Value(Command::Stand),
        "d" | "double" | "double down" => ParseResult::Value(Command::DoubleDown),
        other => ParseResult::Invalid(format!(
            "Unrecognized action '{}'. Valid actions: h, s, d, q",
            other
        )),
    }
}
