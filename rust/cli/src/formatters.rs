//! Card, hand and result formatters for terminal display.
//!
//! Pure functions: they build strings and never write. Suits render as
//! Unicode symbols with an ASCII letter fallback for terminals that cannot
//! show them.
//!
//! ```rust
//! use blackjack_engine::cards::{Card, Rank, Suit};
//! use blackjack_cli::formatters::format_card;
//!
//! let ace = Card::new(Suit::Spades, Rank::Ace);
//! assert!(format_card(&ace) == "A♠" || format_card(&ace) == "As");
//! ```

use blackjack_engine::achievements::Achievement;
use blackjack_engine::cards::{Card, Suit};
use blackjack_engine::dealer::Dealer;
use blackjack_engine::events::RoundResult;
use blackjack_engine::hand::Hand;
use blackjack_engine::player::RoundOutcome;

/// Check if the terminal supports Unicode card symbols.
///
/// On Windows, checks for Windows Terminal (WT_SESSION), modern terminals
/// (TERM_PROGRAM) or VS Code (VSCODE_INJECTION). Elsewhere assumes yes.
pub fn supports_unicode() -> bool {
    if cfg!(windows) {
        std::env::var("WT_SESSION").is_ok()
            || std::env::var("TERM_PROGRAM").is_ok()
            || std::env::var("VSCODE_INJECTION").is_ok()
    } else {
        true
    }
}

pub fn format_suit(suit: Suit) -> String {
    if supports_unicode() {
        suit.symbol().to_string()
    } else {
        match suit {
            Suit::Hearts => "h",
            Suit::Diamonds => "d",
            Suit::Clubs => "c",
            Suit::Spades => "s",
        }
        .to_string()
    }
}

pub fn format_card(card: &Card) -> String {
    format!("{}{}", card.rank.label(), format_suit(card.suit))
}

/// `[A♠ 9♥] 20 (soft)`
pub fn format_hand(hand: &Hand) -> String {
    let cards: Vec<String> = hand.cards().iter().map(format_card).collect();
    let soft = if hand.is_soft() { " (soft)" } else { "" };
    format!("[{}] {}{}", cards.join(" "), hand.score(), soft)
}

/// Dealer hand as the player sees it: `[K♦ ??] 10+` while the hole card is
/// down, the full hand and score once it is turned.
pub fn format_dealer(dealer: &Dealer) -> String {
    let cards: Vec<String> = dealer
        .visible_cards()
        .iter()
        .map(|card| match card {
            Some(card) => format_card(card),
            None => "??".to_string(),
        })
        .collect();
    let score = match dealer.visible_score() {
        Some(score) if dealer.is_hole_hidden() && dealer.hand().len() >= 2 => {
            format!("{}+", score)
        }
        Some(score) => score.to_string(),
        None => "-".to_string(),
    };
    format!("[{}] {}", cards.join(" "), score)
}

pub fn format_outcome(outcome: RoundOutcome) -> &'static str {
    match outcome {
        RoundOutcome::Win => "WIN",
        RoundOutcome::Lose => "LOSE",
        RoundOutcome::Tie => "PUSH",
    }
}

/// `WIN: Blackjack! You win! (payout 250)`
pub fn format_result(result: &RoundResult) -> String {
    let mut line = format!("{}: {}", format_outcome(result.outcome), result.message);
    if result.payout > 0 {
        line.push_str(&format!(" (payout {})", result.payout));
    }
    line
}

/// `[x] 🎉 First Victory - Win your first hand`
pub fn format_achievement(achievement: &Achievement) -> String {
    let mark = if achievement.unlocked { "x" } else { " " };
    format!(
        "[{}] {} - {}",
        mark, achievement.title, achievement.description
    )
}

/// Signed streak as `W3`, `L2`, or `-` when even.
pub fn format_streak(streak: i32) -> String {
    match streak {
        0 => "-".to_string(),
        s if s > 0 => format!("W{}", s),
        s => format!("L{}", s.unsigned_abs()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blackjack_engine::cards::Rank;

    fn card(rank: Rank, suit: Suit) -> Card {
        Card::new(suit, rank)
    }

    #[test]
    fn hand_shows_cards_score_and_softness() {
        let hand = Hand::from_cards([card(Rank::Ace, Suit::Spades), card(Rank::Nine, Suit::Hearts)]);
        let text = format_hand(&hand);
        assert!(text.starts_with("[A"));
        assert!(text.ends_with("] 20 (soft)"), "got {}", text);
    }

    #[test]
    fn ten_uses_two_digit_label() {
        let text = format_card(&card(Rank::Ten, Suit::Clubs));
        assert!(text.starts_with("10"));
    }

    #[test]
    fn dealer_hides_hole_card_and_shows_up_card_value() {
        let mut dealer = Dealer::new();
        dealer.take(card(Rank::King, Suit::Diamonds));
        dealer.take(card(Rank::Seven, Suit::Clubs));
        let text = format_dealer(&dealer);
        assert!(text.contains("??"), "got {}", text);
        assert!(text.ends_with("10+"), "got {}", text);

        dealer.reveal_hole();
        let text = format_dealer(&dealer);
        assert!(!text.contains("??"));
        assert!(text.ends_with(" 17"), "got {}", text);
    }

    #[test]
    fn streaks_are_signed() {
        assert_eq!(format_streak(3), "W3");
        assert_eq!(format_streak(-2), "L2");
        assert_eq!(format_streak(0), "-");
    }

    #[test]
    fn losing_result_omits_payout() {
        let result = RoundResult {
            outcome: RoundOutcome::Lose,
            message: "Bust! You went over 21!".into(),
            payout: 0,
            bet: 50,
            player_score: 24,
            dealer_score: 10,
            unlocked: Vec::new(),
        };
        assert_eq!(format_result(&result), "LOSE: Bust! You went over 21!");
    }
}
