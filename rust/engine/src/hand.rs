use serde::{Deserialize, Serialize};

use crate::cards::Card;

/// Highest score a hand can hold without busting.
pub const BLACKJACK: u8 = 21;

/// A blackjack hand with soft/hard Ace scoring.
///
/// The score is recomputed from scratch on every [`Hand::add`]: every Ace
/// first counts as 11, then Aces are demoted to 1 (subtracting 10 each) while
/// the total is over 21 and an 11-valued Ace remains.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    cards: Vec<Card>,
    score: u8,
    soft_aces: u8,
}

impl Hand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        let mut hand = Self::new();
        for card in cards {
            hand.add(card);
        }
        hand
    }

    pub fn add(&mut self, card: Card) {
        self.cards.push(card);
        self.recompute();
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn is_bust(&self) -> bool {
        self.score > BLACKJACK
    }

    /// Two-card 21.
    pub fn is_natural(&self) -> bool {
        self.cards.len() == 2 && self.score == BLACKJACK
    }

    /// At least one Ace is still counted as 11.
    pub fn is_soft(&self) -> bool {
        self.soft_aces > 0
    }

    /// Two cards of equal rank. Splitting is not offered at the table.
    pub fn can_split(&self) -> bool {
        self.cards.len() == 2 && self.cards[0].rank == self.cards[1].rank
    }

    pub fn reset(&mut self) {
        self.cards.clear();
        self.score = 0;
        self.soft_aces = 0;
    }

    fn recompute(&mut self) {
        let mut score: u32 = 0;
        let mut soft_aces: u8 = 0;
        for card in &self.cards {
            if card.rank.is_ace() {
                soft_aces += 1;
            }
            score += u32::from(card.points());
        }
        while score > u32::from(BLACKJACK) && soft_aces > 0 {
            score -= 10;
            soft_aces -= 1;
        }
        // A hand holds at most a few dozen cards; the cap only guards the cast.
        self.score = score.min(u32::from(u8::MAX)) as u8;
        self.soft_aces = soft_aces;
    }
}
