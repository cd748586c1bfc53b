use crate::cards::Card;
use crate::hand::Hand;

/// Dealer draws while below this score and stands on anything at or above it.
pub const DEALER_STANDS_ON: u8 = 17;

/// The house hand with its fixed hit/stand policy.
///
/// The second card dealt is the hole card. Whether it is still face down only
/// changes what [`Dealer::visible_cards`] and [`Dealer::visible_score`] report;
/// scoring always uses every card.
#[derive(Debug, Clone)]
pub struct Dealer {
    hand: Hand,
    hole_hidden: bool,
}

impl Default for Dealer {
    fn default() -> Self {
        Self::new()
    }
}

impl Dealer {
    pub fn new() -> Self {
        Self {
            hand: Hand::new(),
            hole_hidden: true,
        }
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    pub fn take(&mut self, card: Card) {
        self.hand.add(card);
    }

    pub fn score(&self) -> u8 {
        self.hand.score()
    }

    pub fn should_draw(&self) -> bool {
        self.hand.score() < DEALER_STANDS_ON
    }

    pub fn up_card(&self) -> Option<Card> {
        self.hand.cards().first().copied()
    }

    pub fn is_hole_hidden(&self) -> bool {
        self.hole_hidden
    }

    /// Turns the hole card face up. Returns it if one has been dealt.
    pub fn reveal_hole(&mut self) -> Option<Card> {
        self.hole_hidden = false;
        self.hand.cards().get(1).copied()
    }

    /// Cards as the player sees them; the hole card is `None` while face down.
    pub fn visible_cards(&self) -> Vec<Option<Card>> {
        self.hand
            .cards()
            .iter()
            .enumerate()
            .map(|(idx, card)| {
                if idx == 1 && self.hole_hidden {
                    None
                } else {
                    Some(*card)
                }
            })
            .collect()
    }

    /// Up-card value while the hole card is hidden, full score afterwards.
    pub fn visible_score(&self) -> Option<u8> {
        if self.hand.is_empty() {
            None
        } else if self.hole_hidden {
            self.up_card().map(|c| c.points())
        } else {
            Some(self.hand.score())
        }
    }

    pub fn reset(&mut self) {
        self.hand.reset();
        self.hole_hidden = true;
    }
}
