use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::cards::{full_deck, Card};

/// The pool of undealt cards for the current reshuffle cycle.
///
/// The top of the shoe is the end of `cards`, so dealing is a `pop`. An empty
/// shoe reloads a fresh 52-card set and shuffles it before the next card is
/// dealt, which means [`Shoe::draw`] never fails.
#[derive(Debug, Clone)]
pub struct Shoe {
    cards: Vec<Card>,
    rng: ChaCha20Rng,
    reshuffles: u32,
}

impl Shoe {
    /// Fresh, shuffled shoe seeded from entropy.
    pub fn new() -> Self {
        Self::new_with_seed(rand::random())
    }

    /// Fresh, shuffled shoe. The same seed always yields the same deal order.
    pub fn new_with_seed(seed: u64) -> Self {
        let mut shoe = Self {
            cards: Vec::with_capacity(52),
            rng: ChaCha20Rng::seed_from_u64(seed),
            reshuffles: 0,
        };
        shoe.reload();
        shoe
    }

    /// Shoe that deals `cards` in the given order, first element first.
    ///
    /// Once the stacked cards run out the shoe behaves like any other and
    /// reloads a full deck shuffled with `seed`.
    pub fn stacked(cards: impl IntoIterator<Item = Card>, seed: u64) -> Self {
        let mut cards: Vec<Card> = cards.into_iter().collect();
        cards.reverse();
        Self {
            cards,
            rng: ChaCha20Rng::seed_from_u64(seed),
            reshuffles: 0,
        }
    }

    pub fn draw(&mut self) -> Card {
        loop {
            if let Some(card) = self.cards.pop() {
                return card;
            }
            self.reload();
            self.reshuffles += 1;
            tracing::debug!(reshuffles = self.reshuffles, "shoe exhausted, reshuffled");
        }
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    /// Number of times the shoe has been reloaded after running dry.
    pub fn reshuffles(&self) -> u32 {
        self.reshuffles
    }

    fn reload(&mut self) {
        self.cards = full_deck();
        // Fisher-Yates: walk down from the last index, swapping with [0, i].
        for i in (1..self.cards.len()).rev() {
            let j = self.rng.random_range(0..=i);
            self.cards.swap(i, j);
        }
    }
}

impl Default for Shoe {
    fn default() -> Self {
        Self::new()
    }
}
