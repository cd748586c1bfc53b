#![allow(dead_code)]

use blackjack_engine::cards::{Card, Rank, Suit};
use blackjack_engine::engine::RoundEngine;
use blackjack_engine::shoe::Shoe;
use blackjack_engine::store::{KvStatsRepository, MemoryStore};

pub type MemEngine = RoundEngine<KvStatsRepository<MemoryStore>>;

/// Cards in deal order: player, dealer up, player, dealer hole, then draws.
pub fn cards(ranks: &[Rank]) -> Vec<Card> {
    const SUITS: [Suit; 4] = [Suit::Hearts, Suit::Spades, Suit::Diamonds, Suit::Clubs];
    ranks
        .iter()
        .enumerate()
        .map(|(i, &r)| Card::new(SUITS[i % 4], r))
        .collect()
}

pub fn engine_with(ranks: &[Rank]) -> MemEngine {
    engine_on(MemoryStore::new(), ranks)
}

pub fn engine_on(store: MemoryStore, ranks: &[Rank]) -> MemEngine {
    RoundEngine::new(KvStatsRepository::new(store), Shoe::stacked(cards(ranks), 99))
}

// Common stacked rounds. Each one consumes exactly the listed cards.
pub const NATURAL_WIN: [Rank; 4] = [Rank::Ace, Rank::Nine, Rank::King, Rank::Seven];
pub const STAND_18_LOSES_TO_20: [Rank; 5] = [Rank::Ten, Rank::Six, Rank::Eight, Rank::Ten, Rank::Four];
pub const PUSH_20: [Rank; 4] = [Rank::Ten, Rank::Ten, Rank::Queen, Rank::King];

/// Bets, deals, and stands if the deal didn't already settle the round.
pub fn play_round(engine: &mut MemEngine, bet: u32) {
    engine.place_bet(bet).expect("bet accepted");
    engine.deal().expect("deal accepted");
    if engine.phase() == blackjack_engine::Phase::Playing {
        engine.stand().expect("stand accepted");
    }
}
