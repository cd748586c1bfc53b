//! # blackjack-engine: Single-Seat Blackjack Core
//!
//! A deterministic blackjack round engine for one player against the house.
//! Owns the shoe, hand scoring, the round state machine, lifetime statistics
//! and achievements, and persists progress through a pluggable repository.
//!
//! ## Core Modules
//!
//! - [`cards`] - Card representation (Suit, Rank, Card) and deck construction
//! - [`shoe`] - Seeded single-deck shoe that reshuffles itself when empty
//! - [`hand`] - Blackjack hand scoring with soft/hard aces
//! - [`player`] - Chips, bets and lifetime statistics
//! - [`dealer`] - House hand and its draw-to-17 policy
//! - [`game`] - Round phases and the actions each phase offers
//! - [`engine`] - Round orchestration: commands, settlement, persistence
//! - [`events`] - What happened at the table, for renderers
//! - [`achievements`] - Milestone catalog and unlock tracking
//! - [`store`] - Storage contracts and the key-value repository
//! - [`errors`] - Error types for rejected commands
//!
//! ## Quick Start
//!
//! ```rust
//! use blackjack_engine::cards::{Card, Rank, Suit};
//! use blackjack_engine::hand::Hand;
//!
//! let hand = Hand::from_cards([
//!     Card::new(Suit::Hearts, Rank::Ace),
//!     Card::new(Suit::Spades, Rank::Ace),
//!     Card::new(Suit::Clubs, Rank::Nine),
//! ]);
//! assert_eq!(hand.score(), 21);
//! assert!(!hand.is_natural());
//! ```
//!
//! ## Deterministic Play
//!
//! Shoes built from the same seed deal the same cards:
//!
//! ```rust
//! use blackjack_engine::shoe::Shoe;
//!
//! let mut a = Shoe::new_with_seed(7);
//! let mut b = Shoe::new_with_seed(7);
//! let first: Vec<_> = (0..5).map(|_| a.draw()).collect();
//! let second: Vec<_> = (0..5).map(|_| b.draw()).collect();
//! assert_eq!(first, second);
//! ```
//!
//! ## Playing a Round
//!
//! ```rust
//! use blackjack_engine::engine::{Command, RoundEngine};
//! use blackjack_engine::game::Phase;
//! use blackjack_engine::shoe::Shoe;
//! use blackjack_engine::store::{KvStatsRepository, MemoryStore};
//!
//! let mut engine = RoundEngine::new(
//!     KvStatsRepository::new(MemoryStore::new()),
//!     Shoe::new_with_seed(3),
//! );
//! engine.apply(Command::Bet { amount: 100 }).unwrap();
//! engine.apply(Command::Deal).unwrap();
//! if engine.phase() == Phase::Playing {
//!     engine.apply(Command::Stand).unwrap();
//! }
//! assert_eq!(engine.phase(), Phase::GameOver);
//! assert_eq!(engine.stats().games_played, 1);
//! ```

pub mod achievements;
pub mod cards;
pub mod dealer;
pub mod engine;
pub mod errors;
pub mod events;
pub mod game;
pub mod hand;
pub mod player;
pub mod shoe;
pub mod store;

pub use engine::{Command, RoundEngine};
pub use errors::GameError;
pub use events::{RoundEvent, RoundResult};
pub use game::Phase;
