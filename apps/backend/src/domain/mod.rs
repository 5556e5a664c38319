//! Pure game logic: no IO, no clock, no ambient randomness.
//!
//! The engine mutates a room's [`state::GameState`] in response to already
//! validated intents; everything else here is value types and pure helper
//! functions safe to call from any thread.

pub mod cards;
pub mod deck;
pub mod engine;
pub mod moves;
pub mod rules;
pub mod scoring;
pub mod snapshot;
pub mod state;
pub mod tricks;

pub use cards::{Card, JokerOption, Rank, Suit, TableCard, Trump, TrumpDecision};
pub use state::{GameState, Phase, Player, Seat};
