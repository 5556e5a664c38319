//! Conservative bot policy, shared by timeout auto-actions and bot seats.
//!
//! Every choice is deterministic given the state, which makes timeout
//! behavior reproducible in tests: the smallest legal bet, the first legal
//! card, the longest visible suit as trump.

use crate::domain::cards::{Card, JokerOption, Suit, TrumpDecision};
use crate::domain::moves;
use crate::domain::rules;
use crate::domain::state::{GameState, Seat};
use crate::domain::Trump;

/// A fully specified card play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotPlay {
    pub card: Card,
    pub joker_option: Option<JokerOption>,
    pub requested_suit: Option<Suit>,
}

/// The smallest bet the seat may legally submit right now.
pub fn conservative_bet(state: &GameState, seat: Seat) -> u8 {
    let bets = std::array::from_fn(|i| state.players[i].bet);
    rules::legal_bets(&bets, state.cards_per_player, seat, state.dealer)
        .first()
        .copied()
        .unwrap_or(0)
}

/// The first card the validator reports legal, with a joker declared as
/// weakly as possible: Low when leading, Bottom when following.
pub fn conservative_play(state: &GameState, seat: Seat) -> Option<BotPlay> {
    let hand = &state.players[seat as usize].hand;
    let trump_suit = state.trump.and_then(Trump::suit);
    let legal = moves::legal_plays(hand, &state.table, trump_suit);
    let card = *legal.first()?;

    if !card.is_joker() {
        return Some(BotPlay {
            card,
            joker_option: None,
            requested_suit: None,
        });
    }

    if state.table.is_empty() {
        // A lead joker needs a requested suit; name the first suit held,
        // or clubs from an all-joker hand.
        let requested = hand
            .iter()
            .find_map(|c| c.suit())
            .unwrap_or(Suit::Clubs);
        Some(BotPlay {
            card,
            joker_option: Some(JokerOption::Low),
            requested_suit: Some(requested),
        })
    } else {
        Some(BotPlay {
            card,
            joker_option: Some(JokerOption::Bottom),
            requested_suit: None,
        })
    }
}

/// Trump decision from the chooser's partial hand: the longest suit held,
/// ties broken in suit order; no-trump when no standard card is visible.
/// Never redeals, so auto-selection stays bounded.
pub fn conservative_trump(state: &GameState, seat: Seat) -> TrumpDecision {
    let hand = &state.players[seat as usize].hand;
    let mut counts = [0usize; 4];
    for card in hand {
        if let Some(suit) = card.suit() {
            let idx = Suit::ALL.iter().position(|&s| s == suit).unwrap_or(0);
            counts[idx] += 1;
        }
    }

    let best = (0..4).max_by_key(|&i| counts[i]).unwrap_or(0);
    if counts[best] == 0 {
        TrumpDecision::NoTrump
    } else {
        TrumpDecision::Suit {
            suit: Suit::ALL[best],
        }
    }
}
