//! Deterministic deck construction, shuffling, and dealing.
//!
//! All randomness flows from a per-game seed so every deal is reproducible
//! from the recorded seed and deal counter.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::domain::cards::{Card, Rank, Suit};
use crate::domain::rules::PLAYERS;
use crate::errors::domain::{DomainError, ValidationKind};

/// The 36-card Joker deck: Six..=Ace in all four suits, minus the two
/// black sixes, plus two jokers. A 9-card round consumes the whole deck.
pub fn full_deck() -> Vec<Card> {
    let ranks = [
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    let mut deck = Vec::with_capacity(36);
    for suit in Suit::ALL {
        for rank in ranks {
            if rank == Rank::Six && (suit == Suit::Clubs || suit == Suit::Spades) {
                continue;
            }
            deck.push(Card::standard(suit, rank));
        }
    }
    deck.push(Card::joker(1));
    deck.push(Card::joker(2));
    deck
}

/// Derive the seed for a particular shuffle from the game seed and a
/// monotonically increasing deal counter (SplitMix64 finalizer).
pub fn deal_seed(game_seed: u64, deal_no: u32) -> u64 {
    let mut z = game_seed.wrapping_add((deal_no as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z ^= z >> 30;
    z = z.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z ^= z >> 27;
    z = z.wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

pub fn shuffled_deck(seed: u64) -> Vec<Card> {
    let mut deck = full_deck();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    deck.shuffle(&mut rng);
    deck
}

/// Deal `cards_per_player` to each of the 4 seats, one card at a time in
/// rotation. Returns the hands and the undealt remainder (the first card of
/// which is the trump upcard in rounds that have one).
pub fn deal(
    seed: u64,
    cards_per_player: u8,
) -> Result<([Vec<Card>; PLAYERS], Vec<Card>), DomainError> {
    if !(1..=9).contains(&cards_per_player) {
        return Err(DomainError::validation(
            ValidationKind::InvalidRound,
            "Cards per player must be 1..=9",
        ));
    }

    let mut deck = shuffled_deck(seed);
    let mut hands: [Vec<Card>; PLAYERS] = Default::default();
    for _ in 0..cards_per_player {
        for hand in hands.iter_mut() {
            // Deck arithmetic guarantees 4 * 9 = 36 cards at most.
            hand.push(deck.remove(0));
        }
    }
    for hand in hands.iter_mut() {
        hand.sort();
    }
    Ok((hands, deck))
}

/// One card of the tuzovanie deal sequence, for client animation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TuzovanieDeal {
    pub seat: u8,
    pub card: Card,
    pub deal_index: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tuzovanie {
    pub dealer: u8,
    pub sequence: Vec<TuzovanieDeal>,
}

/// Deal one card per seat in rotation until an Ace appears; that seat is
/// the first dealer. Cannot deadlock: the deck is finite and holds 4 aces.
pub fn tuzovanie(seed: u64) -> Tuzovanie {
    let deck = shuffled_deck(seed);
    let mut sequence = Vec::new();
    let mut seat: u8 = 0;

    for (idx, card) in deck.into_iter().enumerate() {
        sequence.push(TuzovanieDeal {
            seat,
            card,
            deal_index: idx as u16,
        });
        if card.rank() == Some(Rank::Ace) {
            return Tuzovanie {
                dealer: seat,
                sequence,
            };
        }
        seat = (seat + 1) % PLAYERS as u8;
    }

    // Unreachable with 4 aces in the deck; keep the protocol total anyway.
    Tuzovanie {
        dealer: 0,
        sequence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn deck_has_36_unique_cards() {
        let deck = full_deck();
        assert_eq!(deck.len(), 36);
        let ids: HashSet<String> = deck.iter().map(|c| c.id()).collect();
        assert_eq!(ids.len(), 36);
        assert!(!ids.contains("clubs-6"));
        assert!(!ids.contains("spades-6"));
        assert!(ids.contains("hearts-6"));
        assert!(ids.contains("joker-1"));
        assert!(ids.contains("joker-2"));
    }

    #[test]
    fn deal_is_deterministic() {
        let a = deal(12345, 5).unwrap();
        let b = deal(12345, 5).unwrap();
        assert_eq!(a, b);
        let c = deal(54321, 5).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn deal_conserves_cards() {
        for cards in 1..=9u8 {
            let (hands, rest) = deal(42, cards).unwrap();
            let dealt: usize = hands.iter().map(|h| h.len()).sum();
            assert_eq!(dealt, 4 * cards as usize);
            assert_eq!(dealt + rest.len(), 36);

            let mut ids = HashSet::new();
            for card in hands.iter().flatten().chain(rest.iter()) {
                assert!(ids.insert(card.id()), "duplicate card in deal");
            }
        }
    }

    #[test]
    fn deal_rejects_bad_hand_size() {
        assert!(deal(1, 0).is_err());
        assert!(deal(1, 10).is_err());
    }

    #[test]
    fn nine_card_deal_consumes_the_deck() {
        let (_, rest) = deal(7, 9).unwrap();
        assert!(rest.is_empty());
    }

    #[test]
    fn tuzovanie_stops_at_first_ace() {
        for seed in 0..32u64 {
            let result = tuzovanie(seed);
            let last = result.sequence.last().unwrap();
            assert_eq!(last.card.rank(), Some(Rank::Ace));
            assert_eq!(last.seat, result.dealer);
            for dealt in &result.sequence[..result.sequence.len() - 1] {
                assert_ne!(dealt.card.rank(), Some(Rank::Ace));
            }
            // Rotation order 0,1,2,3,0,...
            for (i, dealt) in result.sequence.iter().enumerate() {
                assert_eq!(dealt.seat as usize, i % 4);
                assert_eq!(dealt.deal_index as usize, i);
            }
        }
    }

    #[test]
    fn deal_seed_spreads_counters() {
        let a = deal_seed(99, 0);
        let b = deal_seed(99, 1);
        let c = deal_seed(100, 0);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
