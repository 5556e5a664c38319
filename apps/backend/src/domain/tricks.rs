//! Trick winner resolution, including joker declarations.
//!
//! `resolve_trick` is pure and deterministic: the same table and trump
//! always yield the same winner.

use crate::domain::cards::{Card, JokerOption, Suit, TableCard};
use crate::domain::state::Seat;
use crate::errors::domain::DomainError;

/// The lead suit of a trick: the suit of a standard lead card, or the
/// requested suit attached to a leading High/Low joker.
pub fn lead_suit(table: &[TableCard]) -> Option<Suit> {
    table.first().and_then(TableCard::effective_suit)
}

/// Determine the winning seat of a completed trick.
///
/// Resolution order:
/// 1. the first Top joker played wins outright;
/// 2. a leading High joker whose requested suit is trump is the highest
///    trump and wins;
/// 3. the highest-ranked standard trump card wins if any trump was played;
/// 4. a leading High joker wins (no trump beat it);
/// 5. a leading Low joker loses to the highest standard card of its
///    requested suit, and wins only if no follower produced one;
/// 6. otherwise the highest standard card of the lead suit wins.
///
/// A Bottom joker never wins regardless of position.
pub fn resolve_trick(table: &[TableCard], trump: Option<Suit>) -> Result<Seat, DomainError> {
    let lead = table
        .first()
        .ok_or_else(|| DomainError::invariant("Cannot resolve an empty trick"))?;

    if let Some(top) = table
        .iter()
        .find(|tc| tc.card.is_joker() && tc.joker_option == Some(JokerOption::Top))
    {
        return Ok(top.seat);
    }

    let lead_is_joker = lead.card.is_joker();

    if let Some(trump_suit) = trump {
        if lead_is_joker
            && lead.joker_option == Some(JokerOption::High)
            && lead.requested_suit == Some(trump_suit)
        {
            return Ok(lead.seat);
        }
        if let Some(best) = highest_of_suit(table, trump_suit) {
            return Ok(best);
        }
    }

    match (lead_is_joker, lead.joker_option) {
        (true, Some(JokerOption::High)) => Ok(lead.seat),
        (true, Some(JokerOption::Low)) => {
            let requested = lead.requested_suit;
            let beaten = requested.and_then(|suit| highest_of_suit(&table[1..], suit));
            Ok(beaten.unwrap_or(lead.seat))
        }
        _ => {
            let suit = lead_suit(table)
                .ok_or_else(|| DomainError::invariant("Trick has no lead suit"))?;
            highest_of_suit(table, suit)
                .ok_or_else(|| DomainError::invariant("No card of the lead suit in trick"))
        }
    }
}

/// Seat of the highest-ranked standard card of `suit`, if any was played.
fn highest_of_suit(table: &[TableCard], suit: Suit) -> Option<Seat> {
    table
        .iter()
        .filter_map(|tc| match tc.card {
            Card::Standard { suit: s, rank } if s == suit => Some((rank, tc.seat)),
            _ => None,
        })
        .max_by_key(|(rank, _)| *rank)
        .map(|(_, seat)| seat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cards::Rank;

    fn play(seat: u8, card: Card) -> TableCard {
        TableCard {
            seat,
            card,
            joker_option: None,
            requested_suit: None,
            leader: 0,
        }
    }

    fn joker_play(seat: u8, option: JokerOption, requested: Option<Suit>) -> TableCard {
        TableCard {
            seat,
            card: Card::joker(1),
            joker_option: Some(option),
            requested_suit: requested,
            leader: 0,
        }
    }

    #[test]
    fn highest_of_lead_suit_wins_without_trump() {
        let table = [
            play(0, Card::standard(Suit::Hearts, Rank::Nine)),
            play(1, Card::standard(Suit::Hearts, Rank::King)),
            play(2, Card::standard(Suit::Spades, Rank::Ace)),
            play(3, Card::standard(Suit::Hearts, Rank::Six)),
        ];
        assert_eq!(resolve_trick(&table, None).unwrap(), 1);
    }

    #[test]
    fn trump_beats_the_lead_suit() {
        let table = [
            play(0, Card::standard(Suit::Hearts, Rank::Ace)),
            play(1, Card::standard(Suit::Clubs, Rank::Seven)),
            play(2, Card::standard(Suit::Hearts, Rank::King)),
            play(3, Card::standard(Suit::Clubs, Rank::Nine)),
        ];
        assert_eq!(resolve_trick(&table, Some(Suit::Clubs)).unwrap(), 3);
        assert_eq!(resolve_trick(&table, None).unwrap(), 0);
    }

    #[test]
    fn first_top_joker_beats_everything() {
        let mut second_joker = joker_play(3, JokerOption::Top, None);
        second_joker.card = Card::joker(2);
        let table = [
            play(0, Card::standard(Suit::Clubs, Rank::Ace)),
            joker_play(1, JokerOption::Top, None),
            play(2, Card::standard(Suit::Clubs, Rank::King)),
            second_joker,
        ];
        // Trump ace on the table, still the first Top joker wins.
        assert_eq!(resolve_trick(&table, Some(Suit::Clubs)).unwrap(), 1);
    }

    #[test]
    fn bottom_joker_never_wins() {
        let table = [
            play(0, Card::standard(Suit::Hearts, Rank::Six)),
            joker_play(1, JokerOption::Bottom, None),
            play(2, Card::standard(Suit::Hearts, Rank::Seven)),
            play(3, Card::standard(Suit::Diamonds, Rank::Ace)),
        ];
        assert_eq!(resolve_trick(&table, None).unwrap(), 2);
    }

    #[test]
    fn high_lead_joker_wins_trump_absent_trick() {
        let table = [
            joker_play(0, JokerOption::High, Some(Suit::Hearts)),
            play(1, Card::standard(Suit::Hearts, Rank::Ace)),
            play(2, Card::standard(Suit::Hearts, Rank::King)),
            play(3, Card::standard(Suit::Hearts, Rank::Queen)),
        ];
        assert_eq!(resolve_trick(&table, None).unwrap(), 0);
    }

    #[test]
    fn high_lead_joker_loses_to_offsuit_trump() {
        let table = [
            joker_play(0, JokerOption::High, Some(Suit::Hearts)),
            play(1, Card::standard(Suit::Hearts, Rank::Ace)),
            play(2, Card::standard(Suit::Spades, Rank::Six)),
            play(3, Card::standard(Suit::Hearts, Rank::Queen)),
        ];
        assert_eq!(resolve_trick(&table, Some(Suit::Spades)).unwrap(), 2);
    }

    #[test]
    fn high_lead_joker_requesting_trump_is_highest_trump() {
        let table = [
            joker_play(0, JokerOption::High, Some(Suit::Spades)),
            play(1, Card::standard(Suit::Spades, Rank::Ace)),
            play(2, Card::standard(Suit::Spades, Rank::King)),
            play(3, Card::standard(Suit::Spades, Rank::Queen)),
        ];
        assert_eq!(resolve_trick(&table, Some(Suit::Spades)).unwrap(), 0);
    }

    #[test]
    fn low_lead_joker_loses_to_any_card_of_requested_suit() {
        let table = [
            joker_play(0, JokerOption::Low, Some(Suit::Hearts)),
            play(1, Card::standard(Suit::Hearts, Rank::Six)),
            play(2, Card::standard(Suit::Diamonds, Rank::Ace)),
            play(3, Card::standard(Suit::Hearts, Rank::Nine)),
        ];
        assert_eq!(resolve_trick(&table, None).unwrap(), 3);
    }

    #[test]
    fn low_lead_joker_wins_when_everyone_is_void() {
        let table = [
            joker_play(0, JokerOption::Low, Some(Suit::Hearts)),
            play(1, Card::standard(Suit::Diamonds, Rank::Ace)),
            play(2, Card::standard(Suit::Clubs, Rank::Ace)),
            play(3, Card::standard(Suit::Diamonds, Rank::King)),
        ];
        assert_eq!(resolve_trick(&table, None).unwrap(), 0);
    }

    #[test]
    fn low_lead_joker_beats_a_bottom_follower() {
        let mut bottom = joker_play(2, JokerOption::Bottom, None);
        bottom.card = Card::joker(2);
        let table = [
            joker_play(0, JokerOption::Low, Some(Suit::Hearts)),
            play(1, Card::standard(Suit::Diamonds, Rank::Ace)),
            bottom,
            play(3, Card::standard(Suit::Clubs, Rank::King)),
        ];
        assert_eq!(resolve_trick(&table, None).unwrap(), 0);
    }

    #[test]
    fn resolution_is_deterministic() {
        let table = [
            play(0, Card::standard(Suit::Hearts, Rank::Nine)),
            joker_play(1, JokerOption::Top, None),
            play(2, Card::standard(Suit::Spades, Rank::Ace)),
            play(3, Card::standard(Suit::Hearts, Rank::King)),
        ];
        let first = resolve_trick(&table, Some(Suit::Spades)).unwrap();
        for _ in 0..10 {
            assert_eq!(resolve_trick(&table, Some(Suit::Spades)).unwrap(), first);
        }
    }

    #[test]
    fn empty_trick_is_an_invariant_violation() {
        assert!(resolve_trick(&[], None).unwrap_err().is_fatal());
    }
}
