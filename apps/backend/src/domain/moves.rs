//! Move validation: suit-following, trump-forcing, joker options.
//!
//! Pure functions over (hand, card, table, trump). A rejected play carries
//! the suit the player was required to produce so the client can render
//! "must follow suit: Hearts" inline.

use crate::domain::cards::{Card, JokerOption, Suit, TableCard};
use crate::errors::domain::{DomainError, ValidationKind};

pub fn hand_has_suit(hand: &[Card], suit: Suit) -> bool {
    hand.iter().any(|c| c.suit() == Some(suit))
}

/// The suit followers must produce this trick, if any.
///
/// A leading High/Low joker imposes its requested suit; a standard lead
/// imposes its own suit.
pub fn required_suit(table: &[TableCard]) -> Option<Suit> {
    table.first().and_then(TableCard::effective_suit)
}

/// Check whether `card` may be played from `hand` onto `table`.
///
/// Rules, in order: leading allows anything; a joker is always playable;
/// following requires the lead suit if held, else trump if held, else
/// anything goes.
pub fn validate_play(
    hand: &[Card],
    card: Card,
    table: &[TableCard],
    trump: Option<Suit>,
) -> Result<(), DomainError> {
    if !hand.contains(&card) {
        return Err(DomainError::validation(
            ValidationKind::CardNotInHand,
            "Card not in hand",
        ));
    }

    if card.is_joker() || table.is_empty() {
        return Ok(());
    }

    let Some(lead) = required_suit(table) else {
        // A trick led by a joker without a requested suit cannot happen;
        // be permissive rather than reject a legal card.
        return Ok(());
    };

    if card.suit() == Some(lead) {
        return Ok(());
    }
    if hand_has_suit(hand, lead) {
        return Err(DomainError::validation(
            ValidationKind::MustFollowSuit(lead),
            format!("Must follow suit: {}", lead.key()),
        ));
    }

    if let Some(trump_suit) = trump {
        if card.suit() == Some(trump_suit) {
            return Ok(());
        }
        if hand_has_suit(hand, trump_suit) {
            return Err(DomainError::validation(
                ValidationKind::MustPlayTrump(trump_suit),
                format!("Out of lead suit: must play trump {}", trump_suit.key()),
            ));
        }
    }

    Ok(())
}

/// Check the declaration attached to a joker play.
///
/// High/Low are lead-only and require a requested suit; Top/Bottom are
/// follow-only. The option is chosen at play time, never before.
pub fn validate_joker_option(
    table: &[TableCard],
    option: JokerOption,
    requested_suit: Option<Suit>,
) -> Result<(), DomainError> {
    if table.is_empty() {
        if !option.is_lead_option() {
            return Err(DomainError::validation(
                ValidationKind::IllegalJokerOption,
                "A leading joker must declare high or low",
            ));
        }
        if requested_suit.is_none() {
            return Err(DomainError::validation(
                ValidationKind::IllegalJokerOption,
                "A leading joker must name a requested suit",
            ));
        }
    } else if !option.is_follow_option() {
        return Err(DomainError::validation(
            ValidationKind::IllegalJokerOption,
            "A following joker must declare top or bottom",
        ));
    }
    Ok(())
}

/// All cards in `hand` that `validate_play` would accept, sorted.
pub fn legal_plays(hand: &[Card], table: &[TableCard], trump: Option<Suit>) -> Vec<Card> {
    let mut legal: Vec<Card> = hand
        .iter()
        .copied()
        .filter(|&c| validate_play(hand, c, table, trump).is_ok())
        .collect();
    legal.sort();
    legal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cards::Rank;

    fn std_card(suit: Suit, rank: Rank) -> Card {
        Card::standard(suit, rank)
    }

    fn on_table(seat: u8, card: Card) -> TableCard {
        TableCard {
            seat,
            card,
            joker_option: None,
            requested_suit: None,
            leader: 0,
        }
    }

    #[test]
    fn leading_allows_any_card() {
        let hand = vec![
            std_card(Suit::Hearts, Rank::Seven),
            std_card(Suit::Spades, Rank::Ace),
            Card::joker(1),
        ];
        for &card in &hand {
            assert!(validate_play(&hand, card, &[], Some(Suit::Clubs)).is_ok());
        }
    }

    #[test]
    fn card_must_be_in_hand() {
        let hand = vec![std_card(Suit::Hearts, Rank::Seven)];
        let err = validate_play(&hand, std_card(Suit::Spades, Rank::Ace), &[], None).unwrap_err();
        assert_eq!(err.code(), "CARD_NOT_IN_HAND");
    }

    #[test]
    fn must_follow_lead_suit_when_held() {
        let hand = vec![
            std_card(Suit::Hearts, Rank::Seven),
            std_card(Suit::Spades, Rank::Ace),
        ];
        let table = [on_table(0, std_card(Suit::Hearts, Rank::King))];

        assert!(validate_play(&hand, hand[0], &table, None).is_ok());
        let err = validate_play(&hand, hand[1], &table, None).unwrap_err();
        assert_eq!(err.code(), "MUST_FOLLOW_SUIT");
        match err {
            DomainError::Validation(kind, _) => {
                assert_eq!(kind.required_suit(), Some(Suit::Hearts));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn void_in_lead_suit_forces_trump() {
        let hand = vec![
            std_card(Suit::Diamonds, Rank::Seven),
            std_card(Suit::Spades, Rank::Ace),
        ];
        let table = [on_table(0, std_card(Suit::Hearts, Rank::King))];

        assert!(validate_play(&hand, hand[1], &table, Some(Suit::Spades)).is_ok());
        let err = validate_play(&hand, hand[0], &table, Some(Suit::Spades)).unwrap_err();
        assert_eq!(err.code(), "MUST_PLAY_TRUMP");
    }

    #[test]
    fn void_everywhere_allows_discard() {
        let hand = vec![
            std_card(Suit::Diamonds, Rank::Seven),
            std_card(Suit::Clubs, Rank::Ace),
        ];
        let table = [on_table(0, std_card(Suit::Hearts, Rank::King))];

        assert!(validate_play(&hand, hand[0], &table, None).is_ok());
        assert!(validate_play(&hand, hand[1], &table, Some(Suit::Spades)).is_ok());
    }

    #[test]
    fn joker_is_playable_despite_holding_lead_suit() {
        let joker = Card::joker(1);
        let hand = vec![std_card(Suit::Hearts, Rank::Seven), joker];
        let table = [on_table(0, std_card(Suit::Hearts, Rank::King))];

        assert!(validate_play(&hand, joker, &table, None).is_ok());
    }

    #[test]
    fn lead_joker_requires_high_or_low_with_suit() {
        assert!(validate_joker_option(&[], JokerOption::High, Some(Suit::Hearts)).is_ok());
        assert!(validate_joker_option(&[], JokerOption::Low, Some(Suit::Spades)).is_ok());

        let err = validate_joker_option(&[], JokerOption::Top, None).unwrap_err();
        assert_eq!(err.code(), "ILLEGAL_JOKER_OPTION");
        let err = validate_joker_option(&[], JokerOption::High, None).unwrap_err();
        assert_eq!(err.code(), "ILLEGAL_JOKER_OPTION");
    }

    #[test]
    fn follow_joker_requires_top_or_bottom() {
        let table = [on_table(0, std_card(Suit::Hearts, Rank::King))];

        assert!(validate_joker_option(&table, JokerOption::Top, None).is_ok());
        assert!(validate_joker_option(&table, JokerOption::Bottom, None).is_ok());

        let err = validate_joker_option(&table, JokerOption::High, Some(Suit::Hearts)).unwrap_err();
        assert_eq!(err.code(), "ILLEGAL_JOKER_OPTION");
    }

    #[test]
    fn lead_joker_imposes_its_requested_suit_on_followers() {
        let hand = vec![
            std_card(Suit::Diamonds, Rank::Seven),
            std_card(Suit::Hearts, Rank::Nine),
        ];
        let table = [TableCard {
            seat: 0,
            card: Card::joker(1),
            joker_option: Some(JokerOption::Low),
            requested_suit: Some(Suit::Diamonds),
            leader: 0,
        }];

        assert!(validate_play(&hand, hand[0], &table, None).is_ok());
        let err = validate_play(&hand, hand[1], &table, None).unwrap_err();
        assert_eq!(err.code(), "MUST_FOLLOW_SUIT");
    }

    #[test]
    fn legal_plays_reports_follow_set() {
        let hand = vec![
            std_card(Suit::Hearts, Rank::Seven),
            std_card(Suit::Hearts, Rank::Queen),
            std_card(Suit::Spades, Rank::Ace),
            Card::joker(2),
        ];
        let table = [on_table(0, std_card(Suit::Hearts, Rank::King))];

        let legal = legal_plays(&hand, &table, Some(Suit::Spades));
        assert_eq!(legal.len(), 3);
        assert!(legal.contains(&hand[0]));
        assert!(legal.contains(&hand[1]));
        assert!(legal.contains(&Card::joker(2)));
        assert!(!legal.contains(&hand[2]));
    }
}
