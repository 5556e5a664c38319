//! Core card-related types: Card, Rank, Suit, Trump, joker declarations.

use serde::{Deserialize, Serialize};

use crate::errors::domain::{DomainError, ValidationKind};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    pub fn key(self) -> &'static str {
        match self {
            Suit::Clubs => "clubs",
            Suit::Diamonds => "diamonds",
            Suit::Hearts => "hearts",
            Suit::Spades => "spades",
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trump {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
    NoTrump,
}

impl From<Suit> for Trump {
    fn from(suit: Suit) -> Self {
        match suit {
            Suit::Clubs => Trump::Clubs,
            Suit::Diamonds => Trump::Diamonds,
            Suit::Hearts => Trump::Hearts,
            Suit::Spades => Trump::Spades,
        }
    }
}

impl Trump {
    /// The trump suit, or `None` for a no-trump round.
    pub fn suit(self) -> Option<Suit> {
        match self {
            Trump::Clubs => Some(Suit::Clubs),
            Trump::Diamonds => Some(Suit::Diamonds),
            Trump::Hearts => Some(Suit::Hearts),
            Trump::Spades => Some(Suit::Spades),
            Trump::NoTrump => None,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    /// Numeric value: 2..=10 for pips, J=11, Q=12, K=13, A=14.
    pub fn value(self) -> u8 {
        match self {
            Rank::Two => 2,
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Eight => 8,
            Rank::Nine => 9,
            Rank::Ten => 10,
            Rank::Jack => 11,
            Rank::Queen => 12,
            Rank::King => 13,
            Rank::Ace => 14,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "jack",
            Rank::Queen => "queen",
            Rank::King => "king",
            Rank::Ace => "ace",
        }
    }
}

/// The four declarations a joker's owner picks at play time.
///
/// High/Low are only legal when the joker leads a trick (and require a
/// requested suit); Top/Bottom are only legal when following.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JokerOption {
    High,
    Low,
    Top,
    Bottom,
}

impl JokerOption {
    pub fn is_lead_option(self) -> bool {
        matches!(self, JokerOption::High | JokerOption::Low)
    }

    pub fn is_follow_option(self) -> bool {
        matches!(self, JokerOption::Top | JokerOption::Bottom)
    }
}

/// A playing card: 34 standard cards plus two jokers per deck.
///
/// Identity is stable within a game: a deck never contains two cards with
/// the same `id()`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Card {
    Standard { suit: Suit, rank: Rank },
    Joker { joker_id: u8 },
}

impl Card {
    pub fn standard(suit: Suit, rank: Rank) -> Self {
        Card::Standard { suit, rank }
    }

    pub fn joker(joker_id: u8) -> Self {
        debug_assert!(joker_id == 1 || joker_id == 2);
        Card::Joker { joker_id }
    }

    pub fn is_joker(self) -> bool {
        matches!(self, Card::Joker { .. })
    }

    pub fn suit(self) -> Option<Suit> {
        match self {
            Card::Standard { suit, .. } => Some(suit),
            Card::Joker { .. } => None,
        }
    }

    pub fn rank(self) -> Option<Rank> {
        match self {
            Card::Standard { rank, .. } => Some(rank),
            Card::Joker { .. } => None,
        }
    }

    /// Stable opaque id, e.g. `hearts-ace` or `joker-1`.
    pub fn id(self) -> String {
        match self {
            Card::Standard { suit, rank } => format!("{}-{}", suit.key(), rank.key()),
            Card::Joker { joker_id } => format!("joker-{joker_id}"),
        }
    }
}

/// Decision submitted during trump selection.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrumpDecision {
    Suit { suit: Suit },
    NoTrump,
    Redeal,
}

/// One played card in the current trick.
///
/// `leader` is fixed to the seat that led the trick, for all entries of
/// that trick; clients use it to mark the lead card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCard {
    pub seat: u8,
    pub card: Card,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joker_option: Option<JokerOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_suit: Option<Suit>,
    pub leader: u8,
}

impl TableCard {
    /// The suit this entry contributes to lead-suit determination.
    pub fn effective_suit(&self) -> Option<Suit> {
        match self.card {
            Card::Standard { suit, .. } => Some(suit),
            Card::Joker { .. } => match self.joker_option {
                Some(JokerOption::High) | Some(JokerOption::Low) => self.requested_suit,
                _ => None,
            },
        }
    }
}

impl TryFrom<Trump> for Suit {
    type Error = DomainError;

    fn try_from(trump: Trump) -> Result<Self, Self::Error> {
        trump.suit().ok_or_else(|| {
            DomainError::validation(
                ValidationKind::Other("NO_TRUMP_SUIT".into()),
                "Cannot convert NoTrump to Suit",
            )
        })
    }
}
