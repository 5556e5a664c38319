//! Domain-level error type used across the engine.
//!
//! This error type is transport-agnostic. The websocket and HTTP layers
//! convert it into `crate::error::AppError` at the boundary; a rejected
//! intent never mutates game state.

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::domain::cards::Suit;

/// Rule violations a client intent can trip over.
///
/// Variants carry the data the client needs to render the rejection
/// (e.g. the suit that must be followed, the bet value that is forbidden).
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationKind {
    PhaseMismatch,
    OutOfTurn,
    SeatNotFound,
    BetOutOfRange,
    ForbiddenBet(u8),
    MustFollowSuit(Suit),
    MustPlayTrump(Suit),
    CardNotInHand,
    IllegalJokerOption,
    RedealExhausted,
    InvalidRound,
    Other(String),
}

impl ValidationKind {
    /// Canonical SCREAMING_SNAKE_CASE code for wire responses.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationKind::PhaseMismatch => "PHASE_MISMATCH",
            ValidationKind::OutOfTurn => "OUT_OF_TURN",
            ValidationKind::SeatNotFound => "SEAT_NOT_FOUND",
            ValidationKind::BetOutOfRange => "BET_OUT_OF_RANGE",
            ValidationKind::ForbiddenBet(_) => "FORBIDDEN_BET",
            ValidationKind::MustFollowSuit(_) => "MUST_FOLLOW_SUIT",
            ValidationKind::MustPlayTrump(_) => "MUST_PLAY_TRUMP",
            ValidationKind::CardNotInHand => "CARD_NOT_IN_HAND",
            ValidationKind::IllegalJokerOption => "ILLEGAL_JOKER_OPTION",
            ValidationKind::RedealExhausted => "REDEAL_EXHAUSTED",
            ValidationKind::InvalidRound => "INVALID_ROUND",
            ValidationKind::Other(_) => "VALIDATION_ERROR",
        }
    }

    /// The suit the client was required to play, if this kind carries one.
    pub fn required_suit(&self) -> Option<Suit> {
        match self {
            ValidationKind::MustFollowSuit(s) | ValidationKind::MustPlayTrump(s) => Some(*s),
            _ => None,
        }
    }
}

/// Central domain error type.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Illegal intent for the current phase/seat/turn. Recoverable and
    /// reported only to the originating client.
    Validation(ValidationKind, String),
    /// Internal invariant violation (e.g. card-count mismatch). Fatal for
    /// the room: logged, room terminated, never silently repaired.
    Invariant(String),
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DomainError::Validation(kind, d) => write!(f, "validation {}: {d}", kind.code()),
            DomainError::Invariant(d) => write!(f, "invariant violated: {d}"),
        }
    }
}

impl Error for DomainError {}

impl DomainError {
    pub fn validation(kind: ValidationKind, detail: impl Into<String>) -> Self {
        Self::Validation(kind, detail.into())
    }

    pub fn validation_other(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self::Validation(ValidationKind::Other(detail.clone()), detail)
    }

    pub fn invariant(detail: impl Into<String>) -> Self {
        Self::Invariant(detail.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(kind, _) => kind.code(),
            DomainError::Invariant(_) => "INVARIANT_VIOLATION",
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, DomainError::Invariant(_))
    }
}
