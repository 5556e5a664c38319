//! Wire messages exchanged over the realtime channel.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::cards::{Card, JokerOption, Suit, TrumpDecision};
use crate::domain::deck::TuzovanieDeal;
use crate::domain::scoring::Ranking;
use crate::domain::snapshot::GameSnapshot;
use crate::domain::state::Seat;
use crate::errors::domain::DomainError;

pub const PROTOCOL_VERSION: i32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    Hello {
        protocol: i32,
        #[serde(skip_serializing_if = "Option::is_none")]
        player_id: Option<Uuid>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    FindGame,
    LeaveQueue,
    LeaveGame {
        room_id: Uuid,
    },
    MakeBet {
        room_id: Uuid,
        amount: u8,
    },
    ThrowCard {
        room_id: Uuid,
        card_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        joker_option: Option<JokerOption>,
        #[serde(skip_serializing_if = "Option::is_none")]
        requested_suit: Option<Suit>,
    },
    SelectTrump {
        room_id: Uuid,
        decision: TrumpDecision,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatInfo {
    pub seat: Seat,
    pub id: Uuid,
    pub name: String,
    pub is_bot: bool,
}

#[allow(clippy::large_enum_variant)]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    HelloAck {
        protocol: i32,
        player_id: Uuid,
    },

    Queued {
        current: usize,
        required: usize,
    },

    TuzovanieStarted {
        room_id: Uuid,
        deal_sequence: Vec<TuzovanieDeal>,
        dealer_index: Seat,
        players: Vec<SeatInfo>,
    },

    GameStarted {
        room_id: Uuid,
    },

    GameState {
        room_id: Uuid,
        state: GameSnapshot,
        your_hand: Vec<Card>,
    },

    TurnTimerStarted {
        room_id: Uuid,
        seat: Seat,
        player_id: Uuid,
        expires_at: i64,
    },

    PulkaRecapStarted {
        room_id: Uuid,
        expires_at: i64,
    },

    PlayerReplaced {
        room_id: Uuid,
        seat: Seat,
        player_id: Uuid,
        name: String,
    },

    GameFinished {
        room_id: Uuid,
        rankings: Vec<Ranking>,
    },

    Error {
        code: String,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        required_suit: Option<Suit>,
    },
}

impl ServerMsg {
    /// Shape a rejected intent for the originating client.
    pub fn from_domain_error(err: &DomainError) -> Self {
        let required_suit = match err {
            DomainError::Validation(kind, _) => kind.required_suit(),
            DomainError::Invariant(_) => None,
        };
        ServerMsg::Error {
            code: err.code().to_string(),
            message: err.to_string(),
            required_suit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::domain::ValidationKind;

    #[test]
    fn client_messages_parse_from_snake_case_json() {
        let msg: ClientMsg = serde_json::from_str(
            r#"{"type":"make_bet","room_id":"00000000-0000-0000-0000-000000000001","amount":3}"#,
        )
        .unwrap();
        assert!(matches!(msg, ClientMsg::MakeBet { amount: 3, .. }));

        let msg: ClientMsg = serde_json::from_str(
            r#"{"type":"throw_card","room_id":"00000000-0000-0000-0000-000000000001","card_id":"joker-1","joker_option":"high","requested_suit":"hearts"}"#,
        )
        .unwrap();
        match msg {
            ClientMsg::ThrowCard {
                joker_option,
                requested_suit,
                ..
            } => {
                assert_eq!(joker_option, Some(JokerOption::High));
                assert_eq!(requested_suit, Some(Suit::Hearts));
            }
            other => panic!("unexpected message: {other:?}"),
        }

        let msg: ClientMsg = serde_json::from_str(
            r#"{"type":"select_trump","room_id":"00000000-0000-0000-0000-000000000001","decision":{"kind":"suit","suit":"spades"}}"#,
        )
        .unwrap();
        assert!(matches!(
            msg,
            ClientMsg::SelectTrump {
                decision: TrumpDecision::Suit { suit: Suit::Spades },
                ..
            }
        ));
    }

    #[test]
    fn validation_errors_carry_the_required_suit() {
        let err = DomainError::validation(
            ValidationKind::MustFollowSuit(Suit::Hearts),
            "Must follow suit: hearts",
        );
        let msg = ServerMsg::from_domain_error(&err);
        match msg {
            ServerMsg::Error {
                code,
                required_suit,
                ..
            } => {
                assert_eq!(code, "MUST_FOLLOW_SUIT");
                assert_eq!(required_suit, Some(Suit::Hearts));
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
