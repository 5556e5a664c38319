//! Per-seat projection of the canonical state.
//!
//! Every seat receives the same snapshot shape; other players' hands are
//! redacted to counts and joker ownership is only visible to the owner.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::cards::{Card, TableCard, Trump};
use crate::domain::rules;
use crate::domain::state::{
    AllowedTrumpChoices, GameState, Phase, PulkaResults, Seat, TrumpTrigger,
};

/// Badges shown next to a seat in the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerBadges {
    /// Joker in hand; only ever true on the viewer's own row.
    pub has_jokers: bool,
    pub spoiled: bool,
    /// All contracts kept this pulka; shown at pulka completion.
    pub perfect_pulka: bool,
    pub took_all: bool,
    pub perfect_pass: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: Uuid,
    pub name: String,
    pub seat: Seat,
    pub hand_count: u8,
    pub bet: Option<u8>,
    pub tricks_won: u8,
    pub round_scores: Vec<i32>,
    pub pulka_scores: Vec<i32>,
    pub total_score: i32,
    pub connected: bool,
    pub is_bot: bool,
    pub badges: PlayerBadges,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrumpSelectionView {
    pub chooser: Seat,
    pub allowed: AllowedTrumpChoices,
    pub redeal_count: u8,
    pub max_redeals: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_ts: Option<i64>,
    pub trigger: TrumpTrigger,
}

/// The canonical state as one seat is allowed to see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub phase: Phase,
    pub round: u8,
    pub pulka: u8,
    pub cards_per_player: u8,
    pub dealer: Seat,
    pub turn: Seat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trump: Option<Trump>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trump_card: Option<Card>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trump_selection: Option<TrumpSelectionView>,
    pub table: Vec<TableCard>,
    pub players: Vec<PlayerView>,
    /// The dealer's bet that is currently disabled, present only while the
    /// dealer is deciding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forbidden_bet: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_pulka_results: Option<PulkaResults>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_deadline_ts: Option<i64>,
}

/// Project the state for one seat: their own hand plus a redacted snapshot.
pub fn project_for_seat(state: &GameState, viewer: Seat) -> (GameSnapshot, Vec<Card>) {
    let pulka_complete = state.phase == Phase::PulkaComplete;

    let players = state
        .players
        .iter()
        .enumerate()
        .map(|(seat, p)| {
            let own = seat == viewer as usize;
            PlayerView {
                id: p.id,
                name: p.name.clone(),
                seat: seat as Seat,
                hand_count: p.hand.len() as u8,
                bet: p.bet,
                tricks_won: p.tricks_won,
                round_scores: p.round_scores.clone(),
                pulka_scores: p.pulka_scores.clone(),
                total_score: p.total_score,
                connected: p.connected,
                is_bot: p.is_bot,
                badges: PlayerBadges {
                    has_jokers: own && p.hand.iter().any(|c| c.is_joker()),
                    spoiled: p.spoiled,
                    perfect_pulka: pulka_complete && !p.spoiled,
                    took_all: p.took_all_in_pulka,
                    perfect_pass: p.perfect_pass_in_pulka,
                },
            }
        })
        .collect();

    let forbidden_bet = if state.phase == Phase::Betting && state.turn == state.dealer {
        let bets = std::array::from_fn(|i| state.players[i].bet);
        rules::forbidden_bet(&bets, state.cards_per_player, state.dealer, state.dealer)
    } else {
        None
    };

    let trump_selection = state.trump_selection.as_ref().map(|ts| TrumpSelectionView {
        chooser: ts.chooser,
        allowed: ts.allowed.clone(),
        redeal_count: ts.redeal_count,
        max_redeals: ts.max_redeals,
        deadline_ts: ts.deadline_ts,
        trigger: ts.trigger,
    });

    let snapshot = GameSnapshot {
        phase: state.phase,
        round: state.round,
        pulka: state.pulka,
        cards_per_player: state.cards_per_player,
        dealer: state.dealer,
        turn: state.turn,
        trump: state.trump,
        trump_card: state.trump_card,
        trump_selection,
        table: state.table.clone(),
        players,
        forbidden_bet,
        last_pulka_results: state.last_pulka_results.clone(),
        turn_deadline_ts: state.turn_deadline_ts,
    };

    let your_hand = state.players[viewer as usize].hand.clone();
    (snapshot, your_hand)
}
