use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::cards::{Card, Suit, TableCard, Trump};
use crate::domain::rules::PLAYERS;
use crate::errors::domain::DomainError;

pub type Seat = u8; // 0..=3

/// Overall game progression phases.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Seats filled, tuzovanie animation running; round 1 not dealt yet.
    Waiting,
    /// The chooser must pick a suit, no-trump, or a redeal.
    TrumpSelection,
    /// Seats place bets in turn order, dealer last.
    Betting,
    /// Tricks are being played.
    Playing,
    /// Four cards on the table; observation window before the sweep.
    TrickComplete,
    /// All tricks played; scores being recorded.
    RoundComplete,
    /// Pulka recap with premiums on display.
    PulkaComplete,
    /// Round 24 scored; terminal.
    Finished,
}

/// What put the round into trump selection.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrumpTrigger {
    /// 9-card rounds leave no upcard; the chooser decides.
    NineCardRound,
    /// The flipped upcard was a joker; the chooser decides reactively.
    JokerUpcard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowedTrumpChoices {
    pub suits: Vec<Suit>,
    pub no_trump: bool,
    pub redeal: bool,
}

/// Live state of the trump-selection negotiation.
#[derive(Debug, Clone, PartialEq)]
pub struct TrumpSelection {
    pub chooser: Seat,
    pub allowed: AllowedTrumpChoices,
    pub redeal_count: u8,
    pub max_redeals: u8,
    /// Unix-millisecond deadline; set by the room when the timer is armed.
    pub deadline_ts: Option<i64>,
    pub trigger: TrumpTrigger,
    /// Undealt portion of every hand, released once trump is fixed.
    pub pending_hands: [Vec<Card>; PLAYERS],
}

/// A seat for the whole game. Identity is stable; `is_bot` flips true when
/// a human leaves or times out of the reconnect window.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub hand: Vec<Card>,
    pub bet: Option<u8>,
    pub tricks_won: u8,
    pub round_scores: Vec<i32>,
    pub pulka_scores: Vec<i32>,
    pub total_score: i32,
    pub spoiled: bool,
    pub took_all_in_pulka: bool,
    pub perfect_pass_in_pulka: bool,
    pub joker_counts: Vec<u8>,
    pub shtangas: u8,
    pub connected: bool,
    pub is_bot: bool,
}

impl Player {
    pub fn human(id: Uuid, name: String) -> Self {
        Self {
            id,
            name,
            hand: Vec::new(),
            bet: None,
            tricks_won: 0,
            round_scores: Vec::new(),
            pulka_scores: Vec::new(),
            total_score: 0,
            spoiled: false,
            took_all_in_pulka: false,
            perfect_pass_in_pulka: false,
            joker_counts: Vec::new(),
            shtangas: 0,
            connected: true,
            is_bot: false,
        }
    }

    pub fn bot(id: Uuid, name: String) -> Self {
        Self {
            connected: false,
            is_bot: true,
            ..Self::human(id, name)
        }
    }
}

/// Immutable record appended once a round scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: u8,
    pub pulka: u8,
    pub cards_per_player: u8,
    pub trump: Trump,
    pub bets: [u8; PLAYERS],
    pub tricks: [u8; PLAYERS],
    pub scores: [i32; PLAYERS],
    pub joker_counts: [u8; PLAYERS],
}

/// Every card played, in global play order, for the analysis log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayRecord {
    pub round: u8,
    pub trick_no: u8,
    pub seq: u16,
    pub table_card: TableCard,
}

/// Premium accounting for one clean seat at pulka close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Premium {
    pub seat: Seat,
    pub received: i32,
    pub taken_from: Option<Seat>,
    pub taken_amount: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulkaResults {
    pub pulka: u8,
    pub highest_round_score: i32,
    pub premiums: Vec<Premium>,
    pub deltas: [i32; PLAYERS],
}

/// The aggregate root for one room. Mutated only by the engine functions in
/// response to validated intents or timer events.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub phase: Phase,
    pub round: u8,
    pub pulka: u8,
    pub cards_per_player: u8,
    pub dealer: Seat,
    pub turn: Seat,
    pub trick_leader: Seat,
    pub trick_no: u8,
    pub trump: Option<Trump>,
    pub trump_card: Option<Card>,
    pub trump_selection: Option<TrumpSelection>,
    pub table: Vec<TableCard>,
    pub players: [Player; PLAYERS],
    pub joker_counts_this_round: [u8; PLAYERS],
    pub history: Vec<RoundRecord>,
    pub plays: Vec<PlayRecord>,
    pub last_pulka_results: Option<PulkaResults>,
    /// Unix-millisecond deadline of the running turn timer, if any.
    pub turn_deadline_ts: Option<i64>,
    pub rng_seed: u64,
    /// Shuffles performed so far (tuzovanie and every deal/redeal).
    pub deal_counter: u32,
}

impl GameState {
    pub fn new(players: [Player; PLAYERS], rng_seed: u64) -> Self {
        Self {
            phase: Phase::Waiting,
            round: 1,
            pulka: 1,
            cards_per_player: 1,
            dealer: 0,
            turn: 0,
            trick_leader: 0,
            trick_no: 1,
            trump: None,
            trump_card: None,
            trump_selection: None,
            table: Vec::new(),
            players,
            joker_counts_this_round: [0; PLAYERS],
            history: Vec::new(),
            plays: Vec::new(),
            last_pulka_results: None,
            turn_deadline_ts: None,
            rng_seed,
            deal_counter: 0,
        }
    }

    pub fn seat_of(&self, player_id: Uuid) -> Option<Seat> {
        self.players
            .iter()
            .position(|p| p.id == player_id)
            .map(|i| i as Seat)
    }

    pub fn player(&self, seat: Seat) -> &Player {
        &self.players[seat as usize]
    }

    pub fn player_mut(&mut self, seat: Seat) -> &mut Player {
        &mut self.players[seat as usize]
    }
}

/// Seat / turn math helpers (4 fixed seats: 0..=3, clockwise is +1).
#[inline]
pub fn next_seat(seat: Seat) -> Seat {
    (seat + 1) % PLAYERS as Seat
}

#[inline]
pub fn nth_from(start: Seat, n: u8) -> Seat {
    (start + n) % PLAYERS as Seat
}

/// Round-start seat (player to the left of the dealer).
#[inline]
pub fn first_actor(dealer: Seat) -> Seat {
    next_seat(dealer)
}

pub fn require_seat(state: &GameState, player_id: Uuid) -> Result<Seat, DomainError> {
    state.seat_of(player_id).ok_or_else(|| {
        DomainError::validation(
            crate::errors::ValidationKind::SeatNotFound,
            "Player is not seated in this room",
        )
    })
}
