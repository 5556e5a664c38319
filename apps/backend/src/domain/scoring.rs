//! Round scoring, pulka premiums, and final rankings.
//!
//! Payout table:
//! - contract made (`tricks == bet`): 50 × bet
//! - took everything (`bet == tricks == round length`): 100 × round length
//! - miss (`tricks != bet`): 10 × tricks
//! - shtanga (`bet >= 1 && tricks == 0`): −200

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::rules::PLAYERS;
use crate::domain::state::{next_seat, Player, Premium, RoundRecord, Seat};

pub const SCORE_TOOK_OWN_MULTIPLIER: i32 = 50;
pub const SCORE_TOOK_ALL_MULTIPLIER: i32 = 100;
pub const SCORE_MISS_MULTIPLIER: i32 = 10;
pub const SCORE_SHTANGA_PENALTY: i32 = -200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundScore {
    pub score: i32,
    pub took_own: bool,
    pub took_all: bool,
    pub shtanga: bool,
}

/// Score one seat's round given its bet, tricks taken, and the round length.
///
/// The tiers are mutually exclusive; "took everything" supersedes the
/// ordinary contract payout, shtanga supersedes the ordinary miss penalty.
pub fn round_score(bet: u8, tricks: u8, round_len: u8) -> RoundScore {
    let shtanga = bet >= 1 && tricks == 0;
    let took_own = bet == tricks;
    let took_all = took_own && round_len > 0 && bet == round_len;

    let score = if shtanga {
        SCORE_SHTANGA_PENALTY
    } else if took_all {
        SCORE_TOOK_ALL_MULTIPLIER * i32::from(round_len)
    } else if took_own {
        SCORE_TOOK_OWN_MULTIPLIER * i32::from(bet)
    } else {
        SCORE_MISS_MULTIPLIER * i32::from(tricks)
    };

    RoundScore {
        score,
        took_own,
        took_all,
        shtanga,
    }
}

/// Perfect pass: a kept zero bet. Tracked for the pulka badge.
pub fn is_perfect_pass(bet: u8, tricks: u8) -> bool {
    bet == 0 && tricks == 0
}

/// The premium amount for a pulka: the highest single round score recorded
/// in it, excluding its final round.
pub fn premium_amount(pulka_rounds: &[RoundRecord]) -> i32 {
    let except_last = &pulka_rounds[..pulka_rounds.len().saturating_sub(1)];
    except_last
        .iter()
        .flat_map(|r| r.scores.iter().copied())
        .max()
        .unwrap_or(0)
        .max(0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct PulkaPremiums {
    pub amount: i32,
    pub premiums: Vec<Premium>,
    /// Net premium delta per seat (received minus taken).
    pub deltas: [i32; PLAYERS],
}

/// Compute pulka-close premiums for the seats that kept every contract.
///
/// A clean seat receives `amount` unless the seat before it (clockwise) is
/// also clean, and subtracts the same amount from the next seat unless that
/// seat is itself clean.
pub fn pulka_premiums(clean: [bool; PLAYERS], amount: i32) -> PulkaPremiums {
    let mut premiums = Vec::new();
    let mut deltas = [0i32; PLAYERS];

    if amount == 0 || clean.iter().all(|c| !c) {
        return PulkaPremiums {
            amount,
            premiums,
            deltas,
        };
    }

    for seat in 0..PLAYERS as Seat {
        if !clean[seat as usize] {
            continue;
        }
        let prev = (seat + PLAYERS as Seat - 1) % PLAYERS as Seat;
        let next = next_seat(seat);

        let receives = !clean[prev as usize];
        let subtracts = !clean[next as usize];

        premiums.push(Premium {
            seat,
            received: if receives { amount } else { 0 },
            taken_from: subtracts.then_some(next),
            taken_amount: if subtracts { amount } else { 0 },
        });

        if receives {
            deltas[seat as usize] += amount;
        }
        if subtracts {
            deltas[next as usize] -= amount;
        }
    }

    PulkaPremiums {
        amount,
        premiums,
        deltas,
    }
}

/// One row of the final results payload, best seat first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub rank: u8,
    pub seat: Seat,
    pub player_id: Uuid,
    pub name: String,
    pub total_score: i32,
    pub shtangas: u8,
}

/// Final rankings: total score descending, then fewer shtangas, then seat
/// order.
pub fn final_rankings(players: &[Player; PLAYERS]) -> Vec<Ranking> {
    let mut seats: Vec<Seat> = (0..PLAYERS as Seat).collect();
    seats.sort_by(|&a, &b| {
        let pa = &players[a as usize];
        let pb = &players[b as usize];
        pb.total_score
            .cmp(&pa.total_score)
            .then(pa.shtangas.cmp(&pb.shtangas))
            .then(a.cmp(&b))
    });

    seats
        .into_iter()
        .enumerate()
        .map(|(i, seat)| {
            let p = &players[seat as usize];
            Ranking {
                rank: (i + 1) as u8,
                seat,
                player_id: p.id,
                name: p.name.clone(),
                total_score: p.total_score,
                shtangas: p.shtangas,
            }
        })
        .collect()
}
