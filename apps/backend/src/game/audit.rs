//! Append-only analysis record of a finished game.
//!
//! This is the one artifact the reporting layer consumes; it must be
//! internally consistent so replay tooling can render it without any game
//! logic of its own.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::rules::PLAYERS;
use crate::domain::scoring::Ranking;
use crate::domain::state::{GameState, PlayRecord, PulkaResults, RoundRecord, Seat};
use crate::errors::domain::DomainError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPlayer {
    pub seat: Seat,
    pub id: Uuid,
    pub name: String,
    pub is_bot: bool,
    pub total_score: i32,
    pub shtangas: u8,
}

/// Round-by-round record of one finished game, plus every card played in
/// global sequence order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameAnalysis {
    pub game_id: Uuid,
    pub rng_seed: u64,
    pub finished_ts: i64,
    pub players: Vec<AnalysisPlayer>,
    pub rounds: Vec<RoundRecord>,
    pub plays: Vec<PlayRecord>,
    pub pulka_results: Vec<PulkaResults>,
    pub rankings: Vec<Ranking>,
}

impl GameAnalysis {
    /// Assemble and validate the record. `pulka_results` is the room's
    /// accumulation of every pulka recap, in order.
    pub fn build(
        game_id: Uuid,
        state: &GameState,
        rankings: Vec<Ranking>,
        pulka_results: Vec<PulkaResults>,
        finished_ts: i64,
    ) -> Result<Self, DomainError> {
        let players = state
            .players
            .iter()
            .enumerate()
            .map(|(seat, p)| AnalysisPlayer {
                seat: seat as Seat,
                id: p.id,
                name: p.name.clone(),
                is_bot: p.is_bot,
                total_score: p.total_score,
                shtangas: p.shtangas,
            })
            .collect();

        let analysis = Self {
            game_id,
            rng_seed: state.rng_seed,
            finished_ts,
            players,
            rounds: state.history.clone(),
            plays: state.plays.clone(),
            pulka_results,
            rankings,
        };
        analysis.validate()?;
        Ok(analysis)
    }

    /// Internal consistency: every referenced round exists, every round's
    /// recorded plays sum to `4 × cards_per_player`, and the global play
    /// sequence is gap-free.
    pub fn validate(&self) -> Result<(), DomainError> {
        for (i, round) in self.rounds.iter().enumerate() {
            if round.round as usize != i + 1 {
                return Err(DomainError::invariant(format!(
                    "Analysis rounds out of order at index {i}: round {}",
                    round.round
                )));
            }
            let plays = self
                .plays
                .iter()
                .filter(|p| p.round == round.round)
                .count();
            let expected = PLAYERS * round.cards_per_player as usize;
            if plays != expected {
                return Err(DomainError::invariant(format!(
                    "Round {} records {plays} plays, expected {expected}",
                    round.round
                )));
            }
        }

        for (i, play) in self.plays.iter().enumerate() {
            if play.seq as usize != i {
                return Err(DomainError::invariant(format!(
                    "Play sequence gap at index {i}: seq {}",
                    play.seq
                )));
            }
            if self.rounds.iter().all(|r| r.round != play.round) {
                return Err(DomainError::invariant(format!(
                    "Play references unknown round {}",
                    play.round
                )));
            }
        }

        Ok(())
    }

    pub fn to_json(&self) -> Result<String, DomainError> {
        serde_json::to_string(self)
            .map_err(|e| DomainError::invariant(format!("Analysis serialization failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cards::{Card, Rank, Suit, TableCard, Trump};

    fn round_record(round: u8, cards_per_player: u8) -> RoundRecord {
        RoundRecord {
            round,
            pulka: 1,
            cards_per_player,
            trump: Trump::NoTrump,
            bets: [0; PLAYERS],
            tricks: [1, 0, 0, 0],
            scores: [0; PLAYERS],
            joker_counts: [0; PLAYERS],
        }
    }

    fn plays_for_round(round: u8, cards_per_player: u8, seq_start: u16) -> Vec<PlayRecord> {
        let mut plays = Vec::new();
        for trick in 0..cards_per_player {
            for seat in 0..PLAYERS as u8 {
                plays.push(PlayRecord {
                    round,
                    trick_no: trick + 1,
                    seq: seq_start + plays.len() as u16,
                    table_card: TableCard {
                        seat,
                        card: Card::standard(Suit::Hearts, Rank::Six),
                        joker_option: None,
                        requested_suit: None,
                        leader: 0,
                    },
                });
            }
        }
        plays
    }

    fn analysis() -> GameAnalysis {
        GameAnalysis {
            game_id: Uuid::new_v4(),
            rng_seed: 42,
            finished_ts: 0,
            players: Vec::new(),
            rounds: vec![round_record(1, 1), round_record(2, 2)],
            plays: {
                let mut plays = plays_for_round(1, 1, 0);
                plays.extend(plays_for_round(2, 2, 4));
                plays
            },
            pulka_results: Vec::new(),
            rankings: Vec::new(),
        }
    }

    #[test]
    fn consistent_record_validates_and_serializes() {
        let analysis = analysis();
        analysis.validate().unwrap();
        let json = analysis.to_json().unwrap();
        let parsed: GameAnalysis = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, analysis);
    }

    #[test]
    fn missing_play_is_rejected() {
        let mut analysis = analysis();
        analysis.plays.pop();
        assert!(analysis.validate().is_err());
    }

    #[test]
    fn play_for_unknown_round_is_rejected() {
        let mut analysis = analysis();
        analysis.rounds.pop();
        assert!(analysis.validate().is_err());
    }

    #[test]
    fn sequence_gap_is_rejected() {
        let mut analysis = analysis();
        analysis.plays[3].seq = 99;
        assert!(analysis.validate().is_err());
    }
}
