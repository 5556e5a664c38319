//! Phase transitions and intent application for one room's `GameState`.
//!
//! Every function here is pure computation over `&mut GameState`: no IO, no
//! clock, no ambient randomness. Shuffles derive from the recorded game seed
//! and deal counter, deadlines and timers belong to the room layer. A
//! returned validation error guarantees the state was not mutated.

use tracing::debug;

use crate::domain::cards::{Card, JokerOption, Suit, TableCard, Trump, TrumpDecision};
use crate::domain::deck;
use crate::domain::moves;
use crate::domain::rules::{self, MAX_REDEALS, PLAYERS, TRUMP_SELECTION_VISIBLE_CARDS};
use crate::domain::scoring;
use crate::domain::state::{
    first_actor, next_seat, AllowedTrumpChoices, GameState, Phase, PlayRecord, PulkaResults,
    RoundRecord, Seat, TrumpSelection, TrumpTrigger,
};
use crate::domain::tricks;
use crate::errors::domain::{DomainError, ValidationKind};

/// Outcome of a card play, for the room to decide what to schedule next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayOutcome {
    pub trick_complete: bool,
}

/// Outcome of sweeping a completed trick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrickOutcome {
    pub winner: Seat,
    pub round_complete: bool,
}

fn require_phase(state: &GameState, phase: Phase, intent: &str) -> Result<(), DomainError> {
    if state.phase != phase {
        return Err(DomainError::validation(
            ValidationKind::PhaseMismatch,
            format!("{intent} is not valid in the current phase"),
        ));
    }
    Ok(())
}

fn require_turn(state: &GameState, seat: Seat) -> Result<(), DomainError> {
    if state.turn != seat {
        return Err(DomainError::validation(
            ValidationKind::OutOfTurn,
            "Not this seat's turn",
        ));
    }
    Ok(())
}

/// Run the one-shot dealer determination for a freshly formed room.
///
/// Leaves the phase at `Waiting`; the room broadcasts the deal sequence for
/// animation and then calls [`start_round`].
pub fn run_tuzovanie(state: &mut GameState) -> Result<deck::Tuzovanie, DomainError> {
    require_phase(state, Phase::Waiting, "tuzovanie")?;
    let seed = deck::deal_seed(state.rng_seed, state.deal_counter);
    state.deal_counter += 1;
    let result = deck::tuzovanie(seed);
    state.dealer = result.dealer;
    debug!(dealer = state.dealer, cards = result.sequence.len(), "tuzovanie complete");
    Ok(result)
}

/// Deal round 1 after the tuzovanie recap.
pub fn start_round(state: &mut GameState) -> Result<(), DomainError> {
    require_phase(state, Phase::Waiting, "start round")?;
    deal_round(state)
}

/// Deal the current round: fresh shuffle, hands, upcard, and either the
/// betting phase or a trump-selection negotiation.
fn deal_round(state: &mut GameState) -> Result<(), DomainError> {
    let cards_per_player = rules::cards_for_round(state.round)
        .ok_or_else(|| DomainError::invariant(format!("No schedule for round {}", state.round)))?;
    state.cards_per_player = cards_per_player;
    state.pulka = rules::pulka_for_round(state.round)
        .ok_or_else(|| DomainError::invariant(format!("No pulka for round {}", state.round)))?;

    let seed = deck::deal_seed(state.rng_seed, state.deal_counter);
    state.deal_counter += 1;
    let (hands, rest) = deck::deal(seed, cards_per_player)?;

    // Rounds that don't consume the deck flip an upcard to fix trump.
    let upcard = if cards_per_player != 9 {
        rest.first().copied()
    } else {
        None
    };
    let trigger = trump_trigger(cards_per_player, upcard);

    for player in state.players.iter_mut() {
        player.bet = None;
        player.tricks_won = 0;
        player.hand.clear();
    }
    state.table.clear();
    state.trick_no = 1;
    state.joker_counts_this_round = [0; PLAYERS];
    state.trump_card = upcard;

    match trigger {
        Some(trigger) => setup_trump_selection(state, hands, trigger),
        None => {
            let suit = upcard
                .and_then(Card::suit)
                .ok_or_else(|| DomainError::invariant("Upcard round produced no trump suit"))?;
            state.trump = Some(Trump::from(suit));
            release_hands(state, hands);
            enter_betting(state);
        }
    }

    verify_card_conservation(state)?;
    debug!(
        round = state.round,
        pulka = state.pulka,
        cards_per_player,
        dealer = state.dealer,
        phase = ?state.phase,
        "round dealt"
    );
    Ok(())
}

fn trump_trigger(cards_per_player: u8, upcard: Option<Card>) -> Option<TrumpTrigger> {
    if cards_per_player == 9 {
        Some(TrumpTrigger::NineCardRound)
    } else if upcard.is_some_and(Card::is_joker) {
        Some(TrumpTrigger::JokerUpcard)
    } else {
        None
    }
}

/// Partial deal: the chooser sees only the first few cards of their hand
/// while deciding; everything else is held back until trump is fixed.
fn setup_trump_selection(state: &mut GameState, hands: [Vec<Card>; PLAYERS], trigger: TrumpTrigger) {
    let chooser = state.dealer;
    let visible = TRUMP_SELECTION_VISIBLE_CARDS.min(state.cards_per_player as usize);

    let mut pending_hands: [Vec<Card>; PLAYERS] = Default::default();
    for (seat, hand) in hands.into_iter().enumerate() {
        if seat == chooser as usize {
            let (shown, held) = hand.split_at(visible);
            state.players[seat].hand = shown.to_vec();
            pending_hands[seat] = held.to_vec();
        } else {
            pending_hands[seat] = hand;
        }
    }

    let redeal_count = state
        .trump_selection
        .as_ref()
        .map_or(0, |ts| ts.redeal_count);

    state.trump = None;
    state.trump_selection = Some(TrumpSelection {
        chooser,
        allowed: AllowedTrumpChoices {
            suits: Suit::ALL.to_vec(),
            no_trump: true,
            redeal: redeal_count < MAX_REDEALS,
        },
        redeal_count,
        max_redeals: MAX_REDEALS,
        deadline_ts: None,
        trigger,
        pending_hands,
    });
    state.phase = Phase::TrumpSelection;
    state.turn = chooser;
}

/// Hand every seat its full hand and record this round's joker counts.
fn release_hands(state: &mut GameState, hands: [Vec<Card>; PLAYERS]) {
    for (seat, hand) in hands.into_iter().enumerate() {
        state.players[seat].hand = hand;
        state.players[seat].hand.sort();
        state.joker_counts_this_round[seat] =
            state.players[seat].hand.iter().filter(|c| c.is_joker()).count() as u8;
    }
}

fn enter_betting(state: &mut GameState) {
    state.trump_selection = None;
    state.phase = Phase::Betting;
    state.turn = first_actor(state.dealer);
}

/// Apply the chooser's trump decision.
pub fn select_trump(
    state: &mut GameState,
    seat: Seat,
    decision: TrumpDecision,
) -> Result<(), DomainError> {
    require_phase(state, Phase::TrumpSelection, "select_trump")?;
    require_turn(state, seat)?;

    let selection = state
        .trump_selection
        .as_ref()
        .ok_or_else(|| DomainError::invariant("Trump selection phase without selection state"))?;
    if selection.chooser != seat {
        return Err(DomainError::validation(
            ValidationKind::OutOfTurn,
            "Only the chooser may select trump",
        ));
    }

    match decision {
        TrumpDecision::Redeal => {
            if !selection.allowed.redeal || selection.redeal_count >= selection.max_redeals {
                return Err(DomainError::validation(
                    ValidationKind::RedealExhausted,
                    "No redeals remaining this round",
                ));
            }
            redeal(state)
        }
        TrumpDecision::Suit { suit } => fix_trump(state, Some(Trump::from(suit))),
        TrumpDecision::NoTrump => fix_trump(state, Some(Trump::NoTrump)),
    }
}

fn fix_trump(state: &mut GameState, trump: Option<Trump>) -> Result<(), DomainError> {
    let selection = state
        .trump_selection
        .take()
        .ok_or_else(|| DomainError::invariant("Trump selection phase without selection state"))?;

    state.trump = trump;
    let chooser = selection.chooser as usize;
    let mut full_hands: [Vec<Card>; PLAYERS] = selection.pending_hands;
    full_hands[chooser].extend(state.players[chooser].hand.drain(..));

    release_hands(state, full_hands);
    enter_betting(state);
    verify_card_conservation(state)?;
    Ok(())
}

/// Discard all hands, reshuffle, and deal the same round again.
///
/// The trigger check re-runs against the fresh upcard: a joker-upcard round
/// that redeals into a standard upcard fixes trump from it and proceeds
/// straight to betting.
fn redeal(state: &mut GameState) -> Result<(), DomainError> {
    let selection = state
        .trump_selection
        .as_mut()
        .ok_or_else(|| DomainError::invariant("Redeal without selection state"))?;
    selection.redeal_count += 1;
    let redeal_count = selection.redeal_count;

    let seed = deck::deal_seed(state.rng_seed, state.deal_counter);
    state.deal_counter += 1;
    let (hands, rest) = deck::deal(seed, state.cards_per_player)?;

    let upcard = if state.cards_per_player != 9 {
        rest.first().copied()
    } else {
        None
    };
    state.trump_card = upcard;

    for player in state.players.iter_mut() {
        player.hand.clear();
    }

    match trump_trigger(state.cards_per_player, upcard) {
        Some(trigger) => {
            setup_trump_selection(state, hands, trigger);
            // setup re-reads redeal_count from the surviving selection state
            debug!(redeal_count, "redeal keeps trump selection open");
        }
        None => {
            let suit = upcard
                .and_then(Card::suit)
                .ok_or_else(|| DomainError::invariant("Upcard round produced no trump suit"))?;
            state.trump = Some(Trump::from(suit));
            release_hands(state, hands);
            enter_betting(state);
            debug!(redeal_count, "redeal resolved trump from upcard");
        }
    }

    verify_card_conservation(state)
}

/// Record one seat's bet, enforcing range and the dealer's forbidden bet.
pub fn make_bet(state: &mut GameState, seat: Seat, amount: u8) -> Result<(), DomainError> {
    require_phase(state, Phase::Betting, "make_bet")?;
    require_turn(state, seat)?;

    if state.players[seat as usize].bet.is_some() {
        return Err(DomainError::invariant("Seat already bet this round"));
    }
    if !rules::valid_bet_range(state.cards_per_player).contains(&amount) {
        return Err(DomainError::validation(
            ValidationKind::BetOutOfRange,
            format!("Bet must be between 0 and {}", state.cards_per_player),
        ));
    }

    let bets: [Option<u8>; PLAYERS] = std::array::from_fn(|i| state.players[i].bet);
    if rules::forbidden_bet(&bets, state.cards_per_player, seat, state.dealer) == Some(amount) {
        return Err(DomainError::validation(
            ValidationKind::ForbiddenBet(amount),
            format!("The dealer may not bet {amount} this round"),
        ));
    }

    state.players[seat as usize].bet = Some(amount);

    if state.players.iter().all(|p| p.bet.is_some()) {
        state.phase = Phase::Playing;
        state.turn = first_actor(state.dealer);
        state.trick_leader = state.turn;
    } else {
        state.turn = next_seat(seat);
    }
    Ok(())
}

/// Play a card onto the table, validating legality and joker declarations.
pub fn play_card(
    state: &mut GameState,
    seat: Seat,
    card_id: &str,
    joker_option: Option<JokerOption>,
    requested_suit: Option<Suit>,
) -> Result<PlayOutcome, DomainError> {
    require_phase(state, Phase::Playing, "throw_card")?;
    require_turn(state, seat)?;

    let hand = &state.players[seat as usize].hand;
    let card = hand
        .iter()
        .copied()
        .find(|c| c.id() == card_id)
        .ok_or_else(|| {
            DomainError::validation(ValidationKind::CardNotInHand, "Card not in hand")
        })?;

    let trump_suit = state.trump.and_then(Trump::suit);
    moves::validate_play(hand, card, &state.table, trump_suit)?;

    let (joker_option, requested_suit) = if card.is_joker() {
        let option = joker_option.ok_or_else(|| {
            DomainError::validation(
                ValidationKind::IllegalJokerOption,
                "A joker play must carry a declaration",
            )
        })?;
        moves::validate_joker_option(&state.table, option, requested_suit)?;
        let requested = if option.is_lead_option() {
            requested_suit
        } else {
            None
        };
        (Some(option), requested)
    } else {
        (None, None)
    };

    // Validation passed: mutate.
    if state.table.is_empty() {
        state.trick_leader = seat;
    }
    let hand = &mut state.players[seat as usize].hand;
    hand.retain(|c| c.id() != card_id);

    let table_card = TableCard {
        seat,
        card,
        joker_option,
        requested_suit,
        leader: state.trick_leader,
    };
    state.plays.push(PlayRecord {
        round: state.round,
        trick_no: state.trick_no,
        seq: state.plays.len() as u16,
        table_card: table_card.clone(),
    });
    state.table.push(table_card);

    let trick_complete = state.table.len() == PLAYERS;
    if trick_complete {
        state.phase = Phase::TrickComplete;
    } else {
        state.turn = next_seat(seat);
    }

    verify_card_conservation(state)?;
    Ok(PlayOutcome { trick_complete })
}

/// Sweep a completed trick to its winner after the observation window.
pub fn complete_trick(state: &mut GameState) -> Result<TrickOutcome, DomainError> {
    require_phase(state, Phase::TrickComplete, "complete_trick")?;

    let trump_suit = state.trump.and_then(Trump::suit);
    let winner = tricks::resolve_trick(&state.table, trump_suit)?;

    state.players[winner as usize].tricks_won += 1;
    state.table.clear();
    state.trick_leader = winner;
    state.turn = winner;
    state.trick_no += 1;

    let round_complete = state.players.iter().all(|p| p.hand.is_empty());
    state.phase = if round_complete {
        Phase::RoundComplete
    } else {
        Phase::Playing
    };

    verify_card_conservation(state)?;
    debug!(winner, round_complete, trick_no = state.trick_no, "trick swept");
    Ok(TrickOutcome {
        winner,
        round_complete,
    })
}

/// Score the finished round, append its history record, and either open the
/// pulka recap or deal the next round.
pub fn score_round(state: &mut GameState) -> Result<(), DomainError> {
    require_phase(state, Phase::RoundComplete, "score_round")?;

    let mut bets = [0u8; PLAYERS];
    let mut tricks_taken = [0u8; PLAYERS];
    let mut scores = [0i32; PLAYERS];

    for seat in 0..PLAYERS {
        let bet = state.players[seat]
            .bet
            .ok_or_else(|| DomainError::invariant("Round completed with an unset bet"))?;
        let tricks = state.players[seat].tricks_won;
        let result = scoring::round_score(bet, tricks, state.cards_per_player);

        bets[seat] = bet;
        tricks_taken[seat] = tricks;
        scores[seat] = result.score;

        let player = &mut state.players[seat];
        player.round_scores.push(result.score);
        player.total_score += result.score;
        player.spoiled |= !result.took_own;
        player.took_all_in_pulka |= result.took_all;
        player.perfect_pass_in_pulka |= scoring::is_perfect_pass(bet, tricks);
        if result.shtanga {
            player.shtangas += 1;
        }
        player.joker_counts.push(state.joker_counts_this_round[seat]);
    }

    let trump = state.trump.unwrap_or(Trump::NoTrump);
    state.history.push(RoundRecord {
        round: state.round,
        pulka: state.pulka,
        cards_per_player: state.cards_per_player,
        trump,
        bets,
        tricks: tricks_taken,
        scores,
        joker_counts: state.joker_counts_this_round,
    });
    debug!(round = state.round, ?scores, "round scored");

    if rules::is_last_round_of_pulka(state.round) {
        state.phase = Phase::PulkaComplete;
        Ok(())
    } else {
        state.round += 1;
        state.dealer = next_seat(state.dealer);
        deal_round(state)
    }
}

/// Compute and apply pulka premiums; the phase stays `PulkaComplete` for
/// the recap window.
pub fn complete_pulka(state: &mut GameState) -> Result<(), DomainError> {
    require_phase(state, Phase::PulkaComplete, "complete_pulka")?;

    let pulka_rounds: Vec<RoundRecord> = state
        .history
        .iter()
        .filter(|r| r.pulka == state.pulka)
        .cloned()
        .collect();
    let clean: [bool; PLAYERS] = std::array::from_fn(|i| !state.players[i].spoiled);
    let amount = scoring::premium_amount(&pulka_rounds);
    let result = scoring::pulka_premiums(clean, amount);

    for (seat, player) in state.players.iter_mut().enumerate() {
        player.total_score += result.deltas[seat];
        player.pulka_scores.push(player.total_score);
    }

    state.last_pulka_results = Some(PulkaResults {
        pulka: state.pulka,
        highest_round_score: result.amount,
        premiums: result.premiums,
        deltas: result.deltas,
    });
    debug!(pulka = state.pulka, amount, deltas = ?result.deltas, "pulka premiums applied");
    Ok(())
}

/// Leave the recap: deal the next pulka's first round, or finish the game
/// after round 24.
pub fn advance_after_pulka(state: &mut GameState) -> Result<(), DomainError> {
    require_phase(state, Phase::PulkaComplete, "advance_after_pulka")?;

    if state.round >= rules::TOTAL_ROUNDS {
        state.phase = Phase::Finished;
        return Ok(());
    }

    state.round += 1;
    state.dealer = next_seat(state.dealer);
    for player in state.players.iter_mut() {
        player.spoiled = false;
        player.took_all_in_pulka = false;
        player.perfect_pass_in_pulka = false;
    }
    deal_round(state)
}

/// Ranked results of a finished game.
pub fn final_results(state: &GameState) -> Result<Vec<scoring::Ranking>, DomainError> {
    require_phase(state, Phase::Finished, "final results")?;
    Ok(scoring::final_rankings(&state.players))
}

/// Card conservation: during a round, the hands, held-back partial-deal
/// cards, and cards played so far must account for exactly
/// `4 × cards_per_player` distinct cards.
pub fn verify_card_conservation(state: &GameState) -> Result<(), DomainError> {
    let in_round = matches!(
        state.phase,
        Phase::TrumpSelection | Phase::Betting | Phase::Playing | Phase::TrickComplete
    );
    if !in_round {
        return Ok(());
    }

    let in_hands: usize = state.players.iter().map(|p| p.hand.len()).sum();
    let pending: usize = state
        .trump_selection
        .as_ref()
        .map_or(0, |ts| ts.pending_hands.iter().map(Vec::len).sum());
    let played = state
        .plays
        .iter()
        .filter(|p| p.round == state.round)
        .count();

    let expected = PLAYERS * state.cards_per_player as usize;
    let actual = in_hands + pending + played;
    if actual != expected {
        return Err(DomainError::invariant(format!(
            "Card conservation violated in round {}: {actual} cards accounted for, expected {expected}",
            state.round
        )));
    }
    if state.table.len() > PLAYERS {
        return Err(DomainError::invariant("More than four cards on the table"));
    }
    Ok(())
}
