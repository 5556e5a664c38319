#![allow(dead_code)]

use joker_backend::domain::cards::TrumpDecision;
use joker_backend::domain::engine;
use joker_backend::domain::state::{GameState, Phase, Player, PulkaResults};
use joker_backend::game::bot;
use proptest::prelude::ProptestConfig;
use uuid::Uuid;

#[ctor::ctor]
fn init_logging() {
    let filter = std::env::var("TEST_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .map(tracing_subscriber::EnvFilter::new)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .without_time()
        .try_init()
        .ok();
}

/// Proptest config from the environment; low default for fast CI.
pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(16);

    ProptestConfig {
        cases,
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

pub fn fresh_state(seed: u64) -> GameState {
    let players = std::array::from_fn(|i| Player::human(Uuid::new_v4(), format!("p{i}")));
    GameState::new(players, seed)
}

/// Tuzovanie plus the round-1 deal, with any trump selection resolved the
/// way a timeout would (no-trump), landing in the betting phase.
pub fn state_in_round_one_betting(seed: u64) -> GameState {
    let mut state = fresh_state(seed);
    engine::run_tuzovanie(&mut state).unwrap();
    engine::start_round(&mut state).unwrap();
    if state.phase == Phase::TrumpSelection {
        let chooser = state.turn;
        engine::select_trump(&mut state, chooser, TrumpDecision::NoTrump).unwrap();
    }
    assert_eq!(state.phase, Phase::Betting);
    state
}

/// Apply one conservative action for the current phase, exactly as the
/// room does for bot seats and turn timeouts.
pub fn step_conservatively(state: &mut GameState, pulka_results: &mut Vec<PulkaResults>) -> bool {
    match state.phase {
        Phase::TrumpSelection => {
            let chooser = state.turn;
            let decision = bot::conservative_trump(state, chooser);
            engine::select_trump(state, chooser, decision).unwrap();
        }
        Phase::Betting => {
            let seat = state.turn;
            let amount = bot::conservative_bet(state, seat);
            engine::make_bet(state, seat, amount).unwrap();
        }
        Phase::Playing => {
            let seat = state.turn;
            let play = bot::conservative_play(state, seat).expect("a legal card must exist");
            engine::play_card(
                state,
                seat,
                &play.card.id(),
                play.joker_option,
                play.requested_suit,
            )
            .unwrap();
        }
        Phase::TrickComplete => {
            engine::complete_trick(state).unwrap();
        }
        Phase::RoundComplete => {
            engine::score_round(state).unwrap();
        }
        Phase::PulkaComplete => {
            engine::complete_pulka(state).unwrap();
            pulka_results.push(state.last_pulka_results.clone().unwrap());
            engine::advance_after_pulka(state).unwrap();
        }
        Phase::Finished => return false,
        Phase::Waiting => panic!("cannot step a waiting room"),
    }
    true
}

/// Play a complete 24-round game under the conservative policy.
pub fn drive_full_game(seed: u64) -> (GameState, Vec<PulkaResults>) {
    let mut state = fresh_state(seed);
    engine::run_tuzovanie(&mut state).unwrap();
    engine::start_round(&mut state).unwrap();

    let mut pulka_results = Vec::new();
    // A full game takes well under 2000 steps; a bound catches loops.
    for _ in 0..4000 {
        engine::verify_card_conservation(&state).unwrap();
        if !step_conservatively(&mut state, &mut pulka_results) {
            return (state, pulka_results);
        }
    }
    panic!("game did not finish; stuck in phase {:?}", state.phase);
}
