//! Per-room actor: the single writer for one `GameState`.
//!
//! Every intent, timer expiry, and connection event for a room is
//! serialized through this actor's mailbox, so no two mutations race and
//! broadcasts go out in commit order. Timers are `run_later` handles
//! guarded by generation counters: any accepted intent bumps the
//! generation, so a stale timeout can never fire after the seat acted.

use std::collections::HashMap;
use std::sync::Arc;

use actix::prelude::*;
use time::OffsetDateTime;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::domain::cards::{JokerOption, Suit, TrumpDecision};
use crate::domain::engine;
use crate::domain::snapshot;
use crate::domain::state::{GameState, Phase, Player, PulkaResults, Seat};
use crate::errors::domain::{DomainError, ValidationKind};
use crate::game::audit::GameAnalysis;
use crate::game::bot;
use crate::game::registry::RoomRegistry;
use crate::ws::protocol::{SeatInfo, ServerMsg};

pub fn now_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// A server message bound for one connected session.
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct Outbound(pub ServerMsg);

/// A session attached to a seat (first connect or reconnect).
#[derive(Message)]
#[rtype(result = "()")]
pub struct Attach {
    pub player_id: Uuid,
    pub recipient: Recipient<Outbound>,
}

/// The seat's socket went away; starts the reconnect grace window.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Detach {
    pub player_id: Uuid,
}

/// Voluntary leave: the seat becomes a bot immediately.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Leave {
    pub player_id: Uuid,
}

#[derive(Debug, Clone)]
pub enum Intent {
    MakeBet {
        amount: u8,
    },
    ThrowCard {
        card_id: String,
        joker_option: Option<JokerOption>,
        requested_suit: Option<Suit>,
    },
    SelectTrump {
        decision: TrumpDecision,
    },
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct SubmitIntent {
    pub player_id: Uuid,
    pub intent: Intent,
}

pub struct GameRoom {
    id: Uuid,
    config: EngineConfig,
    registry: Arc<RoomRegistry>,
    state: GameState,
    sessions: HashMap<Uuid, Recipient<Outbound>>,
    /// Bumped on every accepted mutation; scheduled closures compare it.
    timer_generation: u64,
    /// Per-seat reconnect windows, same guard scheme.
    reconnect_generation: HashMap<Uuid, u64>,
    pulka_results: Vec<PulkaResults>,
    /// Round whose dealing most recently ran; used to flip reconnected
    /// seats back from bot control at the next hand only.
    last_dealt_round: u8,
}

impl GameRoom {
    pub fn new(
        id: Uuid,
        config: EngineConfig,
        registry: Arc<RoomRegistry>,
        players: [Player; 4],
        sessions: HashMap<Uuid, Recipient<Outbound>>,
        rng_seed: u64,
    ) -> Self {
        Self {
            id,
            config,
            registry,
            state: GameState::new(players, rng_seed),
            sessions,
            timer_generation: 0,
            reconnect_generation: HashMap::new(),
            pulka_results: Vec::new(),
            last_dealt_round: 0,
        }
    }

    fn seat_infos(&self) -> Vec<SeatInfo> {
        self.state
            .players
            .iter()
            .enumerate()
            .map(|(seat, p)| SeatInfo {
                seat: seat as Seat,
                id: p.id,
                name: p.name.clone(),
                is_bot: p.is_bot,
            })
            .collect()
    }

    fn send_to(&self, player_id: Uuid, msg: ServerMsg) {
        if let Some(recipient) = self.sessions.get(&player_id) {
            recipient.do_send(Outbound(msg));
        }
    }

    fn broadcast(&self, msg: ServerMsg) {
        for recipient in self.sessions.values() {
            recipient.do_send(Outbound(msg.clone()));
        }
    }

    /// Push the committed state to every connected seat, each with its own
    /// projection.
    fn broadcast_state(&self) {
        for (seat, player) in self.state.players.iter().enumerate() {
            if let Some(recipient) = self.sessions.get(&player.id) {
                let (state, your_hand) = snapshot::project_for_seat(&self.state, seat as Seat);
                recipient.do_send(Outbound(ServerMsg::GameState {
                    room_id: self.id,
                    state,
                    your_hand,
                }));
            }
        }
    }

    fn send_state_to(&self, player_id: Uuid) {
        if let Some(seat) = self.state.seat_of(player_id) {
            if let Some(recipient) = self.sessions.get(&player_id) {
                let (state, your_hand) = snapshot::project_for_seat(&self.state, seat);
                recipient.do_send(Outbound(ServerMsg::GameState {
                    room_id: self.id,
                    state,
                    your_hand,
                }));
            }
        }
    }

    /// Central post-commit step: rearm timers, broadcast, chase follow-up
    /// transitions (trick sweep, round scoring, pulka recap, finish).
    fn after_mutation(&mut self, ctx: &mut Context<Self>) {
        match self.state.phase {
            Phase::TrickComplete => {
                self.state.turn_deadline_ts = None;
                self.broadcast_state();
                self.schedule_trick_sweep(ctx);
            }
            Phase::RoundComplete => {
                if let Err(err) = engine::score_round(&mut self.state) {
                    self.fail_room(ctx, err);
                    return;
                }
                self.after_mutation(ctx);
            }
            Phase::PulkaComplete => {
                if let Err(err) = engine::complete_pulka(&mut self.state) {
                    self.fail_room(ctx, err);
                    return;
                }
                if let Some(results) = self.state.last_pulka_results.clone() {
                    self.pulka_results.push(results);
                }
                self.state.turn_deadline_ts = None;
                self.broadcast_state();
                self.schedule_pulka_advance(ctx);
            }
            Phase::Finished => self.finish(ctx),
            Phase::TrumpSelection | Phase::Betting | Phase::Playing => {
                self.rehumanize_on_new_deal();
                if self.state.player(self.state.turn).is_bot {
                    // Bots act on their own short delay; no deadline runs.
                    self.timer_generation += 1;
                    self.state.turn_deadline_ts = None;
                    self.broadcast_state();
                    self.schedule_bot_turn(ctx);
                } else {
                    self.arm_turn_timer(ctx);
                    self.broadcast_state();
                    self.emit_turn_timer();
                }
            }
            Phase::Waiting => {}
        }
    }

    /// A seat replaced by a bot reverts to its human only when the next
    /// hand is dealt, and only if that human has reconnected by then.
    fn rehumanize_on_new_deal(&mut self) {
        if self.state.round == self.last_dealt_round {
            return;
        }
        self.last_dealt_round = self.state.round;
        for player in self.state.players.iter_mut() {
            if player.is_bot && player.connected && self.sessions.contains_key(&player.id) {
                info!(room_id = %self.id, player_id = %player.id, "seat returned to human control");
                player.is_bot = false;
            }
        }
    }

    fn turn_timeout_for_phase(&self) -> std::time::Duration {
        if self.state.phase == Phase::TrumpSelection {
            self.config.trump_selection_timeout
        } else {
            self.config.turn_timeout
        }
    }

    fn arm_turn_timer(&mut self, ctx: &mut Context<Self>) {
        self.timer_generation += 1;
        let generation = self.timer_generation;
        let timeout = self.turn_timeout_for_phase();
        let deadline = now_ms() + timeout.as_millis() as i64;

        self.state.turn_deadline_ts = Some(deadline);
        if let Some(selection) = self.state.trump_selection.as_mut() {
            selection.deadline_ts = Some(deadline);
        }

        ctx.run_later(timeout, move |room, ctx| {
            if room.timer_generation == generation {
                room.handle_turn_timeout(ctx);
            }
        });
    }

    fn emit_turn_timer(&self) {
        let seat = self.state.turn;
        if let Some(deadline) = self.state.turn_deadline_ts {
            self.broadcast(ServerMsg::TurnTimerStarted {
                room_id: self.id,
                seat,
                player_id: self.state.player(seat).id,
                expires_at: deadline,
            });
        }
    }

    fn schedule_bot_turn(&mut self, ctx: &mut Context<Self>) {
        let generation = self.timer_generation;
        ctx.run_later(self.config.bot_turn_delay, move |room, ctx| {
            if room.timer_generation == generation {
                room.auto_action(ctx, false);
            }
        });
    }

    fn schedule_trick_sweep(&mut self, ctx: &mut Context<Self>) {
        self.timer_generation += 1;
        let generation = self.timer_generation;
        ctx.run_later(self.config.trick_recap_timeout, move |room, ctx| {
            if room.timer_generation != generation {
                return;
            }
            match engine::complete_trick(&mut room.state) {
                Ok(_) => room.after_mutation(ctx),
                Err(err) => room.fail_room(ctx, err),
            }
        });
    }

    fn schedule_pulka_advance(&mut self, ctx: &mut Context<Self>) {
        self.timer_generation += 1;
        let generation = self.timer_generation;
        let expires_at = now_ms() + self.config.pulka_recap_timeout.as_millis() as i64;
        self.broadcast(ServerMsg::PulkaRecapStarted {
            room_id: self.id,
            expires_at,
        });
        ctx.run_later(self.config.pulka_recap_timeout, move |room, ctx| {
            if room.timer_generation != generation {
                return;
            }
            match engine::advance_after_pulka(&mut room.state) {
                Ok(()) => room.after_mutation(ctx),
                Err(err) => room.fail_room(ctx, err),
            }
        });
    }

    fn handle_turn_timeout(&mut self, ctx: &mut Context<Self>) {
        warn!(
            room_id = %self.id,
            seat = self.state.turn,
            phase = ?self.state.phase,
            "turn timer expired, applying auto-action"
        );
        self.auto_action(ctx, true);
    }

    /// Deterministic action for the current seat: smallest legal bet, first
    /// legal card, and on a trump-selection timeout always no-trump so the
    /// redeal budget stays untouched.
    fn auto_action(&mut self, ctx: &mut Context<Self>, timed_out: bool) {
        let seat = self.state.turn;
        let result = match self.state.phase {
            Phase::Betting => {
                let amount = bot::conservative_bet(&self.state, seat);
                engine::make_bet(&mut self.state, seat, amount)
            }
            Phase::Playing => match bot::conservative_play(&self.state, seat) {
                Some(play) => engine::play_card(
                    &mut self.state,
                    seat,
                    &play.card.id(),
                    play.joker_option,
                    play.requested_suit,
                )
                .map(|_| ()),
                None => Err(DomainError::invariant("No legal card for auto-play")),
            },
            Phase::TrumpSelection => {
                let decision = if timed_out {
                    TrumpDecision::NoTrump
                } else {
                    bot::conservative_trump(&self.state, seat)
                };
                engine::select_trump(&mut self.state, seat, decision)
            }
            _ => return,
        };

        match result {
            Ok(()) => self.after_mutation(ctx),
            // The conservative policy only submits validator-approved
            // actions; any rejection here is a bug worth killing the room.
            Err(err) => self.fail_room(ctx, err),
        }
    }

    fn apply_intent(&mut self, seat: Seat, intent: Intent) -> Result<(), DomainError> {
        match intent {
            Intent::MakeBet { amount } => engine::make_bet(&mut self.state, seat, amount),
            Intent::ThrowCard {
                card_id,
                joker_option,
                requested_suit,
            } => engine::play_card(&mut self.state, seat, &card_id, joker_option, requested_suit)
                .map(|_| ()),
            Intent::SelectTrump { decision } => {
                engine::select_trump(&mut self.state, seat, decision)
            }
        }
    }

    fn convert_to_bot(&mut self, ctx: &mut Context<Self>, player_id: Uuid) {
        let Some(seat) = self.state.seat_of(player_id) else {
            return;
        };
        let player = self.state.player_mut(seat);
        if player.is_bot {
            return;
        }
        player.is_bot = true;
        player.connected = false;
        let name = player.name.clone();
        info!(room_id = %self.id, %player_id, seat, "seat handed to bot control");

        self.broadcast(ServerMsg::PlayerReplaced {
            room_id: self.id,
            seat,
            player_id,
            name,
        });
        self.broadcast_state();

        if self.state.players.iter().all(|p| p.is_bot) {
            info!(room_id = %self.id, "no humans left, tearing room down");
            self.teardown(ctx);
            return;
        }
        let actionable = matches!(
            self.state.phase,
            Phase::TrumpSelection | Phase::Betting | Phase::Playing
        );
        if actionable && self.state.turn == seat {
            // Invalidate the human's deadline; the bot takes over the turn.
            self.timer_generation += 1;
            self.state.turn_deadline_ts = None;
            self.schedule_bot_turn(ctx);
        }
    }

    fn finish(&mut self, ctx: &mut Context<Self>) {
        let rankings = match engine::final_results(&self.state) {
            Ok(rankings) => rankings,
            Err(err) => {
                self.fail_room(ctx, err);
                return;
            }
        };

        self.broadcast_state();
        self.broadcast(ServerMsg::GameFinished {
            room_id: self.id,
            rankings: rankings.clone(),
        });

        match GameAnalysis::build(
            self.id,
            &self.state,
            rankings,
            self.pulka_results.clone(),
            now_ms(),
        )
        .and_then(|a| a.to_json())
        {
            Ok(json) => info!(room_id = %self.id, analysis = %json, "game archived"),
            Err(err) => error!(room_id = %self.id, error = %err, "analysis export failed"),
        }

        self.teardown(ctx);
    }

    /// An invariant violation is fatal for this room only: log it, notify
    /// every seat, and terminate. History is never rewritten to cover it.
    fn fail_room(&mut self, ctx: &mut Context<Self>, err: DomainError) {
        error!(room_id = %self.id, error = %err, "room failed");
        self.broadcast(ServerMsg::from_domain_error(&err));
        self.teardown(ctx);
    }

    fn teardown(&mut self, ctx: &mut Context<Self>) {
        self.timer_generation += 1;
        let player_ids: Vec<Uuid> = self.state.players.iter().map(|p| p.id).collect();
        self.registry.remove_room(self.id, &player_ids);
        ctx.stop();
    }
}

impl Actor for GameRoom {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(room_id = %self.id, "room started");

        let tuzovanie = match engine::run_tuzovanie(&mut self.state) {
            Ok(t) => t,
            Err(err) => {
                self.fail_room(ctx, err);
                return;
            }
        };

        self.broadcast(ServerMsg::TuzovanieStarted {
            room_id: self.id,
            deal_sequence: tuzovanie.sequence.clone(),
            dealer_index: tuzovanie.dealer,
            players: self.seat_infos(),
        });

        // Let clients animate the deal before round 1 appears.
        let recap = self.config.tuzovanie_card_delay * tuzovanie.sequence.len() as u32
            + std::time::Duration::from_secs(2);
        self.timer_generation += 1;
        let generation = self.timer_generation;
        ctx.run_later(recap, move |room, ctx| {
            if room.timer_generation != generation {
                return;
            }
            match engine::start_round(&mut room.state) {
                Ok(()) => {
                    room.broadcast(ServerMsg::GameStarted { room_id: room.id });
                    room.after_mutation(ctx);
                }
                Err(err) => room.fail_room(ctx, err),
            }
        });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        info!(room_id = %self.id, "room stopped");
    }
}

impl Handler<SubmitIntent> for GameRoom {
    type Result = ();

    fn handle(&mut self, msg: SubmitIntent, ctx: &mut Self::Context) {
        let Some(seat) = self.state.seat_of(msg.player_id) else {
            self.send_to(
                msg.player_id,
                ServerMsg::from_domain_error(&DomainError::validation(
                    ValidationKind::SeatNotFound,
                    "Player is not seated in this room",
                )),
            );
            return;
        };

        match self.apply_intent(seat, msg.intent) {
            Ok(()) => {
                // Accepted: cancel the pending deadline before anything else.
                self.timer_generation += 1;
                self.after_mutation(ctx);
            }
            Err(err) if err.is_fatal() => self.fail_room(ctx, err),
            Err(err) => self.send_to(msg.player_id, ServerMsg::from_domain_error(&err)),
        }
    }
}

impl Handler<Attach> for GameRoom {
    type Result = ();

    fn handle(&mut self, msg: Attach, _ctx: &mut Self::Context) {
        let Some(seat) = self.state.seat_of(msg.player_id) else {
            return;
        };
        self.sessions.insert(msg.player_id, msg.recipient);
        // Cancel any pending bot conversion for this seat.
        *self
            .reconnect_generation
            .entry(msg.player_id)
            .or_default() += 1;
        self.state.player_mut(seat).connected = true;
        info!(room_id = %self.id, player_id = %msg.player_id, seat, "session attached");

        // Rejoining lands at the exact same phase and turn.
        self.send_state_to(msg.player_id);
    }
}

impl Handler<Detach> for GameRoom {
    type Result = ();

    fn handle(&mut self, msg: Detach, ctx: &mut Self::Context) {
        let Some(seat) = self.state.seat_of(msg.player_id) else {
            return;
        };
        self.sessions.remove(&msg.player_id);
        self.state.player_mut(seat).connected = false;
        if self.state.player(seat).is_bot {
            return;
        }

        let entry = self.reconnect_generation.entry(msg.player_id).or_default();
        *entry += 1;
        let generation = *entry;
        let player_id = msg.player_id;
        info!(room_id = %self.id, %player_id, seat, "session detached, grace window armed");

        ctx.run_later(self.config.reconnect_timeout, move |room, ctx| {
            let current = room
                .reconnect_generation
                .get(&player_id)
                .copied()
                .unwrap_or(0);
            if current == generation {
                room.convert_to_bot(ctx, player_id);
            }
        });
    }
}

impl Handler<Leave> for GameRoom {
    type Result = ();

    fn handle(&mut self, msg: Leave, ctx: &mut Self::Context) {
        self.sessions.remove(&msg.player_id);
        *self
            .reconnect_generation
            .entry(msg.player_id)
            .or_default() += 1;
        self.convert_to_bot(ctx, msg.player_id);
    }
}
