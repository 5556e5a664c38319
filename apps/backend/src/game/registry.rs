//! Room registry and matchmaking queue.
//!
//! Rooms are independent actors; the registry only maps ids to addresses
//! and holds the pre-game queue. No game state lives here.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use actix::prelude::*;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::domain::rules::PLAYERS;
use crate::domain::state::Player;
use crate::game::room::{Attach, GameRoom, Outbound};
use crate::ws::protocol::ServerMsg;

#[derive(Clone)]
pub struct QueuedPlayer {
    pub id: Uuid,
    pub name: String,
    pub recipient: Recipient<Outbound>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindGameOutcome {
    AlreadyInGame,
    Queued,
    Started,
}

pub struct RoomRegistry {
    config: EngineConfig,
    rooms: DashMap<Uuid, Addr<GameRoom>>,
    seats: DashMap<Uuid, Uuid>,
    queue: Mutex<Vec<QueuedPlayer>>,
    /// Bumped whenever the pending bot-fill deadline becomes stale.
    queue_generation: AtomicU64,
}

impl RoomRegistry {
    pub fn new(config: EngineConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            rooms: DashMap::new(),
            seats: DashMap::new(),
            queue: Mutex::new(Vec::new()),
            queue_generation: AtomicU64::new(0),
        })
    }

    pub fn queue_len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn room_by_id(&self, room_id: Uuid) -> Option<Addr<GameRoom>> {
        self.rooms.get(&room_id).map(|r| r.value().clone())
    }

    pub fn room_of(&self, player_id: Uuid) -> Option<Addr<GameRoom>> {
        let room_id = *self.seats.get(&player_id)?.value();
        self.room_by_id(room_id)
    }

    /// Enqueue a player, starting a room once four are waiting. A lone
    /// queued player arms the bot-fill deadline.
    pub fn find_game(
        self: Arc<Self>,
        player_id: Uuid,
        name: String,
        recipient: Recipient<Outbound>,
    ) -> FindGameOutcome {
        if let Some(room) = self.room_of(player_id) {
            // Rejoining an in-progress game re-enters at the same turn.
            room.do_send(Attach {
                player_id,
                recipient,
            });
            return FindGameOutcome::AlreadyInGame;
        }

        let ready = {
            let mut queue = self.queue.lock();
            match queue.iter_mut().find(|q| q.id == player_id) {
                Some(existing) => existing.recipient = recipient,
                None => queue.push(QueuedPlayer {
                    id: player_id,
                    name,
                    recipient,
                }),
            }
            if queue.len() >= PLAYERS {
                Some(queue.drain(..PLAYERS).collect::<Vec<_>>())
            } else {
                None
            }
        };

        match ready {
            Some(humans) => {
                self.queue_generation.fetch_add(1, Ordering::SeqCst);
                self.start_room(humans);
                FindGameOutcome::Started
            }
            None => {
                self.notify_queue();
                if self.queue_len() == 1 {
                    self.arm_bot_fill();
                }
                FindGameOutcome::Queued
            }
        }
    }

    pub fn leave_queue(&self, player_id: Uuid) {
        {
            let mut queue = self.queue.lock();
            queue.retain(|q| q.id != player_id);
            if queue.is_empty() {
                self.queue_generation.fetch_add(1, Ordering::SeqCst);
            }
        }
        self.notify_queue();
    }

    pub fn remove_room(&self, room_id: Uuid, player_ids: &[Uuid]) {
        self.rooms.remove(&room_id);
        for player_id in player_ids {
            self.seats.remove(player_id);
        }
        info!(%room_id, "room removed from registry");
    }

    fn notify_queue(&self) {
        let queue = self.queue.lock();
        let current = queue.len();
        for queued in queue.iter() {
            queued.recipient.do_send(Outbound(ServerMsg::Queued {
                current,
                required: PLAYERS,
            }));
        }
    }

    /// After the matchmaking window, whoever is still waiting plays with
    /// bots rather than waiting forever.
    fn arm_bot_fill(self: Arc<Self>) {
        let generation = self.queue_generation.load(Ordering::SeqCst);
        let timeout = self.config.matchmaking_timeout;
        actix::spawn(async move {
            tokio::time::sleep(timeout).await;
            if self.queue_generation.load(Ordering::SeqCst) != generation {
                return;
            }
            let humans: Vec<QueuedPlayer> = {
                let mut queue = self.queue.lock();
                queue.drain(..).collect()
            };
            if humans.is_empty() {
                return;
            }
            self.queue_generation.fetch_add(1, Ordering::SeqCst);
            info!(humans = humans.len(), "matchmaking window closed, filling with bots");
            self.start_room(humans);
        });
    }

    fn start_room(self: Arc<Self>, humans: Vec<QueuedPlayer>) {
        let room_id = Uuid::new_v4();
        let mut sessions = std::collections::HashMap::new();
        for queued in &humans {
            sessions.insert(queued.id, queued.recipient.clone());
        }

        let players: [Player; PLAYERS] = std::array::from_fn(|i| match humans.get(i) {
            Some(queued) => Player::human(queued.id, queued.name.clone()),
            None => Player::bot(Uuid::new_v4(), format!("Bot {}", i + 1)),
        });

        for player in &players {
            self.seats.insert(player.id, room_id);
        }

        let seed: u64 = rand::random();
        let room = GameRoom::new(
            room_id,
            self.config.clone(),
            Arc::clone(&self),
            players,
            sessions,
            seed,
        )
        .start();
        self.rooms.insert(room_id, room);
        info!(%room_id, humans = humans.len(), "room created");
    }
}
