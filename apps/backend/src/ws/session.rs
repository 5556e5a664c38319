//! Per-connection websocket actor: heartbeat, intent forwarding, and
//! delivery of room broadcasts.

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use tracing::{info, warn};
use uuid::Uuid;

use crate::game::registry::RoomRegistry;
use crate::game::room::{Detach, Intent, Leave, Outbound, SubmitIntent};
use crate::ws::protocol::{ClientMsg, ServerMsg, PROTOCOL_VERSION};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(40);

pub async fn upgrade(
    req: HttpRequest,
    stream: web::Payload,
    registry: web::Data<RoomRegistry>,
) -> Result<HttpResponse, Error> {
    let session = WsSession::new(Uuid::new_v4(), registry.into_inner());
    ws::start(session, &req, stream)
}

pub struct WsSession {
    conn_id: Uuid,
    registry: Arc<RoomRegistry>,
    player_id: Option<Uuid>,
    name: String,
    last_heartbeat: Instant,
    hello_done: bool,
}

impl WsSession {
    fn new(conn_id: Uuid, registry: Arc<RoomRegistry>) -> Self {
        Self {
            conn_id,
            registry,
            player_id: None,
            name: String::new(),
            last_heartbeat: Instant::now(),
            hello_done: false,
        }
    }

    fn send_json(ctx: &mut ws::WebsocketContext<Self>, msg: &ServerMsg) {
        match serde_json::to_string(msg) {
            Ok(payload) => ctx.text(payload),
            Err(err) => warn!(error = %err, "[WS SESSION] failed to serialize outbound message"),
        }
    }

    fn send_error(
        ctx: &mut ws::WebsocketContext<Self>,
        code: &str,
        message: impl Into<String>,
    ) {
        Self::send_json(
            ctx,
            &ServerMsg::Error {
                code: code.to_string(),
                message: message.into(),
                required_suit: None,
            },
        );
    }

    fn send_error_and_close(
        &self,
        ctx: &mut ws::WebsocketContext<Self>,
        code: &str,
        message: impl Into<String>,
    ) {
        Self::send_error(ctx, code, message);
        ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
        ctx.stop();
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |actor, ctx| {
            if Instant::now().duration_since(actor.last_heartbeat) > CLIENT_TIMEOUT {
                warn!(conn_id = %actor.conn_id, "[WS SESSION] heartbeat timed out");
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
                ctx.stop();
                return;
            }
            ctx.ping(b"keepalive");
        });
    }

    /// Hello must precede anything that touches the registry.
    fn require_player(&self, ctx: &mut ws::WebsocketContext<Self>) -> Option<Uuid> {
        if !self.hello_done {
            self.send_error_and_close(ctx, "BAD_REQUEST", "Must send hello first");
            return None;
        }
        self.player_id
    }

    fn forward_intent(
        &self,
        ctx: &mut ws::WebsocketContext<Self>,
        room_id: Uuid,
        player_id: Uuid,
        intent: Intent,
    ) {
        match self.registry.room_by_id(room_id) {
            Some(room) => room.do_send(SubmitIntent { player_id, intent }),
            None => Self::send_error(ctx, "ROOM_NOT_FOUND", "No such room"),
        }
    }

    fn handle_client_msg(&mut self, msg: ClientMsg, ctx: &mut ws::WebsocketContext<Self>) {
        match msg {
            ClientMsg::Hello {
                protocol,
                player_id,
                name,
            } => {
                if protocol != PROTOCOL_VERSION {
                    self.send_error_and_close(
                        ctx,
                        "BAD_PROTOCOL",
                        "Unsupported protocol version",
                    );
                    return;
                }
                let player_id = player_id.unwrap_or_else(Uuid::new_v4);
                self.player_id = Some(player_id);
                self.name = name.unwrap_or_else(|| "Player".to_string());
                self.hello_done = true;

                Self::send_json(
                    ctx,
                    &ServerMsg::HelloAck {
                        protocol: PROTOCOL_VERSION,
                        player_id,
                    },
                );

                // A returning player re-attaches to their in-flight room.
                if let Some(room) = self.registry.room_of(player_id) {
                    room.do_send(crate::game::room::Attach {
                        player_id,
                        recipient: ctx.address().recipient(),
                    });
                }
            }

            ClientMsg::FindGame => {
                let Some(player_id) = self.require_player(ctx) else {
                    return;
                };
                let outcome = Arc::clone(&self.registry).find_game(
                    player_id,
                    self.name.clone(),
                    ctx.address().recipient(),
                );
                info!(
                    conn_id = %self.conn_id,
                    %player_id,
                    ?outcome,
                    "[WS SESSION] find_game"
                );
            }

            ClientMsg::LeaveQueue => {
                let Some(player_id) = self.require_player(ctx) else {
                    return;
                };
                self.registry.leave_queue(player_id);
            }

            ClientMsg::LeaveGame { room_id } => {
                let Some(player_id) = self.require_player(ctx) else {
                    return;
                };
                match self.registry.room_by_id(room_id) {
                    Some(room) => room.do_send(Leave { player_id }),
                    None => Self::send_error(ctx, "ROOM_NOT_FOUND", "No such room"),
                }
            }

            ClientMsg::MakeBet { room_id, amount } => {
                let Some(player_id) = self.require_player(ctx) else {
                    return;
                };
                self.forward_intent(ctx, room_id, player_id, Intent::MakeBet { amount });
            }

            ClientMsg::ThrowCard {
                room_id,
                card_id,
                joker_option,
                requested_suit,
            } => {
                let Some(player_id) = self.require_player(ctx) else {
                    return;
                };
                self.forward_intent(
                    ctx,
                    room_id,
                    player_id,
                    Intent::ThrowCard {
                        card_id,
                        joker_option,
                        requested_suit,
                    },
                );
            }

            ClientMsg::SelectTrump { room_id, decision } => {
                let Some(player_id) = self.require_player(ctx) else {
                    return;
                };
                self.forward_intent(ctx, room_id, player_id, Intent::SelectTrump { decision });
            }
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(conn_id = %self.conn_id, "[WS SESSION] started");
        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        if let Some(player_id) = self.player_id {
            self.registry.leave_queue(player_id);
            if let Some(room) = self.registry.room_of(player_id) {
                room.do_send(Detach { player_id });
            }
        }
        info!(conn_id = %self.conn_id, "[WS SESSION] stopped");
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&payload);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();
                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(cmd) => self.handle_client_msg(cmd, ctx),
                    Err(_) => {
                        self.send_error_and_close(ctx, "BAD_REQUEST", "Malformed JSON");
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                self.last_heartbeat = Instant::now();
                self.send_error_and_close(ctx, "BAD_REQUEST", "Binary not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {
                self.last_heartbeat = Instant::now();
            }
            Err(err) => {
                warn!(conn_id = %self.conn_id, error = %err, "[WS SESSION] protocol error");
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
                ctx.stop();
            }
        }
    }
}

impl Handler<Outbound> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: Outbound, ctx: &mut Self::Context) -> Self::Result {
        Self::send_json(ctx, &msg.0);
    }
}
