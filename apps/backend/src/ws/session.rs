use std::sync::Arc;
use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use futures_util::stream::select_all;
use serde::Deserialize;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::services::games::GameService;
use crate::state::app_state::AppState;
use crate::ws::hub::BroadcastHub;
use crate::ws::protocol::{ClientMsg, Envelope, ServerNotice, Topic};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(40);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuery {
    /// Only forward envelopes for this game when set.
    pub game_id: Option<String>,
}

/// GET /api/ws
pub async fn upgrade(
    req: HttpRequest,
    stream: web::Payload,
    query: web::Query<SessionQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let session = WsSession::new(
        app_state.hub.clone(),
        app_state.service.clone(),
        query.into_inner().game_id,
    );
    ws::start(session, &req, stream)
}

/// Bridges one WebSocket connection onto the broadcast hub.
pub struct WsSession {
    conn_id: Uuid,
    hub: Arc<BroadcastHub>,
    service: GameService,
    game_filter: Option<String>,
    subscriptions: Vec<(Topic, Uuid)>,
    last_heartbeat: Instant,
}

impl WsSession {
    fn new(hub: Arc<BroadcastHub>, service: GameService, game_filter: Option<String>) -> Self {
        Self {
            conn_id: Uuid::new_v4(),
            hub,
            service,
            game_filter,
            subscriptions: Vec::new(),
            last_heartbeat: Instant::now(),
        }
    }

    fn send_json<T: serde::Serialize>(ctx: &mut ws::WebsocketContext<Self>, msg: &T) {
        match serde_json::to_string(msg) {
            Ok(payload) => ctx.text(payload),
            Err(err) => warn!(error = %err, "[WS SESSION] failed to serialize outbound frame"),
        }
    }

    fn send_error(ctx: &mut ws::WebsocketContext<Self>, code: &str, message: impl Into<String>) {
        Self::send_json(
            ctx,
            &ServerNotice::Error {
                code: code.to_string(),
                message: message.into(),
            },
        );
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

    fn handle_client_msg(&mut self, msg: ClientMsg, ctx: &mut ws::WebsocketContext<Self>) {
        match msg {
            ClientMsg::Ping => Self::send_json(ctx, &ServerNotice::Pong),
            ClientMsg::Publish {
                envelope: Envelope::UpdateRound(signal),
            } => {
                let service = self.service.clone();
                let conn_id = self.conn_id;
                ctx.spawn(
                    async move { service.signal_round(&signal.game_id).await }
                        .into_actor(self)
                        .map(move |res, _actor, ctx| {
                            if let Err(err) = res {
                                warn!(conn_id = %conn_id, error = %err, "[WS SESSION] round signal rejected");
                                Self::send_error(ctx, "rejected", err.to_string());
                            }
                        }),
                );
            }
            ClientMsg::Publish { envelope } => {
                // Snapshots are only ever published by the server after a commit.
                Self::send_error(
                    ctx,
                    "forbidden_topic",
                    format!("clients may not publish on {}", envelope.topic().as_str()),
                );
            }
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let mut streams = Vec::with_capacity(Topic::ALL.len());
        for topic in Topic::ALL {
            let sub = self.hub.subscribe(topic);
            self.subscriptions.push((topic, sub.id));
            streams.push(UnboundedReceiverStream::new(sub.receiver));
        }
        ctx.add_stream(select_all(streams));

        info!(
            conn_id = %self.conn_id,
            game_filter = ?self.game_filter,
            "[WS SESSION] started"
        );
        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        for (topic, id) in self.subscriptions.drain(..) {
            self.hub.unsubscribe(topic, id);
        }
        info!(conn_id = %self.conn_id, "[WS SESSION] stopped");
    }
}

impl StreamHandler<Envelope> for WsSession {
    fn handle(&mut self, envelope: Envelope, ctx: &mut Self::Context) {
        if let Some(game_id) = &self.game_filter {
            if envelope.game_id() != game_id {
                return;
            }
        }
        Self::send_json(ctx, &envelope);
    }

    // The hub stream only ends when the hub drops us; keep the socket alive.
    fn finished(&mut self, _ctx: &mut Self::Context) {}
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
                    Err(_) => Self::send_error(ctx, "bad_request", "Malformed JSON"),
                }
            }
            Ok(ws::Message::Binary(_)) => {
                Self::send_error(ctx, "bad_request", "Binary frames are not supported");
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
