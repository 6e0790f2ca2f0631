//! One WebSocket session per connected client.
//!
//! The handshake verifies the bearer token before the upgrade completes; a connection that
//! cannot authenticate never joins a room and never receives an event. After the upgrade the
//! session task pumps three things: frames from the registry out to the socket, client frames
//! into the messaging API, and the heartbeat.
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use actix_web::{web, HttpRequest, HttpResponse};
use actix_ws::Message;
use futures::StreamExt;
use log::*;
use serde::Deserialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use wash_engine::{MessagingApi, MessagingDatabase};

use super::{job_room, user_room, ClientFrame, MulticastRegistry, ServerFrame};
use crate::{
    auth::{bearer_token, JwtClaims, TokenVerifier},
    errors::{AuthError, ServerError},
};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Deserialize)]
pub struct WsAuthQuery {
    #[serde(default)]
    token: Option<String>,
}

/// `GET /ws` — authenticate and upgrade.
///
/// The token comes from the `Authorization` header or, because browsers cannot set headers on
/// WebSocket upgrades, from the `token` query parameter. Invalid or missing tokens are rejected
/// here, before any room membership or event delivery exists.
pub async fn ws_handshake<B>(
    req: HttpRequest,
    stream: web::Payload,
    query: web::Query<WsAuthQuery>,
    verifier: web::Data<TokenVerifier>,
    registry: web::Data<MulticastRegistry>,
    messaging: web::Data<MessagingApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: MessagingDatabase + 'static,
{
    let token = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_string)
        .or_else(|| query.into_inner().token)
        .ok_or(ServerError::AuthenticationError(AuthError::MissingToken))?;
    let claims = verifier.verify(&token).map_err(ServerError::AuthenticationError)?;

    let (response, session, msg_stream) =
        actix_ws::handle(&req, stream).map_err(|e| ServerError::Unspecified(e.to_string()))?;

    let registry = registry.into_inner();
    let conn_id = registry.new_connection();
    let (tx, rx) = mpsc::unbounded_channel();
    registry.join(&user_room(claims.sub), conn_id, tx.clone()).await;
    info!("📡️ {} #{} connected to the gateway (conn {conn_id})", claims.role, claims.sub);

    actix_web::rt::spawn(run_session(session, msg_stream, rx, tx, registry, conn_id, claims, messaging.into_inner()));
    Ok(response)
}

#[allow(clippy::too_many_arguments)]
async fn run_session<B>(
    mut session: actix_ws::Session,
    mut msg_stream: actix_ws::MessageStream,
    mut events: UnboundedReceiver<ServerFrame>,
    sender: UnboundedSender<ServerFrame>,
    registry: Arc<MulticastRegistry>,
    conn_id: u64,
    claims: JwtClaims,
    messaging: Arc<MessagingApi<B>>,
) where
    B: MessagingDatabase,
{
    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    let mut last_seen = Instant::now();

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                if Instant::now().duration_since(last_seen) > CLIENT_TIMEOUT {
                    debug!("📡️ Connection {conn_id} missed its heartbeat, dropping");
                    break;
                }
                if session.ping(b"").await.is_err() {
                    break;
                }
            },
            Some(frame) = events.recv() => {
                match serde_json::to_string(&frame) {
                    Ok(json) => {
                        if session.text(json).await.is_err() {
                            break;
                        }
                    },
                    Err(e) => error!("📡️ Could not serialize frame for connection {conn_id}: {e}"),
                }
            },
            msg = msg_stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        last_seen = Instant::now();
                        handle_client_frame(&text, &sender, &registry, conn_id, &claims, &messaging).await;
                    },
                    Some(Ok(Message::Ping(bytes))) => {
                        last_seen = Instant::now();
                        if session.pong(&bytes).await.is_err() {
                            break;
                        }
                    },
                    Some(Ok(Message::Pong(_))) => {
                        last_seen = Instant::now();
                    },
                    Some(Ok(Message::Close(reason))) => {
                        debug!("📡️ Connection {conn_id} closed by client: {reason:?}");
                        break;
                    },
                    Some(Ok(_)) => {},
                    Some(Err(e)) => {
                        debug!("📡️ Protocol error on connection {conn_id}: {e}");
                        break;
                    },
                    None => break,
                }
            },
        }
    }

    registry.leave_all(conn_id).await;
    let _ = session.close(None).await;
    info!("📡️ Connection {conn_id} disconnected");
}

async fn handle_client_frame<B>(
    text: &str,
    sender: &UnboundedSender<ServerFrame>,
    registry: &Arc<MulticastRegistry>,
    conn_id: u64,
    claims: &JwtClaims,
    messaging: &Arc<MessagingApi<B>>,
) where
    B: MessagingDatabase,
{
    let frame = match serde_json::from_str::<ClientFrame>(text) {
        Ok(frame) => frame,
        Err(e) => {
            debug!("📡️ Unparseable frame from connection {conn_id}: {e}");
            let _ = sender.send(ServerFrame::Error { message: format!("Unparseable frame: {e}") });
            return;
        },
    };
    match frame {
        ClientFrame::SendMessage { to, content } => {
            // The messaging API persists first and then fans out; the sender's own echo arrives
            // through the registry like any other event.
            if let Err(e) = messaging.send_message(claims.sub, claims.role, to, content).await {
                debug!("📡️ Could not send message from #{}: {e}", claims.sub);
                let _ = sender.send(ServerFrame::Error { message: e.to_string() });
            }
        },
        ClientFrame::JoinJob { reservation_id } => {
            registry.join(&job_room(reservation_id), conn_id, sender.clone()).await;
        },
        ClientFrame::Ping => {
            let _ = sender.send(ServerFrame::Pong);
        },
    }
}
