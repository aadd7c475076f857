// WebSocket push channel: one connection per player per match, pushing a fresh
// filtered state after every resolution or handshake change.

use crate::domain::errors::MatchError;
use crate::interface_adapters::handlers::verify;
use crate::interface_adapters::http::match_error;
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{MatchEvent, PlayerId};

use axum::{
    extract::{
        Path, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::{
    Sink, SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::timeout;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

type WsSender = SplitSink<WebSocket, Message>;
type WsReceiver = SplitStream<WebSocket>;

const MAX_INVALID_JSON: u32 = 10;
const MAX_SESSION_TOKEN_LEN: usize = 4096;
const JOIN_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    #[allow(dead_code)]
    Match(MatchError),
    JoinRequired,
    JoinTimeout,
    AuthVerify,
    ClosedBeforeJoin,
    InitialStateUnavailable,
    EventsClosed,
}

enum LoopControl {
    Continue,
    Disconnect,
}

struct ConnCtx {
    pub player_id: PlayerId,
    pub match_id: String,
    pub events_rx: broadcast::Receiver<MatchEvent>,

    pub msgs_in: u64,
    pub msgs_out: u64,
    pub invalid_json: u32,

    pub close_frame: Option<CloseFrame>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(match_id): Path<String>,
) -> impl IntoResponse {
    // Unknown matches get the JSON error schema instead of an upgrade.
    if let Err(err) = state.registry.get_match(&match_id).await {
        return match_error(err).into_response();
    }

    ws.on_upgrade(move |socket| {
        let conn_id = Uuid::new_v4();
        let span = info_span!("conn", %conn_id, %match_id, player_id = tracing::field::Empty);
        handle_socket(socket, state, match_id).instrument(span)
    })
}

async fn handle_socket(socket: WebSocket, state: AppState, match_id: String) {
    let (mut sender, mut receiver) = socket.split();

    let mut ctx = match bootstrap_connection(&mut sender, &mut receiver, &state, match_id).await {
        Ok(ctx) => ctx,
        Err(NetError::ClosedBeforeJoin) => {
            info!("client disconnected before join handshake");
            return;
        }
        Err(e) => {
            warn!(error = ?e, "failed to bootstrap connection");
            return;
        }
    };

    tracing::Span::current().record("player_id", ctx.player_id);
    info!(player_id = ctx.player_id, "client connected");

    if let Err(e) = run_client_loop(&mut sender, &mut receiver, &state, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }

    debug!(
        player_id = ctx.player_id,
        msgs_in = ctx.msgs_in,
        msgs_out = ctx.msgs_out,
        invalid_json = ctx.invalid_json,
        "connection stats"
    );
    info!(player_id = ctx.player_id, "client disconnected");
}

async fn send_message<S>(sender: &mut S, msg: &ServerMessage) -> Result<(), NetError>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    sender
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)
}

async fn send_close_with_reason(
    sender: &mut WsSender,
    code: u16,
    reason: &'static str,
) -> Result<(), NetError> {
    sender
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await
        .map_err(NetError::Ws)?;
    sender.close().await.map_err(NetError::Ws)
}

async fn bootstrap_connection(
    sender: &mut WsSender,
    receiver: &mut WsReceiver,
    state: &AppState,
    match_id: String,
) -> Result<ConnCtx, NetError> {
    let player_id = match timeout(JOIN_HANDSHAKE_TIMEOUT, read_join_handshake(sender, receiver, state)).await {
        Ok(result) => result?,
        Err(_) => {
            let _ = send_close_with_reason(sender, close_code::POLICY, "join timeout").await;
            return Err(NetError::JoinTimeout);
        }
    };

    // Subscribe before reading the initial state so no resolution slips between them.
    let events_rx = match state.registry.subscribe(&match_id, player_id).await {
        Ok(rx) => rx,
        Err(err @ MatchError::NotParticipant) => {
            let _ = send_close_with_reason(sender, close_code::POLICY, "not a participant").await;
            return Err(NetError::Match(err));
        }
        Err(err) => {
            let _ = send_close_with_reason(sender, close_code::ERROR, "match unavailable").await;
            return Err(NetError::Match(err));
        }
    };

    send_message(
        sender,
        &ServerMessage::Identity {
            player_id: player_id.to_string(),
        },
    )
    .await?;

    let mut ctx = ConnCtx {
        player_id,
        match_id,
        events_rx,
        msgs_in: 1,
        msgs_out: 1,
        invalid_json: 0,
        close_frame: None,
    };

    send_initial_state(sender, state, &mut ctx).await?;
    Ok(ctx)
}

async fn send_initial_state<S>(sender: &mut S, state: &AppState, ctx: &mut ConnCtx) -> Result<(), NetError>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    match push_state(sender, state, ctx).await {
        LoopControl::Continue => Ok(()),
        LoopControl::Disconnect => {
            close_connection(sender, ctx).await;
            Err(NetError::InitialStateUnavailable)
        }
    }
}

// Sends the pending close frame, if any, then closes the sink.
async fn close_connection<S>(sender: &mut S, ctx: &mut ConnCtx)
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    if let Some(frame) = ctx.close_frame.take() {
        let _ = sender.send(Message::Close(Some(frame))).await;
    }
    if let Err(err) = sender.close().await {
        debug!(error = ?err, "socket close error");
    }
}

async fn read_join_handshake(
    sender: &mut WsSender,
    receiver: &mut WsReceiver,
    state: &AppState,
) -> Result<PlayerId, NetError> {
    loop {
        let Some(incoming) = receiver.next().await else {
            return Err(NetError::ClosedBeforeJoin);
        };

        match incoming.map_err(NetError::Ws)? {
            Message::Text(text) => {
                let Ok(ClientMessage::Join(payload)) = serde_json::from_str::<ClientMessage>(&text) else {
                    let _ = send_close_with_reason(sender, close_code::POLICY, "invalid join payload").await;
                    return Err(NetError::JoinRequired);
                };

                let session_token = payload.session_token.trim();
                if session_token.is_empty() || session_token.len() > MAX_SESSION_TOKEN_LEN {
                    let _ = send_close_with_reason(sender, close_code::POLICY, "invalid session token").await;
                    return Err(NetError::AuthVerify);
                }

                return match verify(state.verifier.as_ref(), session_token).await {
                    Ok(player_id) => Ok(player_id),
                    Err(MatchError::Unauthenticated) => {
                        let _ = send_close_with_reason(sender, close_code::POLICY, "invalid session token").await;
                        Err(NetError::AuthVerify)
                    }
                    Err(_) => {
                        let _ = send_close_with_reason(sender, close_code::ERROR, "auth unavailable").await;
                        Err(NetError::AuthVerify)
                    }
                };
            }
            Message::Binary(_) => {
                let _ = send_close_with_reason(sender, close_code::UNSUPPORTED, "binary messages not supported").await;
                return Err(NetError::JoinRequired);
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => return Err(NetError::ClosedBeforeJoin),
        }
    }
}

async fn run_client_loop(
    sender: &mut WsSender,
    receiver: &mut WsReceiver,
    state: &AppState,
    ctx: &mut ConnCtx,
) -> Result<(), NetError> {
    let mut fatal: Option<NetError> = None;

    loop {
        let disconnect = tokio::select! {
            incoming = receiver.next() => {
                matches!(handle_incoming_ws(incoming, ctx), LoopControl::Disconnect)
            }

            event = ctx.events_rx.recv() => {
                match event {
                    Ok(event) => {
                        debug!(player_id = ctx.player_id, ?event, "match event");
                        matches!(push_state(sender, state, ctx).await, LoopControl::Disconnect)
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        // Every push carries the full state, so the latest one is enough.
                        warn!(player_id = ctx.player_id, missed, "match events lagged; resyncing");
                        matches!(push_state(sender, state, ctx).await, LoopControl::Disconnect)
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::EventsClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            close_connection(sender, ctx).await;
            break;
        }
    }

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn handle_incoming_ws(incoming: Option<Result<Message, axum::Error>>, ctx: &mut ConnCtx) -> LoopControl {
    let player_id = ctx.player_id;
    match incoming {
        Some(Ok(Message::Text(text))) => {
            ctx.msgs_in += 1;
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Join(_)) => {
                    // Repeated Join packets after bootstrap are ignored to keep the session stable.
                    debug!(player_id, "duplicate join ignored");
                    LoopControl::Continue
                }
                Err(parse_err) => {
                    ctx.invalid_json += 1;
                    warn!(player_id, error = %parse_err, "failed to parse client message");
                    if ctx.invalid_json > MAX_INVALID_JSON {
                        ctx.close_frame = Some(CloseFrame {
                            code: close_code::POLICY,
                            reason: "too many invalid messages".into(),
                        });
                        return LoopControl::Disconnect;
                    }
                    LoopControl::Continue
                }
            }
        }
        Some(Ok(Message::Binary(_))) => {
            ctx.close_frame = Some(CloseFrame {
                code: close_code::UNSUPPORTED,
                reason: "binary messages not supported".into(),
            });
            LoopControl::Disconnect
        }
        Some(Ok(Message::Ping(_) | Message::Pong(_))) => LoopControl::Continue,
        Some(Ok(Message::Close(_))) => LoopControl::Disconnect,
        Some(Err(e)) => {
            warn!(player_id, error = %e, "websocket recv error");
            LoopControl::Disconnect
        }
        None => {
            info!(player_id, "websocket closed");
            LoopControl::Disconnect
        }
    }
}

// Sends the player's current filtered view.
async fn push_state<S>(sender: &mut S, state: &AppState, ctx: &mut ConnCtx) -> LoopControl
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    let view = match state.registry.state_for(&ctx.match_id, ctx.player_id).await {
        Ok(view) => view,
        Err(err) => {
            error!(player_id = ctx.player_id, error = %err, "failed to load match state");
            ctx.close_frame = Some(CloseFrame {
                code: close_code::ERROR,
                reason: "match unavailable".into(),
            });
            return LoopControl::Disconnect;
        }
    };

    match send_message(sender, &ServerMessage::MatchState(view)).await {
        Ok(()) => {
            ctx.msgs_out += 1;
            LoopControl::Continue
        }
        Err(err) => {
            // Disconnect follows immediately.
            warn!(error = ?err, "failed to send match state");
            LoopControl::Disconnect
        }
    }
}
