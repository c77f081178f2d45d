use std::time::Duration;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout};
use uuid::Uuid;

use crate::AppState;
use crate::realtime::broadcast;
use crate::realtime::protocol::ClientEvent;
use crate::utils::verify_token;

/// 服务端心跳间隔
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// 心跳应答超时，超时即判定连接失效
const PONG_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
pub struct WsAuthQuery {
    pub token: Option<String>,
}

/// GET /ws?token=JWT
/// 建连时一次性校验Token；校验失败不拒绝连接，会话保持匿名，
/// 后续事件按调用方自报身份处理
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(params): Query<WsAuthQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let identity = params
        .token
        .as_deref()
        .and_then(|token| match verify_token(token, &state.config) {
            Ok(claims) => Some(claims.sub),
            Err(e) => {
                tracing::debug!("WebSocket token rejected, session stays anonymous: {}", e);
                None
            }
        });

    ws.on_upgrade(move |socket| run_session(socket, state, identity))
}

/// 每个连接一个actor：writer任务独占sink，读循环逐条处理入站事件
async fn run_session(socket: WebSocket, state: AppState, identity: Option<String>) {
    let session_id = Uuid::new_v4();
    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<Message>();

    state.rooms.register(session_id, tx.clone());
    if let Some(user_id) = identity.clone() {
        state.rooms.bind_identity(session_id, user_id);
    }

    tracing::info!(
        session_id = %session_id,
        authenticated = identity.is_some(),
        "WebSocket session started"
    );

    let writer_handle = tokio::spawn(writer_task(ws_sender, rx));

    // 心跳任务：周期性ping并等待pong，超时主动断开，避免僵尸会话滞留房间
    let (pong_tx, mut pong_rx) = mpsc::unbounded_channel::<()>();
    let ping_tx = tx.clone();
    let ping_handle = tokio::spawn(async move {
        let mut ping_timer = interval(PING_INTERVAL);
        // 跳过首次立即触发
        ping_timer.tick().await;

        loop {
            ping_timer.tick().await;

            if ping_tx.send(Message::Ping(Vec::new().into())).is_err() {
                break; // writer已退出，连接不在了
            }

            match timeout(PONG_TIMEOUT, pong_rx.recv()).await {
                Ok(Some(())) => {} // 应答正常
                _ => {
                    tracing::warn!("Pong timeout, closing session");
                    let _ = ping_tx.send(Message::Close(None));
                    break;
                }
            }
        }
    });

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                dispatch_event(&state, session_id, &text).await;
            }
            Ok(Message::Ping(data)) => {
                let _ = tx.send(Message::Pong(data));
            }
            Ok(Message::Pong(_)) => {
                let _ = pong_tx.send(());
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Binary(_)) => {
                tracing::debug!("Ignoring binary frame");
            }
            Err(e) => {
                tracing::debug!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    writer_handle.abort();
    ping_handle.abort();

    // 断开后无条件退出全部房间，不留悬挂成员；缓存里的位置保留
    state.rooms.leave_all(session_id);

    tracing::info!(session_id = %session_id, "WebSocket session ended");
}

/// writer任务：把mpsc通道里的消息转发到WebSocket sink
async fn writer_task(
    mut ws_sender: futures_util::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(msg) = rx.recv().await {
        if ws_sender.send(msg).await.is_err() {
            break; // 连接已断
        }
    }
}

/// 解析并分发入站事件；格式不合法的负载静默丢弃
async fn dispatch_event(state: &AppState, session_id: Uuid, text: &str) {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!("Dropping malformed event: {}", e);
            return;
        }
    };

    match event {
        ClientEvent::JoinTrip { trip_id, user_id } => {
            handle_join(state, session_id, &trip_id, user_id).await;
        }
        ClientEvent::SendLocation {
            trip_id,
            user_id,
            location,
        } => {
            broadcast::handle_position_update(state, session_id, &trip_id, user_id, location)
                .await;
        }
    }
}

/// 加入行程房间；tripId为空时静默忽略
async fn handle_join(
    state: &AppState,
    session_id: Uuid,
    trip_id: &str,
    reported_user: Option<String>,
) {
    if trip_id.is_empty() {
        return;
    }

    match broadcast::effective_identity(state, session_id, reported_user) {
        Some(identity) => {
            if !state.membership.is_member(trip_id, identity.as_str()).await {
                tracing::debug!(
                    "Rejecting join of non-member {} for trip {}",
                    identity.as_str(),
                    trip_id
                );
                return;
            }
            tracing::info!("User {} joined trip room {}", identity.as_str(), trip_id);
        }
        // 开启成员校验后，无法核对身份的加入一并拒绝
        None if state.membership.is_enforcing() => {
            tracing::debug!("Rejecting anonymous join for trip {}", trip_id);
            return;
        }
        None => {
            tracing::info!("Anonymous session joined trip room {}", trip_id);
        }
    }

    state.rooms.join(session_id, trip_id);
}
