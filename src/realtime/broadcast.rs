use axum::extract::ws::Message;
use chrono::Utc;
use uuid::Uuid;

use crate::AppState;
use crate::cache::{CachedLocation, LocationCacheOperations};
use crate::realtime::protocol::{GeoPoint, Identity, ServerEvent};

/// 解析事件归属身份：优先使用连接时绑定的认证身份，否则退回调用方自报身份
pub fn effective_identity(
    state: &AppState,
    session_id: Uuid,
    reported_user: Option<String>,
) -> Option<Identity> {
    if let Some(user_id) = state.rooms.identity_of(session_id) {
        return Some(Identity::Authenticated(user_id));
    }
    reported_user
        .filter(|user_id| !user_id.is_empty())
        .map(Identity::Claimed)
}

/// 处理一次位置上报：写入缓存，然后向房间内所有会话广播
/// 上报是即发即弃的遥测，任何校验不通过都静默丢弃，不向发送方回错误
pub async fn handle_position_update(
    state: &AppState,
    session_id: Uuid,
    trip_id: &str,
    reported_user: Option<String>,
    location: Option<GeoPoint>,
) {
    if trip_id.is_empty() {
        tracing::debug!("Dropping location report without trip id");
        return;
    }
    let Some(identity) = effective_identity(state, session_id, reported_user) else {
        tracing::debug!("Dropping location report without identity");
        return;
    };
    let Some(point) = location else {
        tracing::debug!("Dropping location report without coordinates");
        return;
    };

    if !state.membership.is_member(trip_id, identity.as_str()).await {
        tracing::debug!(
            "Dropping location report from non-member {} for trip {}",
            identity.as_str(),
            trip_id
        );
        return;
    }

    // 时间戳取服务端接收时刻，不信任客户端时钟
    let cached = CachedLocation {
        lat: point.lat,
        lng: point.lng,
        ts: Utc::now().timestamp_millis(),
    };

    // 先写缓存再广播：广播期间刚加入的会话即使错过本次事件，
    // 下一次快照读也能看到该位置，最多重复渲染一次
    if let Err(e) = LocationCacheOperations::put(
        &state.redis,
        trip_id,
        identity.as_str(),
        &cached,
        state.config.location_ttl(),
    )
    .await
    {
        // 缓存不可用时降级为仅实时转发
        tracing::warn!("Redis put error for trip {}: {}", trip_id, e);
    }

    broadcast_to_room(state, trip_id, &identity, cached);
}

/// 向房间内所有会话投递locationUpdate，发送方自身也在其中（渲染按身份幂等）
/// 单个对端投递失败只影响它自己，不阻塞其余对端
pub fn broadcast_to_room(
    state: &AppState,
    trip_id: &str,
    identity: &Identity,
    location: CachedLocation,
) {
    let event = ServerEvent::LocationUpdate {
        user_id: identity.as_str().to_string(),
        location,
    };
    let json = match serde_json::to_string(&event) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Failed to encode locationUpdate: {}", e);
            return;
        }
    };

    let members = state.rooms.members_of(trip_id);
    tracing::debug!(
        "Broadcasting location of {} (verified: {}) to {} session(s) in trip {}",
        identity.as_str(),
        identity.is_verified(),
        members.len(),
        trip_id
    );
    for (_, sender) in members {
        let _ = sender.send(Message::Text(json.clone().into()));
    }
}
