use std::collections::HashMap;

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::AppState;
use crate::cache::{CachedLocation, LocationCacheOperations};
use crate::utils::{Claims, error_codes, error_to_api_response, success_to_api_response};

use super::model::HealthResponse;

/// 查询行程内所有成员的最近已知位置
/// 加入或刷新页面时调用，用来回填比自己先上报的成员；
/// 缓存不可用按"没有已知位置"处理，返回空映射而不是报错
#[axum::debug_handler]
pub async fn get_last_locations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(trip_id): Path<String>,
) -> impl IntoResponse {
    if !state.membership.is_member(&trip_id, &claims.sub).await {
        return (
            StatusCode::FORBIDDEN,
            error_to_api_response::<HashMap<String, CachedLocation>>(
                error_codes::PERMISSION_DENIED,
                "非行程成员".to_string(),
            ),
        );
    }

    match LocationCacheOperations::get_all(&state.redis, &trip_id).await {
        Ok(locations) => (StatusCode::OK, success_to_api_response(locations)),
        Err(e) => {
            tracing::warn!("Redis hgetall error for trip {}: {}", trip_id, e);
            (StatusCode::OK, success_to_api_response(HashMap::new()))
        }
    }
}

/// 行程删除通知：清理该行程的位置缓存
#[axum::debug_handler]
pub async fn trip_deleted(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
) -> impl IntoResponse {
    clear_trip_locations(&state, &trip_id, "deleted").await
}

/// 行程结束通知：清理该行程的位置缓存
#[axum::debug_handler]
pub async fn trip_completed(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
) -> impl IntoResponse {
    clear_trip_locations(&state, &trip_id, "completed").await
}

/// 清理失败只告警不报错：接口幂等，行程服务可以重试
async fn clear_trip_locations(state: &AppState, trip_id: &str, reason: &str) -> impl IntoResponse + use<> {
    match LocationCacheOperations::clear(&state.redis, trip_id).await {
        Ok(()) => {
            tracing::info!("Cleared cached locations for {} trip {}", reason, trip_id);
        }
        Err(e) => {
            tracing::warn!("Redis del error for trip {} ({}): {}", trip_id, reason, e);
        }
    }

    (
        StatusCode::OK,
        success_to_api_response(serde_json::json!({
            "success": true
        })),
    )
}

/// 健康检查：服务自身 + Redis连通性
#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let redis_ok = match state.redis.get_multiplexed_async_connection().await {
        Ok(mut conn) => {
            let pong: Result<String, redis::RedisError> =
                redis::cmd("PING").query_async(&mut conn).await;
            pong.is_ok()
        }
        Err(_) => false,
    };

    (
        StatusCode::OK,
        success_to_api_response(HealthResponse {
            service: "tripsync".to_string(),
            redis: if redis_ok { "ok" } else { "down" }.to_string(),
        }),
    )
}
