use axum::{
    Router,
    routing::{get, post},
};

use crate::{AppState, middleware::auth_middleware, middleware::log_errors, realtime};

pub mod trip;

/// 组装路由
/// REST统一挂在api_base_uri下，分公开路由和认证保护路由；
/// 实时通道挂在根路径，与REST前缀无关
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new().route("/health", get(trip::handler::health));

    let protected_routes = Router::new()
        .route(
            "/trips/{trip_id}/locations",
            get(trip::handler::get_last_locations),
        )
        .route("/trips/{trip_id}/deleted", post(trip::handler::trip_deleted))
        .route(
            "/trips/{trip_id}/completed",
            post(trip::handler::trip_completed),
        )
        // 应用认证中间件
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/ws", get(realtime::handler::ws_upgrade))
        .nest(
            &state.config.api_base_uri.clone(),
            Router::new().merge(public_routes).merge(protected_routes),
        )
        // 添加日志中间件
        .layer(axum::middleware::from_fn(log_errors))
        .with_state(state)
}
