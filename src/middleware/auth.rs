use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};

use crate::{
    AppState,
    utils::{error_codes, error_to_api_response, verify_token},
};

/// 受保护路由的认证中间件
/// 校验Bearer Token并把Claims注入请求扩展，供下游handler使用
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let claims = bearer.ok().and_then(|TypedHeader(Authorization(token))| {
        verify_token(token.token(), &state.config).ok()
    });

    match claims {
        Some(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        None => {
            tracing::debug!("Rejected request without valid bearer token");
            (
                StatusCode::UNAUTHORIZED,
                error_to_api_response::<()>(error_codes::AUTH_FAILED, "未授权访问".to_string()),
            )
                .into_response()
        }
    }
}
