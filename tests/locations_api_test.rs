//! REST接口集成测试：认证门槛、缓存不可用降级、健康检查
//! Redis指向不存在的端口，验证降级路径

use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::Value;
use tokio::net::TcpListener;

use tripsync_backend::{
    AppState, config::Config, membership::MembershipPolicy, realtime::session::SessionRegistry,
    routes, utils,
};

fn test_config() -> Config {
    Config {
        redis_url: "redis://127.0.0.1:1".to_string(),
        jwt_secret: "test-secret".to_string(),
        jwt_expiration_secs: 3600,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        api_base_uri: "/api".to_string(),
        location_ttl_secs: 0,
        trip_service_url: None,
    }
}

async fn start_test_server() -> (String, Config) {
    let config = test_config();
    let redis =
        redis::Client::open(config.redis_url.clone()).expect("Failed to create Redis client");
    let state = AppState {
        membership: MembershipPolicy::from_config(&config),
        config: config.clone(),
        redis: Arc::new(redis),
        rooms: SessionRegistry::new(),
    };

    let app = routes::build_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    (format!("http://127.0.0.1:{}", addr.port()), config)
}

#[tokio::test]
async fn health_reports_service_up_and_redis_down() {
    let (base_url, _) = start_test_server().await;

    let resp = reqwest::get(format!("{}/api/health", base_url)).await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], 0);
    assert_eq!(body["resp_data"]["service"], "tripsync");
    assert_eq!(body["resp_data"]["redis"], "down");
}

#[tokio::test]
async fn locations_query_requires_bearer_token() {
    let (base_url, _) = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/api/trips/t1/locations", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], 1002);

    // 伪造的Token同样被拒
    let resp = client
        .get(format!("{}/api/trips/t1/locations", base_url))
        .bearer_auth("garbage.token.here")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn locations_query_degrades_to_empty_map_without_redis() {
    let (base_url, config) = start_test_server().await;
    let (token, _) = utils::generate_token("u1", &config).expect("token");

    let resp = reqwest::Client::new()
        .get(format!("{}/api/trips/t1/locations", base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // 缓存不可用等同于"没有已知位置"，不是错误
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], 0);
    assert_eq!(body["resp_data"], serde_json::json!({}));
}

#[tokio::test]
async fn lifecycle_notifications_are_idempotent_and_survive_redis_outage() {
    let (base_url, config) = start_test_server().await;
    let (token, _) = utils::generate_token("svc", &config).expect("token");
    let client = reqwest::Client::new();

    for path in ["deleted", "completed"] {
        for _ in 0..2 {
            let resp = client
                .post(format!("{}/api/trips/t1/{}", base_url, path))
                .bearer_auth(&token)
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), 200);

            let body: Value = resp.json().await.unwrap();
            assert_eq!(body["code"], 0);
            assert_eq!(body["resp_data"]["success"], true);
        }
    }
}

#[tokio::test]
async fn lifecycle_notifications_require_auth() {
    let (base_url, _) = start_test_server().await;

    let resp = reqwest::Client::new()
        .post(format!("{}/api/trips/t1/deleted", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}
