use config::Config;
use membership::MembershipPolicy;
use realtime::session::SessionRegistry;
use redis::Client as RedisClient;
use std::sync::Arc;

pub mod cache;
pub mod config;
pub mod membership;
pub mod middleware;
pub mod realtime;
pub mod utils;

pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub redis: Arc<RedisClient>,
    pub rooms: SessionRegistry,
    pub membership: MembershipPolicy,
}
