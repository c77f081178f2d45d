use serde::{Deserialize, Serialize};

/// 成员最近位置缓存模型
/// ts为服务端收到上报时的毫秒时间戳，不信任客户端时钟
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct CachedLocation {
    pub lat: f64,
    pub lng: f64,
    pub ts: i64, // Unix timestamp (millis)
}
