use std::collections::HashMap;
use std::sync::Arc;

use redis::{AsyncCommands, Client as RedisClient};

use crate::cache::keys::trip_locations_key;
use crate::cache::models::location::CachedLocation;

/// 位置缓存操作
/// 每个行程一个Redis哈希，成员ID -> 最近位置，按服务端接收顺序覆盖写入
pub struct LocationCacheOperations;

impl LocationCacheOperations {
    /// 写入成员最近位置（无条件覆盖）
    /// ttl为整个行程哈希的过期时间，每次写入都会刷新；None表示永不过期
    pub async fn put(
        redis: &Arc<RedisClient>,
        trip_id: &str,
        user_id: &str,
        location: &CachedLocation,
        ttl: Option<u64>,
    ) -> Result<(), redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let key = trip_locations_key(trip_id);
        let json = serde_json::to_string(location).map_err(|e| {
            redis::RedisError::from((redis::ErrorKind::IoError, "序列化错误", e.to_string()))
        })?;

        let _: () = conn.hset(&key, user_id, json).await?;

        if let Some(secs) = ttl {
            let _: () = conn.expire(&key, secs as i64).await?;
        }

        Ok(())
    }

    /// 获取行程内所有成员的最近位置
    /// 返回完整快照；解析失败的脏数据跳过，不影响其余成员
    pub async fn get_all(
        redis: &Arc<RedisClient>,
        trip_id: &str,
    ) -> Result<HashMap<String, CachedLocation>, redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let key = trip_locations_key(trip_id);
        let raw: HashMap<String, String> = conn.hgetall(&key).await?;

        let mut locations = HashMap::with_capacity(raw.len());
        for (user_id, json) in raw {
            match serde_json::from_str::<CachedLocation>(&json) {
                Ok(location) => {
                    locations.insert(user_id, location);
                }
                Err(e) => {
                    tracing::warn!(
                        "Skipping undecodable location for user {} in trip {}: {}",
                        user_id,
                        trip_id,
                        e
                    );
                }
            }
        }

        Ok(locations)
    }

    /// 清除整个行程的位置缓存
    /// 行程删除或结束时调用，避免继续返回过期位置
    pub async fn clear(redis: &Arc<RedisClient>, trip_id: &str) -> Result<(), redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let key = trip_locations_key(trip_id);
        let _: () = conn.del(key).await?;

        Ok(())
    }
}
