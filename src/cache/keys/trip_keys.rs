/// 行程缓存键前缀
const TRIP_PREFIX: &str = "trip:";

/// 生成行程成员位置哈希键
/// 每个行程一个哈希，field为成员ID，value为最近一次位置
pub fn trip_locations_key(trip_id: &str) -> String {
    format!("{}{}:locations", TRIP_PREFIX, trip_id)
}
