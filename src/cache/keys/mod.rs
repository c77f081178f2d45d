/// 缓存键模块
/// 提供各种缓存键生成函数

// 行程缓存键模块
pub mod trip_keys;

// 重新导出常用的键生成函数
pub use trip_keys::trip_locations_key;
