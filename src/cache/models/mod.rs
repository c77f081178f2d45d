/// 缓存数据模型
/// 定义缓存数据的结构体

// 位置缓存模型
pub mod location;

// 重新导出常用类型
pub use location::CachedLocation;
