/// 缓存操作
/// 提供缓存操作的功能实现

// 位置缓存操作
pub mod location;

// 重新导出常用操作
pub use location::LocationCacheOperations;
