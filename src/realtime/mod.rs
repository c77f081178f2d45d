// 实时位置通道模块
// 房间级广播：会话注册表 + 位置广播路由 + WebSocket接入

pub mod broadcast;
pub mod handler;
pub mod protocol;
pub mod session;

// 重新导出常用类型
pub use protocol::{ClientEvent, GeoPoint, Identity, ServerEvent};
pub use session::{ConnectionSender, SessionRegistry};
