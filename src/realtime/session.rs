use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

/// 会话出站通道
/// 其他模块克隆后即可向指定连接推送消息
pub type ConnectionSender = mpsc::UnboundedSender<Message>;

/// 会话在注册表中的记录
struct SessionEntry {
    /// 连接建立时绑定的认证身份，之后不再重新校验
    identity: Option<String>,
    /// 该会话已加入的行程房间
    rooms: HashSet<String>,
    sender: ConnectionSender,
}

/// 会话注册表
/// 维护会话到行程房间的实时成员关系；按键分片加锁，不同行程互不阻塞
#[derive(Clone, Default)]
pub struct SessionRegistry {
    /// 行程ID -> 房间内会话的出站通道
    rooms: Arc<DashMap<String, HashMap<Uuid, ConnectionSender>>>,
    /// 会话ID -> 会话记录
    sessions: Arc<DashMap<Uuid, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记新建立的连接
    pub fn register(&self, session_id: Uuid, sender: ConnectionSender) {
        self.sessions.insert(
            session_id,
            SessionEntry {
                identity: None,
                rooms: HashSet::new(),
                sender,
            },
        );
    }

    /// 绑定连接时校验出的认证身份
    pub fn bind_identity(&self, session_id: Uuid, user_id: String) {
        if let Some(mut entry) = self.sessions.get_mut(&session_id) {
            entry.identity = Some(user_id);
        }
    }

    /// 查询会话的认证身份
    pub fn identity_of(&self, session_id: Uuid) -> Option<String> {
        self.sessions
            .get(&session_id)
            .and_then(|entry| entry.identity.clone())
    }

    /// 把会话加入行程房间
    /// tripId为空时静默忽略；重复加入是幂等的
    pub fn join(&self, session_id: Uuid, trip_id: &str) {
        if trip_id.is_empty() {
            tracing::debug!("Ignoring join with empty trip id");
            return;
        }

        // 先记到会话自身的房间集合，再挂进房间；顺序保证断开清理不漏
        let sender = match self.sessions.get_mut(&session_id) {
            Some(mut entry) => {
                entry.rooms.insert(trip_id.to_string());
                entry.sender.clone()
            }
            None => return, // 会话已断开
        };

        self.rooms
            .entry(trip_id.to_string())
            .or_default()
            .insert(session_id, sender);

        // 加入与断开并发竞争时的补偿清理
        if !self.sessions.contains_key(&session_id) {
            self.remove_from_room(trip_id, session_id);
        }
    }

    /// 把会话从其加入过的所有房间移除
    /// 断开时无条件调用；从未加入任何房间时是空操作
    pub fn leave_all(&self, session_id: Uuid) {
        let entry = match self.sessions.remove(&session_id) {
            Some((_, entry)) => entry,
            None => return,
        };

        for trip_id in entry.rooms {
            self.remove_from_room(&trip_id, session_id);
        }
    }

    /// 房间当前成员的广播快照
    /// 在房间锁内整体克隆，与最近一次完成的join/leave线性一致
    pub fn members_of(&self, trip_id: &str) -> Vec<(Uuid, ConnectionSender)> {
        match self.rooms.get(trip_id) {
            Some(room) => room
                .iter()
                .map(|(id, sender)| (*id, sender.clone()))
                .collect(),
            None => Vec::new(),
        }
    }

    fn remove_from_room(&self, trip_id: &str, session_id: Uuid) {
        if let Some(mut room) = self.rooms.get_mut(trip_id) {
            room.remove(&session_id);
        }
        // 空房间随最后一个会话一起消失，不留独立生命周期
        self.rooms.remove_if(trip_id, |_, members| members.is_empty());
    }
}
