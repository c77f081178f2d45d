use serde::{Deserialize, Serialize};

use crate::cache::models::location::CachedLocation;

/// 客户端上报的原始坐标
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// 入站事件
/// 字段命名与前端socket负载保持一致（camelCase）
/// 缺失字段不在反序列化层报错，由各处理器自行丢弃
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// 加入行程房间
    JoinTrip {
        #[serde(default)]
        trip_id: String,
        #[serde(default)]
        user_id: Option<String>,
    },
    /// 上报位置
    SendLocation {
        #[serde(default)]
        trip_id: String,
        #[serde(default)]
        user_id: Option<String>,
        #[serde(default)]
        location: Option<GeoPoint>,
    },
}

/// 出站事件
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// 房间内成员位置更新
    LocationUpdate {
        user_id: String,
        location: CachedLocation,
    },
}

/// 事件归属身份
/// Authenticated来自连接时校验过的Token；Claimed是调用方自报、未经证明的身份，
/// 原样接受是已知的信任缺口，展示层可据此区分标注
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Authenticated(String),
    Claimed(String),
}

impl Identity {
    pub fn as_str(&self) -> &str {
        match self {
            Identity::Authenticated(id) | Identity::Claimed(id) => id,
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, Identity::Authenticated(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_join_trip_event() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"joinTrip","tripId":"t1","userId":"u1"}"#).unwrap();
        match event {
            ClientEvent::JoinTrip { trip_id, user_id } => {
                assert_eq!(trip_id, "t1");
                assert_eq!(user_id.as_deref(), Some("u1"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn parses_send_location_event() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"type":"sendLocation","tripId":"t1","userId":"u1","location":{"lat":12.9,"lng":77.6}}"#,
        )
        .unwrap();
        match event {
            ClientEvent::SendLocation {
                trip_id,
                user_id,
                location,
            } => {
                assert_eq!(trip_id, "t1");
                assert_eq!(user_id.as_deref(), Some("u1"));
                assert_eq!(location, Some(GeoPoint { lat: 12.9, lng: 77.6 }));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn missing_fields_parse_as_absent() {
        // 缺字段的负载能解析出来，丢弃决策留给处理器
        let event: ClientEvent = serde_json::from_str(r#"{"type":"sendLocation"}"#).unwrap();
        match event {
            ClientEvent::SendLocation {
                trip_id,
                user_id,
                location,
            } => {
                assert!(trip_id.is_empty());
                assert!(user_id.is_none());
                assert!(location.is_none());
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn unknown_event_type_is_an_error() {
        assert!(serde_json::from_str::<ClientEvent>(r#"{"type":"selfDestruct"}"#).is_err());
    }

    #[test]
    fn serializes_location_update_in_wire_format() {
        let event = ServerEvent::LocationUpdate {
            user_id: "u1".to_string(),
            location: CachedLocation {
                lat: 1.5,
                lng: 2.5,
                ts: 1000,
            },
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "locationUpdate");
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["location"]["lat"], 1.5);
        assert_eq!(json["location"]["lng"], 2.5);
        assert_eq!(json["location"]["ts"], 1000);
    }

    #[test]
    fn identity_reports_verification_state() {
        assert!(Identity::Authenticated("u1".into()).is_verified());
        assert!(!Identity::Claimed("u1".into()).is_verified());
        assert_eq!(Identity::Claimed("u1".into()).as_str(), "u1");
    }
}
