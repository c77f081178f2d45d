use crate::config::Config;

/// 行程成员校验策略
/// 广播路径自身不持有成员数据；是否校验由配置决定，
/// 默认放行以保持与上游加入口径一致的行为
#[derive(Clone)]
pub enum MembershipPolicy {
    /// 不校验，信任调用方
    AllowAll,
    /// 调用外部行程服务校验成员资格
    TripService {
        client: reqwest::Client,
        base_url: String,
    },
}

impl MembershipPolicy {
    pub fn from_config(config: &Config) -> Self {
        match &config.trip_service_url {
            Some(url) => MembershipPolicy::TripService {
                client: reqwest::Client::new(),
                base_url: url.trim_end_matches('/').to_string(),
            },
            None => MembershipPolicy::AllowAll,
        }
    }

    pub fn is_enforcing(&self) -> bool {
        !matches!(self, MembershipPolicy::AllowAll)
    }

    /// 校验用户是否为行程成员
    /// 行程服务不可达时放行并告警：位置通道是尽力而为的，
    /// 不能因校验服务抖动而黑洞全部上报
    pub async fn is_member(&self, trip_id: &str, user_id: &str) -> bool {
        match self {
            MembershipPolicy::AllowAll => true,
            MembershipPolicy::TripService { client, base_url } => {
                let url = format!("{}/trips/{}/members/{}", base_url, trip_id, user_id);
                match client.get(&url).send().await {
                    Ok(resp) => resp.status().is_success(),
                    Err(e) => {
                        tracing::warn!("Membership lookup failed for trip {}: {}", trip_id, e);
                        true
                    }
                }
            }
        }
    }
}
