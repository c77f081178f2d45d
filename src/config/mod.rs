use std::env;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub redis_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub location_ttl_secs: u64,
    pub trip_service_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        let jwt_expiration = env::var("JWT_EXPIRATION")?
            .trim_end_matches('h')
            .parse::<u64>()
            .unwrap_or(24);
        Ok(Config {
            redis_url: env::var("REDIS_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            jwt_expiration_secs: jwt_expiration * 3600,
            server_host: env::var("SERVER_HOST")?,
            server_port: env::var("SERVER_PORT")?.parse().unwrap_or(5000),
            api_base_uri: env::var("API_BASE_URI")?,
            // 位置缓存过期时间（秒），0表示永不过期
            location_ttl_secs: env::var("LOCATION_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            // 配置了行程服务地址则开启成员校验
            trip_service_url: env::var("TRIP_SERVICE_URL").ok().filter(|v| !v.is_empty()),
        })
    }

    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }

    pub fn location_ttl(&self) -> Option<u64> {
        if self.location_ttl_secs == 0 {
            None
        } else {
            Some(self.location_ttl_secs)
        }
    }
}
