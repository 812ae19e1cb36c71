use chrono::FixedOffset;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    pub jwt_secret: String,
    pub jwt_ttl_secs: i64,

    /// Offset of the server calendar from UTC, in minutes. Day boundaries for
    /// slot listing and mood streaks are computed in this offset.
    pub utc_offset_minutes: i32,

    pub ai_provider: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub claude_api_key: String,
    pub claude_model: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "4000".into())
                .parse()
                .expect("PORT must be a number"),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".into()),

            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            jwt_ttl_secs: env::var("JWT_TTL_SECS")
                .unwrap_or_else(|_| "2592000".into()) // 30 days
                .parse()
                .expect("JWT_TTL_SECS must be a number"),

            utc_offset_minutes: env::var("UTC_OFFSET_MINUTES")
                .unwrap_or_else(|_| "0".into())
                .parse()
                .expect("UTC_OFFSET_MINUTES must be a number"),

            ai_provider: env::var("AI_PROVIDER").unwrap_or_else(|_| "openai".into()),
            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-3.5-turbo".into()),
            claude_api_key: env::var("CLAUDE_API_KEY").unwrap_or_default(),
            claude_model: env::var("CLAUDE_MODEL")
                .unwrap_or_else(|_| "claude-3-5-haiku-latest".into()),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Calendar offset used for "today" and day windows. Out-of-range values
    /// fall back to UTC.
    pub fn calendar_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"))
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            database_url: "postgres://localhost/ustawi_test".into(),
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:5173".into(),
            jwt_secret: "test-secret".into(),
            jwt_ttl_secs: 3600,
            utc_offset_minutes: 0,
            ai_provider: "none".into(),
            openai_api_key: String::new(),
            openai_model: "gpt-3.5-turbo".into(),
            claude_api_key: String::new(),
            claude_model: "claude-3-5-haiku-latest".into(),
        }
    }
}
