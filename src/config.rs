use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Absent means the service runs on static seed data only.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub db_timeout_secs: u64,

    pub ai_enabled: bool,
    pub ai_api_url: String,
    pub ai_api_key: String,
    pub ai_model: String,
    pub ai_timeout_secs: u64,
    pub ai_status_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .unwrap_or(8080),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            db_timeout_secs: env::var("DB_TIMEOUT_SECS")
                .unwrap_or_else(|_| "3".into())
                .parse()
                .unwrap_or(3),

            ai_enabled: env::var("AI_ENABLED")
                .unwrap_or_else(|_| "true".into())
                .parse()
                .unwrap_or(true),
            ai_api_url: env::var("AI_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".into()),
            ai_api_key: env::var("AI_API_KEY").unwrap_or_else(|_| String::new()),
            ai_model: env::var("AI_MODEL").unwrap_or_else(|_| "gpt-4o".into()),
            ai_timeout_secs: env::var("AI_TIMEOUT_SECS")
                .unwrap_or_else(|_| "15".into())
                .parse()
                .unwrap_or(15),
            ai_status_ttl_secs: env::var("AI_STATUS_TTL_SECS")
                .unwrap_or_else(|_| "30".into())
                .parse()
                .unwrap_or(30),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn db_timeout(&self) -> Duration {
        Duration::from_secs(self.db_timeout_secs)
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_secs(self.ai_timeout_secs)
    }

    pub fn ai_status_ttl(&self) -> Duration {
        Duration::from_secs(self.ai_status_ttl_secs)
    }
}

#[cfg(test)]
impl Config {
    /// Static-data, AI-disabled configuration for handler tests.
    pub fn for_tests() -> Self {
        Self {
            database_url: None,
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:3000".into(),
            db_timeout_secs: 1,
            ai_enabled: false,
            ai_api_url: "http://127.0.0.1:9/chat/completions".into(),
            ai_api_key: String::new(),
            ai_model: "gpt-4o".into(),
            ai_timeout_secs: 1,
            ai_status_ttl_secs: 30,
        }
    }
}
