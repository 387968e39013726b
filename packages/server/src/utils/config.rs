use once_cell::sync::Lazy;
use std::env;

pub static CONFIG: Lazy<Config> = Lazy::new(Config::new);

pub struct Config {
    pub host: String,
    pub port: u16,
    pub allowed_origin: String,
    pub max_players: usize,
    /// FINISHED のまま放置されたルームを片付けるまでの秒数
    pub room_idle_timeout_secs: u64,
}

impl Config {
    fn new() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_or("PORT", 8080),
            allowed_origin: env::var("ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            max_players: parse_or("MAX_PLAYERS", werewolf_core::game::DEFAULT_MAX_PLAYERS),
            room_idle_timeout_secs: parse_or("ROOM_IDLE_TIMEOUT_SECS", 600),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
