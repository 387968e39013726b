use std::env;

#[derive(Debug, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub verbose_logging: bool,
    // 全員の役職をスナップショットに載せるかどうか
    pub show_player_roles: bool,
    // ゲーム内の待ち時間にかける倍率
    pub timer_scale: f64,
    // 配役を再現したいときの乱数シード
    pub seed: Option<u64>,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            verbose_logging: false,
            show_player_roles: false,
            timer_scale: 1.0,
            seed: None,
        }
    }
}

impl DebugConfig {
    pub fn from_env() -> Self {
        let enabled = env::var("DEBUG_ENABLED")
            .map(|v| v == "true")
            .unwrap_or(false);
        let verbose_logging = env::var("DEBUG_VERBOSE_LOGGING")
            .map(|v| v == "true")
            .unwrap_or(enabled);
        let show_player_roles = env::var("DEBUG_SHOW_PLAYER_ROLES")
            .map(|v| v == "true")
            .unwrap_or(false);
        let timer_scale = env::var("DEBUG_TIMER_SCALE")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(1.0);
        let seed = env::var("DEBUG_SEED")
            .ok()
            .and_then(|v| v.parse::<u64>().ok());

        Self {
            enabled,
            verbose_logging,
            show_player_roles,
            timer_scale,
            seed,
        }
    }

    /// 本番ではフラグが立っていても `enabled` が false なら無視する
    pub fn reveal_roles(&self) -> bool {
        self.enabled && self.show_player_roles
    }
}
