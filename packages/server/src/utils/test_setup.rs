use dotenvy::dotenv;
use std::sync::Once;

static INIT: Once = Once::new();

pub fn setup_test_env() {
    INIT.call_once(|| {
        dotenv().ok();
        // バックアップ値を設定（.envファイルが存在しない場合のデフォルト値）
        if std::env::var("MAX_PLAYERS").is_err() {
            std::env::set_var("MAX_PLAYERS", "16");
        }
        if std::env::var("ROOM_IDLE_TIMEOUT_SECS").is_err() {
            std::env::set_var("ROOM_IDLE_TIMEOUT_SECS", "600");
        }
        // テストではタイマーで勝手に進まないよう十分長くする
        if std::env::var("DEBUG_TIMER_SCALE").is_err() {
            std::env::set_var("DEBUG_TIMER_SCALE", "100");
        }
        if std::env::var("DEBUG_SEED").is_err() {
            std::env::set_var("DEBUG_SEED", "42");
        }
    });
}
