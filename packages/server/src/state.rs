use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use werewolf_core::models::GameConfig;
use werewolf_core::{Game, Timings};

use crate::models::config::DebugConfig;
use crate::services::room_worker::{RoomHandle, RoomRegistry, WorkerSettings};
use crate::utils::config::CONFIG;

#[derive(Clone)]
pub struct AppState {
    pub rooms: RoomRegistry,
    pub debug_config: Arc<DebugConfig>,
    next_room_id: Arc<AtomicU64>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_debug_config(DebugConfig::from_env())
    }

    pub fn with_debug_config(debug_config: DebugConfig) -> Self {
        AppState {
            rooms: Arc::new(Mutex::new(HashMap::new())),
            debug_config: Arc::new(debug_config),
            next_room_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// ルームIDは 1 からの連番
    pub fn next_room_id(&self) -> String {
        (self.next_room_id.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    pub fn new_game(&self, room_id: &str, config: GameConfig) -> Game {
        let timings = Timings::default().scaled(self.debug_config.timer_scale);
        let game = Game::new(room_id, config)
            .with_timings(timings)
            .with_max_players(CONFIG.max_players);
        match self.debug_config.seed {
            Some(seed) => game.with_rng(StdRng::seed_from_u64(seed)),
            None => game,
        }
    }

    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            reveal_roles: self.debug_config.reveal_roles(),
            verbose: self.debug_config.verbose_logging,
            idle_timeout: Duration::from_secs(CONFIG.room_idle_timeout_secs),
        }
    }

    pub async fn room(&self, room_id: &str) -> Option<RoomHandle> {
        self.rooms.lock().await.get(room_id).cloned()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
