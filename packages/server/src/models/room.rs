use serde::{Deserialize, Serialize};
use werewolf_core::models::{Phase, Side};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum RoomStatus {
    Open,
    InProgress,
    Finished,
}

impl From<Phase> for RoomStatus {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Waiting => RoomStatus::Open,
            Phase::Finished => RoomStatus::Finished,
            _ => RoomStatus::InProgress,
        }
    }
}

/// ルーム一覧に出す公開情報
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoomSummary {
    pub room_id: String,
    pub status: RoomStatus,
    pub phase: Phase,
    pub round: u32,
    pub host_id: Option<String>,
    pub player_count: usize,
    pub max_players: usize,
    pub winner: Option<Side>,
}
