use serde::{Deserialize, Serialize};
use werewolf_core::models::{GameConfig, Intent, PlayerId, RoomSnapshot};

/// WebSocket でクライアントに送るイベント
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "message_type", rename_all = "snake_case")]
pub enum ServerEvent {
    RoomState {
        snapshot: Box<RoomSnapshot>,
        timestamp: String,
    },
    Narration {
        room_id: String,
        text: String,
        timestamp: String,
    },
    /// 占い師本人にだけ送る
    InspectionResult {
        room_id: String,
        target_id: PlayerId,
        is_wolf: bool,
        timestamp: String,
    },
    Error {
        content: String,
        timestamp: String,
    },
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

impl ServerEvent {
    pub fn room_state(snapshot: RoomSnapshot) -> Self {
        ServerEvent::RoomState {
            snapshot: Box::new(snapshot),
            timestamp: now(),
        }
    }

    pub fn narration(room_id: &str, text: impl Into<String>) -> Self {
        ServerEvent::Narration {
            room_id: room_id.to_string(),
            text: text.into(),
            timestamp: now(),
        }
    }

    pub fn inspection(room_id: &str, target_id: PlayerId, is_wolf: bool) -> Self {
        ServerEvent::InspectionResult {
            room_id: room_id.to_string(),
            target_id,
            is_wolf,
            timestamp: now(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        ServerEvent::Error {
            content: content.into(),
            timestamp: now(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    /// 指定があれば作成者をホストとして参加させる
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub config: Option<GameConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub room_id: String,
    pub player_id: Option<PlayerId>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRoomRequest {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub existing_player_id: Option<PlayerId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRoomResponse {
    pub room_id: String,
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentRequest {
    pub player_id: PlayerId,
    pub intent: Intent,
}
