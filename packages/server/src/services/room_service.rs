use tracing::info;
use uuid::Uuid;

use crate::{
    models::{
        message::{CreateRoomRequest, CreateRoomResponse, JoinRoomRequest, JoinRoomResponse},
        room::RoomSummary,
    },
    services::{
        error::ServiceError,
        room_worker::{self, EventSender, RoomHandle},
    },
    state::AppState,
};

/// ルームを作成し、名前があれば作成者をホストとして参加させる
pub async fn create_room(
    state: &AppState,
    req: CreateRoomRequest,
) -> Result<CreateRoomResponse, ServiceError> {
    let room_id = state.next_room_id();
    let game = state.new_game(&room_id, req.config.unwrap_or_default());
    let handle = room_worker::spawn_room(game, state.rooms.clone(), state.worker_settings());
    state
        .rooms
        .lock()
        .await
        .insert(room_id.clone(), handle.clone());
    info!(room = %room_id, "room created");

    let player_id = match req.display_name {
        Some(name) => Some(handle.join(&name, None).await?),
        None => None,
    };

    Ok(CreateRoomResponse {
        message: format!("Room created with ID: {}", room_id),
        room_id,
        player_id,
    })
}

pub async fn get_room(state: &AppState, room_id: &str) -> Result<RoomHandle, ServiceError> {
    state
        .room(room_id)
        .await
        .ok_or_else(|| ServiceError::RoomNotFound(room_id.to_string()))
}

pub async fn get_rooms(state: &AppState) -> Vec<RoomSummary> {
    // ロックを持ったまま各ルームの応答を待たない
    let handles: Vec<RoomHandle> = state.rooms.lock().await.values().cloned().collect();

    let mut rooms = Vec::with_capacity(handles.len());
    for handle in handles {
        // 問い合わせ中に閉じたルームは一覧から外す
        if let Ok(summary) = handle.summary().await {
            rooms.push(summary);
        }
    }
    rooms.sort_by_key(|room| room.room_id.parse::<u64>().unwrap_or(u64::MAX));
    rooms
}

pub async fn get_room_info(state: &AppState, room_id: &str) -> Result<RoomSummary, ServiceError> {
    get_room(state, room_id).await?.summary().await
}

pub async fn join_room(
    state: &AppState,
    room_id: &str,
    req: JoinRoomRequest,
) -> Result<JoinRoomResponse, ServiceError> {
    let handle = get_room(state, room_id).await?;
    let player_id = handle
        .join(&req.display_name, req.existing_player_id)
        .await?;
    info!(room = %room_id, player = %player_id, "player joined");
    Ok(JoinRoomResponse {
        room_id: room_id.to_string(),
        player_id,
    })
}

pub async fn leave_room(state: &AppState, room_id: &str, player_id: &str) -> Result<(), ServiceError> {
    get_room(state, room_id).await?.leave(player_id).await?;
    info!(room = %room_id, player = %player_id, "player left");
    Ok(())
}

pub async fn connect(
    handle: &RoomHandle,
    player_id: &str,
    sender: EventSender,
) -> Result<Uuid, ServiceError> {
    let connection_id = handle.connect(player_id, sender).await?;
    info!(room = %handle.room_id(), player = %player_id, "WebSocket connected");
    Ok(connection_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::DebugConfig;
    use crate::models::room::RoomStatus;
    use werewolf_core::Rejection;

    fn join(name: &str) -> JoinRoomRequest {
        JoinRoomRequest {
            display_name: name.to_string(),
            existing_player_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_room() {
        let state = AppState::with_debug_config(DebugConfig::default());
        let created = create_room(
            &state,
            CreateRoomRequest {
                display_name: Some("Host".into()),
                config: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(created.room_id, "1");

        let info = get_room_info(&state, "1").await.unwrap();
        assert_eq!(info.status, RoomStatus::Open);
        assert_eq!(info.player_count, 1);
        assert_eq!(info.host_id, created.player_id);

        let second = create_room(&state, CreateRoomRequest::default()).await.unwrap();
        assert_eq!(second.room_id, "2");
        assert_eq!(second.player_id, None);
        let ids: Vec<String> = get_rooms(&state).await.into_iter().map(|r| r.room_id).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_join_errors() {
        let state = AppState::with_debug_config(DebugConfig::default());
        assert!(matches!(
            join_room(&state, "404", join("Nobody")).await,
            Err(ServiceError::RoomNotFound(_))
        ));

        let room = create_room(&state, CreateRoomRequest::default()).await.unwrap();
        assert!(matches!(
            join_room(&state, &room.room_id, join("  ")).await,
            Err(ServiceError::Rejected(Rejection::EmptyName))
        ));
        assert!(matches!(
            leave_room(&state, &room.room_id, "ghost").await,
            Err(ServiceError::Rejected(Rejection::UnknownPlayer(_)))
        ));
    }
}
