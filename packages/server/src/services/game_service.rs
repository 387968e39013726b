use tracing::debug;
use werewolf_core::models::{Intent, RoomSnapshot};

use crate::models::message::IntentRequest;
use crate::services::{error::ServiceError, room_service, room_worker::RoomHandle};
use crate::state::AppState;

/// 受け付けた操作をルームに渡す。ゲーム進行上の不正は黙って捨てる。
pub async fn submit_intent(
    state: &AppState,
    room_id: &str,
    req: IntentRequest,
) -> Result<(), ServiceError> {
    let handle = room_service::get_room(state, room_id).await?;
    submit_to(&handle, &req.player_id, req.intent).await
}

pub async fn submit_to(
    handle: &RoomHandle,
    player_id: &str,
    intent: Intent,
) -> Result<(), ServiceError> {
    match handle.intent(player_id, intent).await {
        Err(ServiceError::Rejected(rejection)) if !rejection.is_surfaced() => {
            debug!(room = %handle.room_id(), player = %player_id, %rejection, "intent ignored");
            Ok(())
        }
        other => other,
    }
}

/// `player_id` が無ければ観戦者向けの状態を返す
pub async fn get_game_state(
    state: &AppState,
    room_id: &str,
    player_id: Option<&str>,
) -> Result<RoomSnapshot, ServiceError> {
    room_service::get_room(state, room_id)
        .await?
        .snapshot(player_id)
        .await
}
