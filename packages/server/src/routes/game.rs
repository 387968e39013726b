use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::state::AppState;
use crate::{
    models::message::IntentRequest,
    services::{error::ServiceError, game_service},
};

pub fn routes(state: AppState) -> Router {
    Router::new()
        .nest(
            "/:roomid",
            Router::new()
                // WebSocket と同じ操作を HTTP で送る
                // curl -X POST http://localhost:8080/api/game/{roomid}/intent -H 'Content-Type: application/json' -d '{"player_id":"...","intent":{"type":"set_ready"}}'
                .route("/intent", post(submit_intent))
                // 観戦者向けの状態
                // curl http://localhost:8080/api/game/{roomid}/state
                .route("/state", get(get_public_state))
                // プレイヤー本人から見た状態
                // curl http://localhost:8080/api/game/{roomid}/state/{playerid}
                .route("/state/:playerid", get(get_player_state)),
        )
        .with_state(state)
}

async fn submit_intent(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(req): Json<IntentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    game_service::submit_intent(&state, &room_id, req).await?;
    Ok((StatusCode::ACCEPTED, Json("Intent accepted")))
}

async fn get_public_state(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let snapshot = game_service::get_game_state(&state, &room_id, None).await?;
    Ok((StatusCode::OK, Json(snapshot)))
}

async fn get_player_state(
    State(state): State<AppState>,
    Path((room_id, player_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ServiceError> {
    let snapshot = game_service::get_game_state(&state, &room_id, Some(&player_id)).await?;
    Ok((StatusCode::OK, Json(snapshot)))
}
