use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::{
    models::message::{CreateRoomRequest, JoinRoomRequest},
    services::{error::ServiceError, room_service},
    state::AppState,
    utils::websocket,
};

pub fn routes(state: AppState) -> Router {
    Router::new()
        // ルーム作成（ボディ省略可）
        // curl -X POST http://localhost:8080/api/room/create -H 'Content-Type: application/json' -d '{"display_name":"Alice"}'
        .route("/create", post(create_room))
        // ルーム一覧取得
        // curl http://localhost:8080/api/room/rooms
        .route("/rooms", get(get_rooms))
        // 特定のルーム情報取得
        // curl http://localhost:8080/api/room/{roomid}
        .route("/:roomid", get(get_room_info))
        // ルーム参加（再接続は existing_player_id を付ける）
        // curl -X POST http://localhost:8080/api/room/{roomid}/join -H 'Content-Type: application/json' -d '{"display_name":"Bob"}'
        .route("/:roomid/join", post(join_room))
        // ルーム脱退
        // curl -X POST http://localhost:8080/api/room/{roomid}/leave/{playerid}
        .route("/:roomid/leave/:playerid", post(leave_room))
        // WebSocket接続
        // websocat ws://localhost:8080/api/room/{roomid}/ws/{playerid}
        .route("/:roomid/ws/:playerid", get(websocket::handler))
        .with_state(state)
}

pub async fn create_room(
    State(state): State<AppState>,
    body: Option<Json<CreateRoomRequest>>,
) -> Result<impl IntoResponse, ServiceError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let created = room_service::create_room(&state, req).await?;
    Ok((StatusCode::OK, Json(created)))
}

async fn get_rooms(State(state): State<AppState>) -> impl IntoResponse {
    let rooms = room_service::get_rooms(&state).await;
    (StatusCode::OK, Json(rooms))
}

async fn get_room_info(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let room = room_service::get_room_info(&state, &room_id).await?;
    Ok((StatusCode::OK, Json(room)))
}

pub async fn join_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(req): Json<JoinRoomRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let joined = room_service::join_room(&state, &room_id, req).await?;
    Ok((StatusCode::OK, Json(joined)))
}

pub async fn leave_room(
    State(state): State<AppState>,
    Path((room_id, player_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ServiceError> {
    room_service::leave_room(&state, &room_id, &player_id).await?;
    Ok((StatusCode::OK, Json("Successfully left room")))
}
