use crate::services::error::ServiceError;
use crate::state::AppState;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use werewolf_core::Rejection;

mod game;
mod room;

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // curl http://localhost:8080/health
        .route("/health", get(health))
        .nest("/api/room", room::routes(state.clone()))
        .nest("/api/game", game::routes(state.clone()))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::RoomNotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::RoomClosed(_) => StatusCode::GONE,
            ServiceError::Rejected(Rejection::UnknownPlayer(_)) => StatusCode::NOT_FOUND,
            ServiceError::Rejected(Rejection::GameAlreadyStarted | Rejection::RoomFull(_)) => {
                StatusCode::CONFLICT
            }
            ServiceError::Rejected(Rejection::NotHost) => StatusCode::FORBIDDEN,
            ServiceError::Rejected(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
