use crate::routes;
use crate::state::AppState;
use axum::Router;

pub fn create_app() -> Router {
    let state = AppState::new();
    create_app_with_state(state)
}

/// テストなどで状態を共有したい場合に使う
pub fn create_app_with_state(state: AppState) -> Router {
    routes::create_routes(state)
}
