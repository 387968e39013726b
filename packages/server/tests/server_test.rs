use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use server::app;
use server::models::message::{CreateRoomResponse, JoinRoomResponse};
use server::models::room::{RoomStatus, RoomSummary};
use server::utils::test_setup::setup_test_env;
use tower::ServiceExt;
use werewolf_core::models::{Phase, RoomSnapshot};

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn post_json(uri: &str, json: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn create_with_host(app: &Router, name: &str) -> CreateRoomResponse {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/room/create",
            serde_json::json!({ "display_name": name, "config": { "election": false } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

async fn join(app: &Router, room_id: &str, name: &str) -> JoinRoomResponse {
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/room/{}/join", room_id),
            serde_json::json!({ "display_name": name }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

async fn send_intent(app: &Router, room_id: &str, player_id: &str, intent: serde_json::Value) -> StatusCode {
    app.clone()
        .oneshot(post_json(
            &format!("/api/game/{}/intent", room_id),
            serde_json::json!({ "player_id": player_id, "intent": intent }),
        ))
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_health() {
    setup_test_env();
    let app = app::create_app();
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_create_room() {
    setup_test_env();
    let app = app::create_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/room/create")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let created: CreateRoomResponse = body_json(response).await;
    assert!(created.message.contains("Room created with ID:"));
    assert_eq!(created.room_id, "1");
}

#[tokio::test]
async fn test_join_and_list_rooms() {
    setup_test_env();
    let app = app::create_app();

    let created = create_with_host(&app, "Alice").await;
    let host = created.player_id.clone().unwrap();
    let bob = join(&app, &created.room_id, "Bob").await;
    assert_ne!(bob.player_id, host);

    let response = app
        .clone()
        .oneshot(get(&format!("/api/room/{}", created.room_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let info: RoomSummary = body_json(response).await;
    assert_eq!(info.player_count, 2);
    assert_eq!(info.status, RoomStatus::Open);
    assert_eq!(info.host_id, Some(host));

    let response = app.clone().oneshot(get("/api/room/rooms")).await.unwrap();
    let rooms: Vec<RoomSummary> = body_json(response).await;
    assert_eq!(rooms.len(), 1);

    // 空の名前では参加できない
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/room/{}/join", created.room_id),
            serde_json::json!({ "display_name": "" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(post_json(
            "/api/room/404/join",
            serde_json::json!({ "display_name": "Carol" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_start_game_over_http() {
    setup_test_env();
    let app = app::create_app();

    let created = create_with_host(&app, "Alice").await;
    let room_id = created.room_id.clone();
    let host = created.player_id.unwrap();

    // 3人では開始できない
    let guests = vec![
        join(&app, &room_id, "Bob").await.player_id,
        join(&app, &room_id, "Carol").await.player_id,
    ];
    let status = send_intent(&app, &room_id, &host, serde_json::json!({ "type": "start_game" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut guests = guests;
    guests.push(join(&app, &room_id, "Dave").await.player_id);
    for guest in &guests {
        let status = send_intent(&app, &room_id, guest, serde_json::json!({ "type": "set_ready" })).await;
        assert_eq!(status, StatusCode::ACCEPTED);
    }
    let status = send_intent(&app, &room_id, &host, serde_json::json!({ "type": "start_game" })).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let response = app
        .clone()
        .oneshot(get(&format!("/api/game/{}/state/{}", room_id, guests[0])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let snapshot: RoomSnapshot = body_json(response).await;
    assert_eq!(snapshot.phase, Phase::GameStart);
    assert_eq!(snapshot.round, 1);
    let me = snapshot.me.unwrap();
    assert!(me.role.is_some());
    // 自分以外の役職は見えない（人狼同士を除く）
    let visible = snapshot.players.iter().filter(|p| p.role.is_some()).count();
    assert!(visible <= 2);

    // 開始後の新規参加は 409
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/room/{}/join", room_id),
            serde_json::json!({ "display_name": "Eve" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // ゲーム進行上の不正は黙って受け流す
    let status = send_intent(&app, &room_id, &guests[1], serde_json::json!({ "type": "resolve_phase" })).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let response = app
        .oneshot(get(&format!("/api/game/{}/state", room_id)))
        .await
        .unwrap();
    let public: RoomSnapshot = body_json(response).await;
    assert_eq!(public.phase, Phase::GameStart);
    assert!(public.me.is_none());
}

#[tokio::test]
async fn test_leave_room() {
    setup_test_env();
    let app = app::create_app();

    let created = create_with_host(&app, "Alice").await;
    let host = created.player_id.unwrap();
    let bob = join(&app, &created.room_id, "Bob").await.player_id;

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/room/{}/leave/{}", created.room_id, host),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // ホストは残った最小席のプレイヤーに移る
    let response = app
        .clone()
        .oneshot(get(&format!("/api/room/{}", created.room_id)))
        .await
        .unwrap();
    let info: RoomSummary = body_json(response).await;
    assert_eq!(info.host_id, Some(bob));
    assert_eq!(info.player_count, 1);

    let response = app
        .oneshot(post_json(
            &format!("/api/room/{}/leave/unknown", created.room_id),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
