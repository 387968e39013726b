use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
};
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use werewolf_core::models::Intent;

use crate::models::message::ServerEvent;
use crate::services::{game_service, room_service, room_worker::RoomHandle};
use crate::state::AppState;

pub async fn handler(
    State(state): State<AppState>,
    Path((room_id, player_id)): Path<(String, String)>,
    ws: WebSocketUpgrade,
) -> Response {
    match room_service::get_room(&state, &room_id).await {
        Ok(room) => ws
            .on_upgrade(move |socket| handle_socket(socket, room, player_id))
            .into_response(),
        Err(e) => e.into_response(),
    }
}

fn encode(event: &ServerEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(text) => Some(Message::Text(text)),
        Err(e) => {
            error!("Failed to encode event: {}", e);
            None
        }
    }
}

pub async fn handle_socket(ws: WebSocket, room: RoomHandle, player_id: String) {
    let (mut sender, mut receiver) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    let connection_id = match room_service::connect(&room, &player_id, tx.clone()).await {
        Ok(id) => id,
        Err(e) => {
            warn!(room = %room.room_id(), player = %player_id, "WebSocket rejected: {}", e);
            if let Some(msg) = encode(&ServerEvent::error(e.to_string())) {
                let _ = sender.send(msg).await;
            }
            let _ = sender.close().await;
            return;
        }
    };

    let room_for_receive = room.clone();
    let player_for_receive = player_id.clone();
    let receive_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<Intent>(&text) {
                    Ok(intent) => {
                        if let Err(e) =
                            game_service::submit_to(&room_for_receive, &player_for_receive, intent)
                                .await
                        {
                            let _ = tx.send(ServerEvent::error(e.to_string()));
                        }
                    }
                    Err(e) => {
                        // 不正なメッセージフォーマットの場合、本人にだけエラーを返す
                        let _ = tx.send(ServerEvent::error(format!(
                            "メッセージのフォーマットが不正です: {}",
                            e
                        )));
                    }
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
        room_for_receive.disconnect(&player_for_receive, connection_id);
    });

    let room_id = room.room_id().to_string();
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Some(msg) = encode(&event) else {
                continue;
            };
            if let Err(e) = sender.send(msg).await {
                warn!(room = %room_id, "Error sending message: {}", e);
                break;
            }
        }
    });

    let _ = tokio::join!(receive_task, send_task);
    info!(room = %room.room_id(), player = %player_id, "WebSocket closed");
}
