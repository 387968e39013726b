use std::collections::HashMap;
use std::time::Duration;

use server::models::config::DebugConfig;
use server::models::message::{CreateRoomRequest, IntentRequest, JoinRoomRequest, ServerEvent};
use server::models::room::RoomStatus;
use server::services::error::ServiceError;
use server::services::{game_service, room_service};
use server::state::AppState;
use tokio::sync::mpsc;
use werewolf_core::models::{
    ActionKind, Ballot, GameConfig, Intent, NightAction, Phase, Role, Side,
};
use werewolf_core::Rejection;

fn debug_state(timer_scale: f64) -> AppState {
    AppState::with_debug_config(DebugConfig {
        timer_scale,
        seed: Some(7),
        ..DebugConfig::default()
    })
}

fn no_election() -> GameConfig {
    GameConfig {
        roles: None,
        side_kill: false,
        election: false,
    }
}

struct Lobby {
    state: AppState,
    room_id: String,
    ids: Vec<String>,
}

impl Lobby {
    async fn open(state: AppState, players: usize) -> Self {
        let created = room_service::create_room(
            &state,
            CreateRoomRequest {
                display_name: Some("Alice".into()),
                config: Some(no_election()),
            },
        )
        .await
        .unwrap();
        let mut ids = vec![created.player_id.unwrap()];
        for n in 1..players {
            let joined = room_service::join_room(
                &state,
                &created.room_id,
                JoinRoomRequest {
                    display_name: format!("Player {}", n + 1),
                    existing_player_id: None,
                },
            )
            .await
            .unwrap();
            ids.push(joined.player_id);
        }
        Lobby {
            state,
            room_id: created.room_id,
            ids,
        }
    }

    fn host(&self) -> String {
        self.ids[0].clone()
    }

    async fn send(&self, player_id: &str, intent: Intent) -> Result<(), ServiceError> {
        game_service::submit_intent(
            &self.state,
            &self.room_id,
            IntentRequest {
                player_id: player_id.to_string(),
                intent,
            },
        )
        .await
    }

    async fn ready_all(&self) {
        for id in &self.ids[1..] {
            self.send(id, Intent::SetReady { ready: Some(true) })
                .await
                .unwrap();
        }
    }

    async fn phase(&self) -> Phase {
        game_service::get_game_state(&self.state, &self.room_id, None)
            .await
            .unwrap()
            .phase
    }

    async fn force(&self) {
        self.send(&self.host(), Intent::ResolvePhase).await.unwrap();
    }

    async fn roles(&self) -> HashMap<Role, Vec<String>> {
        let mut roles: HashMap<Role, Vec<String>> = HashMap::new();
        for id in &self.ids {
            let snapshot = game_service::get_game_state(&self.state, &self.room_id, Some(id))
                .await
                .unwrap();
            let role = snapshot.me.unwrap().role.unwrap();
            roles.entry(role).or_default().push(id.clone());
        }
        roles
    }
}

#[tokio::test]
async fn test_full_game_through_services() {
    let lobby = Lobby::open(debug_state(100.0), 4).await;
    lobby.ready_all().await;
    lobby
        .send(&lobby.host(), Intent::StartGame { config: None })
        .await
        .unwrap();
    assert_eq!(lobby.phase().await, Phase::GameStart);

    let roles = lobby.roles().await;
    let wolf = roles[&Role::Wolf][0].clone();
    let seer = roles[&Role::Seer][0].clone();
    let villager = roles[&Role::Villager][0].clone();

    // 占い結果を受け取るために占い師だけ接続しておく
    let room = room_service::get_room(&lobby.state, &lobby.room_id)
        .await
        .unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    room_service::connect(&room, &seer, tx).await.unwrap();

    lobby.force().await;
    assert_eq!(lobby.phase().await, Phase::NightStart);
    lobby.force().await;
    assert_eq!(lobby.phase().await, Phase::NightWolves);

    let kill = NightAction::new(ActionKind::Kill, Some(&villager));
    lobby
        .send(&wolf, Intent::NightAction { action: kill })
        .await
        .unwrap();
    lobby.force().await;
    assert_eq!(lobby.phase().await, Phase::NightWitch);
    lobby.force().await;
    assert_eq!(lobby.phase().await, Phase::NightSeer);

    let inspect = NightAction::new(ActionKind::Inspect, Some(&wolf));
    lobby
        .send(&seer, Intent::NightAction { action: inspect })
        .await
        .unwrap();
    let mut inspected = None;
    while let Ok(Some(event)) = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await {
        if let ServerEvent::InspectionResult {
            target_id, is_wolf, ..
        } = event
        {
            inspected = Some((target_id, is_wolf));
            break;
        }
    }
    assert_eq!(inspected, Some((wolf.clone(), true)));

    // 夜の解決、そして朝の発表へ
    lobby.force().await;
    lobby.force().await;
    assert_eq!(lobby.phase().await, Phase::DayAnnounce);
    lobby.force().await;
    assert_eq!(lobby.phase().await, Phase::DayDiscussion);
    lobby.force().await;
    assert_eq!(lobby.phase().await, Phase::DayVote);

    for id in &lobby.ids {
        if *id == villager {
            continue;
        }
        let target = if *id == wolf {
            Ballot::Abstain
        } else {
            Ballot::Player(wolf.clone())
        };
        lobby.send(id, Intent::DayVote { target }).await.unwrap();
    }

    let public = game_service::get_game_state(&lobby.state, &lobby.room_id, None)
        .await
        .unwrap();
    assert_eq!(public.phase, Phase::Finished);
    assert_eq!(public.winner, Some(Side::Villagers));
    assert!(public.players.iter().all(|p| p.role.is_some()));

    let summary = room_service::get_room_info(&lobby.state, &lobby.room_id)
        .await
        .unwrap();
    assert_eq!(summary.status, RoomStatus::Finished);
    assert_eq!(summary.winner, Some(Side::Villagers));

    lobby.send(&lobby.host(), Intent::PlayAgain).await.unwrap();
    assert_eq!(lobby.phase().await, Phase::Waiting);
}

#[tokio::test]
async fn test_only_session_errors_are_reported() {
    let lobby = Lobby::open(debug_state(100.0), 3).await;

    // 人数不足はホストに返す
    let result = lobby
        .send(&lobby.host(), Intent::StartGame { config: None })
        .await;
    assert!(matches!(
        result,
        Err(ServiceError::Rejected(Rejection::NotEnoughPlayers { needed: 4, have: 3 }))
    ));

    // ホスト以外の開始要求は黙って捨てる
    let guest = lobby.ids[1].clone();
    assert!(lobby
        .send(&guest, Intent::StartGame { config: None })
        .await
        .is_ok());
    assert_eq!(lobby.phase().await, Phase::Waiting);

    let unknown = lobby.send("ghost", Intent::EndSpeech).await;
    assert!(matches!(
        unknown,
        Err(ServiceError::Rejected(Rejection::UnknownPlayer(_)))
    ));

    let missing = game_service::get_game_state(&lobby.state, "999", None).await;
    assert!(matches!(missing, Err(ServiceError::RoomNotFound(_))));
}

#[tokio::test]
async fn test_late_joiners_are_refused_but_seated_players_reconnect() {
    let lobby = Lobby::open(debug_state(100.0), 4).await;
    lobby.ready_all().await;
    lobby
        .send(&lobby.host(), Intent::StartGame { config: None })
        .await
        .unwrap();

    let late = room_service::join_room(
        &lobby.state,
        &lobby.room_id,
        JoinRoomRequest {
            display_name: "Eve".into(),
            existing_player_id: None,
        },
    )
    .await;
    assert!(matches!(
        late,
        Err(ServiceError::Rejected(Rejection::GameAlreadyStarted))
    ));

    let guest = lobby.ids[2].clone();
    room_service::leave_room(&lobby.state, &lobby.room_id, &guest)
        .await
        .unwrap();
    let view = game_service::get_game_state(&lobby.state, &lobby.room_id, None)
        .await
        .unwrap();
    assert!(!view.players[2].connected);

    let back = room_service::join_room(
        &lobby.state,
        &lobby.room_id,
        JoinRoomRequest {
            display_name: String::new(),
            existing_player_id: Some(guest.clone()),
        },
    )
    .await
    .unwrap();
    assert_eq!(back.player_id, guest);
}

#[tokio::test]
async fn test_alarms_advance_the_room_on_their_own() {
    let lobby = Lobby::open(debug_state(0.0), 4).await;
    lobby.ready_all().await;
    lobby
        .send(&lobby.host(), Intent::StartGame { config: None })
        .await
        .unwrap();

    // 待ち時間ゼロなら最初の役職の手番まで自動で進む
    let reached = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if lobby.phase().await == Phase::NightWolves {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(reached.is_ok());
}
