//! One task per room. The worker owns the room's [`Game`] and processes
//! commands from its inbox strictly one at a time, so joins, intents,
//! connection changes and fired alarms for a room never interleave.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;
use werewolf_core::models::{Intent, Phase, PlayerId, RoomSnapshot};
use werewolf_core::{Alarm, Effect, Game, Rejection};

use crate::models::message::ServerEvent;
use crate::models::room::{RoomStatus, RoomSummary};
use crate::services::error::ServiceError;

pub type RoomRegistry = Arc<Mutex<HashMap<String, RoomHandle>>>;
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

type Reply<T> = oneshot::Sender<T>;

pub enum RoomCommand {
    Join {
        display_name: String,
        existing_player_id: Option<PlayerId>,
        reply: Reply<Result<PlayerId, Rejection>>,
    },
    Leave {
        player_id: PlayerId,
        reply: Reply<Result<(), Rejection>>,
    },
    Intent {
        player_id: PlayerId,
        intent: Intent,
        reply: Reply<Result<(), Rejection>>,
    },
    Connect {
        player_id: PlayerId,
        sender: EventSender,
        reply: Reply<Result<Uuid, Rejection>>,
    },
    Disconnect {
        player_id: PlayerId,
        connection_id: Uuid,
    },
    Snapshot {
        viewer: Option<PlayerId>,
        reply: Reply<RoomSnapshot>,
    },
    Summary {
        reply: Reply<RoomSummary>,
    },
    Fire(Alarm),
}

#[derive(Debug, Clone, Copy)]
pub struct WorkerSettings {
    pub reveal_roles: bool,
    pub verbose: bool,
    pub idle_timeout: Duration,
}

/// Cheap, cloneable address of a running room worker.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_id: String,
    inbox: mpsc::UnboundedSender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> RoomCommand,
    ) -> Result<T, ServiceError> {
        let (reply, response) = oneshot::channel();
        self.inbox
            .send(command(reply))
            .map_err(|_| ServiceError::RoomClosed(self.room_id.clone()))?;
        response
            .await
            .map_err(|_| ServiceError::RoomClosed(self.room_id.clone()))
    }

    pub async fn join(
        &self,
        display_name: &str,
        existing_player_id: Option<PlayerId>,
    ) -> Result<PlayerId, ServiceError> {
        let display_name = display_name.to_string();
        Ok(self
            .request(|reply| RoomCommand::Join {
                display_name,
                existing_player_id,
                reply,
            })
            .await??)
    }

    pub async fn leave(&self, player_id: &str) -> Result<(), ServiceError> {
        let player_id = player_id.to_string();
        Ok(self
            .request(|reply| RoomCommand::Leave { player_id, reply })
            .await??)
    }

    pub async fn intent(&self, player_id: &str, intent: Intent) -> Result<(), ServiceError> {
        let player_id = player_id.to_string();
        Ok(self
            .request(|reply| RoomCommand::Intent {
                player_id,
                intent,
                reply,
            })
            .await??)
    }

    /// Registers `sender` as the player's connection, replacing any earlier one.
    pub async fn connect(&self, player_id: &str, sender: EventSender) -> Result<Uuid, ServiceError> {
        let player_id = player_id.to_string();
        Ok(self
            .request(|reply| RoomCommand::Connect {
                player_id,
                sender,
                reply,
            })
            .await??)
    }

    pub fn disconnect(&self, player_id: &str, connection_id: Uuid) {
        let command = RoomCommand::Disconnect {
            player_id: player_id.to_string(),
            connection_id,
        };
        if self.inbox.send(command).is_err() {
            debug!(room = %self.room_id, "room already closed on disconnect");
        }
    }

    pub async fn snapshot(&self, viewer: Option<&str>) -> Result<RoomSnapshot, ServiceError> {
        let viewer = viewer.map(str::to_string);
        self.request(|reply| RoomCommand::Snapshot { viewer, reply })
            .await
    }

    pub async fn summary(&self) -> Result<RoomSummary, ServiceError> {
        self.request(|reply| RoomCommand::Summary { reply }).await
    }
}

struct Connection {
    id: Uuid,
    sender: EventSender,
}

struct RoomWorker {
    game: Game,
    inbox: mpsc::UnboundedReceiver<RoomCommand>,
    // アラームはこの送信側から自分の inbox に戻ってくる
    alarms: mpsc::UnboundedSender<RoomCommand>,
    connections: HashMap<PlayerId, Connection>,
    registry: RoomRegistry,
    settings: WorkerSettings,
    idle_deadline: Option<Instant>,
    closed: bool,
}

/// Starts the worker for `game`. The caller is expected to put the returned
/// handle into `registry`; the worker removes it again when the room closes.
pub fn spawn_room(game: Game, registry: RoomRegistry, settings: WorkerSettings) -> RoomHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = RoomHandle {
        room_id: game.room_id().to_string(),
        inbox: tx.clone(),
    };
    let worker = RoomWorker {
        game,
        inbox: rx,
        alarms: tx,
        connections: HashMap::new(),
        registry,
        settings,
        idle_deadline: None,
        closed: false,
    };
    tokio::spawn(worker.run());
    handle
}

async fn idle(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

impl RoomWorker {
    async fn run(mut self) {
        let room_id = self.game.room_id().to_string();
        info!(room = %room_id, "room worker started");
        self.update_idle_deadline();

        loop {
            let deadline = self.idle_deadline;
            let command = tokio::select! {
                command = self.inbox.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
                _ = idle(deadline) => {
                    info!(room = %room_id, "closing idle room");
                    break;
                }
            };

            self.handle(command);
            self.flush();
            if self.closed {
                info!(room = %room_id, "last player left, closing room");
                break;
            }
            self.update_idle_deadline();
        }

        self.registry.lock().await.remove(&room_id);
        info!(room = %room_id, "room worker stopped");
    }

    fn handle(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Join {
                display_name,
                existing_player_id,
                reply,
            } => {
                let result = self.game.join(&display_name, existing_player_id.as_deref());
                let _ = reply.send(result);
            }
            RoomCommand::Leave { player_id, reply } => {
                let result = match self.game.leave(&player_id) {
                    Ok(empty) => {
                        self.connections.remove(&player_id);
                        self.closed = empty;
                        Ok(())
                    }
                    Err(rejection) => Err(rejection),
                };
                let _ = reply.send(result);
            }
            RoomCommand::Intent {
                player_id,
                intent,
                reply,
            } => {
                let result = self.game.apply(&player_id, intent);
                let _ = reply.send(result);
            }
            RoomCommand::Connect {
                player_id,
                sender,
                reply,
            } => {
                let _ = reply.send(self.connect(player_id, sender));
            }
            RoomCommand::Disconnect {
                player_id,
                connection_id,
            } => {
                // 再接続で置き換え済みなら古い切断は無視する
                let current = self.connections.get(&player_id).map(|c| c.id);
                if current == Some(connection_id) {
                    self.connections.remove(&player_id);
                    self.game.set_connected(&player_id, false);
                    info!(room = %self.game.room_id(), player = %player_id, "player disconnected");
                }
            }
            RoomCommand::Snapshot { viewer, reply } => {
                let snapshot = self
                    .game
                    .snapshot(viewer.as_deref(), self.settings.reveal_roles);
                let _ = reply.send(snapshot);
            }
            RoomCommand::Summary { reply } => {
                let _ = reply.send(self.summary());
            }
            RoomCommand::Fire(alarm) => self.game.fire(alarm),
        }
    }

    fn connect(&mut self, player_id: PlayerId, sender: EventSender) -> Result<Uuid, Rejection> {
        let was_connected = match self.game.player(&player_id) {
            Some(player) => player.connected,
            None => return Err(Rejection::UnknownPlayer(player_id)),
        };

        let id = Uuid::new_v4();
        let previous = self
            .connections
            .insert(player_id.clone(), Connection { id, sender });
        if previous.is_some() {
            info!(room = %self.game.room_id(), player = %player_id, "replacing previous connection");
        }

        self.game.set_connected(&player_id, true);
        // 状態が変わらなければ Publish は出ないので、本人にだけ送る
        if was_connected {
            self.send_snapshot(&player_id);
        }
        Ok(id)
    }

    /// Drains the engine's outbox. Any number of publishes collapse into one
    /// snapshot per connection.
    fn flush(&mut self) {
        let room_id = self.game.room_id().to_string();
        let mut publish = false;

        for effect in self.game.take_effects() {
            if self.settings.verbose {
                info!(room = %room_id, ?effect, "effect");
            }
            match effect {
                Effect::Publish => publish = true,
                Effect::Narrate(text) => self.broadcast(ServerEvent::narration(&room_id, text)),
                Effect::Inspection {
                    seer_id,
                    target_id,
                    is_wolf,
                } => self.send_to(&seer_id, ServerEvent::inspection(&room_id, target_id, is_wolf)),
                Effect::Schedule { alarm, delay } => self.schedule(alarm, delay),
            }
        }

        if publish {
            self.publish();
        }
    }

    fn schedule(&self, alarm: Alarm, delay: Duration) {
        debug!(room = %self.game.room_id(), ?alarm, ?delay, "alarm scheduled");
        let inbox = self.alarms.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // ルームが閉じていれば届かなくてよい
            let _ = inbox.send(RoomCommand::Fire(alarm));
        });
    }

    fn publish(&self) {
        for player_id in self.connections.keys() {
            self.send_snapshot(player_id);
        }
    }

    fn send_snapshot(&self, player_id: &str) {
        let snapshot = self
            .game
            .snapshot(Some(player_id), self.settings.reveal_roles);
        self.send_to(player_id, ServerEvent::room_state(snapshot));
    }

    fn broadcast(&self, event: ServerEvent) {
        for player_id in self.connections.keys() {
            self.send_to(player_id, event.clone());
        }
    }

    fn send_to(&self, player_id: &str, event: ServerEvent) {
        if let Some(connection) = self.connections.get(player_id) {
            if connection.sender.send(event).is_err() {
                warn!(room = %self.game.room_id(), player = %player_id, "connection dropped before delivery");
            }
        }
    }

    fn summary(&self) -> RoomSummary {
        RoomSummary {
            room_id: self.game.room_id().to_string(),
            status: RoomStatus::from(self.game.phase()),
            phase: self.game.phase(),
            round: self.game.round(),
            host_id: self.game.host_id().map(str::to_string),
            player_count: self.game.players().len(),
            max_players: self.game.max_players(),
            winner: self.game.winner(),
        }
    }

    /// Finished rooms and rooms nobody sits in are closed after the idle timeout.
    fn update_idle_deadline(&mut self) {
        let idle = self.game.phase() == Phase::Finished || self.game.is_empty();
        match (idle, self.idle_deadline) {
            (true, None) => {
                self.idle_deadline = Some(Instant::now() + self.settings.idle_timeout);
            }
            (false, Some(_)) => self.idle_deadline = None,
            _ => {}
        }
    }
}
