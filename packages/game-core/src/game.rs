//! The room state machine. Owns the phase and every piece of per-room state;
//! the night, day and election modules only hold data and answer questions.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

use crate::day::{BallotBox, SpeakingQueue};
use crate::effect::{Alarm, DelayRange, Effect, Timings};
use crate::election::Election;
use crate::error::Rejection;
use crate::models::{
    DeathCause, GameConfig, GameLog, Intent, Phase, Player, PlayerId, Role, Side, Target,
};
use crate::night::NightState;

mod intents;
mod transitions;
mod view;

pub const DEFAULT_MAX_PLAYERS: usize = 16;
pub const LOG_TAIL: usize = 50;

pub struct Game {
    pub(crate) room_id: String,
    pub(crate) host_id: Option<PlayerId>,
    pub(crate) phase: Phase,
    pub(crate) round: u32,
    /// Kept sorted by seat.
    pub(crate) players: Vec<Player>,
    pub(crate) log: GameLog,
    pub(crate) night_flow: Vec<Phase>,
    /// Index into `night_flow` of the next night phase to enter.
    pub(crate) night_cursor: usize,
    pub(crate) night: NightState,
    pub(crate) night_resolved: bool,
    pub(crate) pending_deaths: Vec<(PlayerId, DeathCause)>,
    pub(crate) speaking: Option<SpeakingQueue>,
    pub(crate) ballots: BallotBox,
    pub(crate) executed_id: Option<PlayerId>,
    pub(crate) first_execution_done: bool,
    pub(crate) hunter_queue: VecDeque<PlayerId>,
    pub(crate) hunter_dead_id: Option<PlayerId>,
    /// Where to go once every pending hunter has decided.
    pub(crate) resume: Option<Target>,
    pub(crate) election: Election,
    pub(crate) winner: Option<Side>,
    pub(crate) lobby_config: GameConfig,
    pub(crate) config: Option<GameConfig>,
    pub(crate) villagers_at_start: usize,
    pub(crate) gods_at_start: usize,
    pub(crate) timings: Timings,
    pub(crate) max_players: usize,
    pub(crate) transition_seq: u64,
    rng: Box<dyn RngCore + Send>,
    effects: Vec<Effect>,
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("room_id", &self.room_id)
            .field("phase", &self.phase)
            .field("round", &self.round)
            .field("players", &self.players.len())
            .field("winner", &self.winner)
            .finish()
    }
}

impl Game {
    pub fn new(room_id: impl Into<String>, lobby_config: GameConfig) -> Self {
        Game {
            room_id: room_id.into(),
            host_id: None,
            phase: Phase::Waiting,
            round: 0,
            players: Vec::new(),
            log: GameLog::default(),
            night_flow: Vec::new(),
            night_cursor: 0,
            night: NightState::default(),
            night_resolved: false,
            pending_deaths: Vec::new(),
            speaking: None,
            ballots: BallotBox::default(),
            executed_id: None,
            first_execution_done: false,
            hunter_queue: VecDeque::new(),
            hunter_dead_id: None,
            resume: None,
            election: Election::default(),
            winner: None,
            lobby_config,
            config: None,
            villagers_at_start: 0,
            gods_at_start: 0,
            timings: Timings::default(),
            max_players: DEFAULT_MAX_PLAYERS,
            transition_seq: 0,
            rng: Box::new(StdRng::from_entropy()),
            effects: Vec::new(),
        }
    }

    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_max_players(mut self, max_players: usize) -> Self {
        self.max_players = max_players;
        self
    }

    // ---- accessors ----

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn host_id(&self) -> Option<&str> {
        self.host_id.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn winner(&self) -> Option<Side> {
        self.winner
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub(crate) fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    pub fn players_with_role(&self, role: Role) -> Vec<&Player> {
        self.players.iter().filter(|p| p.has_role(role)).collect()
    }

    pub fn alive_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_alive())
    }

    pub fn alive_count(&self) -> usize {
        self.alive_players().count()
    }

    pub fn is_alive(&self, player_id: &str) -> bool {
        self.player(player_id).is_some_and(Player::is_alive)
    }

    pub fn is_host(&self, player_id: &str) -> bool {
        self.host_id.as_deref() == Some(player_id)
    }

    pub fn night(&self) -> &NightState {
        &self.night
    }

    pub fn night_flow(&self) -> &[Phase] {
        &self.night_flow
    }

    pub fn election(&self) -> &Election {
        &self.election
    }

    pub fn ballots(&self) -> &BallotBox {
        &self.ballots
    }

    pub fn speaking(&self) -> Option<&SpeakingQueue> {
        self.speaking.as_ref()
    }

    pub fn log(&self) -> &GameLog {
        &self.log
    }

    pub fn executed_id(&self) -> Option<&str> {
        self.executed_id.as_deref()
    }

    pub fn first_execution_done(&self) -> bool {
        self.first_execution_done
    }

    pub fn hunter_dead_id(&self) -> Option<&str> {
        self.hunter_dead_id.as_deref()
    }

    /// The rules of the running game, or the lobby defaults before start.
    pub fn config(&self) -> GameConfig {
        self.config.unwrap_or(self.lobby_config)
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    // ---- lobby ----

    /// Adds a player, or reconnects `existing_player_id` if it is already seated.
    pub fn join(
        &mut self,
        display_name: &str,
        existing_player_id: Option<&str>,
    ) -> Result<PlayerId, Rejection> {
        if let Some(existing) = existing_player_id {
            if let Some(player) = self.player_mut(existing) {
                player.connected = true;
                let id = player.id.clone();
                info!(room = %self.room_id, player = %id, "player reconnected");
                self.emit(Effect::Publish);
                return Ok(id);
            }
        }

        if self.phase != Phase::Waiting {
            return Err(Rejection::GameAlreadyStarted);
        }
        let name = display_name.trim();
        if name.is_empty() {
            return Err(Rejection::EmptyName);
        }
        if self.players.len() >= self.max_players {
            return Err(Rejection::RoomFull(self.max_players));
        }

        let seat = (1..)
            .find(|seat| self.players.iter().all(|p| p.seat != *seat))
            .unwrap_or(self.players.len() + 1);
        let id = uuid::Uuid::new_v4().to_string();
        self.players
            .push(Player::new(id.clone(), name.to_string(), seat));
        self.players.sort_by_key(|p| p.seat);
        if self.host_id.is_none() {
            self.host_id = Some(id.clone());
        }

        self.announce(format!("{} joined (seat {}).", name, seat));
        self.emit(Effect::Publish);
        Ok(id)
    }

    /// Before start the player is removed; afterwards they stay seated and are
    /// marked disconnected. Returns whether the room is now empty.
    pub fn leave(&mut self, player_id: &str) -> Result<bool, Rejection> {
        if self.player(player_id).is_none() {
            return Err(Rejection::UnknownPlayer(player_id.to_string()));
        }

        if self.phase == Phase::Waiting {
            let name = self
                .player(player_id)
                .map(|p| p.name.clone())
                .unwrap_or_default();
            self.players.retain(|p| p.id != player_id);
            if self.is_host(player_id) {
                self.host_id = self.players.first().map(|p| p.id.clone());
            }
            if self.players.is_empty() {
                return Ok(true);
            }
            self.announce(format!("{} left.", name));
        } else if let Some(player) = self.player_mut(player_id) {
            player.connected = false;
        }
        self.emit(Effect::Publish);
        Ok(false)
    }

    pub fn set_connected(&mut self, player_id: &str, connected: bool) {
        if let Some(player) = self.player_mut(player_id) {
            if player.connected != connected {
                player.connected = connected;
                self.emit(Effect::Publish);
            }
        }
    }

    // ---- events ----

    /// Applies one client intent. Gameplay rejections leave the state untouched
    /// and are only logged here; the caller decides whether to surface them.
    pub fn apply(&mut self, player_id: &str, intent: Intent) -> Result<(), Rejection> {
        let name = intent.name();
        let result = if self.player(player_id).is_none() {
            Err(Rejection::UnknownPlayer(player_id.to_string()))
        } else {
            self.dispatch(player_id, intent)
        };

        if let Err(rejection) = &result {
            debug!(
                room = %self.room_id,
                player = %player_id,
                intent = name,
                phase = %self.phase,
                reason = %rejection,
                "dropping intent"
            );
        }
        result
    }

    fn dispatch(&mut self, player_id: &str, intent: Intent) -> Result<(), Rejection> {
        match intent {
            Intent::SetReady { ready } => self.set_ready(player_id, ready),
            Intent::StartGame { config } => self.start_game(player_id, config),
            Intent::NightAction { action } => self.role_action(player_id, action),
            Intent::ProposeTarget { target_id } => self.propose_target(player_id, &target_id),
            Intent::DayVote { target } => self.day_vote(player_id, target),
            Intent::EndSpeech => self.end_speech(player_id),
            Intent::ResolvePhase => self.resolve_phase(player_id),
            Intent::MayorNominate { run } => self.mayor_nominate(player_id, run),
            Intent::MayorWithdraw { withdraw } => self.mayor_withdraw(player_id, withdraw),
            Intent::MayorVote { target_id } => self.mayor_vote(player_id, &target_id),
            Intent::PlayAgain => self.play_again(player_id),
        }
    }

    /// Runs a scheduled continuation. Alarms from an earlier transition are stale.
    pub fn fire(&mut self, alarm: Alarm) {
        if alarm.seq() != self.transition_seq {
            debug!(
                room = %self.room_id,
                ?alarm,
                current = self.transition_seq,
                "dropping stale alarm"
            );
            return;
        }
        match alarm {
            Alarm::Advance { target, .. } => self.go(target),
            Alarm::ReopenVote { .. } => self.reopen_vote(),
        }
    }

    // ---- effect helpers ----

    pub(crate) fn emit(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    /// Public log line plus narration.
    pub(crate) fn announce(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.log.push(self.round, self.phase, message.clone());
        self.emit(Effect::Narrate(message));
    }

    pub(crate) fn schedule(&mut self, target: Target, delay: DelayRange) {
        let delay = delay.sample(self.rng.as_mut());
        self.schedule_exact(
            Alarm::Advance {
                seq: self.transition_seq,
                target,
            },
            delay,
        );
    }

    pub(crate) fn schedule_exact(&mut self, alarm: Alarm, delay: Duration) {
        self.emit(Effect::Schedule { alarm, delay });
    }

    pub(crate) fn rng(&mut self) -> &mut dyn RngCore {
        self.rng.as_mut()
    }

    pub(crate) fn seat_order(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id.clone()).collect()
    }

    pub(crate) fn name_of(&self, player_id: &str) -> String {
        self.player(player_id)
            .map(|p| format!("{} (seat {})", p.name, p.seat))
            .unwrap_or_else(|| player_id.to_string())
    }
}
