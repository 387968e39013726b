//! Shared helpers for engine scenario tests.
#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

use werewolf_core::models::{
    ActionKind, Ballot, GameConfig, Intent, NightAction, Phase, PlayerId, Role, RoleConfig,
};
use werewolf_core::{Alarm, Effect, Game, Rejection};

/// A game plus a virtual clock that fires scheduled alarms in due order.
pub struct Table {
    pub game: Game,
    /// Player ids in seat order. Seat 1 hosts.
    pub ids: Vec<PlayerId>,
    now: Duration,
    alarms: Vec<(Duration, Alarm)>,
    pub narrations: Vec<String>,
    pub inspections: Vec<(PlayerId, PlayerId, bool)>,
    pub delays: Vec<Duration>,
}

pub fn roles(wolves: usize, seer: bool, witch: bool, guard: bool, hunter: bool) -> RoleConfig {
    RoleConfig {
        wolves,
        seer,
        witch,
        guard,
        hunter,
    }
}

pub fn config(roles: RoleConfig) -> GameConfig {
    GameConfig {
        roles: Some(roles),
        side_kill: false,
        election: false,
    }
}

impl Table {
    pub fn lobby(players: usize, seed: u64) -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let mut game =
            Game::new("test-room", GameConfig::default()).with_rng(StdRng::seed_from_u64(seed));
        let ids = (1..=players)
            .map(|i| game.join(&format!("Player{}", i), None).unwrap())
            .collect();
        let mut table = Table {
            game,
            ids,
            now: Duration::ZERO,
            alarms: Vec::new(),
            narrations: Vec::new(),
            inspections: Vec::new(),
            delays: Vec::new(),
        };
        table.drain();
        table
    }

    /// Seats `players`, readies everyone and starts with `config`.
    pub fn start(players: usize, config: GameConfig) -> Self {
        Self::start_seeded(players, config, 7)
    }

    pub fn start_seeded(players: usize, config: GameConfig, seed: u64) -> Self {
        let mut table = Self::lobby(players, seed);
        for id in table.ids.clone().iter().skip(1) {
            table
                .apply(id, Intent::SetReady { ready: Some(true) })
                .unwrap();
        }
        let host = table.host();
        table
            .apply(
                &host,
                Intent::StartGame {
                    config: Some(config),
                },
            )
            .unwrap();
        table
    }

    pub fn host(&self) -> PlayerId {
        self.ids[0].clone()
    }

    pub fn phase(&self) -> Phase {
        self.game.phase()
    }

    pub fn drain(&mut self) {
        for effect in self.game.take_effects() {
            match effect {
                Effect::Publish => {}
                Effect::Narrate(text) => self.narrations.push(text),
                Effect::Inspection {
                    seer_id,
                    target_id,
                    is_wolf,
                } => self.inspections.push((seer_id, target_id, is_wolf)),
                Effect::Schedule { alarm, delay } => {
                    self.delays.push(delay);
                    self.alarms.push((self.now + delay, alarm));
                }
            }
        }
    }

    pub fn apply(&mut self, player_id: &str, intent: Intent) -> Result<(), Rejection> {
        let result = self.game.apply(player_id, intent);
        self.drain();
        result
    }

    pub fn act(
        &mut self,
        player_id: &str,
        kind: ActionKind,
        target_id: Option<&str>,
    ) -> Result<(), Rejection> {
        self.apply(
            player_id,
            Intent::NightAction {
                action: NightAction::new(kind, target_id),
            },
        )
    }

    /// Host-only forced advance.
    pub fn force(&mut self) {
        let host = self.host();
        self.apply(&host, Intent::ResolvePhase).unwrap();
    }

    /// Fires the earliest pending alarm. Returns false when none are left.
    pub fn fire_next(&mut self) -> bool {
        let Some(index) = (0..self.alarms.len()).min_by_key(|i| self.alarms[*i].0) else {
            return false;
        };
        let (due, alarm) = self.alarms.remove(index);
        self.now = due;
        self.game.fire(alarm);
        self.drain();
        true
    }

    pub fn pending_alarms(&self) -> usize {
        self.alarms.len()
    }

    pub fn run_until(&mut self, phase: Phase) {
        for _ in 0..500 {
            if self.phase() == phase {
                return;
            }
            if !self.fire_next() {
                panic!("stuck in {} waiting for {}", self.phase(), phase);
            }
        }
        panic!("never reached {}", phase);
    }

    /// Lets every alarm run out without any player acting.
    pub fn settle(&mut self) {
        while self.fire_next() {}
    }

    pub fn holders(&self, role: Role) -> Vec<PlayerId> {
        self.game
            .players_with_role(role)
            .into_iter()
            .map(|p| p.id.clone())
            .collect()
    }

    pub fn holder(&self, role: Role) -> PlayerId {
        self.holders(role)
            .into_iter()
            .next()
            .unwrap_or_else(|| panic!("nobody holds {}", role))
    }

    /// Living non-host villagers, in seat order.
    pub fn villagers(&self) -> Vec<PlayerId> {
        let host = self.host();
        self.holders(Role::Villager)
            .into_iter()
            .filter(|id| *id != host && self.game.is_alive(id))
            .collect()
    }

    pub fn alive(&self) -> Vec<PlayerId> {
        self.game.alive_players().map(|p| p.id.clone()).collect()
    }

    /// Skips every night role by host force until the day is announced.
    pub fn force_through_night(&mut self) {
        for _ in 0..100 {
            match self.phase() {
                Phase::DayAnnounce => return,
                Phase::NightGuard | Phase::NightWolves | Phase::NightWitch | Phase::NightSeer => {
                    self.force()
                }
                phase => {
                    if !self.fire_next() {
                        panic!("stuck in {} during the night", phase);
                    }
                }
            }
        }
        panic!("night never ended");
    }

    /// Every living player casts the same ballot. The target abstains.
    pub fn vote_all(&mut self, ballot: Ballot) {
        for id in self.alive() {
            if self.phase() != Phase::DayVote {
                break;
            }
            let target = match &ballot {
                Ballot::Player(target) if *target == id => Ballot::Abstain,
                other => other.clone(),
            };
            self.apply(&id, Intent::DayVote { target }).unwrap();
        }
    }

    /// From the announcement, through discussion, to a unanimous vote.
    pub fn day_vote(&mut self, ballot: Ballot) {
        self.run_until(Phase::DayDiscussion);
        self.force();
        assert_eq!(self.phase(), Phase::DayVote);
        self.vote_all(ballot);
    }

    pub fn log_count(&self, message: &str) -> usize {
        self.game
            .log()
            .entries()
            .iter()
            .filter(|e| e.message == message)
            .count()
    }
}
