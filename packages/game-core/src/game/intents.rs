//! One handler per inbound intent. Each validates first and only then mutates,
//! so a rejected intent leaves the room exactly as it was.

use tracing::info;

use super::Game;
use crate::capability::{self, SkipEffect};
use crate::day::Cast;
use crate::deck::{self, MIN_PLAYERS};
use crate::effect::Effect;
use crate::error::Rejection;
use crate::models::{
    ActionKind, Ballot, DisabledReason, GameConfig, NightAction, Phase, Target,
};
use crate::night::WitchChoice;

impl Game {
    fn require_phase(&self, intent: &'static str, allowed: &[Phase]) -> Result<(), Rejection> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(Rejection::WrongPhase {
                intent,
                phase: self.phase,
            })
        }
    }

    fn require_alive(&self, player_id: &str) -> Result<(), Rejection> {
        if self.is_alive(player_id) {
            Ok(())
        } else {
            Err(Rejection::ActorDead)
        }
    }

    fn require_host(&self, player_id: &str) -> Result<(), Rejection> {
        if self.is_host(player_id) {
            Ok(())
        } else {
            Err(Rejection::NotHost)
        }
    }

    fn require_living_target(&self, target_id: &str) -> Result<(), Rejection> {
        if self.is_alive(target_id) {
            Ok(())
        } else {
            Err(Rejection::InvalidTarget(target_id.to_string()))
        }
    }

    // ---- lobby ----

    pub(super) fn set_ready(&mut self, player_id: &str, ready: Option<bool>) -> Result<(), Rejection> {
        self.require_phase("set_ready", &[Phase::Waiting])?;
        if let Some(player) = self.player_mut(player_id) {
            player.is_ready = ready.unwrap_or(!player.is_ready);
        }
        self.emit(Effect::Publish);
        Ok(())
    }

    pub(super) fn start_game(
        &mut self,
        player_id: &str,
        config: Option<GameConfig>,
    ) -> Result<(), Rejection> {
        if self.phase != Phase::Waiting {
            return Err(Rejection::GameAlreadyStarted);
        }
        self.require_host(player_id)?;
        let have = self.players.len();
        if have < MIN_PLAYERS {
            return Err(Rejection::NotEnoughPlayers {
                needed: MIN_PLAYERS,
                have,
            });
        }
        // ホストは準備完了扱い
        let not_ready = self
            .players
            .iter()
            .filter(|p| !p.is_ready && !self.is_host(&p.id))
            .count();
        if not_ready > 0 {
            return Err(Rejection::PlayersNotReady(not_ready));
        }

        let config = config.unwrap_or(self.lobby_config);
        let roles = deck::build_deck(have, config.roles.as_ref(), self.rng());
        for (player, role) in self.players.iter_mut().zip(roles) {
            player.role = Some(role);
        }
        self.config = Some(config);
        self.villagers_at_start = self
            .players
            .iter()
            .filter(|p| p.role.is_some_and(|r| r.is_plain_villager()))
            .count();
        self.gods_at_start = self
            .players
            .iter()
            .filter(|p| p.role.is_some_and(|r| r.is_god()))
            .count();
        self.round = 1;
        info!(
            room = %self.room_id,
            players = have,
            wolves = self.players.iter().filter(|p| p.is_wolf()).count(),
            ?config,
            "game started"
        );
        self.advance_phase(Phase::GameStart);
        Ok(())
    }

    pub(super) fn play_again(&mut self, player_id: &str) -> Result<(), Rejection> {
        self.require_phase("play_again", &[Phase::Finished])?;
        self.require_host(player_id)?;

        for player in &mut self.players {
            player.reset_for_lobby();
        }
        self.round = 0;
        self.winner = None;
        self.config = None;
        self.log.clear();
        self.night = Default::default();
        self.night_flow.clear();
        self.night_cursor = 0;
        self.night_resolved = false;
        self.pending_deaths.clear();
        self.speaking = None;
        self.ballots = Default::default();
        self.executed_id = None;
        self.first_execution_done = false;
        self.hunter_queue.clear();
        self.hunter_dead_id = None;
        self.resume = None;
        self.election = Default::default();
        self.villagers_at_start = 0;
        self.gods_at_start = 0;
        info!(room = %self.room_id, "back to the lobby");
        self.advance_phase(Phase::Waiting);
        Ok(())
    }

    // ---- night ----

    pub(super) fn role_action(&mut self, player_id: &str, action: NightAction) -> Result<(), Rejection> {
        let Some(player) = self.player(player_id) else {
            return Err(Rejection::UnknownPlayer(player_id.to_string()));
        };
        let skip = player.role.and_then(capability::skip_effect);
        if player.is_dead && !capability::acts_while_dead(player) {
            return Err(Rejection::ActorDead);
        }
        if self.phase.is_night() && self.night_resolved {
            return Err(Rejection::WrongPhase {
                intent: "night_action",
                phase: self.phase,
            });
        }

        let menu = capability::available_actions(self, player);
        let offered = menu
            .iter()
            .find(|a| a.kind == action.kind)
            .ok_or(Rejection::ActionNotOffered(action.kind))?;
        if let Some(reason) = offered.disabled {
            return Err(Rejection::ActionDisabled {
                kind: action.kind,
                reason,
            });
        }
        let target = if offered.needs_target {
            let target = action
                .target_id
                .as_deref()
                .ok_or(Rejection::MissingTarget(action.kind))?;
            if self.player(target).is_none() {
                return Err(Rejection::InvalidTarget(target.to_string()));
            }
            if let Some(reason) = offered.target_reason(target) {
                return Err(Rejection::ActionDisabled {
                    kind: action.kind,
                    reason,
                });
            }
            Some(target.to_string())
        } else {
            None
        };

        let kind = action.kind;
        let rejected = |reason: DisabledReason| Rejection::ActionDisabled { kind, reason };
        let target = target.as_deref();
        match (kind, target) {
            (ActionKind::Kill, Some(t)) => self.night.commit_kill(t).map_err(rejected)?,
            (ActionKind::Protect, Some(t)) => self.night.protect(Some(t)).map_err(rejected)?,
            (ActionKind::Save, Some(t)) => {
                self.night.witch(WitchChoice::Save, t).map_err(rejected)?
            }
            (ActionKind::Poison, Some(t)) => {
                self.night.witch(WitchChoice::Poison, t).map_err(rejected)?
            }
            (ActionKind::Inspect, Some(t)) => {
                let is_wolf = self.player(t).is_some_and(|p| p.is_wolf());
                let round = self.round;
                self.night.inspect(round, t, is_wolf).map_err(rejected)?;
                self.emit(Effect::Inspection {
                    seer_id: player_id.to_string(),
                    target_id: t.to_string(),
                    is_wolf,
                });
            }
            (ActionKind::Shoot, Some(t)) => {
                self.hunter_decide(player_id, Some(t));
                return Ok(());
            }
            (ActionKind::Skip, _) => match skip {
                Some(SkipEffect::GuardRests) => self.night.protect(None).map_err(rejected)?,
                Some(SkipEffect::WitchRests) => self.night.witch_skip().map_err(rejected)?,
                Some(SkipEffect::HunterPasses) => {
                    self.hunter_decide(player_id, None);
                    return Ok(());
                }
                None => return Err(Rejection::ActionNotOffered(kind)),
            },
            (_, None) => return Err(Rejection::MissingTarget(kind)),
        }

        info!(
            room = %self.room_id,
            round = self.round,
            phase = %self.phase,
            player = %player_id,
            ?kind,
            target = ?target,
            "night action accepted"
        );
        self.schedule(Target::NextNightStep, self.timings.after_action);
        self.emit(Effect::Publish);
        Ok(())
    }

    pub(super) fn propose_target(&mut self, player_id: &str, target_id: &str) -> Result<(), Rejection> {
        self.require_phase("propose_target", &[Phase::NightWolves])?;
        self.require_alive(player_id)?;
        if !self.player(player_id).is_some_and(|p| p.is_wolf()) {
            return Err(Rejection::ActionNotOffered(ActionKind::Kill));
        }
        if self.night.wolves_acted() || self.night_resolved {
            return Err(Rejection::ActionDisabled {
                kind: ActionKind::Kill,
                reason: DisabledReason::AlreadyActed,
            });
        }
        self.require_living_target(target_id)?;
        self.night.propose(player_id, target_id);
        self.emit(Effect::Publish);
        Ok(())
    }

    // ---- day ----

    pub(super) fn day_vote(&mut self, player_id: &str, ballot: Ballot) -> Result<(), Rejection> {
        self.require_phase("day_vote", &[Phase::DayVote])?;
        self.require_alive(player_id)?;
        if self.ballots.locked {
            return Err(Rejection::VoteLocked);
        }
        if let Some(target) = ballot.target() {
            if target == player_id {
                return Err(Rejection::InvalidTarget(target.to_string()));
            }
            self.require_living_target(target)?;
        }
        let cast = self.ballots.cast(player_id, ballot);
        tracing::debug!(room = %self.room_id, player = %player_id, ?cast, "day vote");

        let everyone_voted = self.alive_players().all(|p| self.ballots.has_voted(&p.id));
        if everyone_voted {
            self.resolve_day_vote();
        } else {
            self.emit(Effect::Publish);
        }
        Ok(())
    }

    pub(super) fn end_speech(&mut self, player_id: &str) -> Result<(), Rejection> {
        if !self.phase.is_speech() {
            return Err(Rejection::WrongPhase {
                intent: "end_speech",
                phase: self.phase,
            });
        }
        let Some(queue) = self.speaking.as_ref() else {
            return Err(Rejection::NotSpeaker);
        };
        let is_speaker = queue.current_speaker() == Some(player_id);
        if !is_speaker && !self.is_host(player_id) {
            return Err(Rejection::NotSpeaker);
        }

        let finished = self.speaking.as_mut().map_or(true, |q| q.advance());
        if finished {
            self.finish_speeches();
        } else {
            self.emit(Effect::Publish);
        }
        Ok(())
    }

    fn finish_speeches(&mut self) {
        match self.phase.spec().next {
            Some(next) => self.go(next),
            None => tracing::error!(room = %self.room_id, phase = %self.phase, "speech phase without a next step"),
        }
    }

    /// Host-only forced advance. Every phase has a defined way forward.
    pub(super) fn resolve_phase(&mut self, player_id: &str) -> Result<(), Rejection> {
        self.require_host(player_id)?;
        info!(room = %self.room_id, phase = %self.phase, "host forced the phase");
        match self.phase {
            Phase::Waiting | Phase::Finished => {
                return Err(Rejection::WrongPhase {
                    intent: "resolve_phase",
                    phase: self.phase,
                })
            }
            Phase::GameStart
            | Phase::NightStart
            | Phase::NightGuard
            | Phase::NightWolves
            | Phase::NightWitch
            | Phase::NightSeer
            | Phase::DayElimination => {
                if let Some(next) = self.phase.spec().next {
                    self.go(next);
                }
            }
            Phase::DayAnnounce => {
                let next = if self.election_due() {
                    Phase::DayMayorNominate
                } else {
                    Phase::DayDiscussion
                };
                self.go(next.into());
            }
            Phase::DayDiscussion
            | Phase::DayLeaveSpeech
            | Phase::DayMayorSpeech
            | Phase::DayMayorPkSpeech => {
                self.speaking = None;
                self.finish_speeches();
            }
            Phase::DayVote => {
                if self.ballots.locked {
                    self.reopen_vote();
                } else {
                    self.resolve_day_vote();
                }
            }
            Phase::DayHunterDecide => match self.hunter_dead_id.clone() {
                Some(hunter) => self.hunter_decide(&hunter, None),
                None => self.go(Target::ResumeFromHunter),
            },
            Phase::DayMayorNominate => self.close_nomination(),
            Phase::DayMayorWithdraw => self.close_withdrawal(),
            Phase::DayMayorVote | Phase::DayMayorPkVote => self.resolve_mayor_vote(),
        }
        Ok(())
    }

    // ---- election ----

    pub(super) fn mayor_nominate(&mut self, player_id: &str, run: bool) -> Result<(), Rejection> {
        self.require_phase("mayor_nominate", &[Phase::DayMayorNominate])?;
        self.require_alive(player_id)?;
        self.election.nominate(player_id, run)?;
        info!(room = %self.room_id, player = %player_id, run, "mayor nomination");

        let all_responded = self
            .alive_players()
            .all(|p| self.election.has_responded(&p.id));
        if all_responded {
            self.close_nomination();
        } else {
            self.emit(Effect::Publish);
        }
        Ok(())
    }

    pub(super) fn mayor_withdraw(&mut self, player_id: &str, withdraw: bool) -> Result<(), Rejection> {
        self.require_phase("mayor_withdraw", &[Phase::DayMayorWithdraw])?;
        self.require_alive(player_id)?;
        self.election.withdraw(player_id, withdraw)?;
        if withdraw {
            self.announce(format!("{} withdrew from the election.", self.name_of(player_id)));
        }

        let all_responded = self
            .alive_players()
            .filter(|p| self.election.is_nominee(&p.id))
            .all(|p| self.election.has_responded(&p.id));
        if all_responded {
            self.close_withdrawal();
        } else {
            self.emit(Effect::Publish);
        }
        Ok(())
    }

    pub(super) fn mayor_vote(&mut self, player_id: &str, target_id: &str) -> Result<(), Rejection> {
        self.require_phase("mayor_vote", &[Phase::DayMayorVote, Phase::DayMayorPkVote])?;
        self.require_alive(player_id)?;
        self.require_living_target(target_id)?;
        let cast = self.election.vote(player_id, target_id)?;
        tracing::debug!(room = %self.room_id, player = %player_id, ?cast, "mayor vote");

        let everyone_voted = self
            .mayor_voters()
            .iter()
            .all(|id| self.election.ballots.has_voted(id));
        if matches!(cast, Cast::Recorded) && everyone_voted {
            self.resolve_mayor_vote();
        } else {
            self.emit(Effect::Publish);
        }
        Ok(())
    }
}
