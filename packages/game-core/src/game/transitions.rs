//! Phase transitions, entry effects and the flows that converge on them.

use tracing::{debug, error, info, warn};

use super::Game;
use crate::capability::{self, DeathHook};
use crate::day::{SpeakingQueue, VoteOutcome};
use crate::effect::{Alarm, Effect};
use crate::election::ElectionStep;
use crate::models::{DeathCause, Phase, PlayerId, Role, Side, Target};

impl Game {
    /// Takes a transition. Pending hunters preempt every target and the
    /// target is remembered until they have all decided.
    pub(crate) fn go(&mut self, target: Target) {
        if self.phase == Phase::Finished {
            debug!(room = %self.room_id, ?target, "game is over, ignoring transition");
            return;
        }
        if target != Target::ResumeFromHunter && self.start_next_hunter(Some(target)) {
            return;
        }
        match target {
            Target::Phase(phase) => self.advance_phase(phase),
            Target::NextNightStep => self.next_night_step(),
            Target::ResolveNight => self.resolve_night(),
            Target::StartNightOrEnd => self.start_night_or_end(),
            Target::ResumeFromHunter => self.resume_from_hunter(),
            Target::ResolveSpeechFlow => self.resolve_speech_flow(),
        }
    }

    /// The only place `phase` changes.
    pub(crate) fn advance_phase(&mut self, phase: Phase) {
        let spec = phase.spec();
        if let Some(role) = spec.requires_role {
            if self.players_with_role(role).is_empty() {
                if let Some(fallback) = spec.fallback {
                    debug!(room = %self.room_id, %phase, %role, "no holder, taking fallback");
                    self.go(fallback);
                    return;
                }
            }
        }

        let from = self.phase;
        self.phase = phase;
        self.transition_seq += 1;
        info!(
            room = %self.room_id,
            round = self.round,
            %from,
            to = %phase,
            "phase transition"
        );
        self.announce(phase.narration());
        self.enter(phase);
        self.emit(Effect::Publish);
    }

    fn enter(&mut self, phase: Phase) {
        match phase {
            Phase::Waiting | Phase::Finished => {}
            Phase::GameStart => {
                self.schedule(Phase::NightStart.into(), self.timings.game_start);
            }
            Phase::NightStart => {
                self.night.begin_night();
                self.night_resolved = false;
                self.night_cursor = 0;
                self.speaking = None;
                self.night_flow =
                    capability::night_flow(self.players.iter().filter_map(|p| p.role));
                debug!(room = %self.room_id, flow = ?self.night_flow, "night flow");
                self.schedule(Target::NextNightStep, self.timings.night_start);
            }
            Phase::NightGuard | Phase::NightWolves | Phase::NightWitch | Phase::NightSeer => {
                let awake = phase
                    .spec()
                    .requires_role
                    .is_some_and(|role| self.has_living(role));
                if !awake {
                    // 役職者が死亡済みでも待ち時間を演出する
                    self.schedule(Target::NextNightStep, self.timings.absent_role);
                }
            }
            Phase::DayAnnounce => self.enter_day_announce(),
            Phase::DayDiscussion => {
                let queue = self.alive_players().map(|p| p.id.clone()).collect();
                self.speaking = Some(SpeakingQueue::new(queue));
            }
            Phase::DayVote => {
                self.speaking = None;
                self.ballots.clear();
                self.ballots.locked = false;
            }
            Phase::DayElimination => self.enter_elimination(),
            Phase::DayLeaveSpeech => {
                let queue = self.executed_id.clone().into_iter().collect();
                self.speaking = Some(SpeakingQueue::new(queue));
            }
            Phase::DayHunterDecide => {
                self.speaking = None;
            }
            Phase::DayMayorNominate => {
                self.speaking = None;
                self.election.begin();
            }
            Phase::DayMayorSpeech => {
                self.speaking = Some(SpeakingQueue::new(self.election.remaining()));
            }
            Phase::DayMayorWithdraw => {
                self.speaking = None;
            }
            Phase::DayMayorVote | Phase::DayMayorPkVote => {
                self.speaking = None;
                self.election.ballots.clear();
                if self.mayor_voters().is_empty() {
                    error!(room = %self.room_id, %phase, "mayor vote has no eligible voters");
                    self.resolve_mayor_vote();
                }
            }
            Phase::DayMayorPkSpeech => {
                self.speaking = Some(SpeakingQueue::new(self.election.pk_candidates.clone()));
            }
        }
    }

    // ---- night ----

    fn next_night_step(&mut self) {
        match self.night_flow.get(self.night_cursor).copied() {
            Some(phase) => {
                self.night_cursor += 1;
                self.advance_phase(phase);
            }
            None => self.go(Target::ResolveNight),
        }
    }

    fn resolve_night(&mut self) {
        if self.night_resolved {
            self.go(Phase::DayAnnounce.into());
            return;
        }
        let outcome = self.night.resolve();
        self.night_resolved = true;
        info!(
            room = %self.room_id,
            round = self.round,
            deaths = ?outcome.deaths,
            prevented = outcome.kill_prevented,
            "night resolved"
        );
        self.pending_deaths = outcome
            .deaths
            .iter()
            .map(|id| (id.clone(), outcome.cause_of(id)))
            .collect();
        self.schedule(Phase::DayAnnounce.into(), self.timings.night_resolve);
        self.emit(Effect::Publish);
    }

    fn enter_day_announce(&mut self) {
        let deaths = std::mem::take(&mut self.pending_deaths);
        if deaths.is_empty() {
            self.announce("Last night was peaceful. Nobody died.");
        } else {
            let names: Vec<String> = deaths.iter().map(|(id, _)| self.name_of(id)).collect();
            self.announce(format!("Last night {} died.", names.join(", ")));
        }
        for (id, cause) in &deaths {
            self.kill(id, *cause);
        }
        if self.check_win() {
            return;
        }
        let next = if self.election_due() {
            Phase::DayMayorNominate
        } else {
            Phase::DayDiscussion
        };
        self.schedule(next.into(), self.timings.announce);
    }

    pub(crate) fn election_due(&self) -> bool {
        self.round == 1 && self.config().election && self.election.is_open()
    }

    // ---- day ----

    /// Counts the ballots of living players and acts on the result.
    pub(crate) fn resolve_day_vote(&mut self) {
        if self.ballots.voter_count() == 0 {
            warn!(room = %self.room_id, "closing a day vote nobody voted in");
        }
        let tally = self
            .ballots
            .tally(|voter| self.is_alive(voter), |target| self.is_alive(target));
        debug!(room = %self.room_id, counts = ?tally.counts, "day vote tallied");

        match tally.outcome {
            VoteOutcome::Winner(id) => {
                self.executed_id = Some(id);
                self.advance_phase(Phase::DayElimination);
            }
            VoteOutcome::Tie(tied) => {
                let names: Vec<String> = tied.iter().map(|id| self.name_of(id)).collect();
                self.announce(format!("The vote is tied between {}. Vote again.", names.join(", ")));
                self.ballots.clear();
                self.ballots.locked = true;
                // 前の同票で仕掛けた再開アラームを無効にする
                self.transition_seq += 1;
                let range = self.timings.tie_reopen;
                let delay = range.sample(self.rng());
                self.schedule_exact(
                    Alarm::ReopenVote {
                        seq: self.transition_seq,
                    },
                    delay,
                );
                self.emit(Effect::Publish);
            }
            VoteOutcome::NoVotes => {
                self.executed_id = None;
                self.advance_phase(Phase::DayElimination);
            }
        }
    }

    pub(crate) fn reopen_vote(&mut self) {
        if self.phase != Phase::DayVote {
            return;
        }
        self.transition_seq += 1;
        self.ballots.clear();
        self.ballots.locked = false;
        self.announce("Voting is open again.");
        self.emit(Effect::Publish);
    }

    fn enter_elimination(&mut self) {
        match self.executed_id.clone() {
            Some(id) => {
                self.announce(format!("{} was executed.", self.name_of(&id)));
                self.kill(&id, DeathCause::Vote);
                if self.check_win() {
                    return;
                }
            }
            None => self.announce("Nobody was executed."),
        }
        self.schedule(Target::ResolveSpeechFlow, self.timings.after_execution);
    }

    /// Only the first execution of a game gets last words.
    fn resolve_speech_flow(&mut self) {
        if self.executed_id.is_some() && !self.first_execution_done {
            self.first_execution_done = true;
            self.advance_phase(Phase::DayLeaveSpeech);
        } else {
            self.go(Target::StartNightOrEnd);
        }
    }

    fn start_night_or_end(&mut self) {
        if self.check_win() {
            return;
        }
        self.round += 1;
        self.executed_id = None;
        self.advance_phase(Phase::NightStart);
    }

    // ---- deaths and hunters ----

    pub(crate) fn kill(&mut self, player_id: &str, cause: DeathCause) {
        let Some(player) = self.player_mut(player_id) else {
            error!(player = %player_id, "death of unknown player");
            return;
        };
        if player.is_dead {
            return;
        }
        player.is_dead = true;
        player.death_cause = Some(cause);
        let hook = capability::on_death(player, cause);
        info!(room = %self.room_id, player = %player_id, ?cause, "player died");

        if hook == Some(DeathHook::HunterShot)
            && !self.hunter_queue.iter().any(|id| id == player_id)
            && self.hunter_dead_id.as_deref() != Some(player_id)
        {
            self.hunter_queue.push_back(player_id.to_string());
        }
    }

    /// Enters the decision phase for the next queued hunter. `preempted` is the
    /// transition to come back to, kept only if nothing is remembered yet.
    fn start_next_hunter(&mut self, preempted: Option<Target>) -> bool {
        while let Some(id) = self.hunter_queue.pop_front() {
            if self.player(&id).map_or(true, |p| p.hunter_resolved) {
                continue;
            }
            if self.resume.is_none() {
                self.resume = preempted;
            }
            debug!(room = %self.room_id, hunter = %id, resume = ?self.resume, "hunter interrupt");
            self.hunter_dead_id = Some(id);
            self.advance_phase(Phase::DayHunterDecide);
            return true;
        }
        false
    }

    fn resume_from_hunter(&mut self) {
        if self.start_next_hunter(None) {
            return;
        }
        let next = self.resume.take().unwrap_or(Target::StartNightOrEnd);
        debug!(room = %self.room_id, ?next, "resuming after hunter");
        self.go(next);
    }

    /// Records the deciding hunter's shot (or pass) and schedules the resume.
    pub(crate) fn hunter_decide(&mut self, hunter_id: &str, target_id: Option<&str>) {
        if let Some(hunter) = self.player_mut(hunter_id) {
            hunter.hunter_resolved = true;
        }
        self.hunter_dead_id = None;
        match target_id {
            Some(target) => {
                let message = format!(
                    "{} shot {}.",
                    self.name_of(hunter_id),
                    self.name_of(target)
                );
                self.announce(message);
                self.kill(target, DeathCause::Shot);
                if self.check_win() {
                    return;
                }
            }
            None => {
                self.announce(format!("{} put the gun down.", self.name_of(hunter_id)));
            }
        }
        self.schedule(Target::ResumeFromHunter, self.timings.after_action);
        self.emit(Effect::Publish);
    }

    // ---- election ----

    /// Living players allowed to vote for mayor right now.
    pub(crate) fn mayor_voters(&self) -> Vec<PlayerId> {
        self.alive_players()
            .filter(|p| self.election.is_voter(&p.id))
            .map(|p| p.id.clone())
            .collect()
    }

    pub(crate) fn close_nomination(&mut self) {
        let order = self.seat_order();
        self.election.close_nomination(&order);
        match self.election.remaining().as_slice() {
            [] => self.no_mayor("Nobody ran for mayor."),
            [only] => {
                let only = only.clone();
                self.elect_mayor(&only);
            }
            _ => self.advance_phase(Phase::DayMayorSpeech),
        }
    }

    pub(crate) fn close_withdrawal(&mut self) {
        match self.election.remaining().as_slice() {
            [] => self.no_mayor("Every candidate withdrew."),
            [only] => {
                let only = only.clone();
                self.elect_mayor(&only);
            }
            _ => self.advance_phase(Phase::DayMayorVote),
        }
    }

    pub(crate) fn resolve_mayor_vote(&mut self) {
        let alive: Vec<PlayerId> = self.alive_players().map(|p| p.id.clone()).collect();
        let step = self
            .election
            .resolve_vote(|id| alive.iter().any(|a| a == id));
        match step {
            ElectionStep::Elected(id) => self.elect_mayor(&id),
            ElectionStep::Pk(tied) => {
                let names: Vec<String> = tied.iter().map(|id| self.name_of(id)).collect();
                self.announce(format!("Mayor vote tied between {}.", names.join(", ")));
                self.advance_phase(Phase::DayMayorPkSpeech);
            }
            ElectionStep::NoMayor => {
                self.no_mayor("The election is tied again. There will be no mayor.")
            }
        }
    }

    fn elect_mayor(&mut self, player_id: &str) {
        self.election.elect(player_id);
        if let Some(player) = self.player_mut(player_id) {
            player.is_mayor = true;
        }
        info!(room = %self.room_id, mayor = %player_id, "mayor elected");
        self.announce(format!("{} is the new mayor.", self.name_of(player_id)));
        self.go(Phase::DayDiscussion.into());
    }

    fn no_mayor(&mut self, message: &str) {
        self.election.skip();
        info!(room = %self.room_id, "election skipped");
        self.announce(message);
        self.go(Phase::DayDiscussion.into());
    }

    // ---- win ----

    fn has_living(&self, role: Role) -> bool {
        self.players.iter().any(|p| p.has_role(role) && p.is_alive())
    }

    /// Ends the game if a side has won. Callers stop when this returns true.
    pub(crate) fn check_win(&mut self) -> bool {
        let Some(side) = self.evaluate_winner() else {
            return false;
        };
        self.winner = Some(side);
        self.hunter_queue.clear();
        self.hunter_dead_id = None;
        self.resume = None;
        self.speaking = None;
        info!(room = %self.room_id, round = self.round, winner = %side, "game finished");
        self.announce(format!("The {} win.", side));
        self.advance_phase(Phase::Finished);
        true
    }

    pub(crate) fn evaluate_winner(&self) -> Option<Side> {
        let wolves = self.alive_players().filter(|p| p.is_wolf()).count();
        let good = self.alive_count() - wolves;
        if wolves == 0 {
            return Some(Side::Villagers);
        }
        if wolves >= good {
            return Some(Side::Werewolves);
        }
        if self.config().side_kill {
            let villagers = self
                .alive_players()
                .filter(|p| p.role.is_some_and(|r| r.is_plain_villager()))
                .count();
            let gods = self
                .alive_players()
                .filter(|p| p.role.is_some_and(|r| r.is_god()))
                .count();
            if (self.villagers_at_start > 0 && villagers == 0)
                || (self.gods_at_start > 0 && gods == 0)
            {
                return Some(Side::Werewolves);
            }
        }
        None
    }
}
