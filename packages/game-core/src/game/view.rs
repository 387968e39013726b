//! Personalized snapshots. Nothing here mutates the game.

use super::{Game, LOG_TAIL};
use crate::capability;
use crate::models::{
    Ballot, DisabledReason, DisabledTarget, MeView, Phase, Player, PublicPlayer, RoomSnapshot,
    SpeakingView,
};

impl Game {
    /// The room as `viewer` may see it. `reveal_all` shows every role
    /// regardless of phase.
    pub fn snapshot(&self, viewer: Option<&str>, reveal_all: bool) -> RoomSnapshot {
        let viewer = viewer.and_then(|id| self.player(id));
        RoomSnapshot {
            room_id: self.room_id.clone(),
            host_id: self.host_id.clone(),
            phase: self.phase,
            round: self.round,
            winner: self.winner,
            players: self
                .players
                .iter()
                .map(|p| self.public_player(p, viewer, reveal_all))
                .collect(),
            log: self.log.tail(LOG_TAIL).to_vec(),
            night_flow: self.night_flow.clone(),
            speaking: self.speaking.as_ref().map(|q| SpeakingView {
                queue: q.queue.clone(),
                current_index: q.current,
                current_speaker: q.current_speaker().map(str::to_string),
            }),
            vote_locked: self.ballots.locked,
            election: self.election.view(),
            me: viewer.map(|me| self.me_view(me)),
        }
    }

    fn role_visible(&self, subject: &Player, viewer: Option<&Player>, reveal_all: bool) -> bool {
        if reveal_all || self.phase == Phase::Finished {
            return true;
        }
        let Some(viewer) = viewer else {
            return false;
        };
        viewer.id == subject.id || viewer.is_dead || (viewer.is_wolf() && subject.is_wolf())
    }

    fn is_voting(&self, player_id: &str) -> bool {
        match self.phase {
            Phase::DayVote => self.ballots.has_voted(player_id),
            Phase::DayMayorVote | Phase::DayMayorPkVote => {
                self.election.ballots.has_voted(player_id)
            }
            _ => false,
        }
    }

    fn public_player(&self, p: &Player, viewer: Option<&Player>, reveal_all: bool) -> PublicPlayer {
        PublicPlayer {
            id: p.id.clone(),
            name: p.name.clone(),
            seat: p.seat,
            is_alive: p.is_alive(),
            is_ready: p.is_ready,
            connected: p.connected,
            is_host: self.is_host(&p.id),
            is_mayor: p.is_mayor,
            is_voting: self.is_voting(&p.id),
            role: if self.role_visible(p, viewer, reveal_all) {
                p.role
            } else {
                None
            },
            death_cause: p.death_cause,
        }
    }

    fn me_view(&self, me: &Player) -> MeView {
        let wolf_allies = if me.is_wolf() {
            self.players
                .iter()
                .filter(|p| p.is_wolf() && p.id != me.id)
                .map(|p| p.id.clone())
                .collect()
        } else {
            Vec::new()
        };

        let can_vote = me.is_alive()
            && match self.phase {
                Phase::DayVote => !self.ballots.locked,
                Phase::DayMayorVote | Phase::DayMayorPkVote => self.election.is_voter(&me.id),
                _ => false,
            };

        let vote_disabled = if self.phase == Phase::DayVote {
            self.players
                .iter()
                .filter_map(|p| {
                    let reason = if p.id == me.id {
                        DisabledReason::SelfTarget
                    } else if p.is_dead {
                        DisabledReason::TargetDead
                    } else {
                        return None;
                    };
                    Some(DisabledTarget {
                        target_id: p.id.clone(),
                        reason,
                    })
                })
                .collect()
        } else {
            Vec::new()
        };

        MeView {
            id: me.id.clone(),
            role: me.role,
            side: me.role.map(|r| r.side()),
            is_alive: me.is_alive(),
            is_host: self.is_host(&me.id),
            available_actions: capability::available_actions(self, me),
            wolf_allies,
            night: capability::night_view(self, me),
            ballot: self.ballots.ballot_of(&me.id).cloned(),
            vote_disabled,
            mayor_ballot: self
                .election
                .ballots
                .ballot_of(&me.id)
                .and_then(Ballot::target)
                .map(str::to_string),
            can_vote,
        }
    }
}
