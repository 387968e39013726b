//! Mayor election bookkeeping. The game drives the phases; this holds the
//! nominees, responses and ballots, and decides what each vote means.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use crate::day::{BallotBox, Cast, VoteOutcome};
use crate::error::Rejection;
use crate::models::{Ballot, ElectionView, PlayerId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElectionStep {
    Elected(PlayerId),
    Pk(Vec<PlayerId>),
    NoMayor,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Election {
    /// Everyone who opted in, in seat order. Never shrinks during the election.
    pub nominees: Vec<PlayerId>,
    pub withdrawn: Vec<PlayerId>,
    pub responded: BTreeSet<PlayerId>,
    pub pk_candidates: Vec<PlayerId>,
    pub ballots: BallotBox,
    pub mayor_id: Option<PlayerId>,
    pub skipped: bool,
    pub resolved: bool,
}

impl Election {
    pub fn is_open(&self) -> bool {
        !self.resolved && !self.skipped
    }

    pub fn begin(&mut self) {
        self.nominees.clear();
        self.withdrawn.clear();
        self.responded.clear();
        self.pk_candidates.clear();
        self.ballots.clear();
    }

    pub fn has_responded(&self, player_id: &str) -> bool {
        self.responded.contains(player_id)
    }

    pub fn nominate(&mut self, player_id: &str, run: bool) -> Result<(), Rejection> {
        if !self.responded.insert(player_id.to_string()) {
            return Err(Rejection::AlreadyResponded);
        }
        if run {
            self.nominees.push(player_id.to_string());
        }
        Ok(())
    }

    /// Orders nominees to match `seat_order` once nomination closes.
    pub fn close_nomination(&mut self, seat_order: &[PlayerId]) {
        self.nominees
            .sort_by_key(|id| seat_order.iter().position(|s| s == id).unwrap_or(usize::MAX));
        self.responded.clear();
    }

    pub fn is_nominee(&self, player_id: &str) -> bool {
        self.nominees.iter().any(|n| n == player_id)
    }

    pub fn remaining(&self) -> Vec<PlayerId> {
        self.nominees
            .iter()
            .filter(|n| !self.withdrawn.contains(n))
            .cloned()
            .collect()
    }

    pub fn withdraw(&mut self, player_id: &str, withdraw: bool) -> Result<(), Rejection> {
        if !self.is_nominee(player_id) || self.withdrawn.iter().any(|w| w == player_id) {
            return Err(Rejection::NotEligibleVoter);
        }
        if !self.responded.insert(player_id.to_string()) {
            return Err(Rejection::AlreadyResponded);
        }
        if withdraw {
            self.withdrawn.push(player_id.to_string());
        }
        Ok(())
    }

    /// Who may be voted for right now.
    pub fn candidates(&self) -> Vec<PlayerId> {
        if self.pk_candidates.is_empty() {
            self.remaining()
        } else {
            self.pk_candidates.clone()
        }
    }

    pub fn in_pk(&self) -> bool {
        !self.pk_candidates.is_empty()
    }

    /// Voters are living players who never ran.
    pub fn is_voter(&self, player_id: &str) -> bool {
        !self.is_nominee(player_id)
    }

    pub fn vote(&mut self, voter_id: &str, target_id: &str) -> Result<Cast, Rejection> {
        if !self.is_voter(voter_id) {
            return Err(Rejection::NotEligibleVoter);
        }
        if !self.candidates().iter().any(|c| c == target_id) {
            return Err(Rejection::InvalidTarget(target_id.to_string()));
        }
        Ok(self
            .ballots
            .cast(voter_id, Ballot::Player(target_id.to_string())))
    }

    pub fn elect(&mut self, player_id: &str) {
        self.mayor_id = Some(player_id.to_string());
        self.resolved = true;
        self.pk_candidates.clear();
    }

    pub fn skip(&mut self) {
        self.skipped = true;
        self.mayor_id = None;
        self.pk_candidates.clear();
    }

    /// Decides the vote that just closed. `is_alive` filters ballots of players
    /// who died since casting.
    pub fn resolve_vote(&mut self, is_alive: impl Fn(&str) -> bool) -> ElectionStep {
        let candidates = self.candidates();
        let tally = self.ballots.tally(
            |voter| is_alive(voter) && self.is_voter(voter),
            |target| candidates.iter().any(|c| c == target),
        );
        debug!(counts = ?tally.counts, pk = self.in_pk(), "mayor vote tallied");
        let in_pk = self.in_pk();
        self.ballots.clear();

        match tally.outcome {
            VoteOutcome::Winner(id) => ElectionStep::Elected(id),
            _ if in_pk => ElectionStep::NoMayor,
            VoteOutcome::Tie(tied) => {
                // 席順を保つ
                let tied: Vec<PlayerId> = candidates
                    .into_iter()
                    .filter(|c| tied.contains(c))
                    .collect();
                self.pk_candidates = tied.clone();
                ElectionStep::Pk(tied)
            }
            VoteOutcome::NoVotes => {
                self.pk_candidates = candidates.clone();
                ElectionStep::Pk(candidates)
            }
        }
    }

    pub fn view(&self) -> ElectionView {
        ElectionView {
            nominees: self.nominees.clone(),
            withdrawn: self.withdrawn.clone(),
            responded: self.responded.iter().cloned().collect(),
            pk_candidates: self.pk_candidates.clone(),
            voted: self.ballots.voters().cloned().collect(),
            mayor_id: self.mayor_id.clone(),
            skipped: self.skipped,
            resolved: self.resolved,
        }
    }
}
