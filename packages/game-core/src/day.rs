//! Speaking queue and ballot box shared by the day vote and the election.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{Ballot, PlayerId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakingQueue {
    pub queue: Vec<PlayerId>,
    pub current: usize,
}

impl SpeakingQueue {
    pub fn new(queue: Vec<PlayerId>) -> Self {
        Self { queue, current: 0 }
    }

    pub fn current_speaker(&self) -> Option<&str> {
        self.queue.get(self.current).map(String::as_str)
    }

    /// Moves to the next speaker. Returns `true` once everyone has spoken.
    pub fn advance(&mut self) -> bool {
        if self.current < self.queue.len() {
            self.current += 1;
        }
        self.is_finished()
    }

    pub fn is_finished(&self) -> bool {
        self.current >= self.queue.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cast {
    Recorded,
    /// Same ballot cast twice: the vote was taken back.
    Withdrawn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    Winner(PlayerId),
    Tie(Vec<PlayerId>),
    /// Nobody received a vote.
    NoVotes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    pub counts: BTreeMap<PlayerId, usize>,
    pub outcome: VoteOutcome,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BallotBox {
    ballots: BTreeMap<PlayerId, Ballot>,
    /// Votes are refused while a tie is being announced.
    pub locked: bool,
}

impl BallotBox {
    pub fn cast(&mut self, voter_id: &str, ballot: Ballot) -> Cast {
        if self.ballots.get(voter_id) == Some(&ballot) {
            self.ballots.remove(voter_id);
            Cast::Withdrawn
        } else {
            self.ballots.insert(voter_id.to_string(), ballot);
            Cast::Recorded
        }
    }

    pub fn ballot_of(&self, voter_id: &str) -> Option<&Ballot> {
        self.ballots.get(voter_id)
    }

    pub fn has_voted(&self, voter_id: &str) -> bool {
        self.ballots.contains_key(voter_id)
    }

    pub fn voters(&self) -> impl Iterator<Item = &PlayerId> {
        self.ballots.keys()
    }

    pub fn voter_count(&self) -> usize {
        self.ballots.len()
    }

    pub fn clear(&mut self) {
        self.ballots.clear();
    }

    /// Counts ballots from eligible voters for valid targets. Abstentions count
    /// toward nobody.
    pub fn tally(
        &self,
        is_voter: impl Fn(&str) -> bool,
        is_target: impl Fn(&str) -> bool,
    ) -> Tally {
        let mut counts: BTreeMap<PlayerId, usize> = BTreeMap::new();
        for (voter, ballot) in &self.ballots {
            if !is_voter(voter) {
                continue;
            }
            if let Some(target) = ballot.target().filter(|t| is_target(t)) {
                *counts.entry(target.to_string()).or_default() += 1;
            }
        }

        let max = counts.values().copied().max().unwrap_or(0);
        let leaders: Vec<PlayerId> = counts
            .iter()
            .filter(|(_, n)| **n == max && max > 0)
            .map(|(id, _)| id.clone())
            .collect();

        let outcome = match leaders.len() {
            0 => VoteOutcome::NoVotes,
            1 => VoteOutcome::Winner(leaders[0].clone()),
            _ => VoteOutcome::Tie(leaders),
        };
        Tally { counts, outcome }
    }
}
