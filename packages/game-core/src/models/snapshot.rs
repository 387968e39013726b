use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::action::{AvailableAction, Ballot, DisabledTarget};
use super::log::LogEntry;
use super::phase::Phase;
use super::player::{DeathCause, PlayerId};
use super::role::{Role, Side};

/// Full room state as seen by one recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub room_id: String,
    pub host_id: Option<PlayerId>,
    pub phase: Phase,
    pub round: u32,
    pub winner: Option<Side>,
    pub players: Vec<PublicPlayer>,
    pub log: Vec<LogEntry>,
    pub night_flow: Vec<Phase>,
    pub speaking: Option<SpeakingView>,
    pub vote_locked: bool,
    pub election: ElectionView,
    pub me: Option<MeView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicPlayer {
    pub id: PlayerId,
    pub name: String,
    pub seat: usize,
    pub is_alive: bool,
    pub is_ready: bool,
    pub connected: bool,
    pub is_host: bool,
    pub is_mayor: bool,
    /// Has a ballot in the vote currently open.
    pub is_voting: bool,
    /// Only present when revealed to this recipient.
    pub role: Option<Role>,
    pub death_cause: Option<DeathCause>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakingView {
    pub queue: Vec<PlayerId>,
    pub current_index: usize,
    pub current_speaker: Option<PlayerId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElectionView {
    pub nominees: Vec<PlayerId>,
    pub withdrawn: Vec<PlayerId>,
    pub responded: Vec<PlayerId>,
    pub pk_candidates: Vec<PlayerId>,
    pub voted: Vec<PlayerId>,
    pub mayor_id: Option<PlayerId>,
    pub skipped: bool,
    pub resolved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionRecord {
    pub round: u32,
    pub target_id: PlayerId,
    pub is_wolf: bool,
}

/// Night facts visible to the recipient because of their role.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NightView {
    pub wolf_target: Option<PlayerId>,
    pub wolf_proposals: BTreeMap<PlayerId, PlayerId>,
    pub guard_target: Option<PlayerId>,
    pub guard_last_target: Option<PlayerId>,
    pub save_available: Option<bool>,
    pub poison_available: Option<bool>,
    pub inspections: Vec<InspectionRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeView {
    pub id: PlayerId,
    pub role: Option<Role>,
    pub side: Option<Side>,
    pub is_alive: bool,
    pub is_host: bool,
    pub available_actions: Vec<AvailableAction>,
    pub wolf_allies: Vec<PlayerId>,
    pub night: NightView,
    pub ballot: Option<Ballot>,
    /// Day vote targets this viewer may not pick.
    pub vote_disabled: Vec<DisabledTarget>,
    pub mayor_ballot: Option<PlayerId>,
    pub can_vote: bool,
}
