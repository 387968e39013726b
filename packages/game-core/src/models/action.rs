use serde::{Deserialize, Serialize};

use super::phase::Phase;
use super::player::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Kill,
    Protect,
    Save,
    Poison,
    Inspect,
    Shoot,
    Skip,
}

impl ActionKind {
    /// The phase an action of this kind belongs to. `Skip` belongs to whichever
    /// phase offers it.
    pub const fn phase(&self) -> Option<Phase> {
        match self {
            ActionKind::Kill => Some(Phase::NightWolves),
            ActionKind::Protect => Some(Phase::NightGuard),
            ActionKind::Save | ActionKind::Poison => Some(Phase::NightWitch),
            ActionKind::Inspect => Some(Phase::NightSeer),
            ActionKind::Shoot => Some(Phase::DayHunterDecide),
            ActionKind::Skip => None,
        }
    }

    pub const fn label_key(&self) -> &'static str {
        match self {
            ActionKind::Kill => "action.kill",
            ActionKind::Protect => "action.protect",
            ActionKind::Save => "action.save",
            ActionKind::Poison => "action.poison",
            ActionKind::Inspect => "action.inspect",
            ActionKind::Shoot => "action.shoot",
            ActionKind::Skip => "action.skip",
        }
    }
}

/// A role action as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    #[serde(default)]
    pub target_id: Option<PlayerId>,
}

impl NightAction {
    pub fn new(kind: ActionKind, target_id: Option<&str>) -> Self {
        Self {
            kind,
            target_id: target_id.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisabledReason {
    NotYourTurn,
    AlreadyActed,
    PotionUsed,
    NoVictim,
    SelfTarget,
    SameAsLastNight,
    TargetDead,
    NotTheVictim,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisabledTarget {
    pub target_id: PlayerId,
    pub reason: DisabledReason,
}

/// One entry of a player's action menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub label: String,
    pub needs_target: bool,
    pub disabled: Option<DisabledReason>,
    pub disabled_targets: Vec<DisabledTarget>,
}

impl AvailableAction {
    pub fn new(kind: ActionKind, needs_target: bool) -> Self {
        Self {
            kind,
            label: kind.label_key().to_string(),
            needs_target,
            disabled: None,
            disabled_targets: Vec::new(),
        }
    }

    pub fn disabled(mut self, reason: Option<DisabledReason>) -> Self {
        self.disabled = reason;
        self
    }

    pub fn disable_target(&mut self, target_id: &str, reason: DisabledReason) {
        if self.target_reason(target_id).is_none() {
            self.disabled_targets.push(DisabledTarget {
                target_id: target_id.to_string(),
                reason,
            });
        }
    }

    pub fn target_reason(&self, target_id: &str) -> Option<DisabledReason> {
        self.disabled_targets
            .iter()
            .find(|t| t.target_id == target_id)
            .map(|t| t.reason)
    }

    pub fn is_enabled(&self) -> bool {
        self.disabled.is_none()
    }
}

pub const ABSTAIN: &str = "abstain";

/// A day ballot: another player, or an explicit abstention.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Ballot {
    Player(PlayerId),
    Abstain,
}

impl From<String> for Ballot {
    fn from(value: String) -> Self {
        if value == ABSTAIN {
            Ballot::Abstain
        } else {
            Ballot::Player(value)
        }
    }
}

impl From<Ballot> for String {
    fn from(ballot: Ballot) -> Self {
        match ballot {
            Ballot::Player(id) => id,
            Ballot::Abstain => ABSTAIN.to_string(),
        }
    }
}

impl Ballot {
    pub fn target(&self) -> Option<&str> {
        match self {
            Ballot::Player(id) => Some(id),
            Ballot::Abstain => None,
        }
    }
}
