use serde::{Deserialize, Serialize};
use std::fmt;

use super::phase::Phase;

/// Coalition a role plays for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Villagers,
    Werewolves,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Villager, // 村人
    Wolf,     // 人狼
    Seer,     // 占い師
    Witch,    // 魔女
    Guard,    // 守衛
    Hunter,   // 猟師
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Villager,
        Role::Wolf,
        Role::Seer,
        Role::Witch,
        Role::Guard,
        Role::Hunter,
    ];

    pub const fn side(&self) -> Side {
        match self {
            Role::Wolf => Side::Werewolves,
            _ => Side::Villagers,
        }
    }

    /// Power roles on the villager side. Wiping them out wins a side-kill game.
    pub const fn is_god(&self) -> bool {
        matches!(self, Role::Seer | Role::Witch | Role::Guard | Role::Hunter)
    }

    /// The benign filler role. Wiping these out wins a side-kill game.
    pub const fn is_plain_villager(&self) -> bool {
        matches!(self, Role::Villager)
    }

    pub const fn can_act_at_night(&self) -> bool {
        self.night_phase().is_some()
    }

    pub const fn night_phase(&self) -> Option<Phase> {
        match self {
            Role::Guard => Some(Phase::NightGuard),
            Role::Wolf => Some(Phase::NightWolves),
            Role::Witch => Some(Phase::NightWitch),
            Role::Seer => Some(Phase::NightSeer),
            Role::Villager | Role::Hunter => None,
        }
    }

    /// Lower acts first.
    pub const fn night_priority(&self) -> Option<u8> {
        match self {
            Role::Guard => Some(10),
            Role::Wolf => Some(20),
            Role::Witch => Some(30),
            Role::Seer => Some(40),
            Role::Villager | Role::Hunter => None,
        }
    }

    /// Whether this role's death opens a decision that preempts the current flow.
    pub const fn interrupts_on_death(&self) -> bool {
        matches!(self, Role::Hunter)
    }

    /// Keeps acting after death until the death hook is resolved.
    pub const fn acts_while_dead(&self) -> bool {
        matches!(self, Role::Hunter)
    }

    pub const fn label_key(&self) -> &'static str {
        match self {
            Role::Villager => "role.villager",
            Role::Wolf => "role.wolf",
            Role::Seer => "role.seer",
            Role::Witch => "role.witch",
            Role::Guard => "role.guard",
            Role::Hunter => "role.hunter",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Villager => write!(f, "Villager"),
            Role::Wolf => write!(f, "Werewolf"),
            Role::Seer => write!(f, "Seer"),
            Role::Witch => write!(f, "Witch"),
            Role::Guard => write!(f, "Guard"),
            Role::Hunter => write!(f, "Hunter"),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Villagers => write!(f, "villagers"),
            Side::Werewolves => write!(f, "werewolves"),
        }
    }
}
