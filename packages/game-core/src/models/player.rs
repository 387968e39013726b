use serde::{Deserialize, Serialize};

use super::role::Role;

pub type PlayerId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Wolves,
    Poison,
    Vote,
    Shot,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub seat: usize,
    pub role: Option<Role>,
    pub is_dead: bool,
    pub death_cause: Option<DeathCause>,
    pub connected: bool,
    pub is_ready: bool,
    pub is_mayor: bool,
    // 猟師の最後の一発を処理済みか
    pub hunter_resolved: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: String, seat: usize) -> Self {
        Self {
            id,
            name,
            seat,
            role: None,
            is_dead: false,
            death_cause: None,
            connected: true,
            is_ready: false,
            is_mayor: false,
            hunter_resolved: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == Some(role)
    }

    pub fn is_wolf(&self) -> bool {
        self.has_role(Role::Wolf)
    }

    /// Back to the lobby state, keeping identity and seat.
    pub fn reset_for_lobby(&mut self) {
        self.role = None;
        self.is_dead = false;
        self.death_cause = None;
        self.is_ready = false;
        self.is_mayor = false;
        self.hunter_resolved = false;
    }
}
