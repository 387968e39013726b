use serde::{Deserialize, Serialize};

/// Explicit role counts. Whatever is left over is filled with villagers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConfig {
    pub wolves: usize,
    #[serde(default)]
    pub seer: bool,
    #[serde(default)]
    pub witch: bool,
    #[serde(default)]
    pub guard: bool,
    #[serde(default)]
    pub hunter: bool,
}

/// Game rules. Captured once at start and never mutated while a game runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub roles: Option<RoleConfig>,
    /// Wolves also win by wiping out either the plain villagers or the power roles.
    #[serde(default)]
    pub side_kill: bool,
    /// Whether round one opens with a mayor election.
    #[serde(default = "default_election")]
    pub election: bool,
}

fn default_election() -> bool {
    true
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            roles: None,
            side_kill: false,
            election: true,
        }
    }
}
