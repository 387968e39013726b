use serde::{Deserialize, Serialize};

use super::action::{Ballot, NightAction};
use super::config::GameConfig;
use super::player::PlayerId;

/// Everything a client can ask a room to do once it has joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    SetReady {
        #[serde(default)]
        ready: Option<bool>,
    },
    StartGame {
        #[serde(default)]
        config: Option<GameConfig>,
    },
    NightAction {
        action: NightAction,
    },
    /// Wolf-only soft signal shown to the pack. Does not commit the kill.
    ProposeTarget {
        target_id: PlayerId,
    },
    DayVote {
        target: Ballot,
    },
    EndSpeech,
    /// Host-only forced advance.
    ResolvePhase,
    MayorNominate {
        run: bool,
    },
    MayorWithdraw {
        withdraw: bool,
    },
    MayorVote {
        target_id: PlayerId,
    },
    PlayAgain,
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::SetReady { .. } => "set_ready",
            Intent::StartGame { .. } => "start_game",
            Intent::NightAction { .. } => "night_action",
            Intent::ProposeTarget { .. } => "propose_target",
            Intent::DayVote { .. } => "day_vote",
            Intent::EndSpeech => "end_speech",
            Intent::ResolvePhase => "resolve_phase",
            Intent::MayorNominate { .. } => "mayor_nominate",
            Intent::MayorWithdraw { .. } => "mayor_withdraw",
            Intent::MayorVote { .. } => "mayor_vote",
            Intent::PlayAgain => "play_again",
        }
    }
}
