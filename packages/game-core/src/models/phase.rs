use serde::{Deserialize, Serialize};
use std::fmt;

use super::role::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Waiting,
    GameStart,
    NightStart,
    NightGuard,
    NightWolves,
    NightWitch,
    NightSeer,
    DayAnnounce,
    DayDiscussion,
    DayVote,
    DayElimination,
    DayLeaveSpeech,
    DayHunterDecide,
    DayMayorNominate,
    DayMayorSpeech,
    DayMayorWithdraw,
    DayMayorVote,
    DayMayorPkSpeech,
    DayMayorPkVote,
    Finished,
}

/// Where a transition goes. Symbolic targets are resolved by the game at the
/// moment they are taken, so several flows can converge on one resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "phase", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Target {
    Phase(Phase),
    /// The next entry of the current night flow, or night resolution after the last.
    NextNightStep,
    ResolveNight,
    StartNightOrEnd,
    ResumeFromHunter,
    /// Last words after the first execution, straight to night afterwards.
    ResolveSpeechFlow,
}

impl From<Phase> for Target {
    fn from(phase: Phase) -> Self {
        Target::Phase(phase)
    }
}

/// Static row of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseSpec {
    pub next: Option<Target>,
    pub requires_role: Option<Role>,
    /// Taken instead of the phase when `requires_role` has no holder in the game.
    pub fallback: Option<Target>,
}

impl PhaseSpec {
    const fn plain(next: Option<Target>) -> Self {
        Self {
            next,
            requires_role: None,
            fallback: None,
        }
    }

    const fn night(role: Role) -> Self {
        Self {
            next: Some(Target::NextNightStep),
            requires_role: Some(role),
            fallback: Some(Target::NextNightStep),
        }
    }
}

impl Phase {
    pub const fn spec(&self) -> PhaseSpec {
        match self {
            Phase::Waiting => PhaseSpec::plain(Some(Target::Phase(Phase::GameStart))),
            Phase::GameStart => PhaseSpec::plain(Some(Target::Phase(Phase::NightStart))),
            Phase::NightStart => PhaseSpec::plain(Some(Target::NextNightStep)),
            Phase::NightGuard => PhaseSpec::night(Role::Guard),
            Phase::NightWolves => PhaseSpec::night(Role::Wolf),
            Phase::NightWitch => PhaseSpec::night(Role::Witch),
            Phase::NightSeer => PhaseSpec::night(Role::Seer),
            // 昼の開始先は選挙の有無で変わる
            Phase::DayAnnounce => PhaseSpec::plain(None),
            Phase::DayDiscussion => PhaseSpec::plain(Some(Target::Phase(Phase::DayVote))),
            Phase::DayVote => PhaseSpec::plain(None),
            Phase::DayElimination => PhaseSpec::plain(Some(Target::ResolveSpeechFlow)),
            Phase::DayLeaveSpeech => PhaseSpec::plain(Some(Target::StartNightOrEnd)),
            Phase::DayHunterDecide => PhaseSpec {
                next: Some(Target::ResumeFromHunter),
                requires_role: Some(Role::Hunter),
                fallback: Some(Target::ResumeFromHunter),
            },
            Phase::DayMayorNominate => PhaseSpec::plain(None),
            Phase::DayMayorSpeech => {
                PhaseSpec::plain(Some(Target::Phase(Phase::DayMayorWithdraw)))
            }
            Phase::DayMayorWithdraw => PhaseSpec::plain(None),
            Phase::DayMayorVote => PhaseSpec::plain(None),
            Phase::DayMayorPkSpeech => {
                PhaseSpec::plain(Some(Target::Phase(Phase::DayMayorPkVote)))
            }
            Phase::DayMayorPkVote => PhaseSpec::plain(None),
            Phase::Finished => PhaseSpec::plain(None),
        }
    }

    pub const fn is_night(&self) -> bool {
        matches!(
            self,
            Phase::NightStart
                | Phase::NightGuard
                | Phase::NightWolves
                | Phase::NightWitch
                | Phase::NightSeer
        )
    }

    pub const fn is_election(&self) -> bool {
        matches!(
            self,
            Phase::DayMayorNominate
                | Phase::DayMayorSpeech
                | Phase::DayMayorWithdraw
                | Phase::DayMayorVote
                | Phase::DayMayorPkSpeech
                | Phase::DayMayorPkVote
        )
    }

    pub const fn is_speech(&self) -> bool {
        matches!(
            self,
            Phase::DayDiscussion
                | Phase::DayLeaveSpeech
                | Phase::DayMayorSpeech
                | Phase::DayMayorPkSpeech
        )
    }

    /// Narration line spoken when the phase is entered.
    pub const fn narration(&self) -> &'static str {
        match self {
            Phase::Waiting => "Waiting for players.",
            Phase::GameStart => "The game begins. Check your role.",
            Phase::NightStart => "Night falls. Everyone close your eyes.",
            Phase::NightGuard => "Guard, open your eyes and choose someone to protect.",
            Phase::NightWolves => "Werewolves, open your eyes and choose your victim.",
            Phase::NightWitch => "Witch, open your eyes. Will you use a potion?",
            Phase::NightSeer => "Seer, open your eyes and choose someone to inspect.",
            Phase::DayAnnounce => "The sun rises. Everyone open your eyes.",
            Phase::DayDiscussion => "Discussion begins. Speak in turn.",
            Phase::DayVote => "Time to vote.",
            Phase::DayElimination => "The village has decided.",
            Phase::DayLeaveSpeech => "The eliminated player may say their last words.",
            Phase::DayHunterDecide => "The hunter has fallen and may take one last shot.",
            Phase::DayMayorNominate => "Mayor election. Who will run?",
            Phase::DayMayorSpeech => "Candidates, make your case.",
            Phase::DayMayorWithdraw => "Candidates may now withdraw.",
            Phase::DayMayorVote => "Vote for the mayor.",
            Phase::DayMayorPkSpeech => "The election is tied. Tied candidates speak again.",
            Phase::DayMayorPkVote => "Final vote between the tied candidates.",
            Phase::Finished => "The game is over.",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // serde名と同じ表記にそろえる
        let name = match self {
            Phase::Waiting => "WAITING",
            Phase::GameStart => "GAME_START",
            Phase::NightStart => "NIGHT_START",
            Phase::NightGuard => "NIGHT_GUARD",
            Phase::NightWolves => "NIGHT_WOLVES",
            Phase::NightWitch => "NIGHT_WITCH",
            Phase::NightSeer => "NIGHT_SEER",
            Phase::DayAnnounce => "DAY_ANNOUNCE",
            Phase::DayDiscussion => "DAY_DISCUSSION",
            Phase::DayVote => "DAY_VOTE",
            Phase::DayElimination => "DAY_ELIMINATION",
            Phase::DayLeaveSpeech => "DAY_LEAVE_SPEECH",
            Phase::DayHunterDecide => "DAY_HUNTER_DECIDE",
            Phase::DayMayorNominate => "DAY_MAYOR_NOMINATE",
            Phase::DayMayorSpeech => "DAY_MAYOR_SPEECH",
            Phase::DayMayorWithdraw => "DAY_MAYOR_WITHDRAW",
            Phase::DayMayorVote => "DAY_MAYOR_VOTE",
            Phase::DayMayorPkSpeech => "DAY_MAYOR_PK_SPEECH",
            Phase::DayMayorPkVote => "DAY_MAYOR_PK_VOTE",
            Phase::Finished => "FINISHED",
        };
        f.write_str(name)
    }
}
