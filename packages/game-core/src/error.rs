use thiserror::Error;

use crate::models::{ActionKind, DisabledReason, Phase};

/// Why an intent was refused.
///
/// Gameplay violations are silent: the room logs them and moves on without
/// telling the sender. Session-level failures are surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("unknown player {0}")]
    UnknownPlayer(String),
    #[error("the game has already started")]
    GameAlreadyStarted,
    #[error("the room is full ({0} players)")]
    RoomFull(usize),
    #[error("display name must not be empty")]
    EmptyName,
    #[error("need at least {needed} players, have {have}")]
    NotEnoughPlayers { needed: usize, have: usize },
    #[error("players not ready: {0}")]
    PlayersNotReady(usize),
    #[error("only the host can do that")]
    NotHost,
    #[error("{intent} is not accepted during {phase}")]
    WrongPhase { intent: &'static str, phase: Phase },
    #[error("player is dead")]
    ActorDead,
    #[error("{0:?} is not offered to this player")]
    ActionNotOffered(ActionKind),
    #[error("{kind:?} is disabled: {reason:?}")]
    ActionDisabled {
        kind: ActionKind,
        reason: DisabledReason,
    },
    #[error("{0:?} needs a target")]
    MissingTarget(ActionKind),
    #[error("invalid target {0}")]
    InvalidTarget(String),
    #[error("not this player's turn to speak")]
    NotSpeaker,
    #[error("voting is paused")]
    VoteLocked,
    #[error("not eligible to vote")]
    NotEligibleVoter,
    #[error("already responded")]
    AlreadyResponded,
}

impl Rejection {
    /// Session-level failures the sender should hear about.
    pub fn is_surfaced(&self) -> bool {
        matches!(
            self,
            Rejection::UnknownPlayer(_)
                | Rejection::GameAlreadyStarted
                | Rejection::RoomFull(_)
                | Rejection::EmptyName
                | Rejection::NotEnoughPlayers { .. }
                | Rejection::PlayersNotReady(_)
        )
    }
}
