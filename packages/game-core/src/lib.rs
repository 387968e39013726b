//! Room game-state engine for a werewolf party game.
//!
//! A [`Game`] is a synchronous state machine. Feed it intents with
//! [`Game::apply`] and fired alarms with [`Game::fire`], then drain
//! [`Game::take_effects`] to learn what to publish, narrate and schedule.

pub mod capability;
pub mod day;
pub mod deck;
pub mod effect;
pub mod election;
pub mod error;
pub mod game;
pub mod models;
pub mod night;

pub use effect::{Alarm, DelayRange, Effect, Timings};
pub use error::Rejection;
pub use game::Game;
