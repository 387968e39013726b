pub mod action;
pub mod config;
pub mod intent;
pub mod log;
pub mod phase;
pub mod player;
pub mod role;
pub mod snapshot;

pub use action::*;
pub use config::*;
pub use intent::*;
pub use log::*;
pub use phase::*;
pub use player::*;
pub use role::*;
pub use snapshot::*;
