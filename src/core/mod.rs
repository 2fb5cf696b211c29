//! Core engine types: variables, state, players, RNG, configuration.
//!
//! Everything here is independent of the expression language and of the
//! flow interpreter; both build on top of it.

pub mod variable;
pub mod state;
pub mod player;
pub mod rng;
pub mod config;

pub use variable::{Location, Variable, VariableContainer};
pub use state::{GameState, PathSegment, Place, CURRENT, PLAYERS};
pub use player::{PlayerCountRange, PlayerId};
pub use rng::{GameRng, GameRngState};
pub use config::EngineConfig;
