//! Phases: named block sequences run under a repetition strategy.

pub mod definition;
pub mod machine;

pub use definition::{PhaseDefinition, PhaseSpec, Repetition};
pub use machine::{LoopStrategy, PhaseMachine, PhaseStatus, Termination, CURRENT_INDEX};
