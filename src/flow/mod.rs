//! Flow blocks and their interpreter.
//!
//! A game's flow is a tree of [`FlowBlock`]s. The [`Interpreter`] runs a
//! block against a [`GameState`](crate::core::GameState) and returns an
//! [`Outcome`]: the successor state, or a signal that ends the current phase
//! or the whole game.

pub mod block;
pub mod signal;
pub mod event;
pub mod condition;
pub mod input;
pub mod interpreter;

pub use block::{ConditionBlock, EventBlock, FlowBlock, InputBlock, InputField, PhaseBlock, PickMethod};
pub use signal::Outcome;
pub use event::{move_component, set_variable, shuffle, winner_names};
pub use input::{
    accept_answers, build_request, AnswerCollector, Answers, ChannelCollector, ChannelFrontEnd, FieldDescriptor,
    FieldKind, InputRequest, ScriptedCollector,
};
pub use interpreter::Interpreter;
