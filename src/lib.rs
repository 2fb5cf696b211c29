//! # rust-tabletop
//!
//! A rules-execution engine for turn-based games described as data.
//!
//! ## Design Principles
//!
//! 1. **Definitions, not code**: A game is a [`GameDefinition`]: starting
//!    variables, a player template, named phases and views, and a tree of
//!    flow blocks whose formulas are written in a small expression language.
//!
//! 2. **States are values**: Every block turns a [`GameState`] into a
//!    successor. Nothing is mutated in place; clones are O(1) via `im-rs`.
//!
//! 3. **Signals are outcomes**: Ending a phase or the game is an [`Outcome`]
//!    variant that each frame matches explicitly, never an error.
//!
//! ## Expressions
//!
//! Definition strings that start with `=` are formulas:
//!
//! ```text
//! =count(current.hand) > 0
//! =maxby(players, p => p.score)
//! =find(this, card => card.suit == 'hearts')
//! ```
//!
//! Names are case-insensitive. Lists are indexed from 1.
//!
//! ## Modules
//!
//! - `core`: Variables, locations, game state, players, RNG, configuration
//! - `expr`: Lexer, parser and evaluator for formulas
//! - `functions`: Built-in function library
//! - `flow`: Flow blocks, signals, input collection and the interpreter
//! - `phase`: Phase definitions and the phase loop
//! - `views`: Labeled expressions rendered before input
//! - `game`: Game definitions and the driver

pub mod core;
pub mod error;
pub mod expr;
pub mod functions;
pub mod flow;
pub mod phase;
pub mod views;
pub mod game;

// Re-export commonly used types
pub use crate::core::{
    EngineConfig, GameRng, GameRngState, GameState, Location, Place, PlayerCountRange, PlayerId, Variable,
    VariableContainer,
};

pub use crate::error::{EngineError, EvaluationError, InputError, ParseError, Result};

pub use crate::expr::{evaluate, parse, EvalOptions, Expr};

pub use crate::flow::{
    AnswerCollector, Answers, ChannelCollector, FlowBlock, InputRequest, Interpreter, Outcome, ScriptedCollector,
};

pub use crate::phase::{PhaseDefinition, Repetition};

pub use crate::views::{LogViewRenderer, View, ViewElement, ViewRenderer};

pub use crate::game::{DefinitionSource, Game, GameDefinition, GameReport, GameResult};
