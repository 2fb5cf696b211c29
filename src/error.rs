//! Error taxonomy for the engine.
//!
//! - [`ParseError`]: expression text rejected by the grammar.
//! - [`EvaluationError`]: semantic failures while evaluating expressions or
//!   executing blocks (undefined names, type mismatches, bad configuration).
//! - [`InputError`]: failures of the answer collector or invalid answers.
//!
//! Flow signals (end of phase, end of game) are deliberately absent here:
//! they are [`Outcome`](crate::flow::Outcome) variants, so `?` can never
//! swallow them.

use thiserror::Error;

/// Convenience result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Expression text that does not match the grammar.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The grammar rejected the expression.
    #[error("Invalid expression. {reason} in `{expression}`")]
    InvalidExpression {
        /// The offending expression text.
        expression: String,
        /// What the parser tripped over.
        reason: String,
    },
}

impl ParseError {
    pub(crate) fn invalid(expression: &str, reason: impl Into<String>) -> Self {
        Self::InvalidExpression {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }
}

/// Semantic failure during evaluation or block execution.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum EvaluationError {
    #[error("Variable {name} is not defined.")]
    UndefinedVariable { name: String },

    #[error("{name} is not a supported function.")]
    UnknownFunction { name: String },

    #[error("{type_name} type cannot be indexed.")]
    NotIndexable { type_name: &'static str },

    #[error("{type_name} type cannot be used as index.")]
    InvalidIndexType { type_name: &'static str },

    #[error("index {index} is out of bounds for list of size {size}.")]
    IndexOutOfBounds { index: String, size: usize },

    #[error("{type_name} type has no property {property}.")]
    NoProperties {
        type_name: &'static str,
        property: String,
    },

    #[error("operator {operator} cannot be applied to {left} and {right}.")]
    OperandTypes {
        operator: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("operator {operator} cannot be applied to {operand}.")]
    UnaryOperandType {
        operator: &'static str,
        operand: &'static str,
    },

    #[error("division by zero.")]
    DivisionByZero,

    #[error("{function} expects {expected} arguments but received {found}.")]
    ArgumentCount {
        function: String,
        expected: String,
        found: usize,
    },

    #[error("{function}: {details}")]
    InvalidArgument { function: String, details: String },

    #[error("a lambda cannot be used as a value.")]
    LambdaAsValue,

    #[error("expected a lambda but found {type_name}.")]
    NotCallable { type_name: &'static str },

    #[error("A pick method must be provided when moving components from a collection.")]
    MissingPickMethod,

    #[error("{details}")]
    EmptyLocation { details: String },

    #[error("`{expression}` does not refer to a location (found {type_name}).")]
    NotALocation {
        expression: String,
        type_name: &'static str,
    },

    #[error("Location of type {type_name} is not a collection and cannot be shuffled.")]
    NotACollection { type_name: &'static str },

    #[error("condition `{expression}` evaluated to {type_name}, expected boolean.")]
    NonBooleanCondition {
        expression: String,
        type_name: &'static str,
    },

    #[error("starting player must be a player id or a player record, found {type_name}.")]
    InvalidStartingPlayer { type_name: &'static str },

    #[error("player {id} does not exist among {count} players.")]
    UnknownPlayer { id: String, count: usize },

    #[error("winners must be a list of player records: {details}")]
    InvalidWinners { details: String },

    #[error("cannot assign to `{path}`: {details}")]
    InvalidAssignment { path: String, details: String },
}

/// Failure while collecting answers for an input block.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum InputError {
    #[error("answer collector failed: {0}")]
    Collector(String),

    #[error("no answer was provided for field {field}.")]
    MissingAnswer { field: String },

    #[error("answer for field {field} must be {expected}, found {found}.")]
    InvalidAnswer {
        field: String,
        expected: &'static str,
        found: String,
    },
}

/// Top-level engine error.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("phase {name} is not defined.")]
    UnknownPhase { name: String },

    #[error("player count {requested} is outside the allowed range {min}..={max}.")]
    PlayerCount {
        requested: usize,
        min: usize,
        max: usize,
    },

    #[error("phase {phase} exceeded the limit of {limit} iterations.")]
    IterationLimit { phase: String, limit: u64 },
}
