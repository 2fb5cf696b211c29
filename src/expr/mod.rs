//! The expression language.
//!
//! Definition strings starting with `=` are formulas:
//!
//! ```text
//! =count(players) * 2
//! =maxby(current.hand, c => c.value)
//! =players[currentindex].name
//! ```
//!
//! Strings without the marker are plain text and evaluate to themselves.

pub mod lexer;
pub mod ast;
pub mod parser;
pub mod eval;

pub use ast::{BinaryOperator, Expr};
pub use eval::{
    evaluate, evaluate_callable, evaluate_expr, evaluate_raw, resolve_place, EvalOptions, Evaluated, Lambda,
    FORMULA_PREFIX, THIS,
};
pub use parser::parse;
