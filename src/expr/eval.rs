//! Tree-walking evaluator.
//!
//! ## Entry points
//!
//! - [`evaluate`]: text in, [`Variable`] out. Text starting with `=` is a
//!   formula; any other text is returned verbatim as a string.
//! - [`evaluate_callable`]: a formula that must produce a lambda.
//! - [`resolve_place`]: a formula naming a location in the state
//!   (`players[2].hand`), used by blocks that write.
//!
//! ## Lambdas
//!
//! `x => body` evaluates to a [`Lambda`] closing over the current scope.
//! Lambdas can be handed to the function library but are never stored as
//! variables.

use std::rc::Rc;

use smallvec::SmallVec;

use super::ast::{BinaryOperator, Expr};
use super::parser::parse;
use crate::core::variable::format_number;
use crate::core::{GameState, Location, Place, Variable, VariableContainer};
use crate::error::{EngineError, EvaluationError, Result};
use crate::functions::{self, Arguments};

/// Marker that turns a definition string into a formula.
pub const FORMULA_PREFIX: char = '=';

/// Name bound by `eval(expr, value)` and by `find` pick expressions.
pub const THIS: &str = "this";

/// Evaluation switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvalOptions {
    /// Unwrap locations into their components when reading variables.
    pub resolve_locations: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            resolve_locations: true,
        }
    }
}

impl EvalOptions {
    /// Options that keep locations wrapped.
    #[must_use]
    pub fn raw_locations() -> Self {
        Self {
            resolve_locations: false,
        }
    }
}

/// Result of evaluating an expression: a value or a callable.
#[derive(Clone, Debug)]
pub enum Evaluated {
    Value(Variable),
    Lambda(Lambda),
}

impl Evaluated {
    /// The value, failing when the expression produced a lambda.
    pub fn into_value(self) -> std::result::Result<Variable, EvaluationError> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Lambda(_) => Err(EvaluationError::LambdaAsValue),
        }
    }

    pub fn into_lambda(self) -> std::result::Result<Lambda, EvaluationError> {
        match self {
            Self::Lambda(lambda) => Ok(lambda),
            Self::Value(value) => Err(EvaluationError::NotCallable {
                type_name: value.type_name(),
            }),
        }
    }
}

/// Single-parameter closure.
#[derive(Clone, Debug)]
pub struct Lambda {
    param: String,
    body: Rc<Expr>,
    scope: VariableContainer,
    options: EvalOptions,
}

impl Lambda {
    #[must_use]
    pub fn param(&self) -> &str {
        &self.param
    }

    /// Evaluate the body with the parameter bound to `argument`.
    pub fn call(&self, argument: Variable) -> Result<Variable> {
        let evaluator = Evaluator {
            scope: self.scope.with(&self.param, argument),
            options: self.options,
        };
        Ok(evaluator.eval(&self.body)?.into_value()?)
    }
}

/// Evaluate definition text to a value.
///
/// ```
/// use rust_tabletop::core::{Variable, VariableContainer};
/// use rust_tabletop::expr::{evaluate, EvalOptions};
///
/// let vars = VariableContainer::new();
/// let value = evaluate("=1 + 2 * 3 + 4", &vars, EvalOptions::default()).unwrap();
/// assert_eq!(value, Variable::Number(11.0));
///
/// let text = evaluate("Player 1", &vars, EvalOptions::default()).unwrap();
/// assert_eq!(text, Variable::from("Player 1"));
/// ```
pub fn evaluate(expression: &str, variables: &VariableContainer, options: EvalOptions) -> Result<Variable> {
    Ok(evaluate_raw(expression, variables, options)?.into_value()?)
}

/// Like [`evaluate`] but lets a lambda through.
pub fn evaluate_raw(expression: &str, variables: &VariableContainer, options: EvalOptions) -> Result<Evaluated> {
    match expression.strip_prefix(FORMULA_PREFIX) {
        Some(formula) => {
            let expr = parse(formula)?;
            evaluate_expr(&expr, variables, options)
        }
        None => Ok(Evaluated::Value(Variable::String(expression.to_string()))),
    }
}

/// Evaluate a formula that must produce a lambda.
pub fn evaluate_callable(expression: &str, variables: &VariableContainer, options: EvalOptions) -> Result<Lambda> {
    Ok(evaluate_raw(expression, variables, options)?.into_lambda()?)
}

/// Evaluate an already parsed expression.
pub fn evaluate_expr(expr: &Expr, variables: &VariableContainer, options: EvalOptions) -> Result<Evaluated> {
    let evaluator = Evaluator {
        scope: variables.clone(),
        options,
    };
    evaluator.eval(expr)
}

/// Resolve text naming a place in the state. The leading `=` is optional.
///
/// Only variables followed by property and index accesses denote places;
/// index expressions are evaluated against `variables`.
pub fn resolve_place(expression: &str, variables: &VariableContainer, options: EvalOptions) -> Result<Place> {
    let formula = expression.strip_prefix(FORMULA_PREFIX).unwrap_or(expression);
    let expr = parse(formula)?;
    let evaluator = Evaluator {
        scope: variables.clone(),
        options,
    };
    evaluator.place_of(&expr, expression)
}

impl GameState {
    /// Evaluate definition text against this state with default options.
    pub fn evaluate(&self, expression: &str) -> Result<Variable> {
        evaluate(expression, self.variables(), EvalOptions::default())
    }

    /// Evaluate definition text against this state.
    pub fn evaluate_with(&self, expression: &str, options: EvalOptions) -> Result<Variable> {
        evaluate(expression, self.variables(), options)
    }
}

struct Evaluator {
    scope: VariableContainer,
    options: EvalOptions,
}

impl Evaluator {
    fn eval(&self, expr: &Expr) -> Result<Evaluated> {
        let value = match expr {
            Expr::Literal(value) => value.clone(),
            Expr::Variable(name) => self.scope.lookup_resolved(name, self.options.resolve_locations)?,
            Expr::List(items) => items
                .iter()
                .map(|item| self.eval_value(item))
                .collect::<Result<Variable>>()?,
            Expr::Call {
                name,
                display_name,
                arguments,
            } => return self.eval_call(name, display_name, arguments),
            Expr::Property { object, property } => {
                let object = self.eval_value(object)?;
                self.property(&object, property)?
            }
            Expr::Index { list, index } => {
                let list = self.eval_value(list)?;
                let index = self.eval_value(index)?;
                index_list(&list, &index)?
            }
            Expr::Negate(operand) => match self.eval_value(operand)? {
                Variable::Number(n) => Variable::Number(-n),
                other => {
                    return Err(EvaluationError::UnaryOperandType {
                        operator: "-",
                        operand: other.type_name(),
                    }
                    .into())
                }
            },
            Expr::Binary { op, left, right } => {
                let left = self.eval_value(left)?;
                let right = self.eval_value(right)?;
                binary(*op, &left, &right)?
            }
            Expr::Lambda { param, body } => {
                return Ok(Evaluated::Lambda(Lambda {
                    param: param.clone(),
                    body: Rc::clone(body),
                    scope: self.scope.clone(),
                    options: self.options,
                }))
            }
        };
        Ok(Evaluated::Value(value))
    }

    fn eval_value(&self, expr: &Expr) -> Result<Variable> {
        Ok(self.eval(expr)?.into_value()?)
    }

    fn property(&self, object: &Variable, property: &str) -> std::result::Result<Variable, EvaluationError> {
        match object {
            Variable::Mapping(container) | Variable::Location(Location::Component(Some(container))) => {
                container.lookup_resolved(property, self.options.resolve_locations)
            }
            other => Err(EvaluationError::NoProperties {
                type_name: other.type_name(),
                property: property.to_string(),
            }),
        }
    }

    fn eval_call(&self, name: &str, display_name: &str, arguments: &[Expr]) -> Result<Evaluated> {
        if name == "eval" {
            return self.eval_reentrant(arguments);
        }

        let builtin = functions::lookup(name).ok_or_else(|| EvaluationError::UnknownFunction {
            name: display_name.to_string(),
        })?;
        builtin.check_arity(arguments.len())?;

        let values = arguments
            .iter()
            .map(|argument| self.eval(argument))
            .collect::<Result<SmallVec<[Evaluated; 4]>>>()?;
        let result = builtin.call(&Arguments::new(builtin.name(), &values))?;
        Ok(Evaluated::Value(result))
    }

    /// `eval(text, this)`: evaluate text as definition text with `this` bound.
    fn eval_reentrant(&self, arguments: &[Expr]) -> Result<Evaluated> {
        if arguments.len() != 2 {
            return Err(EvaluationError::ArgumentCount {
                function: "eval".to_string(),
                expected: "2".to_string(),
                found: arguments.len(),
            }
            .into());
        }
        let text = match self.eval_value(&arguments[0])? {
            Variable::String(text) => text,
            other => {
                return Err(EvaluationError::InvalidArgument {
                    function: "eval".to_string(),
                    details: format!("expected an expression string, found {}", other.type_name()),
                }
                .into())
            }
        };
        let this = self.eval_value(&arguments[1])?;
        evaluate_raw(&text, &self.scope.with(THIS, this), self.options)
    }

    fn place_of(&self, expr: &Expr, source: &str) -> Result<Place> {
        match expr {
            Expr::Variable(name) => Ok(Place::variable(name)),
            Expr::Property { object, property } => Ok(self.place_of(object, source)?.key(property)),
            Expr::Index { list, index } => {
                let place = self.place_of(list, source)?;
                let size = self.eval_value(list)?.as_list().map_or(0, |items| items.len());
                let position = list_position(&self.eval_value(index)?, size)?;
                Ok(place.index(position))
            }
            _ => Err(EngineError::Evaluation(EvaluationError::InvalidAssignment {
                path: source.to_string(),
                details: "only variables with property and index accesses denote places".to_string(),
            })),
        }
    }
}

/// 0-based position for a 1-based index value.
fn list_position(index: &Variable, size: usize) -> std::result::Result<usize, EvaluationError> {
    let position = match index {
        Variable::Bool(b) => f64::from(u8::from(*b)),
        Variable::Number(n) => *n,
        other => {
            return Err(EvaluationError::InvalidIndexType {
                type_name: other.type_name(),
            })
        }
    };
    if position.fract() != 0.0 || position < 1.0 || position > size as f64 {
        return Err(EvaluationError::IndexOutOfBounds {
            index: format_number(position),
            size,
        });
    }
    Ok(position as usize - 1)
}

fn index_list(list: &Variable, index: &Variable) -> std::result::Result<Variable, EvaluationError> {
    match list {
        Variable::List(items) => {
            let position = list_position(index, items.len())?;
            Ok(items[position].clone())
        }
        Variable::Location(Location::Collection(components)) => {
            let position = list_position(index, components.len())?;
            Ok(Variable::Mapping(components[position].clone()))
        }
        other => Err(EvaluationError::NotIndexable {
            type_name: other.type_name(),
        }),
    }
}

fn operand_error(op: BinaryOperator, left: &Variable, right: &Variable) -> EvaluationError {
    EvaluationError::OperandTypes {
        operator: op.symbol(),
        left: left.type_name(),
        right: right.type_name(),
    }
}

/// Apply a binary operator.
pub(crate) fn binary(
    op: BinaryOperator,
    left: &Variable,
    right: &Variable,
) -> std::result::Result<Variable, EvaluationError> {
    use BinaryOperator::{Add, Div, Eq, Ge, Gt, Le, Lt, Mod, Mul, NotEq, Pow, Sub};

    match op {
        Eq => return Ok(Variable::Bool(left == right)),
        NotEq => return Ok(Variable::Bool(left != right)),
        Lt | Le | Gt | Ge => {
            let ordering = left
                .partial_compare(right)
                .ok_or_else(|| operand_error(op, left, right))?;
            let result = match op {
                Lt => ordering.is_lt(),
                Le => ordering.is_le(),
                Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            };
            return Ok(Variable::Bool(result));
        }
        _ => {}
    }

    if let (Add, Variable::String(a), Variable::String(b)) = (op, left, right) {
        return Ok(Variable::String(format!("{a}{b}")));
    }

    let (Variable::Number(a), Variable::Number(b)) = (left, right) else {
        return Err(operand_error(op, left, right));
    };
    let (a, b) = (*a, *b);
    let value = match op {
        Add => a + b,
        Sub => a - b,
        Mul => a * b,
        Div | Mod if b == 0.0 => return Err(EvaluationError::DivisionByZero),
        Div => a / b,
        Mod => a % b,
        Pow => a.powf(b),
        Eq | NotEq | Lt | Le | Gt | Ge => return Err(operand_error(op, left, right)),
    };
    Ok(Variable::Number(value))
}
