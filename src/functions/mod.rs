//! Built-in function library.
//!
//! Functions are looked up case-insensitively in a fixed table. Each entry
//! declares its arity, which is checked before any argument is evaluated.
//!
//! ## Iteratees
//!
//! Functions that take a key or predicate (`maxby`, `filter`, `sorted`, ...)
//! accept either a lambda (`c => c.value`) or a property name
//! (`"value"`), see [`Iteratee`].

pub mod logic;
pub mod aggregate;
pub mod higher_order;

use std::fmt;

use im::Vector;

use crate::core::Variable;
use crate::error::{EvaluationError, Result};
use crate::expr::{Evaluated, Lambda};

/// Signature of a built-in implementation.
type BuiltinFn = fn(&Arguments<'_>) -> Result<Variable>;

/// Number of arguments a built-in accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    /// Inclusive bounds.
    Range(usize, usize),
}

impl Arity {
    #[must_use]
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exact(n) => count == n,
            Self::AtLeast(n) => count >= n,
            Self::Range(min, max) => (min..=max).contains(&count),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::AtLeast(n) => write!(f, "at least {n}"),
            Self::Range(min, max) => write!(f, "{min} to {max}"),
        }
    }
}

/// A library entry.
pub struct Builtin {
    name: &'static str,
    arity: Arity,
    func: BuiltinFn,
}

impl Builtin {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn check_arity(&self, found: usize) -> std::result::Result<(), EvaluationError> {
        if self.arity.accepts(found) {
            Ok(())
        } else {
            Err(EvaluationError::ArgumentCount {
                function: self.name.to_string(),
                expected: self.arity.to_string(),
                found,
            })
        }
    }

    pub fn call(&self, arguments: &Arguments<'_>) -> Result<Variable> {
        (self.func)(arguments)
    }
}

/// Builds the static lookup table and the public list of names.
macro_rules! builtin_functions {
    (
        $(
            $name:literal => {
                arity: $arity:expr,
                func: $func:expr $(,)?
            }
        ),* $(,)?
    ) => {
        static BUILTIN_TABLE: &[Builtin] = &[
            $(
                Builtin { name: $name, arity: $arity, func: $func },
            )*
        ];

        /// Names of every built-in function.
        pub const BUILTIN_FUNCTIONS: &[&str] = &[
            $($name,)*
        ];
    };
}

builtin_functions! {
    "or"      => { arity: Arity::AtLeast(0), func: logic::or },
    "any"     => { arity: Arity::Range(1, 2), func: logic::any },
    "and"     => { arity: Arity::AtLeast(0), func: logic::and },
    "all"     => { arity: Arity::Range(1, 2), func: logic::all },
    "not"     => { arity: Arity::Exact(1), func: logic::not },
    "isnull"  => { arity: Arity::Exact(1), func: logic::isnull },
    "if"      => { arity: Arity::Exact(3), func: logic::if_ },
    "ifs"     => { arity: Arity::AtLeast(1), func: logic::ifs },
    "union"   => { arity: Arity::Exact(1), func: aggregate::union },
    "count"   => { arity: Arity::Exact(1), func: aggregate::count },
    "min"     => { arity: Arity::Exact(1), func: |args| aggregate::extreme("min", args) },
    "max"     => { arity: Arity::Exact(1), func: |args| aggregate::extreme("max", args) },
    "sum"     => { arity: Arity::Exact(1), func: aggregate::sum },
    "minby"   => { arity: Arity::Exact(2), func: |args| higher_order::extreme_by("minby", args) },
    "maxby"   => { arity: Arity::Exact(2), func: |args| higher_order::extreme_by("maxby", args) },
    "find"    => { arity: Arity::Exact(2), func: higher_order::find },
    "filter"  => { arity: Arity::Exact(2), func: higher_order::filter },
    "map"     => { arity: Arity::Exact(2), func: higher_order::map },
    "sorted"  => { arity: Arity::Range(1, 2), func: higher_order::sorted },
}

/// Find a built-in by name, ignoring case.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTIN_TABLE.iter().find(|builtin| builtin.name.eq_ignore_ascii_case(name))
}

/// Evaluated arguments of one call.
pub struct Arguments<'a> {
    function: &'static str,
    values: &'a [Evaluated],
}

impl<'a> Arguments<'a> {
    #[must_use]
    pub fn new(function: &'static str, values: &'a [Evaluated]) -> Self {
        Self { function, values }
    }

    #[must_use]
    pub fn function(&self) -> &'static str {
        self.function
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn invalid(&self, details: impl Into<String>) -> EvaluationError {
        EvaluationError::InvalidArgument {
            function: self.function.to_string(),
            details: details.into(),
        }
    }

    fn get(&self, index: usize) -> std::result::Result<&'a Evaluated, EvaluationError> {
        self.values.get(index).ok_or_else(|| EvaluationError::ArgumentCount {
            function: self.function.to_string(),
            expected: format!("at least {}", index + 1),
            found: self.values.len(),
        })
    }

    /// Argument `index` as a plain value.
    pub fn value(&self, index: usize) -> std::result::Result<&'a Variable, EvaluationError> {
        match self.get(index)? {
            Evaluated::Value(value) => Ok(value),
            Evaluated::Lambda(_) => Err(EvaluationError::LambdaAsValue),
        }
    }

    /// Every argument as a plain value.
    pub fn values(&self) -> std::result::Result<Vec<&'a Variable>, EvaluationError> {
        (0..self.values.len()).map(|i| self.value(i)).collect()
    }

    /// Argument `index` as a list.
    pub fn list(&self, index: usize) -> std::result::Result<&'a Vector<Variable>, EvaluationError> {
        let value = self.value(index)?;
        value
            .as_list()
            .ok_or_else(|| self.invalid(format!("argument {} must be a list, found {}", index + 1, value.type_name())))
    }

    /// Argument `index` as a key or predicate.
    pub fn iteratee(&self, index: usize) -> std::result::Result<Iteratee<'a>, EvaluationError> {
        match self.get(index)? {
            Evaluated::Lambda(lambda) => Ok(Iteratee::Lambda(lambda)),
            Evaluated::Value(Variable::String(property)) => Ok(Iteratee::Property(property)),
            Evaluated::Value(other) => Err(self.invalid(format!(
                "argument {} must be a lambda or a property name, found {}",
                index + 1,
                other.type_name()
            ))),
        }
    }

    /// Like [`Arguments::iteratee`], `None` when the argument is absent.
    pub fn optional_iteratee(&self, index: usize) -> std::result::Result<Option<Iteratee<'a>>, EvaluationError> {
        if index < self.values.len() {
            self.iteratee(index).map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Key or predicate applied to each list element.
#[derive(Clone, Copy, Debug)]
pub enum Iteratee<'a> {
    Lambda(&'a Lambda),
    /// Read this property of each element (null when absent).
    Property(&'a str),
}

impl Iteratee<'_> {
    pub fn apply(&self, item: &Variable) -> Result<Variable> {
        match self {
            Self::Lambda(lambda) => lambda.call(item.clone()),
            Self::Property(property) => Ok(item
                .as_mapping()
                .and_then(|mapping| mapping.get(property))
                .cloned()
                .map_or(Variable::Null, Variable::resolved)),
        }
    }

    /// Apply as a predicate.
    pub fn test(&self, item: &Variable) -> Result<bool> {
        Ok(self.apply(item)?.is_truthy())
    }
}
