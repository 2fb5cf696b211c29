use std::fmt;
use std::rc::Rc;

use crate::core::Variable;

/// Binary operators, loosest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl BinaryOperator {
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Pow => "^",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Parsed expression tree.
///
/// Variable and property names keep their spelling so error messages can
/// quote them; lookups normalize. Function names are stored lowercased.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Number, string, boolean or null literal.
    Literal(Variable),
    /// Reference to a variable in scope.
    Variable(String),
    /// `[a, b, c]`
    List(Vec<Expr>),
    /// `name(args...)`. `display_name` keeps the spelling for error messages.
    Call {
        name: String,
        display_name: String,
        arguments: Vec<Expr>,
    },
    /// `object.property`
    Property { object: Box<Expr>, property: String },
    /// `list[index]`, 1-based.
    Index { list: Box<Expr>, index: Box<Expr> },
    /// `-operand`
    Negate(Box<Expr>),
    Binary {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `param => body`. The body is shared with every closure built from it.
    Lambda { param: String, body: Rc<Expr> },
}

impl Expr {
    pub(crate) fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}
