//! List aggregation built-ins.

use std::cmp::Ordering;

use im::Vector;

use super::Arguments;
use crate::core::Variable;
use crate::error::{EvaluationError, Result};

/// `union(lists)`: concatenation of a list of lists without duplicates,
/// first occurrence wins.
pub fn union(args: &Arguments<'_>) -> Result<Variable> {
    let lists = args.list(0)?;
    let mut merged: Vector<Variable> = Vector::new();
    for list in lists {
        let items = list
            .as_list()
            .ok_or_else(|| args.invalid(format!("expected a list of lists, found {} inside", list.type_name())))?;
        for item in items {
            if !merged.contains(item) {
                merged.push_back(item.clone());
            }
        }
    }
    Ok(Variable::List(merged))
}

/// `count(list)`: number of elements (or characters of a string).
pub fn count(args: &Arguments<'_>) -> Result<Variable> {
    match args.value(0)? {
        Variable::List(items) => Ok(Variable::from(items.len())),
        Variable::String(s) => Ok(Variable::from(s.chars().count())),
        other => Err(args.invalid(format!("expected a list, found {}", other.type_name())).into()),
    }
}

/// Compare two elements of a list being searched for its extreme.
pub(crate) fn compare(function: &str, a: &Variable, b: &Variable) -> std::result::Result<Ordering, EvaluationError> {
    a.partial_compare(b).ok_or_else(|| EvaluationError::InvalidArgument {
        function: function.to_string(),
        details: format!("cannot compare {} with {}", a.type_name(), b.type_name()),
    })
}

/// `min(list)` / `max(list)`: null for an empty list.
pub fn extreme(function: &'static str, args: &Arguments<'_>) -> Result<Variable> {
    let wanted = if function == "min" { Ordering::Less } else { Ordering::Greater };
    let mut best: Option<&Variable> = None;
    for item in args.list(0)? {
        best = match best {
            Some(current) if compare(function, item, current)? != wanted => Some(current),
            _ => Some(item),
        };
    }
    Ok(best.cloned().unwrap_or_default())
}

/// `sum(list)`: 0 for an empty list.
pub fn sum(args: &Arguments<'_>) -> Result<Variable> {
    let mut total = 0.0;
    for item in args.list(0)? {
        total += item
            .as_number()
            .ok_or_else(|| args.invalid(format!("can only add numbers, found {}", item.type_name())))?;
    }
    Ok(Variable::Number(total))
}
