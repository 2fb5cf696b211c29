//! Logical and conditional built-ins. All of them work on truthiness.

use super::Arguments;
use crate::core::Variable;
use crate::error::Result;

/// `or(a, b, ...)`: true when any argument is truthy. `or()` is false.
pub fn or(args: &Arguments<'_>) -> Result<Variable> {
    Ok(Variable::Bool(args.values()?.into_iter().any(Variable::is_truthy)))
}

/// `and(a, b, ...)`: true when every argument is truthy. `and()` is true.
pub fn and(args: &Arguments<'_>) -> Result<Variable> {
    Ok(Variable::Bool(args.values()?.into_iter().all(Variable::is_truthy)))
}

/// `any(list[, predicate])`: true when some element (or its predicate
/// result) is truthy.
pub fn any(args: &Arguments<'_>) -> Result<Variable> {
    let list = args.list(0)?;
    match args.optional_iteratee(1)? {
        Some(predicate) => {
            for item in list {
                if predicate.test(item)? {
                    return Ok(Variable::Bool(true));
                }
            }
            Ok(Variable::Bool(false))
        }
        None => Ok(Variable::Bool(list.iter().any(Variable::is_truthy))),
    }
}

/// `all(list[, predicate])`: true when every element (or its predicate
/// result) is truthy.
pub fn all(args: &Arguments<'_>) -> Result<Variable> {
    let list = args.list(0)?;
    match args.optional_iteratee(1)? {
        Some(predicate) => {
            for item in list {
                if !predicate.test(item)? {
                    return Ok(Variable::Bool(false));
                }
            }
            Ok(Variable::Bool(true))
        }
        None => Ok(Variable::Bool(list.iter().all(Variable::is_truthy))),
    }
}

pub fn not(args: &Arguments<'_>) -> Result<Variable> {
    Ok(Variable::Bool(!args.value(0)?.is_truthy()))
}

pub fn isnull(args: &Arguments<'_>) -> Result<Variable> {
    Ok(Variable::Bool(args.value(0)?.is_null()))
}

/// `if(condition, then, else)`
pub fn if_(args: &Arguments<'_>) -> Result<Variable> {
    ifs(args)
}

/// `ifs(c1, v1, c2, v2, ..., default)`: value of the first truthy condition,
/// otherwise the last argument.
pub fn ifs(args: &Arguments<'_>) -> Result<Variable> {
    let values = args.values()?;
    let last = values.len() - 1;
    for i in (0..last).step_by(2) {
        if values[i].is_truthy() {
            return Ok(values[i + 1].clone());
        }
    }
    Ok(values[last].clone())
}
