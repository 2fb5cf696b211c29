//! Built-ins that take a key or predicate.

use std::cmp::Ordering;

use im::Vector;

use super::aggregate::compare;
use super::Arguments;
use crate::core::Variable;
use crate::error::Result;

/// `minby(list, key)` / `maxby(list, key)`: the element with the extreme
/// key, first one on ties. Null for an empty list.
pub fn extreme_by(function: &'static str, args: &Arguments<'_>) -> Result<Variable> {
    let list = args.list(0)?;
    let key = args.iteratee(1)?;
    let wanted = if function == "minby" { Ordering::Less } else { Ordering::Greater };

    let mut best: Option<(&Variable, Variable)> = None;
    for item in list {
        let item_key = key.apply(item)?;
        let replace = match &best {
            Some((_, best_key)) => compare(function, &item_key, best_key)? == wanted,
            None => true,
        };
        if replace {
            best = Some((item, item_key));
        }
    }
    Ok(best.map(|(item, _)| item.clone()).unwrap_or_default())
}

/// `find(list, predicate)`: first matching element or null.
pub fn find(args: &Arguments<'_>) -> Result<Variable> {
    let list = args.list(0)?;
    let predicate = args.iteratee(1)?;
    for item in list {
        if predicate.test(item)? {
            return Ok(item.clone());
        }
    }
    Ok(Variable::Null)
}

/// `filter(list, predicate)`
pub fn filter(args: &Arguments<'_>) -> Result<Variable> {
    let list = args.list(0)?;
    let predicate = args.iteratee(1)?;
    let mut kept = Vector::new();
    for item in list {
        if predicate.test(item)? {
            kept.push_back(item.clone());
        }
    }
    Ok(Variable::List(kept))
}

/// `map(list, f)`
pub fn map(args: &Arguments<'_>) -> Result<Variable> {
    let list = args.list(0)?;
    let f = args.iteratee(1)?;
    list.iter().map(|item| f.apply(item)).collect()
}

/// `sorted(list[, key])`: stable ascending sort.
pub fn sorted(args: &Arguments<'_>) -> Result<Variable> {
    let list = args.list(0)?;
    let key = args.optional_iteratee(1)?;

    let mut keyed = list
        .iter()
        .map(|item| {
            let item_key = match &key {
                Some(key) => key.apply(item)?,
                None => item.clone(),
            };
            Ok((item_key, item))
        })
        .collect::<Result<Vec<_>>>()?;

    // sort_by cannot fail, so collect the first comparison error separately
    let mut failure = None;
    keyed.sort_by(|(a, _), (b, _)| {
        compare("sorted", a, b).unwrap_or_else(|err| {
            failure.get_or_insert(err);
            Ordering::Equal
        })
    });
    if let Some(err) = failure {
        return Err(err.into());
    }

    Ok(keyed.into_iter().map(|(_, item)| item.clone()).collect())
}

#[cfg(test)]
mod tests {
    use crate::core::{Variable, VariableContainer};
    use crate::error::Result;
    use crate::expr::{evaluate, EvalOptions};

    fn card(suit: &str, value: i32) -> Variable {
        Variable::Mapping([("suit", Variable::from(suit)), ("value", Variable::from(value))].into_iter().collect())
    }

    fn hand() -> VariableContainer {
        let mut vars = VariableContainer::new();
        vars.insert(
            "hand",
            Variable::from(vec![card("hearts", 3), card("spades", 9), card("clubs", 9), card("hearts", 1)]),
        );
        vars
    }

    fn eval(source: &str) -> Result<Variable> {
        evaluate(source, &hand(), EvalOptions::default())
    }

    #[test]
    fn test_minby_maxby_first_on_ties() {
        assert_eq!(eval("=maxby(hand, c => c.value)").unwrap(), card("spades", 9));
        assert_eq!(eval("=minby(hand, 'value')").unwrap(), card("hearts", 1));
        assert_eq!(eval("=maxby([], x => x)").unwrap(), Variable::Null);
    }

    #[test]
    fn test_find() {
        assert_eq!(eval("=find(hand, c => c.suit == 'clubs')").unwrap(), card("clubs", 9));
        assert_eq!(eval("=find(hand, c => c.value > 10)").unwrap(), Variable::Null);
    }

    #[test]
    fn test_filter_and_map() {
        assert_eq!(
            eval("=map(filter(hand, c => c.suit = 'hearts'), c => c.value)").unwrap(),
            Variable::from(vec![Variable::from(3), Variable::from(1)])
        );
        assert_eq!(
            eval("=map(hand, 'suit')").unwrap(),
            Variable::from(vec![
                Variable::from("hearts"),
                Variable::from("spades"),
                Variable::from("clubs"),
                Variable::from("hearts"),
            ])
        );
    }

    #[test]
    fn test_sorted_is_stable() {
        assert_eq!(
            eval("=sorted(hand, c => c.value)").unwrap(),
            Variable::from(vec![card("hearts", 1), card("hearts", 3), card("spades", 9), card("clubs", 9)])
        );
        assert_eq!(
            eval("=sorted([3, 1, 2])").unwrap(),
            Variable::from(vec![Variable::from(1), Variable::from(2), Variable::from(3)])
        );
        assert!(eval("=sorted([1, 'a'])").is_err());
    }

    #[test]
    fn test_non_callable_iteratee() {
        let err = eval("=filter(hand, 3)").unwrap_err();
        assert!(err.to_string().contains("lambda or a property name"));
    }
}
