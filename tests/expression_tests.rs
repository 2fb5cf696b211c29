//! Expression language tests.
//!
//! These tests exercise formulas end to end through the public API:
//! - Operator precedence and associativity
//! - Case-insensitive names, property and index access
//! - Error messages for undefined names and bad indices

use proptest::prelude::*;

use rust_tabletop::core::{Location, Variable, VariableContainer};
use rust_tabletop::expr::{evaluate, resolve_place, EvalOptions};
use rust_tabletop::GameState;

fn eval(source: &str, vars: &VariableContainer) -> rust_tabletop::Result<Variable> {
    evaluate(source, vars, EvalOptions::default())
}

fn card(suit: &str, value: i32) -> VariableContainer {
    [("Suit", Variable::from(suit)), ("Value", Variable::from(value))]
        .into_iter()
        .collect()
}

/// Test arithmetic precedence.
#[test]
fn test_precedence() {
    let vars = VariableContainer::new();
    assert_eq!(eval("=1 + 2 * 3 + 4", &vars).unwrap(), Variable::from(11));
    assert_eq!(eval("=(1 + 2) * (3 + 4)", &vars).unwrap(), Variable::from(21));
    assert_eq!(eval("=2 ^ 3 * 2", &vars).unwrap(), Variable::from(16));
    assert_eq!(eval("=10 - 4 - 3", &vars).unwrap(), Variable::from(3));
    assert_eq!(eval("=-2 + 5", &vars).unwrap(), Variable::from(3));
}

/// Test that names are case-insensitive.
#[test]
fn test_case_insensitive_lookup() {
    let mut vars = VariableContainer::new();
    vars.insert("Card", card("hearts", 5));

    for source in ["=card.suit", "=CARD.Suit", "=Card.SUIT"] {
        assert_eq!(eval(source, &vars).unwrap(), Variable::from("hearts"));
    }
}

/// Test 1-based list indexing and its bounds.
#[test]
fn test_indexing() {
    let vars = VariableContainer::new();
    assert_eq!(eval("=[9, 8, 7][1]", &vars).unwrap(), Variable::from(9));
    assert_eq!(eval("=[9, 8, 7][3]", &vars).unwrap(), Variable::from(7));

    let err = eval("=[1, 2, 3][0]", &vars).unwrap_err();
    assert!(err.to_string().contains("out of bounds"));
    let err = eval("=[1, 2, 3][4]", &vars).unwrap_err();
    assert!(err.to_string().contains("out of bounds"));
}

/// Test the undefined-variable message keeps the caller's spelling.
#[test]
fn test_undefined_variable() {
    let err = eval("=Foo", &VariableContainer::new()).unwrap_err();
    assert_eq!(err.to_string(), "Variable Foo is not defined.");
}

/// Test that plain text is a string, not a formula.
#[test]
fn test_plain_text() {
    let vars = VariableContainer::new();
    assert_eq!(eval("Foo", &vars).unwrap(), Variable::from("Foo"));
    assert_eq!(eval("", &vars).unwrap(), Variable::from(""));
}

/// Test that locations resolve to their components when read.
#[test]
fn test_locations_resolve() {
    let mut vars = VariableContainer::new();
    vars.insert("deck", Location::collection([card("hearts", 2), card("clubs", 4)]));
    vars.insert("slot", Location::Component(Some(card("spades", 1))));
    vars.insert("empty", Location::empty_component());

    assert_eq!(eval("=deck[2].suit", &vars).unwrap(), Variable::from("clubs"));
    assert_eq!(eval("=count(deck)", &vars).unwrap(), Variable::from(2));
    assert_eq!(eval("=slot.value", &vars).unwrap(), Variable::from(1));
    assert_eq!(eval("=isnull(empty)", &vars).unwrap(), Variable::from(true));

    let raw = evaluate("=deck", &vars, EvalOptions::raw_locations()).unwrap();
    assert!(raw.is_collection_location());
}

/// Test resolving place expressions.
#[test]
fn test_resolve_place() {
    let players: Variable = vec![
        Variable::Mapping(card("hearts", 1)),
        Variable::Mapping(card("clubs", 2)),
    ]
    .into();
    let state = GameState::default().with_variable("players", players).with_variable("i", 2);

    let place = resolve_place("=players[i].Suit", state.variables(), EvalOptions::raw_locations()).unwrap();
    assert_eq!(place.to_string(), "players[2].suit");
    assert_eq!(state.read(&place).unwrap(), &Variable::from("clubs"));

    assert!(resolve_place("=1 + 2", state.variables(), EvalOptions::raw_locations()).is_err());
}

/// Test lambdas capture the surrounding scope.
#[test]
fn test_lambda_scope() {
    let mut vars = VariableContainer::new();
    vars.insert("threshold", 3);
    assert_eq!(
        eval("=filter([1, 2, 3, 4, 5], x => x > threshold)", &vars).unwrap(),
        Variable::from(vec![Variable::from(4), Variable::from(5)])
    );
    assert!(eval("=x => x", &vars).is_err());
}

/// Test eval() re-enters the evaluator with `this` bound.
#[test]
fn test_eval_binds_this() {
    let vars = VariableContainer::new();
    assert_eq!(eval("=eval('=this * 2', 21)", &vars).unwrap(), Variable::from(42));
}

/// Test parse errors surface with the fixed prefix.
#[test]
fn test_invalid_expressions() {
    let vars = VariableContainer::new();
    for source in ["=1 +", "=(1", "=.", "=3[1]", "=[1, 2"] {
        let err = eval(source, &vars).unwrap_err();
        assert!(err.to_string().starts_with("Invalid expression."), "{source}: {err}");
    }
}

proptest! {
    /// Multiplication binds tighter than addition for any operands.
    #[test]
    fn prop_mul_binds_tighter(a in -1000i32..1000, b in -1000i32..1000, c in -1000i32..1000) {
        let vars = VariableContainer::new();
        let value = eval(&format!("={a} + {b} * {c}"), &vars).unwrap();
        prop_assert_eq!(value, Variable::from(f64::from(a) + f64::from(b) * f64::from(c)));
    }

    /// Subtraction is left associative.
    #[test]
    fn prop_sub_left_associative(a in -1000i32..1000, b in -1000i32..1000, c in -1000i32..1000) {
        let vars = VariableContainer::new();
        let value = eval(&format!("={a} - {b} - {c}"), &vars).unwrap();
        prop_assert_eq!(value, Variable::from(f64::from(a) - f64::from(b) - f64::from(c)));
    }

    /// Every in-range 1-based index reads the matching element.
    #[test]
    fn prop_index_in_range(items in prop::collection::vec(-100i32..100, 1..20), pick in 0usize..20) {
        let index = pick % items.len();
        let list: Vec<String> = items.iter().map(ToString::to_string).collect();
        let vars = VariableContainer::new();
        let value = eval(&format!("=[{}][{}]", list.join(", "), index + 1), &vars).unwrap();
        prop_assert_eq!(value, Variable::from(items[index]));
    }
}
