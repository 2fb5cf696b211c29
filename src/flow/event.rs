//! Event blocks: assignments, component moves, shuffles and the two signals.
//!
//! Each event is a free function from a state to its successor so it can be
//! exercised without an interpreter; [`Interpreter`] only dispatches and
//! supplies the RNG.

use tracing::debug;

use super::block::{EventBlock, PickMethod};
use super::interpreter::Interpreter;
use super::signal::Outcome;
use crate::core::{GameRng, GameState, Location, Place, Variable, VariableContainer};
use crate::error::{EvaluationError, Result};
use crate::expr::{evaluate_raw, resolve_place, EvalOptions, Evaluated, THIS};

impl<'d> Interpreter<'d> {
    pub(super) fn execute_event(&mut self, event: &'d EventBlock, state: GameState) -> Result<Outcome> {
        match event {
            EventBlock::SetVariable { variable, expression } => {
                set_variable(&state, variable, expression).map(Outcome::Continue)
            }
            EventBlock::MoveComponent {
                source,
                pick_method,
                pick_find_expression,
                destination,
            } => move_component(
                &state,
                source,
                *pick_method,
                pick_find_expression.as_deref(),
                destination,
            )
            .map(Outcome::Continue),
            EventBlock::Shuffle { stack } => shuffle(&state, stack, &mut self.rng).map(Outcome::Continue),
            EventBlock::EndPhase => Ok(Outcome::EndPhase(state)),
            EventBlock::EndGame { winners } => {
                let winners = winner_names(&state, winners)?;
                Ok(Outcome::EndGame { state, winners })
            }
        }
    }
}

/// Assign the value of `expression` to the dotted `variable` path.
///
/// A target currently holding a component location stays one: null empties
/// it and a mapping fills it.
pub fn set_variable(state: &GameState, variable: &str, expression: &str) -> Result<GameState> {
    let value = state.evaluate(expression)?;
    let place = Place::dotted(variable);
    debug!(variable = %place, value = %value, "Updating variable");

    let (next, ()) = state.upsert(&place, |slot| store(slot, value, &place))?;
    Ok(next)
}

fn store(slot: &mut Variable, value: Variable, place: &Place) -> std::result::Result<(), EvaluationError> {
    if !slot.is_component_location() {
        *slot = value;
        return Ok(());
    }
    let component = match value {
        Variable::Null => None,
        Variable::Mapping(component) => Some(component),
        Variable::Location(Location::Component(component)) => component,
        other => {
            return Err(EvaluationError::InvalidAssignment {
                path: place.to_string(),
                details: format!("a component location cannot hold {}", other.type_name()),
            })
        }
    };
    *slot = Location::Component(component).into();
    Ok(())
}

/// Take one component out of `source` and put it into `destination`.
///
/// Both ends are place expressions and must hold locations. Collections
/// give up their first component (`draw`) or the one selected by
/// `find_expression` (`find`); component locations give up their content.
/// Collections receive at the end, component locations are overwritten.
pub fn move_component(
    state: &GameState,
    source: &str,
    pick_method: Option<PickMethod>,
    find_expression: Option<&str>,
    destination: &str,
) -> Result<GameState> {
    let raw = EvalOptions::raw_locations();
    let from = resolve_place(source, state.variables(), raw)?;
    let to = resolve_place(destination, state.variables(), raw)?;

    let position = match location_at(state, &from, source)? {
        Location::Collection(components) => Some(pick_position(
            state,
            components,
            pick_method,
            find_expression,
            &from,
        )?),
        Location::Component(_) => None,
    };
    location_at(state, &to, destination)?;

    debug!(source = %from, destination = %to, "Moving component");
    let (state, component) = state.update(&from, |slot| take(slot, position, &from))?;
    let (state, ()) = state.update(&to, |slot| put(slot, component))?;
    Ok(state)
}

fn location_at<'s>(
    state: &'s GameState,
    place: &Place,
    expression: &str,
) -> std::result::Result<&'s Location, EvaluationError> {
    let value = state.read(place)?;
    value.as_location().ok_or_else(|| EvaluationError::NotALocation {
        expression: expression.to_string(),
        type_name: value.type_name(),
    })
}

/// Position of the component a collection gives up.
fn pick_position(
    state: &GameState,
    components: &im::Vector<VariableContainer>,
    pick_method: Option<PickMethod>,
    find_expression: Option<&str>,
    place: &Place,
) -> Result<usize> {
    match pick_method {
        None => Err(EvaluationError::MissingPickMethod.into()),
        Some(PickMethod::Draw) if components.is_empty() => Err(EvaluationError::EmptyLocation {
            details: format!("cannot draw from {place}: the collection is empty."),
        }
        .into()),
        Some(PickMethod::Draw) => Ok(0),
        Some(PickMethod::Find) => {
            let expression = find_expression.ok_or_else(|| EvaluationError::InvalidArgument {
                function: "moveComponent".to_string(),
                details: "pick method find requires a pickFindExpression".to_string(),
            })?;
            let candidates: Variable = components.iter().cloned().map(Variable::Mapping).collect();
            let scope = state.variables().with(THIS, candidates);

            let position = match evaluate_raw(expression, &scope, EvalOptions::default())? {
                Evaluated::Lambda(predicate) => {
                    let mut found = None;
                    for (i, component) in components.iter().enumerate() {
                        if predicate.call(Variable::Mapping(component.clone()))?.is_truthy() {
                            found = Some(i);
                            break;
                        }
                    }
                    found
                }
                Evaluated::Value(Variable::Mapping(wanted)) => components.iter().position(|c| *c == wanted),
                Evaluated::Value(_) => None,
            };
            position.ok_or_else(|| {
                EvaluationError::EmptyLocation {
                    details: format!("no component in {place} matches `{expression}`."),
                }
                .into()
            })
        }
    }
}

fn take(
    slot: &mut Variable,
    position: Option<usize>,
    place: &Place,
) -> std::result::Result<VariableContainer, EvaluationError> {
    match slot {
        Variable::Location(Location::Collection(components)) => {
            let index = position.unwrap_or(0);
            if index >= components.len() {
                return Err(EvaluationError::EmptyLocation {
                    details: format!("cannot take component {} from {place}.", index + 1),
                });
            }
            Ok(components.remove(index))
        }
        Variable::Location(Location::Component(component)) => {
            component.take().ok_or_else(|| EvaluationError::EmptyLocation {
                details: format!("cannot move from {place}: the component location is empty."),
            })
        }
        other => Err(EvaluationError::NotALocation {
            expression: place.to_string(),
            type_name: other.type_name(),
        }),
    }
}

fn put(slot: &mut Variable, component: VariableContainer) -> std::result::Result<(), EvaluationError> {
    match slot {
        Variable::Location(Location::Collection(components)) => {
            components.push_back(component);
            Ok(())
        }
        Variable::Location(Location::Component(target)) => {
            *target = Some(component);
            Ok(())
        }
        other => Err(EvaluationError::NotALocation {
            expression: String::new(),
            type_name: other.type_name(),
        }),
    }
}

/// Randomly reorder the collection stored at `stack`.
pub fn shuffle(state: &GameState, stack: &str, rng: &mut GameRng) -> Result<GameState> {
    let place = resolve_place(stack, state.variables(), EvalOptions::raw_locations())?;
    debug!(stack = %place, "Shuffling");

    let (next, ()) = state.update(&place, |slot| match slot {
        Variable::Location(Location::Collection(components)) => {
            *components = rng.shuffled(components);
            Ok(())
        }
        Variable::Location(location) => Err(EvaluationError::NotACollection {
            type_name: location.type_name(),
        }),
        other => Err(EvaluationError::NotACollection {
            type_name: other.type_name(),
        }),
    })?;
    Ok(next)
}

/// Names of the player records `expression` evaluates to.
pub fn winner_names(state: &GameState, expression: &str) -> Result<Vec<String>> {
    let value = state.evaluate(expression)?;
    let found = value.type_name();
    let Variable::List(records) = value else {
        return Err(EvaluationError::InvalidWinners {
            details: format!("found {found}"),
        }
        .into());
    };

    records
        .iter()
        .map(|record| {
            let name = record
                .as_mapping()
                .and_then(|record| record.get("name"))
                .ok_or_else(|| EvaluationError::InvalidWinners {
                    details: format!("{record} has no name"),
                })?;
            Ok(match name {
                Variable::String(name) => name.clone(),
                other => other.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::player::player_records;
    use crate::core::{PlayerId, PLAYERS};

    fn card(value: i32) -> VariableContainer {
        [("value", value)].into_iter().collect()
    }

    fn table() -> GameState {
        let template: VariableContainer = [("hand", Variable::from(Location::collection([])))].into_iter().collect();
        let mut variables = VariableContainer::new();
        variables.insert(PLAYERS, Variable::List(player_records(&template, 2)));
        variables.insert("deck", Location::collection([card(1), card(2), card(3)]));
        variables.insert("slot", Location::empty_component());
        variables.insert("round", 1);
        GameState::new(variables)
    }

    fn collection(state: &GameState, path: &str) -> Vec<VariableContainer> {
        match state.read(&Place::dotted(path)).unwrap() {
            Variable::Location(Location::Collection(components)) => components.iter().cloned().collect(),
            other => panic!("expected collection, found {other}"),
        }
    }

    fn component(state: &GameState, path: &str) -> Option<VariableContainer> {
        match state.read(&Place::dotted(path)).unwrap() {
            Variable::Location(Location::Component(component)) => component.clone(),
            other => panic!("expected component location, found {other}"),
        }
    }

    #[test]
    fn test_set_variable() {
        let state = table();
        let next = set_variable(&state, "Round", "=round + 1").unwrap();
        assert_eq!(next.get("round"), Some(&Variable::from(2)));
        assert_eq!(state.get("round"), Some(&Variable::from(1)));

        let next = set_variable(&state, "winner", "nobody").unwrap();
        assert_eq!(next.get("winner"), Some(&Variable::from("nobody")));
    }

    #[test]
    fn test_set_variable_keeps_component_location() {
        let state = table();
        let filled = set_variable(&state, "slot", "=deck[2]").unwrap();
        assert_eq!(component(&filled, "slot"), Some(card(2)));

        let emptied = set_variable(&filled, "slot", "=null").unwrap();
        assert_eq!(component(&emptied, "slot"), None);

        assert!(set_variable(&state, "slot", "=3").is_err());
    }

    #[test]
    fn test_draw_moves_first_component() {
        let state = table().with_current_player(PlayerId::new(2)).unwrap();
        let next = move_component(&state, "=deck", Some(PickMethod::Draw), None, "=current.hand").unwrap();

        assert_eq!(collection(&next, "deck"), vec![card(2), card(3)]);
        assert_eq!(collection(&next, "current.hand"), vec![card(1)]);
        let players = next.get(PLAYERS).and_then(Variable::as_list).unwrap();
        assert_eq!(
            players[1].as_mapping().unwrap().get("hand"),
            Some(&Variable::from(Location::collection([card(1)])))
        );
    }

    #[test]
    fn test_find_with_value_and_predicate() {
        let state = table();
        let by_value = move_component(&state, "=deck", Some(PickMethod::Find), Some("=this[3]"), "=slot").unwrap();
        assert_eq!(component(&by_value, "slot"), Some(card(3)));
        assert_eq!(collection(&by_value, "deck"), vec![card(1), card(2)]);

        let by_predicate = move_component(
            &state,
            "=deck",
            Some(PickMethod::Find),
            Some("=c => c.value == 2"),
            "=slot",
        )
        .unwrap();
        assert_eq!(component(&by_predicate, "slot"), Some(card(2)));

        let err = move_component(&state, "=deck", Some(PickMethod::Find), Some("=c => c.value > 5"), "=slot")
            .unwrap_err();
        assert!(err.to_string().contains("no component in deck"));
    }

    #[test]
    fn test_collection_requires_pick_method() {
        let err = move_component(&table(), "=deck", None, None, "=slot").unwrap_err();
        assert_eq!(
            err.to_string(),
            "A pick method must be provided when moving components from a collection."
        );
    }

    #[test]
    fn test_move_round_trip_restores_state() {
        let state = table();
        let drawn = move_component(&state, "=deck", Some(PickMethod::Draw), None, "=slot").unwrap();
        let back = move_component(&drawn, "=slot", None, None, "=deck").unwrap();

        assert_eq!(component(&back, "slot"), None);
        assert_eq!(collection(&back, "deck"), vec![card(2), card(3), card(1)]);

        let one = GameState::default()
            .with_variable("pile", Location::collection([card(7)]))
            .with_variable("slot", Location::empty_component());
        let moved = move_component(&one, "pile", Some(PickMethod::Draw), None, "slot").unwrap();
        let restored = move_component(&moved, "slot", None, None, "pile").unwrap();
        assert_eq!(restored, one);
    }

    #[test]
    fn test_move_errors() {
        let state = table();
        assert!(move_component(&state, "=slot", None, None, "=deck").is_err());
        assert!(move_component(&state, "=round", None, None, "=deck").is_err());
        let err = move_component(&state, "=deck", Some(PickMethod::Draw), None, "=round").unwrap_err();
        assert!(err.to_string().contains("does not refer to a location"));

        let empty = state.with_variable("deck", Location::collection([]));
        assert!(move_component(&empty, "=deck", Some(PickMethod::Draw), None, "=slot").is_err());
    }

    #[test]
    fn test_shuffle_permutes_deterministically() {
        let deck: Vec<_> = (1..=20).map(card).collect();
        let state = GameState::default().with_variable("deck", Location::collection(deck.clone()));

        let a = shuffle(&state, "deck", &mut GameRng::new(42)).unwrap();
        let b = shuffle(&state, "deck", &mut GameRng::new(42)).unwrap();
        assert_eq!(a, b);

        let mut shuffled = collection(&a, "deck");
        assert_ne!(shuffled, deck);
        shuffled.sort_by_key(|c| c.get("value").and_then(Variable::as_number).unwrap_or(0.0) as i64);
        assert_eq!(shuffled, deck);
    }

    #[test]
    fn test_shuffle_requires_collection() {
        let err = shuffle(&table(), "slot", &mut GameRng::new(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Location of type component location is not a collection and cannot be shuffled."
        );
    }

    #[test]
    fn test_winner_names() {
        let state = table();
        assert_eq!(winner_names(&state, "=[players[2]]").unwrap(), vec!["Player 2"]);
        assert!(winner_names(&state, "=[]").unwrap().is_empty());
        assert!(winner_names(&state, "=players[1]").is_err());
        assert!(winner_names(&state, "=[1]").is_err());
    }
}
