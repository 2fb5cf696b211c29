//! Game state and addressable places inside it.
//!
//! ## GameState
//!
//! A [`GameState`] owns one [`VariableContainer`]. States are values: every
//! block produces a successor through one of the `with_*`/`assign`/`update`
//! methods and the predecessor is never touched. Cloning is O(1) thanks to
//! the persistent maps underneath.
//!
//! ## Place
//!
//! A [`Place`] is a resolved path into the state (`players[2].hand`). Blocks
//! that write somewhere other than a top-level variable (assignments, moves,
//! shuffles) first resolve their target to a place, then ask the state for a
//! successor with that place modified.
//!
//! ## The current player
//!
//! While a per-player phase runs, `current` holds the record of the player
//! whose turn it is. Writes through `current` land on the matching entry of
//! `players` and `current` is refreshed afterwards, so both names always see
//! the same record.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::player::PlayerId;
use super::variable::{Location, Variable, VariableContainer};
use crate::error::EvaluationError;

/// Name of the variable holding every player record.
pub const PLAYERS: &str = "players";

/// Name of the variable bound to the active player in per-player phases.
pub const CURRENT: &str = "current";

/// One step of a [`Place`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    /// Mapping key (already normalized).
    Key(String),
    /// 0-based list position.
    Index(usize),
}

/// A resolved path to a value inside a [`GameState`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Place {
    segments: SmallVec<[PathSegment; 4]>,
}

impl Place {
    /// Place of a top-level variable.
    #[must_use]
    pub fn variable(name: &str) -> Self {
        let mut segments = SmallVec::new();
        segments.push(PathSegment::Key(VariableContainer::normalize(name)));
        Self { segments }
    }

    /// Parse a dotted name such as `table.discard`.
    #[must_use]
    pub fn dotted(path: &str) -> Self {
        Self {
            segments: path
                .split('.')
                .map(|key| PathSegment::Key(VariableContainer::normalize(key.trim())))
                .collect(),
        }
    }

    /// Extend with a mapping key.
    #[must_use]
    pub fn key(mut self, key: &str) -> Self {
        self.segments.push(PathSegment::Key(VariableContainer::normalize(key)));
        self
    }

    /// Extend with a 0-based list position.
    #[must_use]
    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(PathSegment::Index(index));
        self
    }

    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    fn root(&self) -> Option<&str> {
        match self.segments.first() {
            Some(PathSegment::Key(key)) => Some(key),
            _ => None,
        }
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{key}")?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{}]", index + 1)?,
            }
        }
        Ok(())
    }
}

/// Snapshot of every game variable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameState {
    variables: VariableContainer,
}

impl GameState {
    #[must_use]
    pub fn new(variables: VariableContainer) -> Self {
        Self { variables }
    }

    #[must_use]
    pub fn variables(&self) -> &VariableContainer {
        &self.variables
    }

    #[must_use]
    pub fn into_variables(self) -> VariableContainer {
        self.variables
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn lookup(&self, name: &str) -> Result<&Variable, EvaluationError> {
        self.variables.lookup(name)
    }

    /// Successor with one top-level variable replaced.
    #[must_use]
    pub fn with_variable(&self, name: &str, value: impl Into<Variable>) -> Self {
        Self::new(self.variables.with(name, value))
    }

    /// Successor with every entry of `updates` merged in.
    #[must_use]
    pub fn with_variables(&self, updates: &VariableContainer) -> Self {
        let mut variables = self.variables.clone();
        variables.extend_from(updates);
        Self::new(variables)
    }

    /// Number of entries in `players`.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.get(PLAYERS).and_then(Variable::as_list).map_or(0, |players| players.len())
    }

    /// Record of the given player, if present.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&VariableContainer> {
        self.get(PLAYERS)
            .and_then(Variable::as_list)
            .and_then(|players| players.get(id.index()))
            .and_then(Variable::as_mapping)
    }

    /// Successor with `current` bound to the given player.
    pub fn with_current_player(&self, id: PlayerId) -> Result<Self, EvaluationError> {
        let record = self.player(id).ok_or_else(|| EvaluationError::UnknownPlayer {
            id: id.0.to_string(),
            count: self.player_count(),
        })?;
        Ok(self.with_variable(CURRENT, record.clone()))
    }

    /// Read the value at a place.
    pub fn read(&self, place: &Place) -> Result<&Variable, EvaluationError> {
        let place = self.canonical(place);
        let mut segments = place.segments.iter();
        let mut current = match segments.next() {
            Some(PathSegment::Key(key)) => self.variables.lookup(key)?,
            _ => return Err(invalid_place(&place, "a place must start with a variable name")),
        };
        for segment in segments {
            current = child(current, segment)?;
        }
        Ok(current)
    }

    /// Successor with the value at `place` replaced. Missing leaf keys are
    /// created.
    pub fn assign(&self, place: &Place, value: Variable) -> Result<Self, EvaluationError> {
        self.upsert(place, |slot| {
            *slot = value;
            Ok(())
        })
        .map(|(state, ())| state)
    }

    /// Successor with the existing value at `place` modified by `f`.
    pub fn update<T>(
        &self,
        place: &Place,
        f: impl FnOnce(&mut Variable) -> Result<T, EvaluationError>,
    ) -> Result<(Self, T), EvaluationError> {
        self.modify(place, false, f)
    }

    /// Like [`GameState::update`], creating a null leaf first when the last
    /// key is missing.
    pub fn upsert<T>(
        &self,
        place: &Place,
        f: impl FnOnce(&mut Variable) -> Result<T, EvaluationError>,
    ) -> Result<(Self, T), EvaluationError> {
        self.modify(place, true, f)
    }

    fn modify<T>(
        &self,
        place: &Place,
        create_leaf: bool,
        f: impl FnOnce(&mut Variable) -> Result<T, EvaluationError>,
    ) -> Result<(Self, T), EvaluationError> {
        let place = self.canonical(place);
        let mut variables = self.variables.clone();
        let last = place.segments.len().saturating_sub(1);

        let mut segments = place.segments.iter().enumerate();
        let mut slot = match segments.next() {
            Some((i, PathSegment::Key(key))) => entry_mut(&mut variables, key, create_leaf && i == last)?,
            _ => return Err(invalid_place(&place, "a place must start with a variable name")),
        };
        for (i, segment) in segments {
            slot = child_mut(slot, segment, create_leaf && i == last)?;
        }

        let result = f(slot)?;
        let state = Self::new(variables).sync_current();
        Ok((state, result))
    }

    /// Redirect writes through `current` to the matching `players` entry.
    fn canonical(&self, place: &Place) -> Place {
        if place.segments.len() < 2 || place.root() != Some(CURRENT) {
            return place.clone();
        }
        match self.current_index() {
            Some(index) => {
                let mut segments: SmallVec<[PathSegment; 4]> = SmallVec::new();
                segments.push(PathSegment::Key(PLAYERS.to_string()));
                segments.push(PathSegment::Index(index));
                segments.extend(place.segments[1..].iter().cloned());
                Place { segments }
            }
            None => place.clone(),
        }
    }

    /// Position in `players` of the record bound to `current`.
    fn current_index(&self) -> Option<usize> {
        let id = self.get(CURRENT)?.as_mapping()?.get("id")?.as_number()?;
        if id.fract() != 0.0 || id < 1.0 {
            return None;
        }
        let index = id as usize - 1;
        let players = self.get(PLAYERS)?.as_list()?;
        matches!(players.get(index), Some(Variable::Mapping(_))).then_some(index)
    }

    fn sync_current(self) -> Self {
        let refreshed = self
            .current_index()
            .and_then(|index| self.get(PLAYERS)?.as_list()?.get(index).cloned());
        match refreshed {
            Some(record) if self.get(CURRENT) != Some(&record) => self.with_variable(CURRENT, record),
            _ => self,
        }
    }
}

fn invalid_place(place: &Place, details: &str) -> EvaluationError {
    EvaluationError::InvalidAssignment {
        path: place.to_string(),
        details: details.to_string(),
    }
}

fn child<'v>(parent: &'v Variable, segment: &PathSegment) -> Result<&'v Variable, EvaluationError> {
    match (parent, segment) {
        (Variable::Mapping(container), PathSegment::Key(key))
        | (Variable::Location(Location::Component(Some(container))), PathSegment::Key(key)) => {
            container.lookup(key)
        }
        (Variable::List(items), PathSegment::Index(index)) => {
            items.get(*index).ok_or_else(|| EvaluationError::IndexOutOfBounds {
                index: (index + 1).to_string(),
                size: items.len(),
            })
        }
        (other, PathSegment::Key(key)) => Err(EvaluationError::NoProperties {
            type_name: other.type_name(),
            property: key.clone(),
        }),
        (other, PathSegment::Index(_)) => Err(EvaluationError::NotIndexable {
            type_name: other.type_name(),
        }),
    }
}

fn entry_mut<'v>(
    container: &'v mut VariableContainer,
    key: &str,
    create: bool,
) -> Result<&'v mut Variable, EvaluationError> {
    if create && !container.contains(key) {
        container.insert(key, Variable::Null);
    }
    container
        .get_mut(key)
        .ok_or_else(|| EvaluationError::UndefinedVariable { name: key.to_string() })
}

fn child_mut<'v>(
    parent: &'v mut Variable,
    segment: &PathSegment,
    create: bool,
) -> Result<&'v mut Variable, EvaluationError> {
    match (parent, segment) {
        (Variable::Mapping(container), PathSegment::Key(key))
        | (Variable::Location(Location::Component(Some(container))), PathSegment::Key(key)) => {
            entry_mut(container, key, create)
        }
        (Variable::List(items), PathSegment::Index(index)) => {
            let size = items.len();
            items.get_mut(*index).ok_or_else(|| EvaluationError::IndexOutOfBounds {
                index: (index + 1).to_string(),
                size,
            })
        }
        (other, PathSegment::Key(key)) => Err(EvaluationError::NoProperties {
            type_name: other.type_name(),
            property: key.clone(),
        }),
        (other, PathSegment::Index(_)) => Err(EvaluationError::NotIndexable {
            type_name: other.type_name(),
        }),
    }
}
