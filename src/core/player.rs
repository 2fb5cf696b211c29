//! Player identification, player records and turn rotation.
//!
//! ## PlayerId
//!
//! Players are numbered from 1, matching the `id` field every player record
//! carries in game state.
//!
//! ## Player records
//!
//! At start-up the `players` variable is a list of mappings built from the
//! definition's player template plus an `id` and a display `name`.
//!
//! ## Rotation
//!
//! [`shift`] rotates a sequence left; [`turn_order`] uses it to start a
//! round at an arbitrary player.

use std::collections::VecDeque;

use im::Vector;
use serde::{Deserialize, Serialize};

use super::variable::{Variable, VariableContainer};
use crate::error::{EngineError, EvaluationError};

/// 1-based player identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl PlayerId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Position of this player in the `players` list (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        (self.0 as usize).saturating_sub(1)
    }

    /// Iterate over all player IDs for a game with `player_count` players.
    ///
    /// ```
    /// use rust_tabletop::core::PlayerId;
    ///
    /// let players: Vec<_> = PlayerId::all(3).collect();
    /// assert_eq!(players, vec![PlayerId::new(1), PlayerId::new(2), PlayerId::new(3)]);
    /// ```
    pub fn all(player_count: usize) -> impl Iterator<Item = PlayerId> {
        (1..=player_count as u32).map(PlayerId)
    }

    /// Interpret a starting-player value: either a player id number or a
    /// player record carrying an `id`.
    pub fn from_variable(value: &Variable, player_count: usize) -> Result<Self, EvaluationError> {
        let id = match value {
            Variable::Number(n) => *n,
            Variable::Mapping(record) => match record.get("id") {
                Some(Variable::Number(n)) => *n,
                _ => {
                    return Err(EvaluationError::InvalidStartingPlayer {
                        type_name: value.type_name(),
                    })
                }
            },
            other => {
                return Err(EvaluationError::InvalidStartingPlayer {
                    type_name: other.type_name(),
                })
            }
        };

        if id.fract() != 0.0 || id < 1.0 || id > player_count as f64 {
            return Err(EvaluationError::UnknownPlayer {
                id: super::variable::format_number(id),
                count: player_count,
            });
        }
        Ok(Self(id as u32))
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player {}", self.0)
    }
}

/// Inclusive range of supported player counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerCountRange {
    pub min: usize,
    pub max: usize,
}

impl PlayerCountRange {
    #[must_use]
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn contains(&self, count: usize) -> bool {
        (self.min..=self.max).contains(&count)
    }

    /// Pick the player count for a run: the requested one when given, the
    /// minimum otherwise.
    pub fn resolve(&self, requested: Option<usize>) -> Result<usize, EngineError> {
        let count = requested.unwrap_or(self.min);
        if count == 0 || !self.contains(count) {
            return Err(EngineError::PlayerCount {
                requested: count,
                min: self.min,
                max: self.max,
            });
        }
        Ok(count)
    }
}

impl Default for PlayerCountRange {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// Build the `players` list: one copy of `template` per player with `id`
/// and `name` filled in.
#[must_use]
pub fn player_records(template: &VariableContainer, player_count: usize) -> Vector<Variable> {
    PlayerId::all(player_count)
        .map(|id| {
            let mut record = template.clone();
            record.insert("id", Variable::Number(f64::from(id.0)));
            record.insert("name", Variable::String(id.to_string()));
            Variable::Mapping(record)
        })
        .collect()
}

/// Rotate left: the first `n mod len` items move to the end. Negative `n`
/// rotates right.
///
/// ```
/// use rust_tabletop::core::player::shift;
///
/// assert_eq!(shift(&[1, 2, 3, 4], 1), vec![2, 3, 4, 1]);
/// assert_eq!(shift(&[1, 2, 3, 4], -1), vec![4, 1, 2, 3]);
/// ```
#[must_use]
pub fn shift<T: Clone>(items: &[T], n: i64) -> Vec<T> {
    if items.is_empty() {
        return Vec::new();
    }
    let len = items.len() as i64;
    let split = n.rem_euclid(len) as usize;
    let mut rotated = Vec::with_capacity(items.len());
    rotated.extend_from_slice(&items[split..]);
    rotated.extend_from_slice(&items[..split]);
    rotated
}

/// Player order for one round, starting at `starting` (or player 1).
#[must_use]
pub fn turn_order(player_count: usize, starting: Option<PlayerId>) -> VecDeque<PlayerId> {
    let ids: Vec<PlayerId> = PlayerId::all(player_count).collect();
    let offset = starting.map_or(0, |id| i64::from(id.0) - 1);
    shift(&ids, offset).into()
}
