//! Phase definitions and their resolution into runnable phases.
//!
//! A game names its reusable phases in a `phases` table. A
//! [`PhaseBlock`] either refers to one of them, optionally overriding the
//! repetition and starting player, or carries its blocks inline.
//! [`PhaseSpec::resolve`] turns either form into the single shape the
//! [`PhaseMachine`](super::PhaseMachine) runs.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::flow::{FlowBlock, PhaseBlock};

/// How often a phase runs its blocks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Repetition {
    /// A single pass.
    #[default]
    Once,
    /// Until a signal leaves the phase.
    Forever,
    /// One pass per player, binding `current` to each in turn.
    ForEachPlayer,
}

/// Named, reusable phase.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repetition: Option<Repetition>,
    /// Expression yielding a player id or player record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_player: Option<String>,
    #[serde(default)]
    pub blocks: Vec<FlowBlock>,
    /// View rendered before input blocks inside this phase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
}

impl PhaseDefinition {
    #[must_use]
    pub fn new(blocks: Vec<FlowBlock>) -> Self {
        Self {
            blocks,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_repetition(mut self, repetition: Repetition) -> Self {
        self.repetition = Some(repetition);
        self
    }

    #[must_use]
    pub fn with_starting_player(mut self, expression: impl Into<String>) -> Self {
        self.starting_player = Some(expression.into());
        self
    }

    #[must_use]
    pub fn with_view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }
}

/// A phase ready to run: everything resolved except the starting player,
/// which depends on the state at entry.
#[derive(Clone, Debug, PartialEq)]
pub struct PhaseSpec<'d> {
    pub name: String,
    pub repetition: Repetition,
    pub starting_player: Option<&'d str>,
    pub blocks: &'d [FlowBlock],
    pub view: Option<&'d str>,
    /// Implicit phases (condition branches, the main flow) forward
    /// End-Phase to their parent instead of absorbing it.
    pub implicit: bool,
}

impl<'d> PhaseSpec<'d> {
    /// Transient Once-phase wrapping a block sequence.
    #[must_use]
    pub fn implicit(name: impl Into<String>, blocks: &'d [FlowBlock]) -> Self {
        Self {
            name: name.into(),
            repetition: Repetition::Once,
            starting_player: None,
            blocks,
            view: None,
            implicit: true,
        }
    }

    /// Resolve a phase block against the definition table.
    ///
    /// Block settings win over the definition's, and repetition defaults to
    /// [`Repetition::Once`].
    pub fn resolve(block: &'d PhaseBlock, phases: &'d FxHashMap<String, PhaseDefinition>) -> Result<Self> {
        let Some(reference) = block.phase.as_deref() else {
            return Ok(Self {
                name: block.name.clone().unwrap_or_else(|| "Unnamed phase".to_string()),
                repetition: block.repetition.unwrap_or_default(),
                starting_player: block.starting_player.as_deref(),
                blocks: &block.blocks,
                view: block.view.as_deref(),
                implicit: false,
            });
        };

        let definition = phases.get(reference).ok_or_else(|| EngineError::UnknownPhase {
            name: reference.to_string(),
        })?;
        Ok(Self {
            name: block.name.clone().unwrap_or_else(|| reference.to_string()),
            repetition: block.repetition.or(definition.repetition).unwrap_or_default(),
            starting_player: block
                .starting_player
                .as_deref()
                .or(definition.starting_player.as_deref()),
            blocks: &definition.blocks,
            view: block.view.as_deref().or(definition.view.as_deref()),
            implicit: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phases() -> FxHashMap<String, PhaseDefinition> {
        let mut phases = FxHashMap::default();
        phases.insert(
            "turn".to_string(),
            PhaseDefinition::new(vec![FlowBlock::end_phase()])
                .with_repetition(Repetition::ForEachPlayer)
                .with_starting_player("=2")
                .with_view("table"),
        );
        phases.insert("setup".to_string(), PhaseDefinition::new(vec![]));
        phases
    }

    #[test]
    fn test_repetition_serde_names() {
        let repetitions: Vec<Repetition> = serde_json::from_str(r#"["once", "forever", "forEachPlayer"]"#).unwrap();
        assert_eq!(
            repetitions,
            vec![Repetition::Once, Repetition::Forever, Repetition::ForEachPlayer]
        );
    }

    #[test]
    fn test_resolve_named_phase() {
        let phases = phases();
        let block = PhaseBlock {
            phase: Some("turn".to_string()),
            ..PhaseBlock::default()
        };
        let spec = PhaseSpec::resolve(&block, &phases).unwrap();

        assert_eq!(spec.name, "turn");
        assert_eq!(spec.repetition, Repetition::ForEachPlayer);
        assert_eq!(spec.starting_player, Some("=2"));
        assert_eq!(spec.view, Some("table"));
        assert_eq!(spec.blocks.len(), 1);
        assert!(!spec.implicit);
    }

    #[test]
    fn test_block_overrides_definition() {
        let phases = phases();
        let block = PhaseBlock {
            phase: Some("turn".to_string()),
            ..PhaseBlock::default()
        }
        .with_repetition(Repetition::Forever)
        .with_starting_player("=players[1]");
        let spec = PhaseSpec::resolve(&block, &phases).unwrap();

        assert_eq!(spec.repetition, Repetition::Forever);
        assert_eq!(spec.starting_player, Some("=players[1]"));
    }

    #[test]
    fn test_repetition_defaults_to_once() {
        let phases = phases();
        let block = PhaseBlock {
            phase: Some("setup".to_string()),
            ..PhaseBlock::default()
        };
        assert_eq!(PhaseSpec::resolve(&block, &phases).unwrap().repetition, Repetition::Once);
    }

    #[test]
    fn test_unknown_phase() {
        let block = PhaseBlock {
            phase: Some("missing".to_string()),
            ..PhaseBlock::default()
        };
        let err = PhaseSpec::resolve(&block, &phases()).unwrap_err();
        assert_eq!(err.to_string(), "phase missing is not defined.");
    }
}
