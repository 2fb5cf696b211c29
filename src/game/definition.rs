//! Game definitions.
//!
//! A [`GameDefinition`] is the whole game as data: starting variables, the
//! template every player record is built from, the supported player counts,
//! named phases and views, and the main flow. It deserializes from the
//! camelCase JSON definition format.
//!
//! Where definitions come from is up to the embedding application; anything
//! that can produce one implements [`DefinitionSource`].

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{PlayerCountRange, Variable, VariableContainer};
use crate::error::Result;
use crate::flow::FlowBlock;
use crate::phase::PhaseDefinition;
use crate::views::View;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDefinition {
    #[serde(default)]
    pub global_variables: VariableContainer,
    /// Template copied into every player record.
    #[serde(default)]
    pub player_variables: VariableContainer,
    #[serde(default)]
    pub player_count: PlayerCountRange,
    #[serde(default)]
    pub phases: FxHashMap<String, PhaseDefinition>,
    #[serde(default)]
    pub views: FxHashMap<String, View>,
    pub flow: Vec<FlowBlock>,
}

impl GameDefinition {
    #[must_use]
    pub fn new(flow: Vec<FlowBlock>) -> Self {
        Self {
            flow,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_global(mut self, name: &str, value: impl Into<Variable>) -> Self {
        self.global_variables.insert(name, value);
        self
    }

    #[must_use]
    pub fn with_player_variable(mut self, name: &str, value: impl Into<Variable>) -> Self {
        self.player_variables.insert(name, value);
        self
    }

    #[must_use]
    pub fn with_player_count(mut self, min: usize, max: usize) -> Self {
        self.player_count = PlayerCountRange::new(min, max);
        self
    }

    #[must_use]
    pub fn with_phase(mut self, name: impl Into<String>, phase: PhaseDefinition) -> Self {
        self.phases.insert(name.into(), phase);
        self
    }

    #[must_use]
    pub fn with_view(mut self, name: impl Into<String>, view: View) -> Self {
        self.views.insert(name.into(), view);
        self
    }
}

/// Anything that can supply a game definition.
pub trait DefinitionSource {
    fn load(&self) -> Result<GameDefinition>;
}

impl DefinitionSource for GameDefinition {
    fn load(&self) -> Result<GameDefinition> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Location;
    use crate::phase::Repetition;

    #[test]
    fn test_deserialize_definition() {
        let json = r#"{
            "globalVariables": {"Deck": {"collection": [{"Suit": "hearts", "Value": 1}]}, "Round": 0},
            "playerVariables": {"Hand": {"collection": []}, "Score": 0},
            "playerCount": {"min": 2, "max": 4},
            "phases": {
                "turn": {"repetition": "forEachPlayer", "view": "table", "blocks": [
                    {"type": "event", "eventType": "endPhase"}
                ]}
            },
            "views": {"table": [{"label": "Round", "expression": "=round"}]},
            "flow": [{"type": "phase", "phase": "turn"}]
        }"#;
        let definition: GameDefinition = serde_json::from_str(json).unwrap();

        assert_eq!(definition.player_count, PlayerCountRange::new(2, 4));
        assert_eq!(
            definition.global_variables.get("deck"),
            Some(&Variable::from(Location::collection([[("suit", Variable::from("hearts")), ("value", Variable::from(1))]
                .into_iter()
                .collect::<VariableContainer>()])))
        );
        assert!(definition.player_variables.get("hand").unwrap().is_collection_location());
        assert_eq!(definition.phases["turn"].repetition, Some(Repetition::ForEachPlayer));
        assert_eq!(definition.views["table"].elements().len(), 1);
        assert_eq!(definition.flow, vec![FlowBlock::run_phase("turn")]);
    }

    #[test]
    fn test_missing_sections_default() {
        let definition: GameDefinition = serde_json::from_str(r#"{"flow": []}"#).unwrap();
        assert_eq!(definition, GameDefinition::new(vec![]));
        assert_eq!(definition.load().unwrap(), definition);
    }
}
