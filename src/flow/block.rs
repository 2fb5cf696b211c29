//! Flow block definitions.
//!
//! A game's flow is a tree of [`FlowBlock`]s read from the definition file.
//! Blocks are plain data; [`Interpreter`](super::Interpreter) gives them
//! meaning.
//!
//! ## JSON shape
//!
//! ```json
//! {"type": "event", "eventType": "setVariable", "variable": "round", "expression": "=round + 1"}
//! {"type": "condition", "expression": "=round > 3", "whenTrue": [ ... ]}
//! {"type": "input", "form": [{"type": "boolean", "name": "pass", "label": "Pass?"}]}
//! {"type": "phase", "phase": "turn", "repetition": "forEachPlayer"}
//! ```

use serde::{Deserialize, Serialize};

use crate::phase::Repetition;

/// One step of a game's flow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FlowBlock {
    Event(EventBlock),
    Condition(ConditionBlock),
    Input(InputBlock),
    Phase(PhaseBlock),
}

/// A single state transition or signal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "eventType", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EventBlock {
    /// Assign the value of `expression` to the dotted `variable` path.
    SetVariable { variable: String, expression: String },

    /// Take one component out of `source` and put it into `destination`.
    MoveComponent {
        source: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pick_method: Option<PickMethod>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pick_find_expression: Option<String>,
        destination: String,
    },

    /// Randomly reorder the collection stored in `stack`.
    Shuffle { stack: String },

    /// Leave the innermost explicit phase.
    EndPhase,

    /// Stop the game. `winners` evaluates to a list of player records.
    EndGame { winners: String },
}

/// How a component is taken out of a collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PickMethod {
    /// The first component.
    Draw,
    /// The component selected by `pickFindExpression`.
    Find,
}

/// Run `when_true` once when `expression` is true.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionBlock {
    pub expression: String,
    #[serde(default)]
    pub when_true: Vec<FlowBlock>,
}

/// Ask for a form of answers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputBlock {
    pub form: Vec<InputField>,
    /// View shown before asking. Falls back to the enclosing phase's view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
}

/// One field of an input form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum InputField {
    Boolean { name: String, label: String },
    Number { name: String, label: String },
    /// Choose one of the components `options` evaluates to, restricted to
    /// those accepted by the `is_option_valid` lambda.
    Card {
        name: String,
        label: String,
        options: String,
        is_option_valid: String,
    },
}

impl InputField {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Boolean { name, .. } | Self::Number { name, .. } | Self::Card { name, .. } => name,
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Boolean { label, .. } | Self::Number { label, .. } | Self::Card { label, .. } => label,
        }
    }
}

/// Run a phase: either a named definition or inline blocks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseBlock {
    /// Name of a phase definition to run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    /// Display name, used in logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Overrides the definition's repetition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repetition: Option<Repetition>,
    /// Overrides the definition's starting player.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_player: Option<String>,
    /// Inline blocks, used when no `phase` is named.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<FlowBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
}

// === Constructors ===

impl FlowBlock {
    pub fn set_variable(variable: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::Event(EventBlock::SetVariable {
            variable: variable.into(),
            expression: expression.into(),
        })
    }

    pub fn move_component(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self::Event(EventBlock::MoveComponent {
            source: source.into(),
            pick_method: None,
            pick_find_expression: None,
            destination: destination.into(),
        })
    }

    pub fn draw(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self::Event(EventBlock::MoveComponent {
            source: source.into(),
            pick_method: Some(PickMethod::Draw),
            pick_find_expression: None,
            destination: destination.into(),
        })
    }

    pub fn pick(
        source: impl Into<String>,
        find_expression: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self::Event(EventBlock::MoveComponent {
            source: source.into(),
            pick_method: Some(PickMethod::Find),
            pick_find_expression: Some(find_expression.into()),
            destination: destination.into(),
        })
    }

    pub fn shuffle(stack: impl Into<String>) -> Self {
        Self::Event(EventBlock::Shuffle { stack: stack.into() })
    }

    #[must_use]
    pub fn end_phase() -> Self {
        Self::Event(EventBlock::EndPhase)
    }

    pub fn end_game(winners: impl Into<String>) -> Self {
        Self::Event(EventBlock::EndGame { winners: winners.into() })
    }

    pub fn condition(expression: impl Into<String>, when_true: Vec<FlowBlock>) -> Self {
        Self::Condition(ConditionBlock {
            expression: expression.into(),
            when_true,
        })
    }

    #[must_use]
    pub fn input(form: Vec<InputField>) -> Self {
        Self::Input(InputBlock { form, view: None })
    }

    /// Inline phase.
    pub fn phase(name: impl Into<String>, repetition: Repetition, blocks: Vec<FlowBlock>) -> Self {
        Self::Phase(PhaseBlock {
            name: Some(name.into()),
            repetition: Some(repetition),
            blocks,
            ..PhaseBlock::default()
        })
    }

    /// Reference to a named phase definition.
    pub fn run_phase(phase: impl Into<String>) -> Self {
        Self::Phase(PhaseBlock {
            phase: Some(phase.into()),
            ..PhaseBlock::default()
        })
    }
}

impl PhaseBlock {
    #[must_use]
    pub fn with_starting_player(mut self, expression: impl Into<String>) -> Self {
        self.starting_player = Some(expression.into());
        self
    }

    #[must_use]
    pub fn with_repetition(mut self, repetition: Repetition) -> Self {
        self.repetition = Some(repetition);
        self
    }

    #[must_use]
    pub fn with_view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }
}
