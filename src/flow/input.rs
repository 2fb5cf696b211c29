//! Input blocks and the answer collector seam.
//!
//! ## Collecting answers
//!
//! The interpreter turns an [`InputBlock`] into an [`InputRequest`] and hands
//! it to an [`AnswerCollector`]. This is the only place where a run waits on
//! the outside world. Two collectors ship with the crate:
//!
//! - [`ScriptedCollector`] replays prepared answers (headless runs, tests).
//! - [`ChannelCollector`] forwards requests to a front-end thread over
//!   `std::sync::mpsc` and waits for the reply.
//!
//! Any `FnMut(&InputRequest) -> Result<Answers, InputError>` closure is a
//! collector too.
//!
//! ## Answers
//!
//! Answers are keyed by field name (case-insensitive). Each is checked
//! against its field kind before being merged into the state. A card answer
//! must be one of the offered choices and is stored wrapped in a component
//! location. The card is not taken out of wherever it came from.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};

use tracing::debug;

use super::block::{InputBlock, InputField};
use super::interpreter::Interpreter;
use super::signal::Outcome;
use crate::core::{GameState, Location, Variable, VariableContainer};
use crate::error::{EvaluationError, InputError, Result};
use crate::expr::{evaluate_callable, EvalOptions};

/// Answers keyed by field name.
pub type Answers = VariableContainer;

/// Everything a front end needs to ask for one form.
#[derive(Clone, Debug, PartialEq)]
pub struct InputRequest {
    pub fields: Vec<FieldDescriptor>,
    /// Name of the view rendered before asking, if any.
    pub view: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDescriptor {
    /// Lowercased field name; also the variable the answer is stored in.
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldKind {
    Boolean,
    Number,
    Card {
        options: String,
        is_option_valid: String,
        /// Options accepted by `is_option_valid`, in option order.
        choices: Vec<VariableContainer>,
    },
}

impl FieldKind {
    fn expected(&self) -> &'static str {
        match self {
            Self::Boolean => "a boolean",
            Self::Number => "a number",
            Self::Card { .. } => "one of the offered cards",
        }
    }
}

/// Source of answers for input blocks.
pub trait AnswerCollector {
    fn collect(&mut self, request: &InputRequest) -> std::result::Result<Answers, InputError>;
}

impl<F> AnswerCollector for F
where
    F: FnMut(&InputRequest) -> std::result::Result<Answers, InputError>,
{
    fn collect(&mut self, request: &InputRequest) -> std::result::Result<Answers, InputError> {
        self(request)
    }
}

/// Replays a fixed sequence of answers and records what was asked.
#[derive(Clone, Debug, Default)]
pub struct ScriptedCollector {
    answers: VecDeque<Answers>,
    requests: Vec<InputRequest>,
}

impl ScriptedCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_answers(mut self, answers: Answers) -> Self {
        self.answers.push_back(answers);
        self
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> &[InputRequest] {
        &self.requests
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl FromIterator<Answers> for ScriptedCollector {
    fn from_iter<I: IntoIterator<Item = Answers>>(iter: I) -> Self {
        Self {
            answers: iter.into_iter().collect(),
            requests: Vec::new(),
        }
    }
}

impl AnswerCollector for ScriptedCollector {
    fn collect(&mut self, request: &InputRequest) -> std::result::Result<Answers, InputError> {
        self.requests.push(request.clone());
        self.answers
            .pop_front()
            .ok_or_else(|| InputError::Collector("no scripted answers left".to_string()))
    }
}

/// Collector side of a request/reply channel.
#[derive(Debug)]
pub struct ChannelCollector {
    requests: Sender<InputRequest>,
    answers: Receiver<Answers>,
}

/// Front-end side of a request/reply channel.
#[derive(Debug)]
pub struct ChannelFrontEnd {
    requests: Receiver<InputRequest>,
    answers: Sender<Answers>,
}

impl ChannelCollector {
    /// Connected collector and front end.
    #[must_use]
    pub fn pair() -> (Self, ChannelFrontEnd) {
        let (request_tx, request_rx) = mpsc::channel();
        let (answer_tx, answer_rx) = mpsc::channel();
        (
            Self {
                requests: request_tx,
                answers: answer_rx,
            },
            ChannelFrontEnd {
                requests: request_rx,
                answers: answer_tx,
            },
        )
    }
}

impl AnswerCollector for ChannelCollector {
    fn collect(&mut self, request: &InputRequest) -> std::result::Result<Answers, InputError> {
        self.requests
            .send(request.clone())
            .map_err(|_| InputError::Collector("front end hung up".to_string()))?;
        self.answers
            .recv()
            .map_err(|_| InputError::Collector("front end hung up before answering".to_string()))
    }
}

impl ChannelFrontEnd {
    /// Wait for the next request. `None` once the collector is gone.
    #[must_use]
    pub fn next_request(&self) -> Option<InputRequest> {
        self.requests.recv().ok()
    }

    pub fn reply(&self, answers: Answers) -> std::result::Result<(), InputError> {
        self.answers
            .send(answers)
            .map_err(|_| InputError::Collector("collector hung up".to_string()))
    }
}

impl<'d> Interpreter<'d> {
    pub(super) fn execute_input(&mut self, block: &'d InputBlock, state: GameState) -> Result<Outcome> {
        let view = block.view.as_deref().or_else(|| self.enclosing_view());
        if let Some(view) = view {
            self.render_view(view, &state)?;
        }

        let request = build_request(block, &state, view)?;
        debug!(fields = request.fields.len(), "Requesting input");
        let answers = self.collector.collect(&request)?;
        let accepted = accept_answers(&request, &answers)?;
        Ok(Outcome::Continue(state.with_variables(&accepted)))
    }
}

/// Describe every field of `block` against `state`.
pub fn build_request(block: &InputBlock, state: &GameState, view: Option<&str>) -> Result<InputRequest> {
    let fields = block
        .form
        .iter()
        .map(|field| describe(field, state))
        .collect::<Result<Vec<_>>>()?;
    Ok(InputRequest {
        fields,
        view: view.map(str::to_string),
    })
}

fn describe(field: &InputField, state: &GameState) -> Result<FieldDescriptor> {
    let kind = match field {
        InputField::Boolean { .. } => FieldKind::Boolean,
        InputField::Number { .. } => FieldKind::Number,
        InputField::Card {
            name,
            options,
            is_option_valid,
            ..
        } => {
            let invalid = |details: String| EvaluationError::InvalidArgument {
                function: format!("card field {name}"),
                details,
            };
            let values = state.evaluate(options)?;
            let found = values.type_name();
            let Variable::List(values) = values else {
                return Err(invalid(format!("options must be a list, found {found}")).into());
            };
            let is_valid = evaluate_callable(is_option_valid, state.variables(), EvalOptions::default())?;

            let mut choices = Vec::new();
            for value in values {
                let found = value.type_name();
                let Variable::Mapping(card) = value else {
                    return Err(invalid(format!("options must be cards, found {found}")).into());
                };
                if is_valid.call(Variable::Mapping(card.clone()))?.is_truthy() {
                    choices.push(card);
                }
            }
            FieldKind::Card {
                options: options.clone(),
                is_option_valid: is_option_valid.clone(),
                choices,
            }
        }
    };
    Ok(FieldDescriptor {
        name: VariableContainer::normalize(field.name()),
        label: field.label().to_string(),
        kind,
    })
}

/// Check answers against the request and shape them for the state.
pub fn accept_answers(request: &InputRequest, answers: &Answers) -> std::result::Result<VariableContainer, InputError> {
    let mut accepted = VariableContainer::new();
    for field in &request.fields {
        let answer = answers.get(&field.name).ok_or_else(|| InputError::MissingAnswer {
            field: field.name.clone(),
        })?;
        let invalid = || InputError::InvalidAnswer {
            field: field.name.clone(),
            expected: field.kind.expected(),
            found: answer.to_string(),
        };

        let value = match (&field.kind, answer) {
            (FieldKind::Boolean, Variable::Bool(_)) | (FieldKind::Number, Variable::Number(_)) => answer.clone(),
            (FieldKind::Card { choices, .. }, Variable::Mapping(card))
            | (FieldKind::Card { choices, .. }, Variable::Location(Location::Component(Some(card)))) => {
                if !choices.contains(card) {
                    return Err(invalid());
                }
                Location::Component(Some(card.clone())).into()
            }
            _ => return Err(invalid()),
        };
        accepted.insert(&field.name, value);
    }
    Ok(accepted)
}
