//! Views: labeled expressions shown to players before they answer.
//!
//! A game defines named views in its `views` table; phases and input blocks
//! refer to them by name. Rendering is delegated to a [`ViewRenderer`] so
//! front ends can draw views however they like. [`LogViewRenderer`] writes
//! them to the log and [`RecordingViewRenderer`] keeps them for inspection.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::{GameState, Variable};
use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewElement {
    pub label: String,
    pub expression: String,
}

impl ViewElement {
    pub fn new(label: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            expression: expression.into(),
        }
    }
}

/// Ordered list of labeled expressions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct View {
    elements: Vec<ViewElement>,
}

impl View {
    #[must_use]
    pub fn new(elements: Vec<ViewElement>) -> Self {
        Self { elements }
    }

    #[must_use]
    pub fn elements(&self) -> &[ViewElement] {
        &self.elements
    }

    /// Evaluate every element against `state`, in order.
    pub fn evaluate<'v>(&'v self, state: &GameState) -> Result<Vec<(&'v str, Variable)>> {
        self.elements
            .iter()
            .map(|element| Ok((element.label.as_str(), state.evaluate(&element.expression)?)))
            .collect()
    }
}

impl FromIterator<ViewElement> for View {
    fn from_iter<I: IntoIterator<Item = ViewElement>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Presents views to players.
pub trait ViewRenderer {
    fn render(&mut self, name: &str, view: &View, state: &GameState) -> Result<()>;
}

/// Writes each element of a view to the `tracing` log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogViewRenderer;

impl ViewRenderer for LogViewRenderer {
    fn render(&mut self, name: &str, view: &View, state: &GameState) -> Result<()> {
        for (label, value) in view.evaluate(state)? {
            info!(view = name, "{label}: {value}");
        }
        Ok(())
    }
}

/// Keeps every rendered view, evaluated, in render order.
#[derive(Clone, Debug, Default)]
pub struct RecordingViewRenderer {
    rendered: Vec<(String, Vec<(String, Variable)>)>,
}

impl RecordingViewRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `(view name, [(label, value)])` for every render so far.
    #[must_use]
    pub fn rendered(&self) -> &[(String, Vec<(String, Variable)>)] {
        &self.rendered
    }
}

impl ViewRenderer for RecordingViewRenderer {
    fn render(&mut self, name: &str, view: &View, state: &GameState) -> Result<()> {
        let values = view
            .evaluate(state)?
            .into_iter()
            .map(|(label, value)| (label.to_string(), value))
            .collect();
        self.rendered.push((name.to_string(), values));
        Ok(())
    }
}
