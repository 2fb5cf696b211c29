//! Block dispatcher.
//!
//! [`Interpreter`] owns what a run needs besides the state itself: the phase
//! and view tables, the answer collector, the optional view renderer and the
//! RNG used for shuffles. States are threaded through every call by value.

use rustc_hash::FxHashMap;
use tracing::warn;

use super::block::FlowBlock;
use super::input::AnswerCollector;
use super::signal::Outcome;
use crate::core::{EngineConfig, GameRng, GameState};
use crate::error::Result;
use crate::phase::{PhaseDefinition, PhaseMachine, PhaseSpec};
use crate::views::{View, ViewRenderer};

pub struct Interpreter<'d> {
    phases: &'d FxHashMap<String, PhaseDefinition>,
    views: &'d FxHashMap<String, View>,
    pub(super) collector: &'d mut dyn AnswerCollector,
    renderer: Option<&'d mut dyn ViewRenderer>,
    pub(super) rng: GameRng,
    max_phase_iterations: Option<u64>,
    /// View of every phase being run, innermost last.
    view_stack: Vec<Option<&'d str>>,
}

impl<'d> Interpreter<'d> {
    pub fn new(
        phases: &'d FxHashMap<String, PhaseDefinition>,
        views: &'d FxHashMap<String, View>,
        collector: &'d mut dyn AnswerCollector,
    ) -> Self {
        Self {
            phases,
            views,
            collector,
            renderer: None,
            rng: GameRng::from_entropy(),
            max_phase_iterations: None,
            view_stack: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_renderer(mut self, renderer: &'d mut dyn ViewRenderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    #[must_use]
    pub fn with_rng(mut self, rng: GameRng) -> Self {
        self.rng = rng;
        self
    }

    /// Apply the RNG seed and iteration guard of a config.
    #[must_use]
    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.rng = GameRng::from_seed_option(config.seed);
        self.max_phase_iterations = config.max_phase_iterations;
        self
    }

    #[must_use]
    pub fn max_phase_iterations(&self) -> Option<u64> {
        self.max_phase_iterations
    }

    #[must_use]
    pub fn rng(&self) -> &GameRng {
        &self.rng
    }

    /// Execute one block.
    pub fn execute_block(&mut self, block: &'d FlowBlock, state: GameState) -> Result<Outcome> {
        match block {
            FlowBlock::Event(event) => self.execute_event(event, state),
            FlowBlock::Condition(condition) => self.execute_condition(condition, state),
            FlowBlock::Input(input) => self.execute_input(input, state),
            FlowBlock::Phase(phase) => {
                let spec = PhaseSpec::resolve(phase, self.phases)?;
                self.run_phase(spec, state)
            }
        }
    }

    /// Execute blocks in order, stopping at the first signal.
    pub fn execute_blocks(&mut self, blocks: &'d [FlowBlock], state: GameState) -> Result<Outcome> {
        let mut state = state;
        for block in blocks {
            match self.execute_block(block, state)? {
                Outcome::Continue(next) => state = next,
                signal => return Ok(signal),
            }
        }
        Ok(Outcome::Continue(state))
    }

    pub fn run_phase(&mut self, spec: PhaseSpec<'d>, state: GameState) -> Result<Outcome> {
        PhaseMachine::new(spec).run(self, state)
    }

    pub(crate) fn push_view(&mut self, view: Option<&'d str>) {
        self.view_stack.push(view);
    }

    pub(crate) fn pop_view(&mut self) {
        self.view_stack.pop();
    }

    /// View of the innermost phase that has one.
    pub(super) fn enclosing_view(&self) -> Option<&'d str> {
        self.view_stack.iter().rev().find_map(|view| *view)
    }

    pub(super) fn render_view(&mut self, name: &str, state: &GameState) -> Result<()> {
        let Some(renderer) = self.renderer.as_deref_mut() else {
            return Ok(());
        };
        match self.views.get(name) {
            Some(view) => renderer.render(name, view, state),
            None => {
                warn!(view = name, "View is not defined");
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for Interpreter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("phases", &self.phases.len())
            .field("views", &self.views.len())
            .field("has_renderer", &self.renderer.is_some())
            .field("rng", &self.rng)
            .field("max_phase_iterations", &self.max_phase_iterations)
            .finish()
    }
}
