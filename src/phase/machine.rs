//! The phase loop.
//!
//! ## Lifecycle
//!
//! ```text
//! NotStarted --run--> Looping --strategy exhausted--> Terminated(Normal)
//!                        |
//!                        +--End-Phase / End-Game----> Terminated(Signal)
//! ```
//!
//! Every pass starts with the strategy's `on_loop_start` hook, then runs the
//! phase's blocks in order, threading the state. `currentindex` counts passes
//! from 1. It is scoped to the phase: when a nested phase (including a
//! condition branch) finishes, the enclosing phase's counter is restored.
//!
//! ## Signals
//!
//! An explicit phase absorbs End-Phase and finishes with the signal's state.
//! Implicit phases (condition branches, the main flow) forward it so it
//! reaches the nearest explicit phase. End-Game always propagates.

use std::collections::VecDeque;

use tracing::info;

use super::definition::{PhaseSpec, Repetition};
use crate::core::player::turn_order;
use crate::core::{GameState, PlayerId};
use crate::error::{EngineError, Result};
use crate::flow::{Interpreter, Outcome};

/// Variable holding the 1-based pass counter of the innermost phase.
pub const CURRENT_INDEX: &str = "currentindex";

/// Why a phase stopped looping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// The strategy ran out of passes.
    Normal,
    /// A signal ended the loop.
    Signal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseStatus {
    NotStarted,
    Looping,
    Terminated(Termination),
}

/// Decides whether another pass runs and prepares each pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoopStrategy {
    Once { has_looped: bool },
    Forever,
    ForEachPlayer { remaining: VecDeque<PlayerId> },
}

impl LoopStrategy {
    #[must_use]
    pub fn new(repetition: Repetition) -> Self {
        match repetition {
            Repetition::Once => Self::Once { has_looped: false },
            Repetition::Forever => Self::Forever,
            Repetition::ForEachPlayer => Self::ForEachPlayer {
                remaining: VecDeque::new(),
            },
        }
    }

    /// Called once when the phase starts. Per-player phases compute the turn
    /// order here from the starting-player expression.
    pub fn before_loop(&mut self, state: &GameState, starting_player: Option<&str>) -> Result<()> {
        if let Self::ForEachPlayer { remaining } = self {
            let player_count = state.player_count();
            let starting = match starting_player {
                Some(expression) => Some(PlayerId::from_variable(&state.evaluate(expression)?, player_count)?),
                None => None,
            };
            *remaining = turn_order(player_count, starting);
        }
        Ok(())
    }

    #[must_use]
    pub fn should_execute(&self) -> bool {
        match self {
            Self::Once { has_looped } => !has_looped,
            Self::Forever => true,
            Self::ForEachPlayer { remaining } => !remaining.is_empty(),
        }
    }

    /// Called at the start of every pass.
    pub fn on_loop_start(&mut self, state: GameState) -> Result<GameState> {
        match self {
            Self::Once { has_looped } => {
                *has_looped = true;
                Ok(state)
            }
            Self::Forever => Ok(state),
            Self::ForEachPlayer { remaining } => {
                let Some(id) = remaining.pop_front() else {
                    return Ok(state);
                };
                let state = state.with_current_player(id)?;
                let name = state
                    .player(id)
                    .and_then(|record| record.get("name"))
                    .and_then(|name| name.as_str().map(str::to_string))
                    .unwrap_or_else(|| id.to_string());
                info!(player = id.0, "Current player is now {name}");
                Ok(state)
            }
        }
    }
}

/// Runs one phase to completion.
#[derive(Debug)]
pub struct PhaseMachine<'d> {
    spec: PhaseSpec<'d>,
    strategy: LoopStrategy,
    status: PhaseStatus,
    passes: u64,
}

impl<'d> PhaseMachine<'d> {
    #[must_use]
    pub fn new(spec: PhaseSpec<'d>) -> Self {
        let strategy = LoopStrategy::new(spec.repetition);
        Self {
            spec,
            strategy,
            status: PhaseStatus::NotStarted,
            passes: 0,
        }
    }

    #[must_use]
    pub fn status(&self) -> PhaseStatus {
        self.status
    }

    /// Number of passes started so far.
    #[must_use]
    pub fn passes(&self) -> u64 {
        self.passes
    }

    #[must_use]
    pub fn spec(&self) -> &PhaseSpec<'d> {
        &self.spec
    }

    /// Run the loop, returning the outcome the parent should see.
    pub fn run(&mut self, interpreter: &mut Interpreter<'d>, state: GameState) -> Result<Outcome> {
        info!(phase = %self.spec.name, "Beginning new phase");
        let outer_index = state.get(CURRENT_INDEX).cloned();
        interpreter.push_view(self.spec.view);
        let outcome = self.run_loop(interpreter, state);
        interpreter.pop_view();
        info!(phase = %self.spec.name, "End of phase");

        Ok(match outer_index {
            Some(index) => outcome?.map_state(|state| state.with_variable(CURRENT_INDEX, index)),
            None => outcome?,
        })
    }

    fn run_loop(&mut self, interpreter: &mut Interpreter<'d>, state: GameState) -> Result<Outcome> {
        self.strategy.before_loop(&state, self.spec.starting_player)?;
        self.status = PhaseStatus::Looping;

        let mut current_index: usize = 1;
        let mut state = state.with_variable(CURRENT_INDEX, current_index);
        while self.strategy.should_execute() {
            if let Some(limit) = interpreter.max_phase_iterations() {
                if self.passes >= limit {
                    return Err(EngineError::IterationLimit {
                        phase: self.spec.name.clone(),
                        limit,
                    });
                }
            }
            self.passes += 1;

            state = self.strategy.on_loop_start(state)?;
            match interpreter.execute_blocks(self.spec.blocks, state)? {
                Outcome::Continue(next) => state = next,
                Outcome::EndPhase(next) if !self.spec.implicit => {
                    self.status = PhaseStatus::Terminated(Termination::Signal);
                    return Ok(Outcome::Continue(next));
                }
                signal => {
                    self.status = PhaseStatus::Terminated(Termination::Signal);
                    return Ok(signal);
                }
            }

            current_index += 1;
            state = state.with_variable(CURRENT_INDEX, current_index);
        }

        self.status = PhaseStatus::Terminated(Termination::Normal);
        Ok(Outcome::Continue(state))
    }
}
