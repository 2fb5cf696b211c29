use tracing::info;

use super::block::ConditionBlock;
use super::interpreter::Interpreter;
use super::signal::Outcome;
use crate::core::{GameState, Variable};
use crate::error::{EvaluationError, Result};
use crate::phase::PhaseSpec;

impl<'d> Interpreter<'d> {
    /// Run the branch as an implicit Once-phase when the condition holds.
    pub(super) fn execute_condition(&mut self, block: &'d ConditionBlock, state: GameState) -> Result<Outcome> {
        match state.evaluate(&block.expression)? {
            Variable::Bool(true) => {
                info!(condition = %block.expression, "Condition is true");
                let spec = PhaseSpec::implicit(format!("When {}", block.expression), &block.when_true);
                self.run_phase(spec, state)
            }
            Variable::Bool(false) => {
                info!(condition = %block.expression, "Condition is false");
                Ok(Outcome::Continue(state))
            }
            other => Err(EvaluationError::NonBooleanCondition {
                expression: block.expression.clone(),
                type_name: other.type_name(),
            }
            .into()),
        }
    }
}
