//! Running a whole game.
//!
//! [`Game`] builds the initial state from a definition and runs the main
//! flow as an implicit Once-phase. The run ends when the flow runs out or
//! an End-Game signal reaches the top.

use tracing::info;

use super::definition::{DefinitionSource, GameDefinition};
use crate::core::player::player_records;
use crate::core::{EngineConfig, GameRngState, GameState, Variable, PLAYERS};
use crate::error::Result;
use crate::flow::{AnswerCollector, Interpreter, Outcome};
use crate::phase::PhaseSpec;
use crate::views::ViewRenderer;

/// How a run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameResult {
    /// End-Game named these players.
    Winners(Vec<String>),
    /// End-Game with an empty winner list.
    NoWinners,
    /// The flow ran out without an End-Game.
    Incomplete,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GameReport {
    pub result: GameResult,
    /// State at the moment the run ended.
    pub state: GameState,
    /// Shuffle RNG position at the end of the run.
    pub rng: GameRngState,
}

/// A game ready to run.
#[derive(Clone, Debug)]
pub struct Game {
    definition: GameDefinition,
    config: EngineConfig,
    player_count: usize,
    initial_state: GameState,
}

impl Game {
    /// Validate the player count and build the initial state: the global
    /// variables plus a `players` list built from the player template.
    pub fn new(definition: GameDefinition, config: EngineConfig) -> Result<Self> {
        let player_count = definition.player_count.resolve(config.player_count)?;

        let mut variables = definition.global_variables.clone();
        variables.insert(
            PLAYERS,
            Variable::List(player_records(&definition.player_variables, player_count)),
        );

        Ok(Self {
            initial_state: GameState::new(variables),
            definition,
            config,
            player_count,
        })
    }

    pub fn from_source(source: &dyn DefinitionSource, config: EngineConfig) -> Result<Self> {
        Self::new(source.load()?, config)
    }

    #[must_use]
    pub fn definition(&self) -> &GameDefinition {
        &self.definition
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.player_count
    }

    #[must_use]
    pub fn initial_state(&self) -> &GameState {
        &self.initial_state
    }

    /// Run the game without rendering views.
    pub fn run<'a>(&'a self, collector: &'a mut dyn AnswerCollector) -> Result<GameReport> {
        self.execute(collector, None)
    }

    /// Run the game, rendering views before every input.
    pub fn run_with_renderer<'a>(
        &'a self,
        collector: &'a mut dyn AnswerCollector,
        renderer: &'a mut dyn ViewRenderer,
    ) -> Result<GameReport> {
        self.execute(collector, Some(renderer))
    }

    fn execute<'a>(
        &'a self,
        collector: &'a mut dyn AnswerCollector,
        renderer: Option<&'a mut dyn ViewRenderer>,
    ) -> Result<GameReport> {
        info!(players = self.player_count, "Initializing game");
        let mut interpreter =
            Interpreter::new(&self.definition.phases, &self.definition.views, collector).with_config(&self.config);
        if let Some(renderer) = renderer {
            interpreter = interpreter.with_renderer(renderer);
        }

        let spec = PhaseSpec::implicit("Game", &self.definition.flow);
        let outcome = interpreter.run_phase(spec, self.initial_state.clone())?;
        let rng = interpreter.rng().state();
        let report = match outcome {
            Outcome::EndGame { state, winners } => {
                if winners.is_empty() {
                    info!("End of game. Winners are: The Game");
                    GameReport {
                        result: GameResult::NoWinners,
                        state,
                        rng,
                    }
                } else {
                    info!("End of game. Winners are: {}", winners.join(", "));
                    GameReport {
                        result: GameResult::Winners(winners),
                        state,
                        rng,
                    }
                }
            }
            Outcome::Continue(state) | Outcome::EndPhase(state) => {
                info!("Flow finished without a winner");
                GameReport {
                    result: GameResult::Incomplete,
                    state,
                    rng,
                }
            }
        };
        Ok(report)
    }
}
