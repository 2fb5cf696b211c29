use crate::core::GameState;

/// What executing a block produced.
///
/// Signals travel as values: every frame that runs blocks matches on the
/// outcome and decides whether to absorb or forward it.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// Carry on with the next block.
    Continue(GameState),
    /// Leave the innermost explicit phase.
    EndPhase(GameState),
    /// Stop the whole game.
    EndGame { state: GameState, winners: Vec<String> },
}

impl Outcome {
    #[must_use]
    pub fn state(&self) -> &GameState {
        match self {
            Self::Continue(state) | Self::EndPhase(state) | Self::EndGame { state, .. } => state,
        }
    }

    #[must_use]
    pub fn into_state(self) -> GameState {
        match self {
            Self::Continue(state) | Self::EndPhase(state) | Self::EndGame { state, .. } => state,
        }
    }

    /// Same outcome with its state transformed.
    #[must_use]
    pub fn map_state(self, f: impl FnOnce(GameState) -> GameState) -> Self {
        match self {
            Self::Continue(state) => Self::Continue(f(state)),
            Self::EndPhase(state) => Self::EndPhase(f(state)),
            Self::EndGame { state, winners } => Self::EndGame { state: f(state), winners },
        }
    }

    #[must_use]
    pub fn is_signal(&self) -> bool {
        !matches!(self, Self::Continue(_))
    }
}
