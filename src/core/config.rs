//! Engine configuration.
//!
//! A game definition says *what* to run; [`EngineConfig`] says *how* to run
//! it: which seed drives shuffles, how many players sit at the table and
//! whether runaway phase loops are cut off.

use serde::{Deserialize, Serialize};

/// Per-run engine settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Seed for shuffles. `None` draws a fresh seed per run.
    pub seed: Option<u64>,

    /// Number of players. `None` uses the definition's minimum.
    pub player_count: Option<usize>,

    /// Maximum number of passes any single phase loop may make.
    ///
    /// `None` leaves loops unbounded; a `Forever` phase then only ends
    /// through a signal.
    pub max_phase_iterations: Option<u64>,
}

impl EngineConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the player count.
    #[must_use]
    pub fn with_player_count(mut self, player_count: usize) -> Self {
        self.player_count = Some(player_count);
        self
    }

    /// Bound every phase loop.
    #[must_use]
    pub fn with_max_phase_iterations(mut self, limit: u64) -> Self {
        self.max_phase_iterations = Some(limit);
        self
    }
}
