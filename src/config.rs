//! Simulation parameters and their validation.
//!
//! Validation happens before any player is constructed; a rejected config
//! never spawns a worker or touches a board.

use std::fmt;

use serde::Serialize;

/// Input parameters for one battle: `P` players, an `N`x`N` board each,
/// `M` targets per board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BattleConfig {
    /// Number of players / worker threads (P >= 2).
    pub players: usize,
    /// Board edge length (N > 0).
    pub board_size: usize,
    /// Targets per board (0 < M <= N*N).
    pub targets: usize,
    /// Base seed for board placement and worker draw streams. `None` seeds
    /// from OS entropy.
    pub seed: Option<u64>,
}

impl BattleConfig {
    pub fn new(players: usize, board_size: usize, targets: usize) -> Self {
        Self {
            players,
            board_size,
            targets,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.players < 2 {
            return Err(ConfigError::TooFewPlayers(self.players));
        }
        if self.board_size == 0 {
            return Err(ConfigError::ZeroBoardSize);
        }
        if self.targets == 0 {
            return Err(ConfigError::ZeroTargets);
        }
        let capacity = self.board_size * self.board_size;
        if self.targets > capacity {
            return Err(ConfigError::TooManyTargets {
                targets: self.targets,
                capacity,
            });
        }
        Ok(())
    }
}

/// Rejected input parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    TooFewPlayers(usize),
    ZeroBoardSize,
    ZeroTargets,
    TooManyTargets { targets: usize, capacity: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::TooFewPlayers(players) => {
                write!(f, "P must be greater than or equal to 2 (got {players})")
            }
            ConfigError::ZeroBoardSize => write!(f, "N must be greater than 0"),
            ConfigError::ZeroTargets => write!(f, "M must be greater than 0"),
            ConfigError::TooManyTargets { targets, capacity } => write!(
                f,
                "M must be less than or equal to N² (got {targets}, board holds {capacity})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
