//! Threaded last-one-standing battleship simulation.
//!
//! P worker threads each own an NxN board seeded with M hidden targets and
//! attack randomly chosen opponents until a single player survives. The
//! [battle::Coordinator] runs one simulation end to end; [parallel] runs many
//! simulations concurrently for winner statistics.

pub mod battle;
pub mod board;
pub mod cli;
pub mod config;
pub mod parallel;
pub mod player;
pub mod report;
pub mod rng;

pub use battle::Coordinator;
pub use config::{BattleConfig, ConfigError};
pub use report::BattleReport;
