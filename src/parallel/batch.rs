//! Batch execution: many independent battles in parallel, one per Rayon task.
//!
//! Each run gets its own seed split from the batch base seed, so a seeded
//! batch reproduces the same per-run board placements while runs stay
//! independent of each other. Results aggregate into a winner tally plus
//! per-run records exportable as CSV.

use std::error::Error;
use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;

use crate::battle::Coordinator;
use crate::config::{BattleConfig, ConfigError};
use crate::parallel::pool::WorkerPool;
use crate::rng::Rng;

/// One completed battle inside a batch.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub run: usize,
    pub seed: u64,
    pub winner: usize,
    pub total_attacks: usize,
    pub times_revived: usize,
    pub init_seconds: f64,
    pub battle_seconds: f64,
}

/// Aggregated batch result.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub config: BattleConfig,
    pub runs: usize,
    /// `wins_by_player[i]` == number of runs player `i` won.
    pub wins_by_player: Vec<usize>,
    pub mean_init_seconds: f64,
    pub mean_battle_seconds: f64,
    pub records: Vec<RunRecord>,
}

/// Run `runs` independent battles across the pool's workers.
///
/// Validates the config once up front; a rejected config runs nothing.
pub fn run_battle_batches(
    config: &BattleConfig,
    runs: usize,
    pool: &WorkerPool,
) -> Result<BatchSummary, ConfigError> {
    config.validate()?;
    let base_seed = config
        .seed
        .unwrap_or_else(|| Rng::from_entropy().next_u64());

    let mut records: Vec<RunRecord> = pool.install(|| {
        (0..runs)
            .into_par_iter()
            .map(|run| {
                let seed = Rng::split(base_seed, run as u64).next_u64();
                let report = Coordinator::new(config.with_seed(seed))
                    .expect("config validated above")
                    .run();
                RunRecord {
                    run,
                    seed,
                    winner: report.winner,
                    total_attacks: report.totals.attacks_launched,
                    times_revived: report.totals.times_revived,
                    init_seconds: report.timings.init_seconds,
                    battle_seconds: report.timings.battle_seconds,
                }
            })
            .collect()
    });
    records.sort_by_key(|record| record.run);

    let mut wins_by_player = vec![0_usize; config.players];
    let mut init_total = 0.0;
    let mut battle_total = 0.0;
    for record in &records {
        wins_by_player[record.winner] += 1;
        init_total += record.init_seconds;
        battle_total += record.battle_seconds;
    }
    let denom = runs.max(1) as f64;
    Ok(BatchSummary {
        config: *config,
        runs,
        wins_by_player,
        mean_init_seconds: init_total / denom,
        mean_battle_seconds: battle_total / denom,
        records,
    })
}

/// Write one CSV row per run.
pub fn write_batch_csv(path: impl AsRef<Path>, summary: &BatchSummary) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in &summary.records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
