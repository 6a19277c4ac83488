pub mod batch;
pub mod pool;

pub use batch::{run_battle_batches, write_batch_csv, BatchSummary, RunRecord};
pub use pool::WorkerPool;
