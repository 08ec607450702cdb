use std::sync::mpsc;
use std::sync::{Arc, atomic::AtomicBool};
use crate::train::iter_stats::IterationStats;

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `num_iters`   — number of SGD steps
/// - `batch_size`  — examples sampled (with replacement) per step
/// - `print_every` — log the loss at `info` level every this many steps;
///                   `0` disables the periodic log line
/// - `progress_tx` — optional channel sender; one `IterationStats` is sent per
///                   step.  If the receiver is dropped the loop terminates
///                   early.
/// - `stop_flag`   — optional atomic flag; when set to `true` from another
///                   thread the loop terminates before the next step.
pub struct TrainConfig {
    pub num_iters: usize,
    pub batch_size: usize,
    pub print_every: usize,
    pub progress_tx: Option<mpsc::Sender<IterationStats>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl TrainConfig {
    /// Creates a minimal `TrainConfig` with no progress channel and no stop flag.
    pub fn new(num_iters: usize, batch_size: usize) -> Self {
        TrainConfig {
            num_iters,
            batch_size,
            print_every: 100,
            progress_tx: None,
            stop_flag: None,
        }
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig::new(100, 200)
    }
}
