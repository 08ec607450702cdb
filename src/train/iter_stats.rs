use serde::{Serialize, Deserialize};

/// Per-iteration statistics emitted by `train_loop`.
///
/// When a `progress_tx` channel is configured in `TrainConfig`, the training
/// loop sends one `IterationStats` value after every SGD step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationStats {
    /// 1-based iteration number.
    pub iteration: usize,
    /// Total iterations requested for this run.
    pub total_iterations: usize,
    /// Regularized minibatch loss before the update.
    pub loss: f64,
    /// Wall-clock time since the run started, in milliseconds.
    pub elapsed_ms: u64,
}
