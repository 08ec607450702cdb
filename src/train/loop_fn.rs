use std::sync::atomic::Ordering;
use std::time::Instant;

use log::{debug, info};
use rand::Rng;

use crate::error::{check_labels, NnError, Result};
use crate::linear::classifier::LinearClassifier;
use crate::math::matrix::Matrix;
use crate::optim::sgd::Sgd;
use crate::train::iter_stats::IterationStats;
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `classifier` with minibatch SGD and returns the loss of every
/// completed iteration.
///
/// # Arguments
/// - `classifier` — modified in place; its weights are initialised to
///                  `0.001 * N(0, 1)` of shape (D, max(y) + 1) if unset
/// - `x`          — training data, N x D
/// - `y`          — N labels
/// - `optimizer`  — SGD optimizer (carries learning rate)
/// - `reg`        — L2 regularization strength
/// - `config`     — iterations, batch size, optional progress channel and stop flag
/// - `rng`        — drives weight init and minibatch sampling
///
/// # Early termination
/// The loop breaks early if:
/// - the `progress_tx` receiver has been dropped, **or**
/// - `config.stop_flag` is set to `true`.
pub fn train_loop<R: Rng + ?Sized>(
    classifier: &mut LinearClassifier,
    x: &Matrix,
    y: &[usize],
    optimizer: &Sgd,
    reg: f64,
    config: &TrainConfig,
    rng: &mut R,
) -> Result<Vec<f64>> {
    x.check_layout("train_loop")?;
    if x.rows == 0 {
        return Err(NnError::EmptyBatch { context: "train_loop" });
    }
    if y.len() != x.rows {
        return Err(NnError::ShapeMismatch {
            context: "train_loop",
            expected: vec![x.rows],
            got: vec![y.len()],
        });
    }
    if config.batch_size == 0 {
        return Err(NnError::InvalidConfig {
            parameter: "batch_size",
            reason: "must be at least 1".to_string(),
        });
    }

    let loss_type = classifier.loss_type;
    let num_classes = y.iter().copied().max().unwrap_or(0) + 1;
    let w = classifier
        .w
        .get_or_insert_with(|| Matrix::randn(x.cols, num_classes, 0.001, rng));
    check_labels(y, w.cols)?;

    let t_start = Instant::now();
    let mut loss_history = Vec::with_capacity(config.num_iters);

    for iteration in 1..=config.num_iters {
        if let Some(ref flag) = config.stop_flag {
            if flag.load(Ordering::Relaxed) {
                debug!("stop flag set; halting after {} iterations", iteration - 1);
                break;
            }
        }

        let (x_batch, y_batch) = sample_batch(x, y, config.batch_size, rng);
        let (loss, grad) = loss_type.evaluate(w, &x_batch, &y_batch, reg)?;
        optimizer.step_matrix(w, &grad);
        loss_history.push(loss);

        if config.print_every > 0 && iteration % config.print_every == 0 {
            info!("iteration {iteration} / {}: loss {loss:.6}", config.num_iters);
        }

        let stats = IterationStats {
            iteration,
            total_iterations: config.num_iters,
            loss,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };

        if let Some(ref tx) = config.progress_tx {
            // If the receiver has been dropped, stop training.
            if tx.send(stats).is_err() {
                break;
            }
        }
    }

    Ok(loss_history)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Draws `batch_size` examples uniformly with replacement.
fn sample_batch<R: Rng + ?Sized>(
    x: &Matrix,
    y: &[usize],
    batch_size: usize,
    rng: &mut R,
) -> (Matrix, Vec<usize>) {
    let indices: Vec<usize> = (0..batch_size).map(|_| rng.gen_range(0..x.rows)).collect();
    let x_batch = Matrix {
        rows: batch_size,
        cols: x.cols,
        data: indices.iter().map(|&i| x.data[i].clone()).collect(),
    };
    let y_batch = indices.iter().map(|&i| y[i]).collect();
    (x_batch, y_batch)
}
