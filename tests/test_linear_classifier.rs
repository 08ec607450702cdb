// Minibatch SGD training of the linear classifier.

use std::sync::atomic::AtomicBool;
use std::sync::{mpsc, Arc};

use cs231n::{LinearClassifier, LossType, Matrix, NnError, Sgd, TrainConfig};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Three well separated Gaussian blobs in 2-D plus a constant bias feature.
fn blobs(rng: &mut StdRng, per_class: usize) -> (Matrix, Vec<usize>) {
    let centers = [(4.0, 0.0), (-4.0, 4.0), (-4.0, -4.0)];
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for (label, &(cx, cy)) in centers.iter().enumerate() {
        for _ in 0..per_class {
            let dx: f64 = rng.gen_range(-1.0..1.0);
            let dy: f64 = rng.gen_range(-1.0..1.0);
            rows.push(vec![cx + dx, cy + dy, 1.0]);
            labels.push(label);
        }
    }
    (Matrix::from_data(rows).unwrap(), labels)
}

#[test]
fn test_both_losses_learn_separable_data() {
    for loss_type in [LossType::Svm, LossType::Softmax] {
        let mut rng = StdRng::seed_from_u64(21);
        let (x, y) = blobs(&mut rng, 30);
        let mut clf = LinearClassifier::new(loss_type);
        let config = TrainConfig::new(300, 32);

        let history = clf.train(&x, &y, &Sgd::new(1e-2), 1e-4, &config, &mut rng).unwrap();
        assert_eq!(history.len(), 300);

        let early: f64 = history[..10].iter().sum::<f64>() / 10.0;
        let late: f64 = history[290..].iter().sum::<f64>() / 10.0;
        assert!(late < early, "{loss_type:?}: {early} -> {late}");
        assert!(clf.accuracy(&x, &y).unwrap() > 0.95);
    }
}

#[test]
fn test_progress_channel_receives_every_iteration() {
    let mut rng = StdRng::seed_from_u64(22);
    let (x, y) = blobs(&mut rng, 5);
    let (tx, rx) = mpsc::channel();
    let config = TrainConfig {
        progress_tx: Some(tx),
        ..TrainConfig::new(7, 4)
    };

    let mut clf = LinearClassifier::new(LossType::Svm);
    let history = clf.train(&x, &y, &Sgd::new(1e-3), 0.0, &config, &mut rng).unwrap();
    drop(config);

    let stats: Vec<_> = rx.iter().collect();
    assert_eq!(stats.len(), 7);
    assert_eq!(stats.last().unwrap().iteration, 7);
    assert_eq!(stats[3].loss, history[3]);
}

#[test]
fn test_stop_flag_halts_before_first_step() {
    let mut rng = StdRng::seed_from_u64(23);
    let (x, y) = blobs(&mut rng, 5);
    let config = TrainConfig {
        stop_flag: Some(Arc::new(AtomicBool::new(true))),
        ..TrainConfig::new(50, 4)
    };

    let mut clf = LinearClassifier::new(LossType::Softmax);
    let history = clf.train(&x, &y, &Sgd::new(1e-3), 0.0, &config, &mut rng).unwrap();
    assert!(history.is_empty());
}

#[test]
fn test_rejects_zero_batch_size() {
    let mut rng = StdRng::seed_from_u64(24);
    let (x, y) = blobs(&mut rng, 2);
    let mut clf = LinearClassifier::new(LossType::Svm);
    let result = clf.train(&x, &y, &Sgd::new(1e-3), 0.0, &TrainConfig::new(5, 0), &mut rng);
    assert!(matches!(result, Err(NnError::InvalidConfig { parameter: "batch_size", .. })));
}
