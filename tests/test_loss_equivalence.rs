// Naive vs vectorized agreement for the SVM and softmax losses, plus the
// boundary behaviour both must share.

use cs231n::gradcheck::rel_error;
use cs231n::{
    softmax_loss_naive, softmax_loss_vectorized, svm_loss_naive, svm_loss_vectorized, Matrix,
    NnError,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn random_problem(seed: u64, n: usize, d: usize, c: usize) -> (Matrix, Matrix, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let w = Matrix::randn(d, c, 0.1, &mut rng);
    let x = Matrix::randn(n, d, 1.0, &mut rng);
    let y = (0..n).map(|_| rng.gen_range(0..c)).collect();
    (w, x, y)
}

fn flat(m: &Matrix) -> Vec<f64> {
    m.data.iter().flatten().copied().collect()
}

type LinearLoss = fn(&Matrix, &Matrix, &[usize], f64) -> Result<(f64, Matrix), NnError>;

const SHAPES: [(usize, usize, usize); 5] = [(1, 1, 2), (3, 5, 2), (10, 7, 3), (50, 20, 10), (17, 3, 6)];

#[test]
fn test_svm_naive_matches_vectorized() {
    for (seed, &(n, d, c)) in SHAPES.iter().enumerate() {
        let (w, x, y) = random_problem(seed as u64, n, d, c);
        for reg in [0.0, 0.05, 2.5] {
            let (loss_naive, grad_naive) = svm_loss_naive(&w, &x, &y, reg).unwrap();
            let (loss_vec, grad_vec) = svm_loss_vectorized(&w, &x, &y, reg).unwrap();
            assert!(
                rel_error(&[loss_naive], &[loss_vec]) < 1e-7,
                "loss differs for N={n} D={d} C={c}: {loss_naive} vs {loss_vec}"
            );
            assert!(rel_error(&flat(&grad_naive), &flat(&grad_vec)) < 1e-7);
        }
    }
}

#[test]
fn test_softmax_naive_matches_vectorized() {
    for (seed, &(n, d, c)) in SHAPES.iter().enumerate() {
        let (w, x, y) = random_problem(100 + seed as u64, n, d, c);
        for reg in [0.0, 0.05, 2.5] {
            let (loss_naive, grad_naive) = softmax_loss_naive(&w, &x, &y, reg).unwrap();
            let (loss_vec, grad_vec) = softmax_loss_vectorized(&w, &x, &y, reg).unwrap();
            assert!(rel_error(&[loss_naive], &[loss_vec]) < 1e-7);
            assert!(rel_error(&flat(&grad_naive), &flat(&grad_vec)) < 1e-7);
        }
    }
}

#[test]
fn test_svm_zero_when_correct_class_wins_by_margin() {
    // Every example scores 5 on its own class and 0 elsewhere, so every
    // margin is 0 - 5 + 1 < 0.
    let c = 4;
    let w = Matrix::from_fn(c, c, |i, j| if i == j { 5.0 } else { 0.0 });
    let x = Matrix::from_fn(6, c, |i, j| if j == i % c { 1.0 } else { 0.0 });
    let y: Vec<usize> = (0..6).map(|i| i % c).collect();

    for (loss, grad) in [
        svm_loss_naive(&w, &x, &y, 0.0).unwrap(),
        svm_loss_vectorized(&w, &x, &y, 0.0).unwrap(),
    ] {
        assert_eq!(loss, 0.0);
        assert!(grad.data.iter().flatten().all(|&g| g == 0.0));
    }
}

#[test]
fn test_svm_regularization_only_adds_penalty() {
    let (w, x, y) = random_problem(7, 9, 4, 3);
    let (l0, g0) = svm_loss_vectorized(&w, &x, &y, 0.0).unwrap();
    let (l1, g1) = svm_loss_vectorized(&w, &x, &y, 0.3).unwrap();
    assert!((l1 - l0 - 0.5 * 0.3 * w.sum_squares()).abs() < 1e-12);
    let expected = g0 + w.scale(0.3);
    assert!(rel_error(&flat(&g1), &flat(&expected)) < 1e-12);
}

#[test]
fn test_softmax_loss_is_non_negative_and_vanishes_with_wide_margins() {
    let (w, x, y) = random_problem(9, 20, 6, 5);
    let (loss, _) = softmax_loss_vectorized(&w, &x, &y, 0.0).unwrap();
    assert!(loss >= 0.0);

    let c = 3;
    let w = Matrix::from_fn(c, c, |i, j| if i == j { 50.0 } else { 0.0 });
    let x = Matrix::from_fn(5, c, |i, j| if j == i % c { 1.0 } else { 0.0 });
    let y: Vec<usize> = (0..5).map(|i| i % c).collect();
    let (naive, _) = softmax_loss_naive(&w, &x, &y, 0.0).unwrap();
    let (vectorized, _) = softmax_loss_vectorized(&w, &x, &y, 0.0).unwrap();
    assert!(naive >= 0.0 && naive < 1e-15);
    assert!(vectorized >= 0.0 && vectorized < 1e-15);
}

#[test]
fn test_all_variants_reject_inconsistent_inputs() {
    let (w, x, _) = random_problem(3, 4, 3, 5);
    let losses: [LinearLoss; 4] = [
        svm_loss_naive,
        svm_loss_vectorized,
        softmax_loss_naive,
        softmax_loss_vectorized,
    ];
    for loss in losses {
        assert!(matches!(loss(&w, &x, &[0, 1, 2], 0.0), Err(NnError::ShapeMismatch { .. })));
        assert!(matches!(
            loss(&w, &x, &[0, 1, 2, 5], 0.0),
            Err(NnError::LabelOutOfRange { index: 3, label: 5, num_classes: 5 })
        ));
        assert!(matches!(
            loss(&w, &Matrix::zeros(4, 2), &[0, 0, 0, 0], 0.0),
            Err(NnError::ShapeMismatch { .. })
        ));
    }
}

#[test]
fn test_all_variants_reject_ragged_matrices() {
    // Row metadata says 2 x 2, but the second row carries three values.
    let ragged = Matrix {
        rows: 2,
        cols: 2,
        data: vec![vec![1.0, 2.0], vec![1.0, 2.0, 3.0]],
    };
    let missing_row = Matrix {
        rows: 2,
        cols: 2,
        data: vec![vec![1.0, 2.0]],
    };
    let losses: [LinearLoss; 4] = [
        svm_loss_naive,
        svm_loss_vectorized,
        softmax_loss_naive,
        softmax_loss_vectorized,
    ];
    for loss in losses {
        assert!(matches!(
            loss(&Matrix::zeros(2, 3), &ragged, &[0, 1], 0.0),
            Err(NnError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            loss(&Matrix::zeros(2, 3), &missing_row, &[0, 1], 0.0),
            Err(NnError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            loss(&ragged, &Matrix::zeros(2, 2), &[0, 1], 0.0),
            Err(NnError::ShapeMismatch { .. })
        ));
    }
    assert!(Matrix::from_data(ragged.data.clone()).is_err());
}
