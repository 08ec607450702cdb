// Small demo: compares the naive and vectorized losses, gradient-checks the
// vectorized softmax, and runs one convnet forward/backward pass on random data.
//   RUST_LOG=debug cargo run
use std::error::Error;

use cs231n::gradcheck::{grad_check_sparse, rel_error};
use cs231n::{
    softmax_loss_naive, softmax_loss_vectorized, svm_loss_naive, svm_loss_vectorized,
    ConvNetSpec, Matrix, Precision, Tensor, ThreeLayerConvNet,
};
use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut rng = StdRng::seed_from_u64(231);
    let (n, d, c) = (50, 20, 10);
    let w = Matrix::randn(d, c, 1e-4, &mut rng);
    let x = Matrix::randn(n, d, 1.0, &mut rng);
    let y: Vec<usize> = (0..n).map(|_| rng.gen_range(0..c)).collect();

    let (svm_naive, svm_grad_naive) = svm_loss_naive(&w, &x, &y, 5e-6)?;
    let (svm_vec, svm_grad_vec) = svm_loss_vectorized(&w, &x, &y, 5e-6)?;
    println!("svm loss: naive {svm_naive:.6}, vectorized {svm_vec:.6}");
    println!(
        "svm gradient relative error: {:e}",
        rel_error(&Tensor::from(svm_grad_naive).data, &Tensor::from(svm_grad_vec).data)
    );

    let (sm_naive, _) = softmax_loss_naive(&w, &x, &y, 5e-6)?;
    let (sm_vec, sm_grad) = softmax_loss_vectorized(&w, &x, &y, 5e-6)?;
    println!("softmax loss: naive {sm_naive:.6}, vectorized {sm_vec:.6} (expect ~ln 10 = {:.6})", 10f64.ln());

    let mut w_check = w.clone();
    let errors = grad_check_sparse(
        |w| softmax_loss_vectorized(w, &x, &y, 5e-6).map_or(f64::NAN, |(loss, _)| loss),
        &mut w_check,
        &sm_grad,
        10,
        1e-5,
        &mut rng,
    );
    println!("softmax sparse gradient check, worst relative error: {:e}", errors.iter().cloned().fold(0.0, f64::max));

    let spec = ConvNetSpec {
        input_dim: (3, 16, 16),
        num_filters: 8,
        filter_size: 5,
        hidden_dim: 32,
        precision: Precision::F64,
        ..ConvNetSpec::default()
    };
    let net = ThreeLayerConvNet::new(spec, &mut rng)?;
    let images = Tensor::randn(&[4, 3, 16, 16], 1.0, &mut rng);
    let labels = [1, 3, 5, 7];
    let (loss, grads) = net.loss_and_grads(&images, &labels)?;
    info!("convnet produced gradients for {} parameters", grads.len());
    println!("convnet initial loss {loss:.6}");
    for (name, grad) in &grads {
        println!("  d{name}: shape {:?}", grad.shape);
    }

    Ok(())
}
