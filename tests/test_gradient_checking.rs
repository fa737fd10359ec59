// Numerical gradient checks for the loss.
// The fused softmax cross-entropy gradient (P - Y) / N must match central
// differences of the mean loss, alone and chained through a Dense layer.

use approx::assert_relative_eq;
use catnn::layers::{Dense, Layer};
use catnn::loss::{cross_entropy_loss, softmax_cross_entropy_grad};
use catnn::utils::SimpleRng;
use catnn::{ClassMap, Tensor};

fn logits(n: usize, k: usize, seed: u64, scale: f32) -> Tensor {
    let mut rng = SimpleRng::new(seed);
    let data = (0..n * k).map(|_| rng.gen_range_f32(-scale, scale)).collect();
    Tensor::new(vec![n, k], data).unwrap()
}

fn targets(indices: &[usize]) -> Tensor {
    ClassMap::cat_breeds().one_hot(indices).unwrap()
}

#[test]
fn test_fused_gradient_matches_finite_difference() {
    let eps = 1e-2f32;
    let labels = [0, 3, 4, 1];
    let y = targets(&labels);
    let z = logits(4, 5, 8, 2.0);

    let (_, probs) = cross_entropy_loss(&y, &z).unwrap();
    let grad = softmax_cross_entropy_grad(&probs, &y).unwrap();

    for i in 0..z.len() {
        let mut plus = z.clone();
        plus.data_mut()[i] += eps;
        let mut minus = z.clone();
        minus.data_mut()[i] -= eps;
        let (lp, _) = cross_entropy_loss(&y, &plus).unwrap();
        let (lm, _) = cross_entropy_loss(&y, &minus).unwrap();
        let numeric = (lp - lm) / (2.0 * eps);
        assert_relative_eq!(grad.data()[i], numeric, epsilon = 2e-3, max_relative = 2e-2);
    }
}

#[test]
fn test_fused_gradient_rows_sum_to_zero() {
    let y = targets(&[2, 2, 0]);
    let (_, probs) = cross_entropy_loss(&y, &logits(3, 5, 9, 4.0)).unwrap();
    let grad = softmax_cross_entropy_grad(&probs, &y).unwrap();
    for row in grad.data().chunks(5) {
        assert_relative_eq!(row.iter().sum::<f32>(), 0.0, epsilon = 1e-6);
    }
}

#[test]
fn test_fused_gradient_scaled_by_batch_size() {
    // duplicating every sample halves the per-row gradient
    let y1 = targets(&[1]);
    let y2 = targets(&[1, 1]);
    let z1 = logits(1, 5, 10, 1.0);
    let z2 = Tensor::new(vec![2, 5], [z1.data(), z1.data()].concat()).unwrap();

    let (l1, p1) = cross_entropy_loss(&y1, &z1).unwrap();
    let (l2, p2) = cross_entropy_loss(&y2, &z2).unwrap();
    assert_relative_eq!(l1, l2, epsilon = 1e-6);

    let g1 = softmax_cross_entropy_grad(&p1, &y1).unwrap();
    let g2 = softmax_cross_entropy_grad(&p2, &y2).unwrap();
    for j in 0..5 {
        assert_relative_eq!(g2.data()[j], g1.data()[j] / 2.0, epsilon = 1e-6);
        assert_relative_eq!(g2.data()[5 + j], g1.data()[j] / 2.0, epsilon = 1e-6);
    }
}

#[test]
fn test_dense_weight_gradient_through_loss() {
    let eps = 1e-2f32;
    let (n, inputs, k) = (3, 4, 5);
    let labels = [4, 0, 2];
    let y = targets(&labels);

    let mut rng = SimpleRng::new(31);
    let x = Tensor::new(
        vec![n, inputs],
        (0..n * inputs).map(|_| rng.gen_range_f32(-1.0, 1.0)).collect(),
    )
    .unwrap();
    let weights: Vec<f32> = (0..inputs * k).map(|_| rng.gen_range_f32(-0.5, 0.5)).collect();
    let biases: Vec<f32> = (0..k).map(|_| rng.gen_range_f32(-0.5, 0.5)).collect();

    let loss_at = |w: Vec<f32>| {
        let mut init = SimpleRng::new(0);
        let mut dense = Dense::new(inputs, k, &mut init).unwrap();
        dense.set_parameters(w, biases.clone()).unwrap();
        let z = dense.forward(&x).unwrap();
        cross_entropy_loss(&y, &z).unwrap().0
    };

    let mut init = SimpleRng::new(0);
    let mut dense = Dense::new(inputs, k, &mut init).unwrap();
    dense.set_parameters(weights.clone(), biases.clone()).unwrap();
    let z = dense.forward(&x).unwrap();
    let (_, probs) = cross_entropy_loss(&y, &z).unwrap();
    let grad = softmax_cross_entropy_grad(&probs, &y).unwrap();
    dense.backward(&grad, 1.0).unwrap();

    for i in 0..weights.len() {
        let analytic = weights[i] - dense.weights()[i];
        let mut plus = weights.clone();
        plus[i] += eps;
        let mut minus = weights.clone();
        minus[i] -= eps;
        let numeric = (loss_at(plus) - loss_at(minus)) / (2.0 * eps);
        assert_relative_eq!(analytic, numeric, epsilon = 2e-3, max_relative = 2e-2);
    }
}
