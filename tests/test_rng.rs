// Tests for RNG reproducibility and distribution.

use catnn::utils::SimpleRng;

#[test]
fn test_same_seed_same_stream() {
    let mut a = SimpleRng::new(2024);
    let mut b = SimpleRng::new(2024);
    for _ in 0..1000 {
        assert_eq!(a.next_f32(), b.next_f32());
    }
}

#[test]
fn test_different_seeds_differ() {
    let mut a = SimpleRng::new(1);
    let mut b = SimpleRng::new(2);
    let xs: Vec<u32> = (0..16).map(|_| a.next_u32()).collect();
    let ys: Vec<u32> = (0..16).map(|_| b.next_u32()).collect();
    assert_ne!(xs, ys);
}

#[test]
fn test_uniform_mean_and_spread() {
    let mut rng = SimpleRng::new(99);
    let n = 20_000;
    let samples: Vec<f32> = (0..n).map(|_| rng.next_f32()).collect();
    let mean = samples.iter().sum::<f32>() / n as f32;
    assert!((mean - 0.5).abs() < 0.02, "mean {}", mean);

    // every tenth of [0, 1) gets roughly its share
    let mut buckets = [0usize; 10];
    for &s in &samples {
        buckets[(s * 10.0) as usize] += 1;
    }
    for count in buckets {
        assert!((1600..2400).contains(&count), "bucket count {}", count);
    }
}

#[test]
fn test_range_bounds() {
    let mut rng = SimpleRng::new(5);
    for _ in 0..1000 {
        let v = rng.gen_range_f32(-0.25, 0.75);
        assert!((-0.25..0.75).contains(&v));
    }
}

#[test]
fn test_fork_is_deterministic() {
    let mut p1 = SimpleRng::new(3);
    let mut p2 = SimpleRng::new(3);
    let mut c1 = p1.fork();
    let mut c2 = p2.fork();
    for _ in 0..32 {
        assert_eq!(c1.next_u32(), c2.next_u32());
    }
    assert_eq!(p1.next_u32(), p2.next_u32());
}
