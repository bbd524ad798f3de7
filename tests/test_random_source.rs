//! Tests for the deterministic random source.
//!
//! Determinism is sacred: same seed, same sequence of draws.

use cost_simulator_core_rs::RandomSource;

#[test]
fn test_skewed_values_stay_in_bounds_across_seeds() {
    let triples = [
        (0.0, 1.0, 0.5),
        (0.0, 1.0, 0.1),
        (0.0, 1.0, 0.9),
        (-100.0, 100.0, 25.0),
        (5.0, 6.0, 5.2),
    ];
    for seed in [1_u64, 42, 999, 123456789] {
        for (min, max, mean) in triples {
            let mut source = RandomSource::new(seed);
            for _ in 0..2_000 {
                let value = source.skewed(min, max, mean);
                assert!(
                    (min..=max).contains(&value),
                    "seed {}: {} outside [{}, {}]",
                    seed,
                    value,
                    min,
                    max
                );
            }
        }
    }
}

#[test]
fn test_same_seed_same_sequence() {
    let mut a = RandomSource::new(42);
    let mut b = RandomSource::new(42);
    for _ in 0..1_000 {
        assert_eq!(
            a.skewed(0.0, 10.0, 4.0),
            b.skewed(0.0, 10.0, 4.0),
            "sequence diverged"
        );
    }
}

#[test]
fn test_different_seeds_different_sequences() {
    let mut a = RandomSource::new(42);
    let mut b = RandomSource::new(43);
    let draws_a: Vec<f64> = (0..10).map(|_| a.skewed(0.0, 1.0, 0.5)).collect();
    let draws_b: Vec<f64> = (0..10).map(|_| b.skewed(0.0, 1.0, 0.5)).collect();
    assert_ne!(draws_a, draws_b);
}

#[test]
fn test_empirical_mean_within_five_percent() {
    // Mean positions from the centre out to the contract band edges
    let cases = [
        (0.0, 100.0, 50.0),
        (0.0, 100.0, 10.0),
        (0.0, 100.0, 90.0),
        (0.0, 100.0, 2.0),
        (0.0, 100.0, 98.0),
        (200.0, 400.0, 260.0),
    ];
    for (min, max, mean) in cases {
        let mut source = RandomSource::new(42);
        let n = 100_000;
        let mut sum = 0.0;
        for _ in 0..n {
            sum += source.skewed(min, max, mean);
        }
        let empirical = sum / n as f64;
        assert!(
            (empirical - mean).abs() <= 0.05 * mean.abs(),
            "empirical mean {} too far from {} on [{}, {}]",
            empirical,
            mean,
            min,
            max
        );
    }
}

#[test]
fn test_interleaved_triples_are_reproducible() {
    // Each distinct argument triple owns a cached sampler; interleaving the
    // triples must still replay identically under the same seed.
    let draw = |seed: u64| -> Vec<f64> {
        let mut source = RandomSource::new(seed);
        let mut values = Vec::new();
        for _ in 0..300 {
            values.push(source.skewed(0.0, 1.0, 0.5));
            values.push(source.skewed(10.0, 30.0, 12.0));
        }
        values
    };
    assert_eq!(draw(42), draw(42));
}
