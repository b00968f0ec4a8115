use knn_core::brute_force::{allocate_scratch, predict};
use knn_core::distance::minkowski_distance;
use knn_core::{Evaluator, LabeledSet};
use ndarray::prelude::*;
use ndarray_rand::rand::prelude::*;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

fn main() {
    divan::main()
}

fn random_set(n: usize, seed: u64) -> LabeledSet {
    let mut rng = StdRng::seed_from_u64(seed);
    let images = Array2::random_using((n, 784), Uniform::new_inclusive(0u8, 255), &mut rng);
    let labels = (0..n).map(|_| rng.gen_range(0..10u8)).collect();
    LabeledSet::new(images, labels).unwrap()
}

#[divan::bench(args = [1, 2, 3, 4])]
fn bench_minkowski_distance(bencher: divan::Bencher, order: u32) {
    let data = random_set(2, 1234);
    let (a, b) = (data.image(0), data.image(1));
    bencher.bench_local(|| minkowski_distance(&a, &b, order));
}

#[divan::bench(args = [1, 10, 100])]
fn bench_predict(bencher: divan::Bencher, k: usize) {
    let reference = random_set(10_000, 1);
    let queries = random_set(1, 2);
    bencher
        .with_inputs(|| allocate_scratch(&reference))
        .bench_local_refs(|scratch| predict(&reference, &queries.image(0), k, 2, scratch));
}

#[divan::bench]
fn bench_evaluate(bencher: divan::Bencher) {
    let reference = random_set(2_000, 3);
    let queries = random_set(64, 4);
    let evaluator = Evaluator::new().unwrap();
    bencher.bench_local(|| evaluator.evaluate(&queries, &reference, 10, 2).unwrap());
}
