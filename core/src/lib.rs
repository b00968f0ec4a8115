//! Brute-force k-nearest-neighbor classification of fixed-size byte images
//! under Minkowski distances, with a parallel evaluator and a sweep over
//! `(k, p)` configurations.

pub mod brute_force;
pub mod dataset;
pub mod distance;
pub mod error;
pub mod evaluator;
pub mod sweep;
pub mod types;

pub use dataset::LabeledSet;
pub use error::{KnnError, Result};
pub use evaluator::{Evaluation, Evaluator, RemainderPolicy};
pub use sweep::{SweepGrid, SweepReport};

#[cfg(test)]
pub mod test {
    use crate::dataset::LabeledSet;
    use crate::types::*;
    use ndarray::prelude::*;
    use ndarray_rand::rand::prelude::*;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;

    pub fn random_images(n: usize, dimensions: usize, seed: u64) -> Array2<u8> {
        let mut rng = StdRng::seed_from_u64(seed);
        Array2::random_using((n, dimensions), Uniform::new_inclusive(0u8, 255), &mut rng)
    }

    pub fn random_labeled_set(n: usize, dimensions: usize, seed: u64) -> LabeledSet {
        let images = random_images(n, dimensions, seed);
        let mut rng = StdRng::seed_from_u64(seed ^ 0xdead_beef);
        let labels = (0..n)
            .map(|_| rng.gen_range(0..NUM_LABELS as Label))
            .collect();
        LabeledSet::new(images, labels).unwrap()
    }
}
