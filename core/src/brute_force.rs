use ndarray::prelude::*;
use ndarray::Data;

use crate::dataset::LabeledSet;
use crate::types::*;

/// Distance records for one query: the distance to a reference image and
/// that image's index. Reused across queries to avoid reallocating.
pub type Scratch = Vec<(DistanceF64, usize)>;

pub fn allocate_scratch(reference: &LabeledSet) -> Scratch {
    Vec::with_capacity(reference.num_points())
}

/// The `k` reference images closest to `query`, sorted by increasing
/// distance. Equal distances are ordered by reference index.
///
/// `k` must be in `1..=reference.num_points()`.
pub fn brute_force_knn<'s, S>(
    reference: &LabeledSet,
    query: &ArrayBase<S, Ix1>,
    k: usize,
    order: u32,
    scratch: &'s mut Scratch,
) -> &'s [(DistanceF64, usize)]
where
    S: Data<Elem = u8>,
{
    debug_assert!(k >= 1 && k <= reference.num_points());
    scratch.clear();
    for i in 0..reference.num_points() {
        let d = reference.distance(i, query, order);
        scratch.push((d.into(), i));
    }
    if k < scratch.len() {
        scratch.select_nth_unstable(k);
        scratch.truncate(k);
    }
    scratch.sort_unstable();
    &scratch[..]
}

/// Votes of the `k` nearest neighbors of `query`.
pub fn nearest_labels<S>(
    reference: &LabeledSet,
    query: &ArrayBase<S, Ix1>,
    k: usize,
    order: u32,
    scratch: &mut Scratch,
) -> VoteTally
where
    S: Data<Elem = u8>,
{
    brute_force_knn(reference, query, k, order, scratch)
        .iter()
        .map(|&(_, i)| reference.label(i))
        .collect()
}

/// Majority label among the `k` nearest neighbors of `query`, ties going to
/// the smallest label.
pub fn predict<S>(
    reference: &LabeledSet,
    query: &ArrayBase<S, Ix1>,
    k: usize,
    order: u32,
    scratch: &mut Scratch,
) -> Label
where
    S: Data<Elem = u8>,
{
    nearest_labels(reference, query, k, order, scratch).winner()
}
