//! Parallel classification of a query set against a reference set.
//!
//! The query set is split into one contiguous range per worker. Each range is
//! spawned as its own task on a pool of exactly that many threads and
//! classified with private counters; the counters are summed once every task
//! has returned.

use std::ops::Range;

use log::{debug, warn};
use crate::brute_force::{allocate_scratch, predict};
use crate::dataset::LabeledSet;
use crate::distance::order_is_representable;
use crate::error::{KnnError, Result};
use crate::types::RunCounters;

/// What to do with the `n % workers` queries left over by an even split.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RemainderPolicy {
    /// Give one leftover query to each of the first workers.
    #[default]
    Distribute,
    /// Leave the leftover queries out of the evaluation.
    Truncate,
}

/// Splits `0..n` into `workers` contiguous, non-overlapping ranges of
/// `n / workers` items each, in order. The remainder is handled according to
/// `policy`.
pub fn partition(n: usize, workers: usize, policy: RemainderPolicy) -> Vec<Range<usize>> {
    if workers == 0 {
        return Vec::new();
    }
    let load = n / workers;
    let extra = match policy {
        RemainderPolicy::Distribute => n % workers,
        RemainderPolicy::Truncate => 0,
    };
    let mut start = 0;
    (0..workers)
        .map(|w| {
            let len = load + usize::from(w < extra);
            let range = start..start + len;
            start += len;
            range
        })
        .collect()
}

/// Outcome of evaluating one `(k, order)` configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub k: usize,
    pub order: u32,
    pub counters: RunCounters,
}

impl Evaluation {
    /// Percentage of correctly classified queries. `total` is never zero for
    /// an evaluation returned by [`Evaluator::evaluate`].
    pub fn accuracy(&self) -> f64 {
        100.0 - 100.0 * self.counters.wrong as f64 / self.counters.total as f64
    }
}

pub struct Evaluator {
    pool: rayon::ThreadPool,
    workers: usize,
    policy: RemainderPolicy,
}

impl Evaluator {
    /// An evaluator with one worker per hardware thread.
    pub fn new() -> Result<Self> {
        let workers = match std::thread::available_parallelism() {
            Ok(n) => n.get(),
            Err(e) => {
                warn!("cannot detect hardware concurrency ({}), using one worker", e);
                1
            }
        };
        Self::with_workers(workers)
    }

    pub fn with_workers(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(KnnError::NoWorkers);
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("knn-worker-{}", i))
            .build()?;
        Ok(Self {
            pool,
            workers,
            policy: RemainderPolicy::default(),
        })
    }

    pub fn with_remainder_policy(mut self, policy: RemainderPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn remainder_policy(&self) -> RemainderPolicy {
        self.policy
    }

    /// Classifies every query assigned to a worker and counts the mistakes.
    pub fn evaluate(
        &self,
        queries: &LabeledSet,
        reference: &LabeledSet,
        k: usize,
        order: u32,
    ) -> Result<Evaluation> {
        let partials = self.evaluate_partitions(queries, reference, k, order)?;
        let counters = partials
            .into_iter()
            .fold(RunCounters::default(), RunCounters::merge);
        debug_assert!(counters.wrong <= counters.total);
        Ok(Evaluation { k, order, counters })
    }

    /// Counters of each worker, in partition order. Every range of
    /// [`partition`] is spawned as exactly one task.
    pub fn evaluate_partitions(
        &self,
        queries: &LabeledSet,
        reference: &LabeledSet,
        k: usize,
        order: u32,
    ) -> Result<Vec<RunCounters>> {
        validate(queries, reference, k, order)?;

        let n = queries.num_points();
        let ranges = partition(n, self.workers, self.policy);
        let assigned: usize = ranges.iter().map(|r| r.len()).sum();
        if assigned == 0 {
            return Err(KnnError::EmptyPartition {
                queries: n,
                workers: self.workers,
            });
        }
        if assigned < n {
            warn!(
                "{} trailing queries are left out of the evaluation",
                n - assigned
            );
        }

        let mut partials = vec![RunCounters::default(); ranges.len()];
        self.pool.scope(|s| {
            for (range, slot) in ranges.into_iter().zip(partials.iter_mut()) {
                s.spawn(move |_| *slot = evaluate_range(queries, reference, range, k, order));
            }
        });
        Ok(partials)
    }
}

fn validate(queries: &LabeledSet, reference: &LabeledSet, k: usize, order: u32) -> Result<()> {
    if order == 0 || !order_is_representable(order, reference.num_dimensions()) {
        return Err(KnnError::InvalidOrder(order));
    }
    if reference.is_empty() {
        return Err(KnnError::EmptyReferenceSet);
    }
    if queries.is_empty() {
        return Err(KnnError::EmptyQuerySet);
    }
    if k == 0 || k > reference.num_points() {
        return Err(KnnError::invalid_k(k, reference.num_points()));
    }
    if queries.num_dimensions() != reference.num_dimensions() {
        return Err(KnnError::dimension_mismatch(
            reference.num_dimensions(),
            queries.num_dimensions(),
        ));
    }
    Ok(())
}

fn evaluate_range(
    queries: &LabeledSet,
    reference: &LabeledSet,
    range: Range<usize>,
    k: usize,
    order: u32,
) -> RunCounters {
    debug!(
        "worker {:?} classifying queries {:?}",
        rayon::current_thread_index(),
        range
    );
    let mut scratch = allocate_scratch(reference);
    let mut counters = RunCounters::default();
    for i in range {
        let predicted = predict(reference, &queries.image(i), k, order, &mut scratch);
        counters.record(predicted, queries.label(i));
    }
    counters
}
