use std::cmp::Ordering;

/// A digit class, always in `0..NUM_LABELS`.
pub type Label = u8;

pub const NUM_LABELS: usize = 10;

/// An `f64` distance with a total order, so that it can be sorted and used
/// as a key in selections.
#[derive(Clone, Copy, Debug)]
pub struct DistanceF64(f64);

impl PartialEq for DistanceF64 {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for DistanceF64 {}
impl PartialOrd for DistanceF64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for DistanceF64 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}
impl From<f64> for DistanceF64 {
    fn from(value: f64) -> Self {
        Self(value)
    }
}
impl From<DistanceF64> for f64 {
    fn from(value: DistanceF64) -> Self {
        value.0
    }
}

/// Per-label vote counts among the nearest neighbors of one query.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct VoteTally {
    counts: [usize; NUM_LABELS],
}

impl VoteTally {
    pub fn vote(&mut self, label: Label) {
        self.counts[label as usize] += 1;
    }

    pub fn count(&self, label: Label) -> usize {
        self.counts[label as usize]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// The label with the most votes. Labels are scanned in ascending order
    /// and only a strictly larger count replaces the current best, so ties go
    /// to the smallest label.
    pub fn winner(&self) -> Label {
        let mut best = 0;
        for label in 1..NUM_LABELS {
            if self.counts[label] > self.counts[best] {
                best = label;
            }
        }
        best as Label
    }
}

impl FromIterator<Label> for VoteTally {
    fn from_iter<I: IntoIterator<Item = Label>>(iter: I) -> Self {
        let mut tally = Self::default();
        for label in iter {
            tally.vote(label);
        }
        tally
    }
}

/// Correctness counts for a batch of classified queries.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunCounters {
    pub wrong: usize,
    pub total: usize,
}

impl RunCounters {
    pub fn record(&mut self, predicted: Label, expected: Label) {
        self.total += 1;
        if predicted != expected {
            self.wrong += 1;
        }
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            wrong: self.wrong + other.wrong,
            total: self.total + other.total,
        }
    }
}
