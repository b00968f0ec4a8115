use std::fmt;

use log::{info, warn};
use progress_logger::ProgressLogger;

use crate::dataset::LabeledSet;
use crate::error::Result;
use crate::evaluator::{Evaluation, Evaluator};

pub const DEFAULT_KS: [usize; 5] = [8, 9, 10, 11, 12];
pub const DEFAULT_ORDERS: [u32; 3] = [2, 3, 4];

/// The `(k, order)` configurations to evaluate: every k against every order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepGrid {
    pub ks: Vec<usize>,
    pub orders: Vec<u32>,
}

impl Default for SweepGrid {
    fn default() -> Self {
        Self::new(DEFAULT_KS.to_vec(), DEFAULT_ORDERS.to_vec())
    }
}

impl SweepGrid {
    pub fn new(ks: Vec<usize>, orders: Vec<u32>) -> Self {
        Self { ks, orders }
    }

    pub fn single(k: usize, order: u32) -> Self {
        Self::new(vec![k], vec![order])
    }

    pub fn len(&self) -> usize {
        self.ks.len() * self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evaluates every configuration of the grid. A configuration that
    /// cannot be evaluated is recorded as an error and the sweep goes on.
    pub fn run(
        &self,
        evaluator: &Evaluator,
        queries: &LabeledSet,
        reference: &LabeledSet,
    ) -> SweepReport {
        let mut pl = ProgressLogger::builder()
            .with_expected_updates(self.len() as u64)
            .with_items_name("configurations")
            .start();
        let mut cells = Vec::with_capacity(self.len());
        for &k in &self.ks {
            for &order in &self.orders {
                let cell = evaluator.evaluate(queries, reference, k, order);
                match &cell {
                    Ok(e) => info!(
                        "k={} p={}: {} wrong out of {}, accuracy {:.6}",
                        k,
                        order,
                        e.counters.wrong,
                        e.counters.total,
                        e.accuracy()
                    ),
                    Err(err) => warn!("k={} p={} skipped: {}", k, order, err),
                }
                cells.push(cell);
                pl.update(1u64);
            }
        }
        pl.stop();
        SweepReport {
            grid: self.clone(),
            cells,
        }
    }
}

/// Accuracy of every configuration of a [`SweepGrid`], k by rows and order
/// by columns.
#[derive(Debug)]
pub struct SweepReport {
    grid: SweepGrid,
    /// row major
    cells: Vec<Result<Evaluation>>,
}

impl SweepReport {
    pub fn grid(&self) -> &SweepGrid {
        &self.grid
    }

    /// The outcome at row `row` (a k) and column `col` (an order), if the
    /// grid has such a cell.
    pub fn cell(&self, row: usize, col: usize) -> Option<&Result<Evaluation>> {
        let cols = self.grid.orders.len();
        if row >= self.grid.ks.len() || col >= cols {
            return None;
        }
        self.cells.get(row * cols + col)
    }

    /// Accuracy for the given configuration, if it is part of the grid and
    /// was evaluated successfully.
    pub fn accuracy(&self, k: usize, order: u32) -> Option<f64> {
        let row = self.grid.ks.iter().position(|&x| x == k)?;
        let col = self.grid.orders.iter().position(|&x| x == order)?;
        self.cell(row, col)?.as_ref().ok().map(Evaluation::accuracy)
    }

    pub fn failures(&self) -> usize {
        self.cells.iter().filter(|c| c.is_err()).count()
    }
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "       ")?;
        for p in &self.grid.orders {
            write!(f, "     p = {}", p)?;
        }
        writeln!(f)?;
        for (row, k) in self.grid.ks.iter().enumerate() {
            write!(f, "k = {:2} ", k)?;
            for col in 0..self.grid.orders.len() {
                match self.cell(row, col) {
                    Some(Ok(e)) => write!(f, "{:10.6}", e.accuracy())?,
                    _ => write!(f, "{:>10}", "n/a")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::KnnError;
    use crate::test::*;

    #[test]
    fn test_default_grid() {
        let grid = SweepGrid::default();
        assert_eq!(grid.ks, vec![8, 9, 10, 11, 12]);
        assert_eq!(grid.orders, vec![2, 3, 4]);
        assert_eq!(grid.len(), 15);
    }

    #[test]
    fn test_sweep_continues_past_failures() {
        let reference = random_labeled_set(20, 16, 21);
        let queries = reference.clone();
        let evaluator = Evaluator::with_workers(2).unwrap();
        let grid = SweepGrid::new(vec![1, 99, 3], vec![0, 2]);
        let report = grid.run(&evaluator, &queries, &reference);

        assert_eq!(report.grid(), &grid);
        assert_eq!(report.failures(), 4);
        assert!(matches!(report.cell(0, 0), Some(Err(KnnError::InvalidOrder(0)))));
        assert!(matches!(
            report.cell(1, 1),
            Some(Err(KnnError::InvalidK { k: 99, .. }))
        ));
        assert!(matches!(report.cell(2, 1), Some(Ok(_))));
        assert!(report.cell(0, 2).is_none());
        assert!(report.cell(3, 0).is_none());
        assert_eq!(report.accuracy(1, 2), Some(100.0));
        assert!(report.accuracy(3, 2).is_some());
        assert_eq!(report.accuracy(99, 2), None);
        assert_eq!(report.accuracy(5, 2), None);
    }

    #[test]
    fn test_report_table() {
        let reference = random_labeled_set(10, 8, 22);
        let queries = reference.clone();
        let evaluator = Evaluator::with_workers(3).unwrap();
        let report = SweepGrid::new(vec![1, 11], vec![1, 2]).run(&evaluator, &queries, &reference);
        let expected = "            p = 1     p = 2\n\
                        k =  1 100.000000100.000000\n\
                        k = 11        n/a       n/a\n";
        assert_eq!(report.to_string(), expected);
    }
}
