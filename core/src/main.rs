use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;

use knn_core::sweep::{DEFAULT_KS, DEFAULT_ORDERS};
use knn_core::{Evaluator, LabeledSet, RemainderPolicy, SweepGrid};

/// Accuracy of brute-force k-NN on MNIST for a grid of neighbor counts (k)
/// and Minkowski orders (p).
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Number of neighbors for a single configuration
    #[arg(requires = "p", conflicts_with_all = ["ks", "ps"])]
    k: Option<usize>,

    /// Minkowski order for a single configuration
    #[arg(requires = "k")]
    p: Option<u32>,

    /// Neighbor counts of the grid
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_KS)]
    ks: Vec<usize>,

    /// Minkowski orders of the grid
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_ORDERS)]
    ps: Vec<u32>,

    /// Worker threads, one per hardware thread by default
    #[arg(long)]
    threads: Option<usize>,

    /// Leave out the queries that do not split evenly across workers
    #[arg(long)]
    truncate_remainder: bool,

    /// Use only the first N training images
    #[arg(long, value_name = "N")]
    train_limit: Option<usize>,

    /// Use only the first N test images
    #[arg(long, value_name = "N")]
    test_limit: Option<usize>,

    /// Where the IDX files are looked up, downloaded and cached
    #[arg(long, default_value = ".mnist")]
    data_dir: PathBuf,
}

impl Args {
    fn grid(&self) -> SweepGrid {
        match (self.k, self.p) {
            (Some(k), Some(p)) => SweepGrid::single(k, p),
            _ => SweepGrid::new(self.ks.clone(), self.ps.clone()),
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mnist = datasets::load_mnist(&args.data_dir)
        .with_context(|| format!("loading MNIST from {}", args.data_dir.display()))?;
    let dimensions = mnist.dimensions();
    let mut reference = LabeledSet::new(mnist.train_images, mnist.train_labels)
        .context("invalid training set")?;
    let mut queries =
        LabeledSet::new(mnist.test_images, mnist.test_labels).context("invalid test set")?;
    if let Some(n) = args.train_limit {
        reference = reference.truncated(n);
    }
    if let Some(n) = args.test_limit {
        queries = queries.truncated(n);
    }

    let evaluator = match args.threads {
        Some(n) => Evaluator::with_workers(n),
        None => Evaluator::new(),
    }?;
    let evaluator = evaluator.with_remainder_policy(if args.truncate_remainder {
        RemainderPolicy::Truncate
    } else {
        RemainderPolicy::Distribute
    });
    info!(
        "{} workers, {}-byte images, remainder policy {:?}",
        evaluator.workers(),
        dimensions,
        evaluator.remainder_policy()
    );

    println!("number_of_train_images: {}", reference.num_points());
    println!("number_of_test_images: {}", queries.num_points());

    let report = args.grid().run(&evaluator, &queries, &reference);
    print!("{}", report);
    Ok(())
}
