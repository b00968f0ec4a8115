//! Acquisition of the MNIST digits in IDX format.
//!
//! Files are looked up in a data directory, uncompressed first and then
//! gzipped; missing archives are downloaded. The parsed data set is cached
//! next to them with `bincode`, together with its SHA-256 digest.

use flate2::read::GzDecoder;
use lazy_static::lazy_static;
use log::{info, warn};
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const TRAIN_IMAGES: &str = "train-images-idx3-ubyte";
pub const TRAIN_LABELS: &str = "train-labels-idx1-ubyte";
pub const TEST_IMAGES: &str = "t10k-images-idx3-ubyte";
pub const TEST_LABELS: &str = "t10k-labels-idx1-ubyte";

const IMAGES_MAGIC: u32 = 0x0000_0803;
const LABELS_MAGIC: u32 = 0x0000_0801;
const IMAGES_HEADER: usize = 16;
const LABELS_HEADER: usize = 8;

const CACHE_FILE: &str = "mnist.bin";

lazy_static! {
    pub static ref DATASETS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert(
            TRAIN_IMAGES,
            "https://storage.googleapis.com/cvdf-datasets/mnist/train-images-idx3-ubyte.gz",
        );
        m.insert(
            TRAIN_LABELS,
            "https://storage.googleapis.com/cvdf-datasets/mnist/train-labels-idx1-ubyte.gz",
        );
        m.insert(
            TEST_IMAGES,
            "https://storage.googleapis.com/cvdf-datasets/mnist/t10k-images-idx3-ubyte.gz",
        );
        m.insert(
            TEST_LABELS,
            "https://storage.googleapis.com/cvdf-datasets/mnist/t10k-labels-idx1-ubyte.gz",
        );
        m
    };
}

pub type Result<T> = std::result::Result<T, DatasetError>;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("bad magic number: expected {expected:#010x}, got {actual:#010x}")]
    BadMagic { expected: u32, actual: u32 },

    #[error("truncated file: expected at least {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("cache error: {0}")]
    Cache(#[from] bincode::Error),

    #[error("unknown data file {0}")]
    UnknownFile(String),
}

/// The images of an IDX image file, one flattened image per row.
#[derive(Debug, Clone, PartialEq)]
pub struct IdxImages {
    pub rows: usize,
    pub columns: usize,
    pub pixels: Array2<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mnist {
    pub rows: usize,
    pub columns: usize,
    pub train_images: Array2<u8>,
    pub train_labels: Vec<u8>,
    pub test_images: Array2<u8>,
    pub test_labels: Vec<u8>,
}

impl Mnist {
    /// Parses the four IDX files found in (or downloaded to) `dir`.
    pub fn from_idx_dir(dir: &Path) -> Result<Self> {
        let train = parse_images(&read_idx(dir, TRAIN_IMAGES)?)?;
        let train_labels = parse_labels(&read_idx(dir, TRAIN_LABELS)?)?;
        let test = parse_images(&read_idx(dir, TEST_IMAGES)?)?;
        let test_labels = parse_labels(&read_idx(dir, TEST_LABELS)?)?;
        if (train.rows, train.columns) != (test.rows, test.columns) {
            return Err(DatasetError::InvalidFormat(format!(
                "train images are {}x{} but test images are {}x{}",
                train.rows, train.columns, test.rows, test.columns
            )));
        }
        Ok(Self {
            rows: train.rows,
            columns: train.columns,
            train_images: train.pixels,
            train_labels,
            test_images: test.pixels,
            test_labels,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.rows * self.columns
    }
}

/// Loads MNIST from `dir`, creating the directory, downloading missing
/// files and caching the parsed result as needed.
pub fn load_mnist<P: AsRef<Path>>(dir: P) -> Result<Mnist> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let cache = dir.join(CACHE_FILE);
    if let Some(mnist) = read_cache(&cache)? {
        info!("loaded MNIST from cache {}", cache.display());
        return Ok(mnist);
    }
    let mnist = Mnist::from_idx_dir(dir)?;
    write_cache(&cache, &mnist)?;
    info!("cached MNIST to {}", cache.display());
    Ok(mnist)
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32> {
    bytes
        .get(offset..offset + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(DatasetError::Truncated {
            expected: offset + 4,
            actual: bytes.len(),
        })
}

fn check_magic(bytes: &[u8], expected: u32) -> Result<()> {
    let actual = read_u32(bytes, 0)?;
    if actual != expected {
        return Err(DatasetError::BadMagic { expected, actual });
    }
    Ok(())
}

/// Parses an IDX3 image file: a 16 byte header (magic, count, rows, columns,
/// all big endian) followed by `count * rows * columns` pixels.
pub fn parse_images(bytes: &[u8]) -> Result<IdxImages> {
    check_magic(bytes, IMAGES_MAGIC)?;
    let count = read_u32(bytes, 4)? as usize;
    let rows = read_u32(bytes, 8)? as usize;
    let columns = read_u32(bytes, 12)? as usize;
    let end = count
        .checked_mul(rows)
        .and_then(|n| n.checked_mul(columns))
        .and_then(|n| n.checked_add(IMAGES_HEADER))
        .ok_or_else(|| {
            DatasetError::InvalidFormat(format!("{}x{}x{} images", count, rows, columns))
        })?;
    if bytes.len() < end {
        return Err(DatasetError::Truncated {
            expected: end,
            actual: bytes.len(),
        });
    }
    let pixels = Array2::from_shape_vec((count, rows * columns), bytes[IMAGES_HEADER..end].to_vec())
        .map_err(|e| DatasetError::InvalidFormat(e.to_string()))?;
    Ok(IdxImages {
        rows,
        columns,
        pixels,
    })
}

/// Parses an IDX1 label file: an 8 byte header (magic, count) followed by
/// one byte per label.
pub fn parse_labels(bytes: &[u8]) -> Result<Vec<u8>> {
    check_magic(bytes, LABELS_MAGIC)?;
    let count = read_u32(bytes, 4)? as usize;
    let end = LABELS_HEADER + count;
    if bytes.len() < end {
        return Err(DatasetError::Truncated {
            expected: end,
            actual: bytes.len(),
        });
    }
    Ok(bytes[LABELS_HEADER..end].to_vec())
}

/// Raw contents of the IDX file `name`, decompressing and downloading the
/// archive if the plain file is not there.
fn read_idx(dir: &Path, name: &str) -> Result<Vec<u8>> {
    let plain = dir.join(name);
    if plain.is_file() {
        return Ok(std::fs::read(plain)?);
    }
    let archive = dir.join(format!("{}.gz", name));
    if !archive.is_file() {
        let url = DATASETS
            .get(name)
            .ok_or_else(|| DatasetError::UnknownFile(name.to_owned()))?;
        download(url, &archive)?;
    }
    let mut bytes = Vec::new();
    GzDecoder::new(File::open(&archive)?).read_to_end(&mut bytes)?;
    Ok(bytes)
}

fn download(url: &str, local: &Path) -> Result<()> {
    info!("downloading {} to {}", url, local.display());
    let mut remote = ureq::get(url)
        .call()
        .map_err(|e| DatasetError::Download {
            url: url.to_owned(),
            source: Box::new(e),
        })?
        .into_reader();
    // only complete downloads get the final name
    let partial = local.with_extension("part");
    let mut local_file = BufWriter::new(File::create(&partial)?);
    std::io::copy(&mut remote, &mut local_file)?;
    local_file.flush()?;
    drop(local_file);
    std::fs::rename(&partial, local)?;
    Ok(())
}

fn digest_path(cache: &Path) -> PathBuf {
    cache.with_extension("sha256")
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn read_cache(cache: &Path) -> Result<Option<Mnist>> {
    let digest = digest_path(cache);
    if !cache.is_file() || !digest.is_file() {
        return Ok(None);
    }
    let bytes = std::fs::read(cache)?;
    let expected = std::fs::read_to_string(&digest)?;
    if sha256_hex(&bytes) != expected.trim() {
        warn!("cache {} does not match its digest, rebuilding", cache.display());
        return Ok(None);
    }
    Ok(Some(bincode::deserialize(&bytes)?))
}

fn write_cache(cache: &Path, mnist: &Mnist) -> Result<()> {
    let bytes = bincode::serialize(mnist)?;
    std::fs::write(cache, &bytes)?;
    std::fs::write(digest_path(cache), sha256_hex(&bytes))?;
    Ok(())
}
