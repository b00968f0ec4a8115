use ndarray::prelude::*;
use ndarray::Data;

use crate::distance::minkowski_distance;
use crate::error::{KnnError, Result};
use crate::types::*;

/// An immutable collection of images, one per row, with one label per image.
///
/// Used both as the reference pool that queries are compared against and as
/// the query set whose labels are the ground truth.
#[derive(Debug, Clone)]
pub struct LabeledSet {
    images: Array2<u8>,
    labels: Vec<Label>,
}

impl LabeledSet {
    pub fn new(images: Array2<u8>, labels: Vec<Label>) -> Result<Self> {
        if images.nrows() != labels.len() {
            return Err(KnnError::LengthMismatch {
                images: images.nrows(),
                labels: labels.len(),
            });
        }
        if let Some((index, &label)) = labels
            .iter()
            .enumerate()
            .find(|(_, &l)| l as usize >= NUM_LABELS)
        {
            return Err(KnnError::LabelOutOfRange { index, label });
        }
        Ok(Self { images, labels })
    }

    /// Builds a set from contiguous, header-free buffers: `images` holds
    /// `dimensions` bytes per image, back to back.
    pub fn from_raw(images: &[u8], labels: &[u8], dimensions: usize) -> Result<Self> {
        if dimensions == 0 || images.len() % dimensions != 0 {
            return Err(KnnError::RaggedBuffer {
                len: images.len(),
                dimensions,
            });
        }
        let n = images.len() / dimensions;
        let images = Array2::from_shape_vec((n, dimensions), images.to_vec())
            .map_err(|_| KnnError::RaggedBuffer {
                len: images.len(),
                dimensions,
            })?;
        Self::new(images, labels.to_vec())
    }

    /// Keeps only the first `n` items.
    pub fn truncated(&self, n: usize) -> Self {
        let n = n.min(self.num_points());
        Self {
            images: self.images.slice(s![..n, ..]).to_owned(),
            labels: self.labels[..n].to_vec(),
        }
    }

    /// compute the distance between the given query and the i-th image
    pub fn distance<S: Data<Elem = u8>>(
        &self,
        i: usize,
        query: &ArrayBase<S, Ix1>,
        order: u32,
    ) -> f64 {
        minkowski_distance(&self.images.row(i), query, order)
    }

    pub fn image(&self, i: usize) -> ArrayView1<u8> {
        self.images.row(i)
    }

    pub fn label(&self, i: usize) -> Label {
        self.labels[i]
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn num_dimensions(&self) -> usize {
        self.images.ncols()
    }

    pub fn num_points(&self) -> usize {
        self.images.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.num_points() == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_raw() {
        let images = [0u8, 0, 10, 10, 5, 5];
        let set = LabeledSet::from_raw(&images, &[0, 1, 2], 2).unwrap();
        assert_eq!(set.num_points(), 3);
        assert_eq!(set.num_dimensions(), 2);
        assert_eq!(set.image(1), array![10u8, 10]);
        assert_eq!(set.label(2), 2);
        assert_eq!(set.distance(1, &array![10u8, 10], 2), 0.0);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            LabeledSet::from_raw(&[1, 2, 3], &[0], 2),
            Err(KnnError::RaggedBuffer { len: 3, dimensions: 2 })
        ));
        assert!(matches!(
            LabeledSet::from_raw(&[1, 2, 3, 4], &[0], 2),
            Err(KnnError::LengthMismatch { images: 2, labels: 1 })
        ));
        assert!(matches!(
            LabeledSet::from_raw(&[1, 2, 3, 4], &[0, 10], 2),
            Err(KnnError::LabelOutOfRange { index: 1, label: 10 })
        ));
    }

    #[test]
    fn test_truncated() {
        let set = LabeledSet::from_raw(&[1, 2, 3, 4, 5, 6], &[7, 8, 9], 2).unwrap();
        let small = set.truncated(2);
        assert_eq!(small.num_points(), 2);
        assert_eq!(small.labels(), &[7, 8]);
        assert_eq!(small.image(1), array![3u8, 4]);
        assert_eq!(set.truncated(10).num_points(), 3);
    }
}
