use ndarray::prelude::*;
use ndarray::Data;

/// Minkowski distance of the given `order` between two byte vectors of the
/// same length: `(sum |a_i - b_i|^order)^(1/order)`.
///
/// Order 1 is the Manhattan distance, order 2 the Euclidean one.
pub fn minkowski_distance<S1, S2>(a: &ArrayBase<S1, Ix1>, b: &ArrayBase<S2, Ix1>, order: u32) -> f64
where
    S1: Data<Elem = u8>,
    S2: Data<Elem = u8>,
{
    debug_assert_eq!(a.len(), b.len());
    debug_assert!(order >= 1);
    let exponent = i32::try_from(order).ok();
    let sum: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            // widen before subtracting, bytes would wrap around
            let diff = (x as i32 - y as i32).abs();
            match exponent {
                Some(e) => (diff as f64).powi(e),
                None => (diff as f64).powf(order as f64),
            }
        })
        .sum();
    match order {
        1 => sum,
        2 => sum.sqrt(),
        _ => sum.powf(1.0 / order as f64),
    }
}

/// Whether distances of the given `order` between `dimensions`-byte vectors
/// stay finite: the largest possible sum is `dimensions * 255^order`.
pub fn order_is_representable(order: u32, dimensions: usize) -> bool {
    (255f64.powf(order as f64) * dimensions.max(1) as f64).is_finite()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::random_images;

    #[test]
    fn test_known_values() {
        let a = array![0u8, 0];
        let b = array![3u8, 4];
        assert_eq!(minkowski_distance(&a, &b, 1), 7.0);
        assert_eq!(minkowski_distance(&a, &b, 2), 5.0);
        let d3 = minkowski_distance(&a, &b, 3);
        assert!((d3 - 91f64.cbrt()).abs() < 1e-12);

        let q = array![1u8, 1];
        assert!((minkowski_distance(&a, &q, 2) - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_no_unsigned_wraparound() {
        let a = array![0u8];
        let b = array![255u8];
        assert_eq!(minkowski_distance(&a, &b, 1), 255.0);
        assert_eq!(minkowski_distance(&b, &a, 1), 255.0);
    }

    #[test]
    fn test_identity_for_large_orders() {
        let a = array![3u8, 7];
        for order in [127, i32::MAX as u32, i32::MAX as u32 + 1, u32::MAX] {
            assert_eq!(minkowski_distance(&a, &a, order), 0.0, "order {}", order);
        }
    }

    #[test]
    fn test_representable_orders() {
        assert!(order_is_representable(1, 784));
        assert!(order_is_representable(120, 784));
        assert!(!order_is_representable(130, 784));
        assert!(!order_is_representable(u32::MAX, 784));
    }

    #[test]
    fn test_symmetry_and_identity() {
        let data = random_images(20, 784, 1234);
        for order in 1..=4 {
            for i in 0..data.nrows() {
                let a = data.row(i);
                assert_eq!(minkowski_distance(&a, &a, order), 0.0);
                for j in (i + 1)..data.nrows() {
                    let b = data.row(j);
                    let d_ab = minkowski_distance(&a, &b, order);
                    assert!(d_ab > 0.0);
                    assert_eq!(d_ab, minkowski_distance(&b, &a, order));
                }
            }
        }
    }

    #[test]
    fn test_triangle_inequality() {
        let data = random_images(15, 64, 4321);
        for order in [1, 2] {
            for i in 0..data.nrows() {
                for j in 0..data.nrows() {
                    for k in 0..data.nrows() {
                        let (a, b, c) = (data.row(i), data.row(j), data.row(k));
                        let d_ac = minkowski_distance(&a, &c, order);
                        let d_ab = minkowski_distance(&a, &b, order);
                        let d_bc = minkowski_distance(&b, &c, order);
                        assert!(
                            d_ac <= d_ab + d_bc + 1e-9,
                            "order {}: {} > {} + {}",
                            order,
                            d_ac,
                            d_ab,
                            d_bc
                        );
                    }
                }
            }
        }
    }
}
