//! Distance metric used for nearest-neighbour ranking.
//!
//! The index ranks by squared Euclidean (L2) distance, smallest first.
//! Squaring preserves the order of true L2 distance and skips the root.

/// Squared Euclidean distance between two equal-length vectors.
///
/// Returns `None` when the lengths differ.
pub fn squared_l2(a: &[f32], b: &[f32]) -> Option<f32> {
    (a.len() == b.len()).then(|| {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn identical_vectors_are_zero() {
        let v = [0.1, 0.1, 0.1];
        assert!(approx_eq(squared_l2(&v, &v).unwrap(), 0.0));
    }

    #[test]
    fn known_distance() {
        let a = [0.0, 0.0];
        let b = [3.0, 4.0];
        assert!(approx_eq(squared_l2(&a, &b).unwrap(), 25.0));
    }

    #[test]
    fn length_mismatch_is_none() {
        assert!(squared_l2(&[1.0], &[1.0, 2.0]).is_none());
    }

    #[test]
    fn empty_vectors_are_zero() {
        assert!(approx_eq(squared_l2(&[], &[]).unwrap(), 0.0));
    }
}
