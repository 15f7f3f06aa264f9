use na::{Matrix2, Vector2};

use crate::types::Float;

/// 2-D cross product (z component of the 3-D cross product)
pub fn cross2(a: &Vector2<Float>, b: &Vector2<Float>) -> Float {
    Matrix2::from_columns(&[*a, *b]).determinant()
}

#[macro_export]
macro_rules! assert_close {
    ($left:expr, $right:expr, $tolerance:expr) => {
        let left = $left;
        let right = $right;
        let tol = $tolerance;
        let diff = (left - right).abs();
        if diff > tol {
            panic!(
                "assertion failed: {} ~= {} \
                (tolerance: {}, difference: {})",
                left, right, tol, diff
            );
        }
    };
}

#[macro_export]
macro_rules! assert_vec_close {
    ($left:expr, $right:expr, $tolerance:expr) => {
        let left = $left;
        let right = $right;
        let tol = $tolerance;
        for (a, b) in left.iter().zip(right.iter()) {
            $crate::assert_close!(a, b, tol);
        }
    };
}


#[cfg(test)]
mod tests {
    use na::vector;

    use super::*;

    #[test]
    fn test_cross2() {
        assert_close!(cross2(&vector![1., 0.], &vector![0., 1.]), 1.0, 1e-12);
        assert_close!(cross2(&vector![0., 1.], &vector![1., 0.]), -1.0, 1e-12);
        assert_close!(cross2(&vector![2., 2.], &vector![1., 1.]), 0.0, 1e-12);
    }
}
