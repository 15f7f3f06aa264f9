//! Interface to the solver that picks the basis coefficients ρ.
//!
//! The solver sees only the active columns of the wrench matrix and returns
//! one coefficient per active column, inside the column bounds.

use std::time::Duration;

use na::{DVector, Matrix6, Matrix6xX, Vector6};

use crate::{
    error::{Error, Result},
    matrix::WrenchMatrix,
    spatial::wrench::Wrench,
    types::Float,
};

pub mod clarabel;

pub use self::clarabel::ClarabelOptimizer;

/// One optimization problem:
///     minimize  (Q ρ - w)ᵀ C (Q ρ - w) + Σ rᵢ ρᵢ²
///     s.t.      lower ≤ ρ ≤ upper
#[derive(Clone, Debug)]
pub struct OptimizerInput {
    pub q: Matrix6xX<Float>,
    pub desired: Vector6<Float>,
    pub momentum_weight: Matrix6<Float>,
    pub regularization: DVector<Float>,
    pub lower: DVector<Float>,
    pub upper: DVector<Float>,
}

impl OptimizerInput {
    /// Take the active columns of `matrix`. `desired` must be expressed in
    /// the matrix's resultant frame.
    pub fn from_matrix(
        matrix: &WrenchMatrix,
        desired: &Wrench,
        momentum_weights: &[Float; 6],
    ) -> Result<Self> {
        if desired.frame != matrix.frame() {
            return Err(Error::FrameMismatch {
                expected: matrix.frame().to_string(),
                actual: desired.frame.clone(),
            });
        }

        let n = matrix.active_columns();
        Ok(OptimizerInput {
            q: matrix.q().columns(0, n).into_owned(),
            desired: desired.as_vector6(),
            momentum_weight: Matrix6::from_diagonal(&Vector6::from_row_slice(momentum_weights)),
            regularization: matrix.regularization().rows(0, n).into_owned(),
            lower: matrix.lower().rows(0, n).into_owned(),
            upper: matrix.upper().rows(0, n).into_owned(),
        })
    }

    pub fn size(&self) -> usize {
        self.q.ncols()
    }

    /// Clamp `rho` into the column bounds
    pub fn project(&self, rho: &mut DVector<Float>) {
        for (x, (lo, hi)) in rho.iter_mut().zip(self.lower.iter().zip(self.upper.iter())) {
            *x = x.clamp(*lo, *hi);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Convergence {
    Solved,
    /// Converged to the relaxed tolerances
    AlmostSolved,
    /// Nothing to solve for
    Empty,
}

#[derive(Clone, Debug)]
pub struct OptimizerOutput {
    pub rho: DVector<Float>,
    pub convergence: Convergence,
    pub iterations: u32,
    pub solve_time: Duration,
}

pub trait WrenchOptimizer {
    /// Solve for one coefficient per column of `input.q`. Failure to
    /// converge is reported as `Error::DidNotConverge`, never as a garbage ρ.
    fn solve(&mut self, input: &OptimizerInput) -> Result<OptimizerOutput>;
}

#[cfg(test)]
mod tests {
    use na::vector;

    use crate::{
        config::WrenchDistributionConfig,
        contact::{ContactBody, PlaneContactState},
        matrix::WrenchMatrixCalculator,
        spatial::transform::Transform3D,
    };

    use super::*;

    fn matrix() -> WrenchMatrix {
        let plane =
            PlaneContactState::rectangle(Transform3D::identity("sole", "foot"), 0.2, 0.1, 0.1, 0.3)
                .unwrap();
        let mut foot = ContactBody::new_plane(Transform3D::identity("foot", "com"), plane).unwrap();
        foot.set_load_bearing(true).unwrap();
        let config = WrenchDistributionConfig {
            column_capacity: 20,
            ..Default::default()
        };
        let mut calculator = WrenchMatrixCalculator::new("com", &config);
        calculator.compute_matrix(&[foot]).unwrap().clone()
    }

    #[test]
    fn test_input_takes_active_columns() {
        // Arrange
        let matrix = matrix();
        let desired = Wrench::from_vector6(&vector![0., 0., 0., 0., 0., 981.], "robot", "com");

        // Act
        let input = OptimizerInput::from_matrix(&matrix, &desired, &[1., 1., 1., 2., 2., 2.]).unwrap();

        // Assert
        assert_eq!(input.size(), 16);
        assert_eq!(input.regularization.len(), 16);
        assert_eq!(input.momentum_weight[(3, 3)], 2.);
        assert_eq!(input.momentum_weight[(0, 0)], 1.);
        assert_eq!(input.desired[5], 981.);
    }

    #[test]
    fn test_input_rejects_desired_in_other_frame() {
        let desired = Wrench::zero("robot", "world");
        let result = OptimizerInput::from_matrix(&matrix(), &desired, &[1.; 6]);
        assert!(matches!(result, Err(Error::FrameMismatch { .. })));
    }

    #[test]
    fn test_project() {
        let mut input =
            OptimizerInput::from_matrix(&matrix(), &Wrench::zero("robot", "com"), &[1.; 6]).unwrap();
        input.upper[1] = 2.0;
        let mut rho = DVector::from_element(16, -1.0);
        rho[1] = 5.0;

        input.project(&mut rho);

        assert_eq!(rho[0], 0.);
        assert_eq!(rho[1], 2.);
    }
}
