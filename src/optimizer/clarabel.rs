use std::time::{Duration, Instant};

use ::clarabel::{
    algebra::CscMatrix,
    solver::{
        DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus,
        SupportedConeT::{self, NonnegativeConeT, ZeroConeT},
    },
};
use na::{DMatrix, DVector};

use crate::{
    config::SolverConfig,
    error::{Error, Result},
    optimizer::{Convergence, OptimizerInput, OptimizerOutput, WrenchOptimizer},
    types::Float,
};

/// Solves the distribution problem as a convex QP with the Clarabel
/// interior point solver.
///
/// Clarabel minimizes ½ xᵀPx + qᵀx subject to Ax + s = b, s ∈ K. The wrench
/// error gets its own variables e = Q ρ - w, so with x = [ρ; e]
///     P = 2 diag(r, C),  q = 0
/// and the objective value is the full cost, wᵀCw included, so the duality
/// gap is measured on the scale of the regularization.
///
/// The first six rows of A are [Q -I] x = w. Each bound adds one row:
/// -ρᵢ + s = -lowerᵢ, ρᵢ + s = upperᵢ. Columns whose bounds coincide are
/// pinned with an equality row instead.
pub struct ClarabelOptimizer {
    settings: SolverConfig,
}

impl ClarabelOptimizer {
    pub fn new(settings: &SolverConfig) -> Self {
        ClarabelOptimizer {
            settings: settings.clone(),
        }
    }
}

impl Default for ClarabelOptimizer {
    fn default() -> Self {
        ClarabelOptimizer::new(&SolverConfig::default())
    }
}

impl WrenchOptimizer for ClarabelOptimizer {
    fn solve(&mut self, input: &OptimizerInput) -> Result<OptimizerOutput> {
        let n = input.size();
        if n == 0 {
            return Ok(OptimizerOutput {
                rho: DVector::zeros(0),
                convergence: Convergence::Empty,
                iterations: 0,
                solve_time: Duration::ZERO,
            });
        }

        let start = Instant::now();

        let mut P = DMatrix::<Float>::zeros(n + 6, n + 6);
        for i in 0..n {
            P[(i, i)] = 2. * input.regularization[i];
        }
        P.view_mut((n, n), (6, 6))
            .copy_from(&input.momentum_weight.scale(2.));
        let q = vec![0.; n + 6];

        let (A, b, cones) = constraints(input);

        let settings = DefaultSettingsBuilder::default()
            .max_iter(self.settings.max_iter)
            .verbose(false)
            .tol_feas(self.settings.tolerance)
            .tol_gap_abs(self.settings.tolerance)
            .tol_gap_rel(self.settings.tolerance)
            .build()
            .map_err(|e| Error::SolverSetup(e.to_string()))?;

        let P = dmatrix_to_csc_upper_tri(&P);
        let A = dmatrix_to_csc(&A);
        let b: Vec<Float> = b.iter().copied().collect();

        let mut solver = DefaultSolver::new(&P, &q, &A, &b, &cones, settings)
            .map_err(|e| Error::SolverSetup(format!("{e:?}")))?;
        solver.solve();

        let solution = &solver.solution;
        let convergence = match &solution.status {
            SolverStatus::Solved => Convergence::Solved,
            SolverStatus::AlmostSolved => Convergence::AlmostSolved,
            status => {
                tracing::warn!(?status, iterations = solution.iterations, "wrench QP failed");
                return Err(Error::DidNotConverge {
                    status: format!("{status:?}"),
                });
            }
        };

        let mut rho = DVector::from_column_slice(&solution.x[..n]);
        input.project(&mut rho);

        Ok(OptimizerOutput {
            rho,
            convergence,
            iterations: solution.iterations,
            solve_time: start.elapsed(),
        })
    }
}

/// Rows of A and b over x = [ρ; e], with the cones they fall in. The wrench
/// error rows and the pinned columns come first, in the zero cone.
fn constraints(
    input: &OptimizerInput,
) -> (DMatrix<Float>, DVector<Float>, Vec<SupportedConeT<Float>>) {
    let n = input.size();
    let mut pinned: Vec<(usize, Float, Float)> = vec![];
    let mut bounds: Vec<(usize, Float, Float)> = vec![];
    for i in 0..n {
        let (lower, upper) = (input.lower[i], input.upper[i]);
        if lower == upper {
            pinned.push((i, 1., lower));
            continue;
        }
        if lower.is_finite() {
            bounds.push((i, -1., -lower));
        }
        if upper.is_finite() {
            bounds.push((i, 1., upper));
        }
    }

    let n_eq = 6 + pinned.len();
    let mut A = DMatrix::zeros(n_eq + bounds.len(), n + 6);
    let mut b = DVector::zeros(n_eq + bounds.len());
    A.view_mut((0, 0), (6, n)).copy_from(&input.q);
    for i in 0..6 {
        A[(i, n + i)] = -1.;
    }
    b.rows_mut(0, 6).copy_from(&input.desired);
    for (row, (col, coefficient, bound)) in pinned.iter().chain(bounds.iter()).enumerate() {
        A[(6 + row, *col)] = *coefficient;
        b[6 + row] = *bound;
    }

    let mut cones = vec![ZeroConeT(n_eq)];
    if !bounds.is_empty() {
        cones.push(NonnegativeConeT(bounds.len()));
    }
    (A, b, cones)
}

fn dmatrix_to_csc(m: &DMatrix<Float>) -> CscMatrix<Float> {
    let (nrows, ncols) = m.shape();
    let mut colptr = vec![0usize; ncols + 1];
    let mut rowval = vec![];
    let mut nzval = vec![];

    for j in 0..ncols {
        for i in 0..nrows {
            let v = m[(i, j)];
            if v != 0. {
                rowval.push(i);
                nzval.push(v);
            }
        }
        colptr[j + 1] = rowval.len();
    }

    CscMatrix::new(nrows, ncols, colptr, rowval, nzval)
}

/// Upper triangle of a symmetric matrix, as Clarabel expects for P
fn dmatrix_to_csc_upper_tri(m: &DMatrix<Float>) -> CscMatrix<Float> {
    let (nrows, ncols) = m.shape();
    let mut colptr = vec![0usize; ncols + 1];
    let mut rowval = vec![];
    let mut nzval = vec![];

    for j in 0..ncols {
        for i in 0..=j.min(nrows - 1) {
            let v = m[(i, j)];
            if v != 0. {
                rowval.push(i);
                nzval.push(v);
            }
        }
        colptr[j + 1] = rowval.len();
    }

    CscMatrix::new(nrows, ncols, colptr, rowval, nzval)
}
