use std::ops::Range;

use na::{DVector, Matrix2xX, Matrix6xX, Vector6};

use crate::{
    basis::FrictionBasisGenerator,
    config::WrenchDistributionConfig,
    contact::{check_unique_names, ContactBody},
    diagnostics::{DiagnosticsSink, TracingSink},
    error::{Error, Result},
    spatial::wrench::Wrench,
    types::Float,
};

/// Columns of the wrench matrix owned by one body. Friction basis columns
/// come first, followed by the body's bounded grip columns.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnBlock {
    pub body: String,
    pub basis: Range<usize>,
    pub grip: Range<usize>,
}

impl ColumnBlock {
    pub fn columns(&self) -> Range<usize> {
        self.basis.start..self.grip.end
    }
}

/// The matrix Q mapping coefficients to the net wrench about the resultant
/// frame origin, rows ordered [τ; f], together with the bounds and
/// regularization of each coefficient.
///
/// Q always has `capacity` columns. Columns past `active_columns` are zero
/// and have bounds [0, 0].
#[derive(Clone, Debug)]
pub struct WrenchMatrix {
    frame: String,
    q: Matrix6xX<Float>,
    lower: DVector<Float>,
    upper: DVector<Float>,
    regularization: DVector<Float>,
    blocks: Vec<ColumnBlock>,
    active_columns: usize,
}

impl WrenchMatrix {
    /// The frame the net wrench is expressed in
    pub fn frame(&self) -> &str {
        &self.frame
    }

    pub fn q(&self) -> &Matrix6xX<Float> {
        &self.q
    }

    pub fn lower(&self) -> &DVector<Float> {
        &self.lower
    }

    pub fn upper(&self) -> &DVector<Float> {
        &self.upper
    }

    pub fn regularization(&self) -> &DVector<Float> {
        &self.regularization
    }

    /// One block per body, loaded or not, in input order
    pub fn blocks(&self) -> &[ColumnBlock] {
        &self.blocks
    }

    pub fn block(&self, body: &str) -> Option<&ColumnBlock> {
        self.blocks.iter().find(|b| b.body == body)
    }

    pub fn active_columns(&self) -> usize {
        self.active_columns
    }

    pub fn capacity(&self) -> usize {
        self.q.ncols()
    }

    /// Net wrench Q ρ, acting on the whole robot
    pub fn resultant(&self, rho: &DVector<Float>) -> Result<Vector6<Float>> {
        if rho.len() != self.capacity() {
            return Err(Error::RhoLengthMismatch {
                expected: self.capacity(),
                actual: rho.len(),
            });
        }
        Ok(&self.q * rho)
    }

    /// Zero-pad a solution over the active columns to the full column count
    pub fn pad(&self, rho_active: &DVector<Float>) -> Result<DVector<Float>> {
        if rho_active.len() != self.active_columns {
            return Err(Error::RhoLengthMismatch {
                expected: self.active_columns,
                actual: rho_active.len(),
            });
        }
        let mut rho = DVector::zeros(self.capacity());
        rho.rows_mut(0, self.active_columns).copy_from(rho_active);
        Ok(rho)
    }
}

/// Builds the wrench matrix from the current contact state. The matrix is
/// rebuilt from scratch on every call.
pub struct WrenchMatrixCalculator<D: DiagnosticsSink = TracingSink> {
    resultant_frame: String,
    generator: FrictionBasisGenerator,
    capacity: usize,
    rho_min: Float,
    rho_weight: Float,
    grip_weight: Float,
    matrix: Option<WrenchMatrix>,
    diagnostics: D,
}

impl WrenchMatrixCalculator<TracingSink> {
    pub fn new(resultant_frame: &str, config: &WrenchDistributionConfig) -> Self {
        WrenchMatrixCalculator::with_diagnostics(
            resultant_frame,
            config,
            TracingSink::new("wrench_matrix"),
        )
    }
}

impl<D: DiagnosticsSink> WrenchMatrixCalculator<D> {
    pub fn with_diagnostics(
        resultant_frame: &str,
        config: &WrenchDistributionConfig,
        diagnostics: D,
    ) -> Self {
        WrenchMatrixCalculator {
            resultant_frame: resultant_frame.to_string(),
            generator: FrictionBasisGenerator::new(config.basis_vectors_per_point),
            capacity: config.column_capacity,
            rho_min: config.rho_min,
            rho_weight: config.rho_weight,
            grip_weight: config.grip_weight,
            matrix: None,
            diagnostics,
        }
    }

    pub fn resultant_frame(&self) -> &str {
        &self.resultant_frame
    }

    pub fn generator(&self) -> &FrictionBasisGenerator {
        &self.generator
    }

    pub fn diagnostics(&self) -> &D {
        &self.diagnostics
    }

    /// Matrix from the last successful `compute_matrix`
    pub fn matrix(&self) -> Result<&WrenchMatrix> {
        self.matrix.as_ref().ok_or(Error::MatrixNotComputed)
    }

    /// Build Q from the bodies' current contact state. Each column is the
    /// wrench of a unit coefficient, taken about the resultant frame origin.
    pub fn compute_matrix(&mut self, bodies: &[ContactBody]) -> Result<&WrenchMatrix> {
        self.matrix = None;
        check_unique_names(bodies)?;

        let mut columns: Vec<(Vector6<Float>, Float, Float, Float)> = vec![];
        let mut blocks = Vec::with_capacity(bodies.len());
        let mut loaded_bodies = 0;
        for body in bodies.iter() {
            let body_to_resultant = body.body_to_resultant();
            if body_to_resultant.to != self.resultant_frame {
                return Err(Error::FrameMismatch {
                    expected: self.resultant_frame.clone(),
                    actual: body_to_resultant.to.clone(),
                });
            }

            let basis = self.generator.generate(body);
            if !basis.is_empty() {
                loaded_bodies += 1;
            }

            let basis_start = columns.len();
            for vector in basis.vectors.iter() {
                let column = vector
                    .unit_wrench(body.name())
                    .transform(body_to_resultant)
                    .as_vector6();
                columns.push((column, self.rho_min, Float::INFINITY, self.rho_weight));
            }
            let grip_start = columns.len();
            for grip in basis.grips.iter() {
                let column = grip.unit.transform(body_to_resultant).as_vector6();
                columns.push((column, grip.min, grip.max, self.grip_weight));
            }

            blocks.push(ColumnBlock {
                body: body.name().to_string(),
                basis: basis_start..grip_start,
                grip: grip_start..columns.len(),
            });
        }

        if columns.len() > self.capacity {
            return Err(Error::ColumnCapacityExceeded {
                required: columns.len(),
                capacity: self.capacity,
            });
        }

        let mut q = Matrix6xX::zeros(self.capacity);
        let mut lower = DVector::zeros(self.capacity);
        let mut upper = DVector::zeros(self.capacity);
        let mut regularization = DVector::zeros(self.capacity);
        for (i, (column, min, max, weight)) in columns.iter().enumerate() {
            q.set_column(i, column);
            lower[i] = *min;
            upper[i] = *max;
            regularization[i] = *weight;
        }

        tracing::debug!(
            active_columns = columns.len(),
            capacity = self.capacity,
            loaded_bodies,
            "built wrench matrix"
        );
        self.diagnostics.record_count("active_columns", columns.len());
        self.diagnostics.record_count("loaded_bodies", loaded_bodies);

        Ok(&*self.matrix.insert(WrenchMatrix {
            frame: self.resultant_frame.clone(),
            q,
            lower,
            upper,
            regularization,
            blocks,
            active_columns: columns.len(),
        }))
    }

    /// Moment arms of each friction basis column about the origin of
    /// `body`'s plane frame: row 0 is τx, row 1 is τy. Columns that belong
    /// to other bodies, and grip columns, are zero.
    ///
    /// Constraining this matrix times ρ steers the center of pressure of a
    /// single foot.
    pub fn cop_matrix(&self, bodies: &[ContactBody], body: &str) -> Result<Matrix2xX<Float>> {
        let matrix = self.matrix()?;
        let contact = bodies
            .iter()
            .find(|b| b.name() == body)
            .ok_or_else(|| Error::UnknownContactBody(body.to_string()))?;
        let plane = contact
            .plane()
            .ok_or_else(|| Error::NotAPlaneContact(body.to_string()))?;
        let block = matrix
            .block(body)
            .ok_or_else(|| Error::UnknownContactBody(body.to_string()))?;

        let basis = self.generator.generate(contact);
        if basis.vectors.len() != block.basis.len() {
            // contact state changed since the matrix was built
            return Err(Error::MatrixNotComputed);
        }

        let body_to_plane = plane.frame().inv();
        let mut cop = Matrix2xX::zeros(matrix.capacity());
        for (column, vector) in block.basis.clone().zip(basis.vectors.iter()) {
            let in_plane: Wrench = vector.unit_wrench(body).transform(&body_to_plane);
            cop[(0, column)] = in_plane.angular.x;
            cop[(1, column)] = in_plane.angular.y;
        }
        Ok(cop)
    }
}
