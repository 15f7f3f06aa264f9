use na::DVector;

use crate::{
    config::WrenchDistributionConfig,
    contact::{check_unique_names, ContactBody},
    diagnostics::{DiagnosticsSink, TracingSink},
    error::{Error, Result},
    matrix::WrenchMatrix,
    spatial::wrench::Wrench,
    types::Float,
};

/// Below this total, the per-body rho averages are too small to balance on.
const MIN_RHO_TOTAL: Float = 1e-3;

#[derive(Clone, Debug, PartialEq)]
pub struct BodyWrench {
    pub body: String,
    /// Expressed in the body frame, torque about the body frame origin
    pub in_body: Wrench,
    /// Expressed in the resultant frame, torque about its origin
    pub in_resultant: Wrench,
    /// Mean coefficient over the body's friction basis columns. Zero when
    /// the body has none.
    pub average_rho: Float,
}

/// Turns a coefficient vector back into the wrench each body exerts.
///
/// A body's wrench in the resultant frame is the sum of its columns of Q
/// scaled by their coefficients, so the body wrenches always add up to Q ρ.
pub struct WrenchReconstructor<D: DiagnosticsSink = TracingSink> {
    penalizer_weight: Float,
    resultant_frame: String,
    wrenches: Option<Vec<BodyWrench>>,
    rho_mean: DVector<Float>,
    penalizer_weights: DVector<Float>,
    rho_total: Float,
    diagnostics: D,
}

impl WrenchReconstructor<TracingSink> {
    pub fn new(config: &WrenchDistributionConfig) -> Self {
        WrenchReconstructor::with_diagnostics(config, TracingSink::new("wrench_reconstructor"))
    }
}

impl<D: DiagnosticsSink> WrenchReconstructor<D> {
    pub fn with_diagnostics(config: &WrenchDistributionConfig, diagnostics: D) -> Self {
        WrenchReconstructor {
            penalizer_weight: config.rho_penalizer_weight,
            resultant_frame: String::new(),
            wrenches: None,
            rho_mean: DVector::zeros(0),
            penalizer_weights: DVector::zeros(0),
            rho_total: 0.,
            diagnostics,
        }
    }

    pub fn diagnostics(&self) -> &D {
        &self.diagnostics
    }

    /// Compute the wrench of every body in `bodies` from `rho`, which must
    /// have one entry per column of `matrix`. Bodies that are not
    /// load-bearing get a zero wrench.
    pub fn compute_wrenches(
        &mut self,
        matrix: &WrenchMatrix,
        bodies: &[ContactBody],
        rho: &DVector<Float>,
    ) -> Result<()> {
        self.wrenches = None;
        if rho.len() != matrix.capacity() {
            return Err(Error::RhoLengthMismatch {
                expected: matrix.capacity(),
                actual: rho.len(),
            });
        }
        check_unique_names(bodies)?;

        let frame = matrix.frame();
        let mut rho_mean = DVector::zeros(matrix.capacity());
        let mut wrenches = Vec::with_capacity(bodies.len());
        let mut averages = Vec::with_capacity(bodies.len());
        for body in bodies.iter() {
            let block = matrix
                .block(body.name())
                .ok_or_else(|| Error::UnknownContactBody(body.name().to_string()))?;

            let columns = block.columns();
            let resultant = matrix.q().columns(columns.start, columns.len())
                * rho.rows(columns.start, columns.len());
            let in_resultant = Wrench::from_vector6(&resultant, body.name(), frame);
            let in_body = in_resultant.transform(&body.body_to_resultant().inv());

            let basis = block.basis.clone();
            let average_rho = if basis.is_empty() {
                0.
            } else {
                rho.rows(basis.start, basis.len()).mean()
            };
            if !basis.is_empty() {
                rho_mean.rows_mut(basis.start, basis.len()).fill(average_rho);
                averages.push((basis, average_rho));
            }

            wrenches.push(BodyWrench {
                body: body.name().to_string(),
                in_body,
                in_resultant,
                average_rho,
            });
        }

        // Load balancing: bodies carrying less than their share are penalized less
        let rho_total: Float = averages.iter().map(|(_, average)| average).sum();
        let mut penalizer_weights = DVector::zeros(matrix.capacity());
        if rho_total > MIN_RHO_TOTAL {
            for (basis, average) in averages.iter() {
                let scaling = (1. - average / rho_total).max(0.);
                penalizer_weights
                    .rows_mut(basis.start, basis.len())
                    .fill(self.penalizer_weight * scaling);
            }
        }

        tracing::debug!(
            bodies = wrenches.len(),
            loaded_bodies = averages.len(),
            rho_total,
            "reconstructed contact wrenches"
        );
        self.diagnostics.record_scalar("rho_total", rho_total);
        self.diagnostics
            .record_count("loaded_bodies", averages.len());

        self.resultant_frame = frame.to_string();
        self.rho_mean = rho_mean;
        self.penalizer_weights = penalizer_weights;
        self.rho_total = rho_total;
        self.wrenches = Some(wrenches);
        Ok(())
    }

    /// Forget the last reconstruction, so nothing from an older tick can
    /// be read back
    pub fn clear(&mut self) {
        self.wrenches = None;
        self.rho_mean = DVector::zeros(0);
        self.penalizer_weights = DVector::zeros(0);
        self.rho_total = 0.;
    }

    pub fn wrenches(&self) -> Result<&[BodyWrench]> {
        self.wrenches
            .as_deref()
            .ok_or(Error::WrenchesNotComputed)
    }

    fn body_wrench(&self, body: &str) -> Result<&BodyWrench> {
        self.wrenches()?
            .iter()
            .find(|w| w.body == body)
            .ok_or_else(|| Error::UnknownContactBody(body.to_string()))
    }

    /// Wrench on `body` from the last `compute_wrenches`, in the body frame
    pub fn wrench(&self, body: &str) -> Result<&Wrench> {
        Ok(&self.body_wrench(body)?.in_body)
    }

    pub fn wrench_in_resultant_frame(&self, body: &str) -> Result<&Wrench> {
        Ok(&self.body_wrench(body)?.in_resultant)
    }

    pub fn average_rho(&self, body: &str) -> Result<Float> {
        Ok(self.body_wrench(body)?.average_rho)
    }

    /// Sum of all body wrenches in the resultant frame. The returned wrench
    /// is tagged with the resultant frame as its body.
    pub fn total_wrench(&self) -> Result<Wrench> {
        let mut total = Wrench::zero(&self.resultant_frame, &self.resultant_frame);
        for w in self.wrenches()?.iter() {
            total += &w.in_resultant;
        }
        Ok(total)
    }

    /// Sum of the per-body rho averages
    pub fn rho_total(&self) -> Float {
        self.rho_total
    }

    /// Per column, the average rho of the body owning it
    pub fn rho_mean(&self) -> &DVector<Float> {
        &self.rho_mean
    }

    /// Per column regularization that shifts load toward the bodies that
    /// already carry more of it
    pub fn penalizer_weights(&self) -> &DVector<Float> {
        &self.penalizer_weights
    }
}
