//! Per-tick wrench distribution: build the wrench matrix from the current
//! contacts, solve for the coefficients, and turn them back into one wrench
//! per contact body.

use na::DVector;

use crate::{
    config::{FallbackPolicy, WrenchDistributionConfig},
    contact::ContactBody,
    cop::{CenterOfPressure, CenterOfPressureResolver},
    diagnostics::{DiagnosticsSink, TracingSink},
    error::{Error, Result},
    matrix::{WrenchMatrix, WrenchMatrixCalculator},
    optimizer::{ClarabelOptimizer, Convergence, OptimizerInput, WrenchOptimizer},
    reconstruct::WrenchReconstructor,
    spatial::wrench::Wrench,
    types::Float,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistributionStatus {
    Solved(Convergence),
    /// The optimizer failed; the output of the last solved tick is repeated.
    HeldPrevious,
    /// The optimizer failed; every body is commanded zero wrench.
    Zeroed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContactOutput {
    pub body: String,
    /// In the body frame
    pub wrench: Wrench,
    /// Only for load-bearing plane contacts with a resolvable normal force
    pub center_of_pressure: Option<CenterOfPressure>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DistributionOutput {
    pub contacts: Vec<ContactOutput>,
    /// Sum of the contact wrenches in the resultant frame
    pub resultant: Wrench,
    /// One coefficient per wrench matrix column
    pub rho: DVector<Float>,
    pub status: DistributionStatus,
}

impl DistributionOutput {
    pub fn contact(&self, body: &str) -> Option<&ContactOutput> {
        self.contacts.iter().find(|c| c.body == body)
    }
}

/// Runs one tick of the pipeline. Each component owns its own diagnostics
/// sink.
pub struct WrenchDistributor<
    O: WrenchOptimizer = ClarabelOptimizer,
    D: DiagnosticsSink = TracingSink,
> {
    config: WrenchDistributionConfig,
    calculator: WrenchMatrixCalculator<D>,
    optimizer: O,
    reconstructor: WrenchReconstructor<D>,
    resolver: CenterOfPressureResolver,
    previous: Option<DistributionOutput>,
}

impl WrenchDistributor<ClarabelOptimizer> {
    pub fn new(resultant_frame: &str, config: WrenchDistributionConfig) -> Result<Self> {
        let optimizer = ClarabelOptimizer::new(&config.solver);
        WrenchDistributor::with_optimizer(resultant_frame, config, optimizer)
    }
}

impl<O: WrenchOptimizer> WrenchDistributor<O, TracingSink> {
    pub fn with_optimizer(
        resultant_frame: &str,
        config: WrenchDistributionConfig,
        optimizer: O,
    ) -> Result<Self> {
        WrenchDistributor::with_diagnostics(
            resultant_frame,
            config,
            optimizer,
            TracingSink::new("wrench_matrix"),
            TracingSink::new("wrench_reconstructor"),
        )
    }
}

impl<O: WrenchOptimizer, D: DiagnosticsSink> WrenchDistributor<O, D> {
    pub fn with_diagnostics(
        resultant_frame: &str,
        config: WrenchDistributionConfig,
        optimizer: O,
        matrix_diagnostics: D,
        reconstruction_diagnostics: D,
    ) -> Result<Self> {
        config.validate()?;
        Ok(WrenchDistributor {
            calculator: WrenchMatrixCalculator::with_diagnostics(
                resultant_frame,
                &config,
                matrix_diagnostics,
            ),
            reconstructor: WrenchReconstructor::with_diagnostics(
                &config,
                reconstruction_diagnostics,
            ),
            resolver: CenterOfPressureResolver::new(&config),
            optimizer,
            config,
            previous: None,
        })
    }

    pub fn config(&self) -> &WrenchDistributionConfig {
        &self.config
    }

    pub fn optimizer_mut(&mut self) -> &mut O {
        &mut self.optimizer
    }

    pub fn matrix(&self) -> Result<&WrenchMatrix> {
        self.calculator.matrix()
    }

    pub fn matrix_diagnostics(&self) -> &D {
        self.calculator.diagnostics()
    }

    /// Holds the wrenches of the current tick only. After a fallback it is
    /// empty.
    pub fn reconstructor(&self) -> &WrenchReconstructor<D> {
        &self.reconstructor
    }

    /// Distribute `desired`, expressed in the resultant frame, over the
    /// load-bearing bodies.
    pub fn distribute(
        &mut self,
        bodies: &[ContactBody],
        desired: &Wrench,
    ) -> Result<DistributionOutput> {
        self.reconstructor.clear();
        let matrix = self.calculator.compute_matrix(bodies)?;
        let frame = matrix.frame().to_string();
        let input = OptimizerInput::from_matrix(matrix, desired, &self.config.momentum_weights)?;

        let solution = match self.optimizer.solve(&input) {
            Ok(solution) => solution,
            Err(Error::DidNotConverge { status }) => {
                tracing::warn!(%status, policy = ?self.config.fallback, "applying fallback");
                return self.fallback(bodies, &frame, status);
            }
            Err(e) => return Err(e),
        };

        let rho = matrix.pad(&solution.rho)?;
        self.reconstructor.compute_wrenches(matrix, bodies, &rho)?;

        let mut contacts = Vec::with_capacity(bodies.len());
        for body in bodies.iter() {
            let wrench = self.reconstructor.wrench(body.name())?.clone();
            let center_of_pressure = if body.is_load_bearing() && body.plane().is_some() {
                match self.resolver.resolve_on_body(&wrench, body) {
                    Ok(cop) => Some(cop),
                    Err(Error::DegenerateNormalForce { .. }) => None,
                    Err(e) => return Err(e),
                }
            } else {
                None
            };
            contacts.push(ContactOutput {
                body: body.name().to_string(),
                wrench,
                center_of_pressure,
            });
        }

        let output = DistributionOutput {
            contacts,
            resultant: self.reconstructor.total_wrench()?,
            rho,
            status: DistributionStatus::Solved(solution.convergence),
        };
        tracing::debug!(
            iterations = solution.iterations,
            solve_time_us = solution.solve_time.as_micros() as u64,
            "distributed wrench"
        );
        self.previous = Some(output.clone());
        Ok(output)
    }

    fn fallback(
        &self,
        bodies: &[ContactBody],
        frame: &str,
        status: String,
    ) -> Result<DistributionOutput> {
        match self.config.fallback {
            FallbackPolicy::Fail => Err(Error::DidNotConverge { status }),
            FallbackPolicy::HoldPrevious => match &self.previous {
                Some(previous) => Ok(DistributionOutput {
                    status: DistributionStatus::HeldPrevious,
                    ..previous.clone()
                }),
                None => Ok(zero_output(bodies, frame, self.config.column_capacity)),
            },
            FallbackPolicy::Zero => Ok(zero_output(bodies, frame, self.config.column_capacity)),
        }
    }
}

fn zero_output(bodies: &[ContactBody], frame: &str, capacity: usize) -> DistributionOutput {
    DistributionOutput {
        contacts: bodies
            .iter()
            .map(|body| ContactOutput {
                body: body.name().to_string(),
                wrench: Wrench::zero(body.name(), body.name()),
                center_of_pressure: None,
            })
            .collect(),
        resultant: Wrench::zero(frame, frame),
        rho: DVector::zeros(capacity),
        status: DistributionStatus::Zeroed,
    }
}
