use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    types::Float,
};

/// What the distributor hands out when the optimizer fails on a tick.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Keep the output of the last tick that solved.
    HoldPrevious,
    /// Command zero wrench on every contact body.
    Zero,
    /// Return the error to the caller.
    Fail,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    pub max_iter: u32,
    /// Feasibility and duality gap tolerance handed to the solver.
    pub tolerance: Float,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iter: 200,
            tolerance: 1e-8,
        }
    }
}

/// Configuration for the wrench distribution pipeline.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WrenchDistributionConfig {
    /// Number of friction pyramid edges generated per contact point.
    ///
    /// More edges approximate the friction cone more tightly but grow the
    /// optimization problem linearly.
    pub basis_vectors_per_point: usize,
    /// Number of columns of the wrench matrix. Unused columns are zero.
    pub column_capacity: usize,
    /// Lower bound on every friction basis coefficient.
    pub rho_min: Float,
    /// Regularization on the friction basis coefficients.
    pub rho_weight: Float,
    /// Regularization on the bounded grip coefficients of cylinder contacts.
    pub grip_weight: Float,
    /// Scale of the per-body load balancing penalty reported after reconstruction.
    pub rho_penalizer_weight: Float,
    /// Diagonal of the weight on the wrench error, ordered [angular; linear].
    pub momentum_weights: [Float; 6],
    /// Below this normal force no center of pressure is resolved.
    pub min_normal_force: Float,
    pub solver: SolverConfig,
    pub fallback: FallbackPolicy,
}

impl Default for WrenchDistributionConfig {
    fn default() -> Self {
        Self {
            basis_vectors_per_point: 4,
            column_capacity: 64,
            rho_min: 0.0,
            rho_weight: 1e-6,
            grip_weight: 1e-6,
            rho_penalizer_weight: 0.0,
            momentum_weights: [1.0; 6],
            min_normal_force: 1e-6,
            solver: SolverConfig::default(),
            fallback: FallbackPolicy::HoldPrevious,
        }
    }
}

impl WrenchDistributionConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: WrenchDistributionConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| Error::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        if self.basis_vectors_per_point < 3 {
            return Err(Error::InvalidConfig(format!(
                "basis_vectors_per_point must be at least 3 to span a friction cone, got {}",
                self.basis_vectors_per_point
            )));
        }
        if self.column_capacity == 0 {
            return Err(Error::InvalidConfig(
                "column_capacity must be positive".to_string(),
            ));
        }
        if !(self.rho_min >= 0.0) || self.rho_min.is_infinite() {
            return Err(Error::InvalidConfig(format!(
                "rho_min must be finite and non-negative, got {}",
                self.rho_min
            )));
        }
        let weights = [self.rho_weight, self.grip_weight, self.rho_penalizer_weight];
        if weights.iter().chain(self.momentum_weights.iter()).any(|w| !(*w >= 0.0)) {
            return Err(Error::InvalidConfig(
                "weights must be non-negative".to_string(),
            ));
        }
        if !(self.min_normal_force > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "min_normal_force must be positive, got {}",
                self.min_normal_force
            )));
        }
        if !(self.solver.tolerance > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "solver tolerance must be positive, got {}",
                self.solver.tolerance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(WrenchDistributionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        // Arrange
        let source = r#"
            basis_vectors_per_point = 6
            fallback = "zero"

            [solver]
            max_iter = 50
        "#;

        // Act
        let config = WrenchDistributionConfig::from_toml_str(source).unwrap();

        // Assert
        assert_eq!(config.basis_vectors_per_point, 6);
        assert_eq!(config.fallback, FallbackPolicy::Zero);
        assert_eq!(config.solver.max_iter, 50);
        assert_eq!(config.solver.tolerance, 1e-8);
        assert_eq!(config.column_capacity, 64);
    }

    #[test]
    fn test_rejects_degenerate_pyramid() {
        let result = WrenchDistributionConfig::from_toml_str("basis_vectors_per_point = 2");
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_nan() {
        for source in [
            "rho_min = nan",
            "min_normal_force = nan",
            "rho_weight = nan",
            "momentum_weights = [1.0, 1.0, 1.0, nan, 1.0, 1.0]",
            "[solver]\ntolerance = nan",
        ] {
            let result = WrenchDistributionConfig::from_toml_str(source);
            assert!(matches!(result, Err(Error::InvalidConfig(_))), "{source}");
        }
    }

    #[test]
    fn test_rejects_unknown_field() {
        let result = WrenchDistributionConfig::from_toml_str("wrho = 1.0");
        assert!(matches!(result, Err(Error::ConfigParse(_))));
    }
}
