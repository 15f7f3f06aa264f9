use thiserror::Error;

use crate::types::Float;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid contact parameter `{parameter}`: {value}")]
    InvalidContactParameter {
        parameter: &'static str,
        value: Float,
    },
    #[error("a load-bearing plane contact needs at least one contact point")]
    EmptyContactPoints,
    #[error("expected frame `{expected}`, got `{actual}`")]
    FrameMismatch { expected: String, actual: String },
    #[error("wrench matrix needs {required} columns but only has {capacity}")]
    ColumnCapacityExceeded { required: usize, capacity: usize },
    #[error("wrench matrix has not been computed yet")]
    MatrixNotComputed,
    #[error("wrenches have not been computed yet")]
    WrenchesNotComputed,
    #[error("unknown contact body `{0}`")]
    UnknownContactBody(String),
    #[error("contact body `{0}` appears more than once")]
    DuplicateContactBody(String),
    #[error("`{0}` does not have a plane contact")]
    NotAPlaneContact(String),
    #[error("rho has {actual} entries, the wrench matrix has {expected} columns")]
    RhoLengthMismatch { expected: usize, actual: usize },
    #[error("cannot resolve a center of pressure for normal force {normal_force}")]
    DegenerateNormalForce { normal_force: Float },
    #[error("optimizer setup failed: {0}")]
    SolverSetup(String),
    #[error("optimizer did not converge: {status}")]
    DidNotConverge { status: String },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("could not parse configuration")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
