//! Error types for engine operations.
//!
//! Validation problems are collected and reported together; configuration
//! and data problems abort the call with no partial result. Capacity
//! exhaustion is not an error: it is recorded on the schedule.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors produced by the engine entry points.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed workload, datacenter or forecast input.
    #[error("invalid input: {}", summarize(.0))]
    Validation(Vec<ValidationError>),
    /// Unusable call configuration.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// A datacenter has no forecast points at all.
    #[error("no forecast data for datacenter `{datacenter_id}`")]
    DataUnavailable {
        /// Datacenter lacking coverage.
        datacenter_id: String,
    },
    /// The forecast provider failed.
    #[error(transparent)]
    Forecast(#[from] ForecastError),
}

/// Fatal configuration problems.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// No datacenters to schedule on.
    #[error("datacenter list is empty")]
    EmptyDatacenters,
    /// Algorithm identifier not recognised.
    #[error("unknown algorithm `{0}`")]
    UnknownAlgorithm(String),
    /// Datacenter identifier not present in the registry.
    #[error("unknown datacenter `{0}`")]
    UnknownDatacenter(String),
    /// Request exceeds the configured workload limit.
    #[error("{count} workloads exceed the per-request limit of {max}")]
    TooManyWorkloads {
        /// Workloads in the request.
        count: usize,
        /// Configured limit.
        max: usize,
    },
    /// Engine configuration values are invalid.
    #[error("invalid engine configuration: {0}")]
    Invalid(String),
}

/// Failures reported by a forecast provider.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    /// The provider has no series for a requested datacenter.
    #[error("provider has no series for datacenter `{0}`")]
    MissingDatacenter(String),
    /// Provider-specific failure.
    #[error("forecast provider error: {0}")]
    Provider(String),
}

/// Engine result alias.
pub type Result<T> = std::result::Result<T, EngineError>;

fn summarize(errors: &[ValidationError]) -> String {
    match errors {
        [] => "no details".to_string(),
        [only] => only.message.clone(),
        [first, rest @ ..] => format!("{} (and {} more)", first.message, rest.len()),
    }
}
