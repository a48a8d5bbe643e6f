//! Input validation for scheduling runs.
//!
//! Checks workloads, datacenters and the forecast snapshot before any
//! algorithm sees them. Detects:
//! - Duplicate IDs
//! - Non-positive or oversized resource requests
//! - Priorities outside 1..=10
//! - Invalid datacenter parameters (PUE, cost, capacity)
//! - Out-of-range or unordered forecast points
//!
//! All problems are collected and returned together.

use std::collections::HashSet;

use crate::models::{Datacenter, ForecastSnapshot, Workload};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Largest accepted CPU request (cores).
pub const MAX_CPU_CORES: f64 = 64.0;
/// Largest accepted memory request (GB).
pub const MAX_MEMORY_GB: f64 = 256.0;
/// Longest accepted run (hours, one week).
pub const MAX_DURATION_HOURS: f64 = 168.0;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// CPU, memory or duration is zero, negative or not finite.
    NonPositiveResource,
    /// Priority outside 1..=10.
    PriorityOutOfRange,
    /// Request exceeds the accepted ceiling.
    ResourceLimitExceeded,
    /// Datacenter parameters are unusable.
    InvalidDatacenter,
    /// Deadline at or before submission.
    InvalidDeadline,
    /// Forecast point out of range or out of order.
    InvalidForecast,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates workloads.
///
/// Checks:
/// 1. No duplicate workload IDs
/// 2. `cpu_cores`, `memory_gb`, `duration_hours` are finite and > 0
/// 3. Requests stay within [`MAX_CPU_CORES`], [`MAX_MEMORY_GB`], [`MAX_DURATION_HOURS`]
/// 4. Priority in 1..=10
/// 5. Deadline, when present, is after submission
pub fn validate_workloads(workloads: &[Workload]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut ids = HashSet::new();

    for w in workloads {
        if !ids.insert(w.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate workload ID: {}", w.id),
            ));
        }

        for (field, value, max) in [
            ("cpu_cores", w.cpu_cores, MAX_CPU_CORES),
            ("memory_gb", w.memory_gb, MAX_MEMORY_GB),
            ("duration_hours", w.duration_hours, MAX_DURATION_HOURS),
        ] {
            if !(value.is_finite() && value > 0.0) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::NonPositiveResource,
                    format!("Workload '{}' has non-positive {field}: {value}", w.id),
                ));
            } else if value > max {
                errors.push(ValidationError::new(
                    ValidationErrorKind::ResourceLimitExceeded,
                    format!("Workload '{}' {field} {value} exceeds limit {max}", w.id),
                ));
            }
        }

        if !(1..=10).contains(&w.priority) {
            errors.push(ValidationError::new(
                ValidationErrorKind::PriorityOutOfRange,
                format!("Workload '{}' priority {} outside 1..=10", w.id, w.priority),
            ));
        }

        if let Some(deadline) = w.deadline {
            if deadline <= w.submitted_at {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidDeadline,
                    format!("Workload '{}' deadline is not after submission", w.id),
                ));
            }
        }
    }

    into_result(errors)
}

/// Validates datacenters.
///
/// Checks:
/// 1. No duplicate datacenter IDs
/// 2. PUE finite and >= 1.0
/// 3. Cost rate finite and >= 0
/// 4. Capacity, when set, is finite and > 0 in both dimensions
pub fn validate_datacenters(datacenters: &[Datacenter]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut ids = HashSet::new();

    for dc in datacenters {
        if !ids.insert(dc.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate datacenter ID: {}", dc.id),
            ));
        }
        if !(dc.pue.is_finite() && dc.pue >= 1.0) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDatacenter,
                format!("Datacenter '{}' has invalid PUE {}", dc.id, dc.pue),
            ));
        }
        if !(dc.cost_rate.is_finite() && dc.cost_rate >= 0.0) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDatacenter,
                format!("Datacenter '{}' has invalid cost rate {}", dc.id, dc.cost_rate),
            ));
        }
        if let Some(cap) = dc.capacity {
            let ok = |v: f64| v.is_finite() && v > 0.0;
            if !(ok(cap.cpu_cores) && ok(cap.memory_gb)) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidDatacenter,
                    format!("Datacenter '{}' has non-positive capacity", dc.id),
                ));
            }
        }
    }

    into_result(errors)
}

/// Validates the forecast series of the given datacenters.
///
/// Missing series are not reported here: coverage is a data-availability
/// concern handled by the engine. Checks, per present point:
/// 1. Intensity finite and >= 0
/// 2. Renewable percentage within 0..=100
/// 3. Timestamps strictly ascending
/// 4. `datacenter_id` matches the series it is filed under
pub fn validate_forecast(snapshot: &ForecastSnapshot, datacenters: &[Datacenter]) -> ValidationResult {
    let mut errors = Vec::new();

    for dc in datacenters {
        let Some(points) = snapshot.points(&dc.id) else {
            continue;
        };

        for p in points {
            if p.datacenter_id != dc.id {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidForecast,
                    format!(
                        "Forecast point for '{}' filed under datacenter '{}'",
                        p.datacenter_id, dc.id
                    ),
                ));
            }
            if !(p.intensity_gco2_per_kwh.is_finite() && p.intensity_gco2_per_kwh >= 0.0) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidForecast,
                    format!(
                        "Datacenter '{}' has invalid intensity {} at {}",
                        dc.id, p.intensity_gco2_per_kwh, p.timestamp
                    ),
                ));
            }
            if !(0.0..=100.0).contains(&p.renewable_percentage) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidForecast,
                    format!(
                        "Datacenter '{}' has renewable percentage {} outside 0..=100",
                        dc.id, p.renewable_percentage
                    ),
                ));
            }
        }

        if points.windows(2).any(|w| w[1].timestamp <= w[0].timestamp) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidForecast,
                format!("Forecast for '{}' is not in ascending time order", dc.id),
            ));
        }
    }

    into_result(errors)
}

/// Runs all checks and merges their errors.
pub fn validate_input(
    workloads: &[Workload],
    datacenters: &[Datacenter],
    snapshot: &ForecastSnapshot,
) -> ValidationResult {
    let mut errors = Vec::new();
    for result in [
        validate_workloads(workloads),
        validate_datacenters(datacenters),
        validate_forecast(snapshot, datacenters),
    ] {
        if let Err(mut e) = result {
            errors.append(&mut e);
        }
    }
    into_result(errors)
}

fn into_result(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
