//! Carbon emission and cost model.
//!
//! The single estimate every algorithm (and the comparison baseline) uses,
//! so optimized and baseline schedules are priced identically.
//!
//! ```text
//! power_kw  = (cpu_cores * kw_per_core + memory_gb * kw_per_gb) * pue
//! emissions = power_kw * duration_hours * intensity_at(datacenter, start)
//! cost      = power_kw * duration_hours * cost_rate
//! ```
//!
//! `intensity_at` interpolates the snapshot and clamps to the boundary
//! points outside the forecast range (see [`ForecastSnapshot`]).

use chrono::{DateTime, Utc};

use crate::config::PowerModel;
use crate::error::{EngineError, Result};
use crate::models::{Datacenter, ForecastSnapshot, Workload};

/// Estimated footprint of running a workload on a datacenter from a start
/// time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Facility power draw (kW).
    pub power_kw: f64,
    /// Intensity at the start time (gCO2/kWh).
    pub carbon_intensity: f64,
    /// Renewable share at the start time (0..=100).
    pub renewable_percentage: f64,
    /// Emissions over the whole run (gCO2).
    pub carbon_emissions: f64,
    /// Cost over the whole run.
    pub cost: f64,
}

/// Prices a (workload, datacenter, start time) candidate.
///
/// # Errors
/// [`EngineError::DataUnavailable`] if the snapshot has no points for the
/// datacenter.
pub fn estimate(
    workload: &Workload,
    datacenter: &Datacenter,
    snapshot: &ForecastSnapshot,
    start: DateTime<Utc>,
    model: &PowerModel,
) -> Result<Estimate> {
    let unavailable = || EngineError::DataUnavailable {
        datacenter_id: datacenter.id.clone(),
    };
    let carbon_intensity = snapshot
        .intensity_at(&datacenter.id, start)
        .ok_or_else(unavailable)?;
    let renewable_percentage = snapshot
        .renewable_at(&datacenter.id, start)
        .ok_or_else(unavailable)?;

    let power_kw = workload.power_kw(model, datacenter.pue);
    let energy_kwh = power_kw * workload.duration_hours;

    Ok(Estimate {
        power_kw,
        carbon_intensity,
        renewable_percentage,
        carbon_emissions: (energy_kwh * carbon_intensity).max(0.0),
        cost: energy_kwh * datacenter.cost_rate,
    })
}
