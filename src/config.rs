//! Engine configuration.
//!
//! Everything that bounds or shapes a run (slot grid, capacity enforcement,
//! power model, DP search budget) is fixed here before invocation. The
//! engine never infers these at runtime.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Upper bound on `slot_count` (one year of hourly slots).
pub const MAX_SLOT_COUNT: usize = 8_760;
/// Upper bound on `slot_minutes` (one day).
pub const MAX_SLOT_MINUTES: i64 = 1_440;

/// Linear IT power model shared by every algorithm and the metrics layer.
///
/// `power_kw = cpu_cores * kw_per_core + memory_gb * kw_per_gb`, before PUE.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerModel {
    /// kW drawn per CPU core.
    pub kw_per_core: f64,
    /// kW drawn per GB of memory.
    pub kw_per_gb: f64,
}

impl PowerModel {
    /// IT power draw in kW (excluding facility overhead).
    pub fn it_power_kw(&self, cpu_cores: f64, memory_gb: f64) -> f64 {
        cpu_cores * self.kw_per_core + memory_gb * self.kw_per_gb
    }
}

impl Default for PowerModel {
    fn default() -> Self {
        Self {
            kw_per_core: 0.1,
            kw_per_gb: 0.000_372_5,
        }
    }
}

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of time slots in the horizon (T).
    pub slot_count: usize,
    /// Width of one slot in minutes.
    pub slot_minutes: i64,
    /// Enforce datacenter capacity ceilings per slot.
    pub enforce_capacity: bool,
    /// Renewable percentage above which a datacenter counts as green.
    pub green_threshold_pct: f64,
    /// Power model.
    pub power_model: PowerModel,
    /// Maximum search nodes the DP scheduler may expand.
    pub dp_node_limit: usize,
    /// Maximum workloads accepted per request.
    pub max_workloads_per_request: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            slot_count: 24,
            slot_minutes: 60,
            enforce_capacity: true,
            green_threshold_pct: 50.0,
            power_model: PowerModel::default(),
            dp_node_limit: 100_000,
            max_workloads_per_request: 1000,
        }
    }
}

impl EngineConfig {
    /// Horizon length in hours.
    pub fn horizon_hours(&self) -> f64 {
        self.slot_count as f64 * self.slot_minutes as f64 / 60.0
    }

    /// Sets the slot grid.
    pub fn with_slots(mut self, slot_count: usize, slot_minutes: i64) -> Self {
        self.slot_count = slot_count;
        self.slot_minutes = slot_minutes;
        self
    }

    /// Enables or disables capacity enforcement.
    pub fn with_capacity_enforced(mut self, enforce: bool) -> Self {
        self.enforce_capacity = enforce;
        self
    }

    /// Sets the DP node budget.
    pub fn with_dp_node_limit(mut self, limit: usize) -> Self {
        self.dp_node_limit = limit;
        self
    }

    /// Sets the power model.
    pub fn with_power_model(mut self, model: PowerModel) -> Self {
        self.power_model = model;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(1..=MAX_SLOT_COUNT).contains(&self.slot_count) {
            return Err(invalid("slot_count must be within 1..=8760"));
        }
        if !(1..=MAX_SLOT_MINUTES).contains(&self.slot_minutes) {
            return Err(invalid("slot_minutes must be within 1..=1440"));
        }
        if !(0.0..=100.0).contains(&self.green_threshold_pct) {
            return Err(invalid("green_threshold_pct must be within 0..=100"));
        }
        if !(self.power_model.kw_per_core >= 0.0 && self.power_model.kw_per_gb >= 0.0) {
            return Err(invalid("power model coefficients must be non-negative"));
        }
        if self.dp_node_limit == 0 {
            return Err(invalid("dp_node_limit must be greater than 0"));
        }
        if self.max_workloads_per_request == 0 {
            return Err(invalid("max_workloads_per_request must be greater than 0"));
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigurationError> {
        let cfg: EngineConfig = serde_json::from_str(input)
            .map_err(|e| ConfigurationError::Invalid(format!("parse error: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

fn invalid(message: &str) -> ConfigurationError {
    ConfigurationError::Invalid(message.to_string())
}
