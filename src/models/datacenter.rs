//! Datacenter model.
//!
//! Datacenters are the placement targets. Each has a cost rate, a PUE and an
//! optional concurrent capacity ceiling. Reference data: loaded once per run
//! and never mutated by a scheduler.

use serde::{Deserialize, Serialize};

/// A datacenter workloads can be placed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datacenter {
    /// Unique datacenter identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Free-form location (e.g. "Cardiff, UK").
    pub location: String,
    /// Grid region code used by the carbon feed.
    #[serde(default)]
    pub region_code: String,
    /// Latitude in degrees.
    #[serde(default)]
    pub latitude: f64,
    /// Longitude in degrees.
    #[serde(default)]
    pub longitude: f64,
    /// Concurrent capacity ceiling. `None` = unbounded.
    #[serde(default)]
    pub capacity: Option<Capacity>,
    /// Currency per kWh of facility energy.
    pub cost_rate: f64,
    /// Power usage effectiveness (>= 1.0 in practice).
    pub pue: f64,
}

/// Concurrent resource ceiling of a datacenter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Capacity {
    /// CPU cores that may run at the same time.
    pub cpu_cores: f64,
    /// Memory in GB that may be in use at the same time.
    pub memory_gb: f64,
}

impl Capacity {
    /// Creates a capacity ceiling.
    pub fn new(cpu_cores: f64, memory_gb: f64) -> Self {
        Self {
            cpu_cores,
            memory_gb,
        }
    }
}

impl Datacenter {
    /// Creates an unbounded datacenter with PUE 1.0 and zero cost.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            location: String::new(),
            region_code: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            capacity: None,
            cost_rate: 0.0,
            pue: 1.0,
        }
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Sets the grid region code.
    pub fn with_region(mut self, region_code: impl Into<String>) -> Self {
        self.region_code = region_code.into();
        self
    }

    /// Sets coordinates.
    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }

    /// Sets the capacity ceiling.
    pub fn with_capacity(mut self, cpu_cores: f64, memory_gb: f64) -> Self {
        self.capacity = Some(Capacity::new(cpu_cores, memory_gb));
        self
    }

    /// Sets the cost rate.
    pub fn with_cost_rate(mut self, cost_rate: f64) -> Self {
        self.cost_rate = cost_rate;
        self
    }

    /// Sets the PUE.
    pub fn with_pue(mut self, pue: f64) -> Self {
        self.pue = pue;
        self
    }

    /// Whether capacity is bounded.
    pub fn is_bounded(&self) -> bool {
        self.capacity.is_some()
    }
}
