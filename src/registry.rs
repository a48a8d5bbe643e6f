//! Datacenter registry.
//!
//! An ordered list of known datacenters. Order is significant: it is the
//! configured order FCFS and round-robin follow, and selections keep it.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::models::Datacenter;

/// Cores per default UK site.
pub const UK_SITE_CPU_CORES: f64 = 200.0;
/// Memory per default UK site (GB).
pub const UK_SITE_MEMORY_GB: f64 = 800.0;

/// Ordered set of datacenters available to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatacenterRegistry {
    datacenters: Vec<Datacenter>,
}

impl DatacenterRegistry {
    /// Creates a registry from datacenters in configured order.
    pub fn new(datacenters: Vec<Datacenter>) -> Self {
        Self { datacenters }
    }

    /// Six UK grid regions, 200 cores and 800 GB each.
    pub fn uk_defaults() -> Self {
        let site = |id: &str, city: &str, region: &str, lat: f64, lon: f64, cost: f64| {
            Datacenter::new(id)
                .with_name(id.replace('-', " "))
                .with_location(format!("{city}, UK"))
                .with_region(region)
                .with_coordinates(lat, lon)
                .with_capacity(UK_SITE_CPU_CORES, UK_SITE_MEMORY_GB)
                .with_cost_rate(cost)
        };
        Self::new(vec![
            site("UK-Wales", "Cardiff", "7", 51.4816, -3.1791, 0.044),
            site("UK-South", "London", "13", 51.5074, -0.1278, 0.055),
            site("UK-East", "Cambridge", "12", 52.2053, 0.1218, 0.050),
            site("UK-Midlands", "Birmingham", "9", 52.4862, -1.8904, 0.048),
            site("UK-North", "Manchester", "4", 53.4808, -2.2426, 0.045),
            site("UK-Scotland", "Edinburgh", "2", 55.9533, -3.1883, 0.042),
        ])
    }

    /// All datacenters in configured order.
    pub fn all(&self) -> &[Datacenter] {
        &self.datacenters
    }

    /// IDs in configured order.
    pub fn ids(&self) -> Vec<String> {
        self.datacenters.iter().map(|dc| dc.id.clone()).collect()
    }

    /// Looks up a datacenter by ID.
    pub fn get(&self, id: &str) -> Option<&Datacenter> {
        self.datacenters.iter().find(|dc| dc.id == id)
    }

    pub fn len(&self) -> usize {
        self.datacenters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datacenters.is_empty()
    }

    /// The subset named by `ids`, in registry order.
    ///
    /// # Errors
    /// [`ConfigurationError::UnknownDatacenter`] for the first ID not in the
    /// registry.
    pub fn select<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<Datacenter>, ConfigurationError> {
        if let Some(unknown) = ids.iter().find(|id| self.get(id.as_ref()).is_none()) {
            return Err(ConfigurationError::UnknownDatacenter(
                unknown.as_ref().to_string(),
            ));
        }
        Ok(self
            .datacenters
            .iter()
            .filter(|dc| ids.iter().any(|id| id.as_ref() == dc.id))
            .cloned()
            .collect())
    }
}
