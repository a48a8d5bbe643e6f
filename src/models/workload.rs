//! Workload (job) model.
//!
//! A workload is a unit of compute to be placed on a datacenter at a start
//! time. Workloads are immutable once ingested: schedulers read them and
//! never write back.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::PowerModel;

/// A compute workload to be scheduled.
///
/// # Time Representation
/// `submitted_at` and `deadline` are absolute UTC timestamps. Durations are
/// fractional hours, matching how carbon intensity is quoted (per kWh).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    /// Unique workload identifier.
    pub id: String,
    /// Requested CPU cores (> 0).
    pub cpu_cores: f64,
    /// Requested memory in GB (> 0).
    pub memory_gb: f64,
    /// Run time in hours (> 0).
    pub duration_hours: f64,
    /// Urgency, 1..=10 (higher = more urgent).
    pub priority: u8,
    /// Submission time. Nothing starts before this.
    pub submitted_at: DateTime<Utc>,
    /// Latest completion time. `None` = no deadline.
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}

impl Workload {
    /// Default priority for workloads created without one.
    pub const DEFAULT_PRIORITY: u8 = 5;

    /// Creates a workload submitted at the Unix epoch with default priority.
    ///
    /// Use [`Workload::submitted_at`] to set the real submission time.
    pub fn new(id: impl Into<String>, cpu_cores: f64, memory_gb: f64, duration_hours: f64) -> Self {
        Self {
            id: id.into(),
            cpu_cores,
            memory_gb,
            duration_hours,
            priority: Self::DEFAULT_PRIORITY,
            submitted_at: DateTime::<Utc>::UNIX_EPOCH,
            deadline: None,
        }
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the submission time.
    pub fn submitted_at(mut self, at: DateTime<Utc>) -> Self {
        self.submitted_at = at;
        self
    }

    /// Sets the deadline.
    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Run time as a chrono duration (millisecond precision).
    pub fn duration(&self) -> Duration {
        Duration::milliseconds((self.duration_hours * 3_600_000.0).round() as i64)
    }

    /// Facility power draw in kW on a datacenter with the given PUE.
    pub fn power_kw(&self, model: &PowerModel, pue: f64) -> f64 {
        model.it_power_kw(self.cpu_cores, self.memory_gb) * pue
    }

    /// Facility energy in kWh over the whole run.
    pub fn energy_kwh(&self, model: &PowerModel, pue: f64) -> f64 {
        self.power_kw(model, pue) * self.duration_hours
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_workload_builder() {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap();
        let w = Workload::new("W1", 4.0, 8.0, 2.0)
            .with_priority(7)
            .submitted_at(at)
            .with_deadline(at + Duration::hours(6));

        assert_eq!(w.id, "W1");
        assert_eq!(w.priority, 7);
        assert_eq!(w.submitted_at, at);
        assert_eq!(w.deadline, Some(at + Duration::hours(6)));
    }

    #[test]
    fn test_workload_defaults() {
        let w = Workload::new("W1", 1.0, 1.0, 1.0);
        assert_eq!(w.priority, Workload::DEFAULT_PRIORITY);
        assert!(w.deadline.is_none());
    }

    #[test]
    fn test_workload_duration() {
        let w = Workload::new("W1", 1.0, 1.0, 1.5);
        assert_eq!(w.duration(), Duration::minutes(90));
    }

    #[test]
    fn test_workload_energy() {
        let model = PowerModel {
            kw_per_core: 0.1,
            kw_per_gb: 0.0,
        };
        let w = Workload::new("W1", 4.0, 8.0, 2.0);
        // 4 cores * 0.1 kW * 1.5 PUE = 0.6 kW over 2h
        assert!((w.power_kw(&model, 1.5) - 0.6).abs() < 1e-9);
        assert!((w.energy_kwh(&model, 1.5) - 1.2).abs() < 1e-9);
    }
}
