//! Schedule (solution) model.
//!
//! A schedule is the ordered list of workload → datacenter × start-time
//! assignments produced by one algorithm run, together with the workloads
//! that could not be placed and any non-fatal warnings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scheduler::AlgorithmKind;

/// Output of one scheduling run.
///
/// Assignment order is processing order. Each workload appears at most once,
/// either in `assignments` or in `unscheduled`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Algorithm that produced this schedule.
    pub algorithm_used: AlgorithmKind,
    /// Placements, in processing order.
    pub assignments: Vec<ScheduleAssignment>,
    /// Workloads left unplaced, in processing order.
    pub unscheduled: Vec<String>,
    /// Non-fatal conditions raised during the run.
    pub warnings: Vec<ScheduleWarning>,
    /// Counts.
    pub summary: ScheduleSummary,
}

/// A workload placed on a datacenter at a start time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleAssignment {
    /// Placed workload.
    pub workload_id: String,
    /// Target datacenter.
    pub datacenter_id: String,
    /// Start time.
    pub start_time: DateTime<Utc>,
    /// End time (`start_time + duration`).
    pub end_time: DateTime<Utc>,
    /// Estimated emissions (gCO2).
    pub carbon_emissions: f64,
    /// Estimated cost (currency units).
    pub cost: f64,
    /// Intensity used for the estimate (gCO2/kWh).
    pub carbon_intensity: f64,
    /// Renewable share at the start time (0..=100).
    pub renewable_percentage: f64,
}

/// Scheduled / unscheduled counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    /// Number of assignments.
    pub tasks_scheduled: usize,
    /// Number of workloads left unplaced.
    pub unscheduled_count: usize,
}

/// A non-fatal condition raised while scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleWarning {
    /// Warning kind.
    pub kind: WarningKind,
    /// Related workload.
    pub workload_id: String,
    /// Human-readable description.
    pub message: String,
}

/// Classification of scheduling warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// No datacenter had room in any slot of the horizon.
    CapacityExhausted,
    /// The workload was submitted after the horizon ends.
    HorizonExceeded,
    /// No start slot meets the deadline; the deadline was ignored.
    DeadlineRelaxed,
}

impl ScheduleAssignment {
    /// Duration in hours.
    pub fn duration_hours(&self) -> f64 {
        (self.end_time - self.start_time).num_milliseconds() as f64 / 3_600_000.0
    }
}

impl ScheduleWarning {
    /// Creates a capacity-exhausted warning.
    pub fn capacity_exhausted(workload_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::CapacityExhausted,
            workload_id: workload_id.into(),
            message: message.into(),
        }
    }

    /// Creates a horizon-exceeded warning.
    pub fn horizon_exceeded(workload_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::HorizonExceeded,
            workload_id: workload_id.into(),
            message: message.into(),
        }
    }

    /// Creates a deadline-relaxed warning.
    pub fn deadline_relaxed(workload_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::DeadlineRelaxed,
            workload_id: workload_id.into(),
            message: message.into(),
        }
    }
}

impl Schedule {
    /// Creates an empty schedule for an algorithm.
    pub fn new(algorithm_used: AlgorithmKind) -> Self {
        Self {
            algorithm_used,
            assignments: Vec::new(),
            unscheduled: Vec::new(),
            warnings: Vec::new(),
            summary: ScheduleSummary::default(),
        }
    }

    /// Appends an assignment.
    pub fn add_assignment(&mut self, assignment: ScheduleAssignment) {
        self.assignments.push(assignment);
        self.summary.tasks_scheduled = self.assignments.len();
    }

    /// Records a workload that could not be placed.
    pub fn mark_unscheduled(&mut self, warning: ScheduleWarning) {
        self.unscheduled.push(warning.workload_id.clone());
        self.summary.unscheduled_count = self.unscheduled.len();
        self.warnings.push(warning);
    }

    /// Records a warning that does not affect placement.
    pub fn add_warning(&mut self, warning: ScheduleWarning) {
        self.warnings.push(warning);
    }

    /// Sum of assignment emissions (gCO2).
    pub fn total_carbon(&self) -> f64 {
        self.assignments.iter().map(|a| a.carbon_emissions).sum()
    }

    /// Sum of assignment cost.
    pub fn total_cost(&self) -> f64 {
        self.assignments.iter().map(|a| a.cost).sum()
    }

    /// Mean intensity across assignments (0 if empty).
    pub fn avg_carbon_intensity(&self) -> f64 {
        mean(self.assignments.iter().map(|a| a.carbon_intensity))
    }

    /// Mean renewable percentage across assignments (0 if empty).
    pub fn avg_renewable(&self) -> f64 {
        mean(self.assignments.iter().map(|a| a.renewable_percentage))
    }

    /// Finds the assignment for a workload.
    pub fn assignment_for_workload(&self, workload_id: &str) -> Option<&ScheduleAssignment> {
        self.assignments.iter().find(|a| a.workload_id == workload_id)
    }

    /// Returns all assignments on a datacenter.
    pub fn assignments_for_datacenter(&self, datacenter_id: &str) -> Vec<&ScheduleAssignment> {
        self.assignments
            .iter()
            .filter(|a| a.datacenter_id == datacenter_id)
            .collect()
    }

    /// Whether a workload was left unplaced.
    pub fn is_unscheduled(&self, workload_id: &str) -> bool {
        self.unscheduled.iter().any(|id| id == workload_id)
    }

    /// Latest end time across assignments.
    pub fn makespan_end(&self) -> Option<DateTime<Utc>> {
        self.assignments.iter().map(|a| a.end_time).max()
    }

    /// Number of assignments.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}
