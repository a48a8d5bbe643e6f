//! Carbon-aware schedulers, metrics and comparison.
//!
//! Four placement algorithms share one emission model and one slot grid:
//!
//! | Algorithm | Order | Placement |
//! |-----------|-------|-----------|
//! | Greedy | priority ↓, submission ↑ | cheapest datacenter at its earliest free slot |
//! | DP | priority ↓, submission ↑ | minimum total carbon over all feasible cells, capacity-aware |
//! | FCFS | submission ↑ | first datacenter in configured order with room |
//! | Round-robin | submission ↑ | datacenter `i mod d`, deferring while full |
//!
//! Every run is a pure function of (workloads, datacenters, snapshot,
//! config): no state survives between runs.
//!
//! # References
//!
//! - Wiesner et al. (2021), "Let's Wait Awhile: How Temporal Workload
//!   Shifting Can Reduce Carbon Emissions in the Cloud"
//! - Radovanović et al. (2022), "Carbon-Aware Computing for Datacenters"

mod baseline;
mod comparison;
mod dp;
mod emission;
mod grid;
mod greedy;
mod metrics;
mod placement;

pub use baseline::{FcfsScheduler, RoundRobinScheduler};
pub use comparison::{AlgorithmResult, ComparisonResult, ComparisonRunner};
pub use dp::DpScheduler;
pub use emission::{estimate, Estimate};
pub use grid::{CapacityLedger, Demand, SlotGrid, StartWindow};
pub use greedy::GreedyScheduler;
pub use metrics::{
    CarbonMetrics, CostMetrics, DatacenterShare, MetricsCalculator, PerformanceMetrics,
    RenewableMetrics, ScheduleMetrics,
};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{ConfigurationError, EngineError, Result};
use crate::models::{Datacenter, ForecastSnapshot, Schedule, Workload};

/// The closed set of scheduling algorithms.
///
/// Adding an algorithm means adding a variant here and an arm in
/// [`AlgorithmKind::scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlgorithmKind {
    /// Carbon-greedy, myopic.
    #[serde(rename = "greedy")]
    Greedy,
    /// Forecast-aware dynamic programming.
    #[serde(rename = "dp")]
    DynamicProgramming,
    /// First-come-first-served baseline.
    #[serde(rename = "fcfs")]
    Fcfs,
    /// Round-robin baseline.
    #[serde(rename = "round_robin")]
    RoundRobin,
}

impl AlgorithmKind {
    /// All algorithms, in reporting order.
    pub const ALL: [AlgorithmKind; 4] = [
        AlgorithmKind::Greedy,
        AlgorithmKind::DynamicProgramming,
        AlgorithmKind::Fcfs,
        AlgorithmKind::RoundRobin,
    ];

    /// Stable identifier (`greedy`, `dp`, `fcfs`, `round_robin`).
    pub fn id(self) -> &'static str {
        match self {
            AlgorithmKind::Greedy => "greedy",
            AlgorithmKind::DynamicProgramming => "dp",
            AlgorithmKind::Fcfs => "fcfs",
            AlgorithmKind::RoundRobin => "round_robin",
        }
    }

    /// Whether the algorithm reads carbon intensity when placing.
    pub fn is_carbon_aware(self) -> bool {
        matches!(self, AlgorithmKind::Greedy | AlgorithmKind::DynamicProgramming)
    }

    /// Instantiates a fresh scheduler for one run.
    pub fn scheduler(self, config: &EngineConfig) -> Box<dyn CarbonScheduler> {
        match self {
            AlgorithmKind::Greedy => Box::new(GreedyScheduler::new(config.clone())),
            AlgorithmKind::DynamicProgramming => Box::new(DpScheduler::new(config.clone())),
            AlgorithmKind::Fcfs => Box::new(FcfsScheduler::new(config.clone())),
            AlgorithmKind::RoundRobin => Box::new(RoundRobinScheduler::new(config.clone())),
        }
    }

    /// Parses a list of identifiers.
    pub fn parse_list<S: AsRef<str>>(ids: &[S]) -> std::result::Result<Vec<Self>, ConfigurationError> {
        ids.iter().map(|s| s.as_ref().parse()).collect()
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for AlgorithmKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "greedy" => Ok(AlgorithmKind::Greedy),
            "dp" | "dynamic_programming" => Ok(AlgorithmKind::DynamicProgramming),
            "fcfs" => Ok(AlgorithmKind::Fcfs),
            "round_robin" | "round-robin" | "rr" => Ok(AlgorithmKind::RoundRobin),
            _ => Err(ConfigurationError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// A scheduling algorithm.
///
/// Implementations are pure: they read the problem, never mutate it, and
/// keep all working state (ledger, memo tables) local to one call.
pub trait CarbonScheduler: Send + Sync + fmt::Debug {
    /// Algorithm identity.
    fn kind(&self) -> AlgorithmKind;

    /// Produces a schedule for the problem.
    fn schedule(&self, problem: &SchedulingProblem<'_>) -> Result<Schedule>;
}

/// Immutable input of one run.
///
/// Datacenter order is significant: it is the configured order FCFS and
/// round-robin follow and the order metrics report in.
#[derive(Debug, Clone, Copy)]
pub struct SchedulingProblem<'a> {
    /// Workloads to place.
    pub workloads: &'a [Workload],
    /// Candidate datacenters, in configured order.
    pub datacenters: &'a [Datacenter],
    /// Forecast captured for this run.
    pub snapshot: &'a ForecastSnapshot,
}

impl<'a> SchedulingProblem<'a> {
    /// Bundles a run's input.
    ///
    /// # Errors
    /// - [`ConfigurationError::EmptyDatacenters`] if no datacenters are given.
    /// - [`EngineError::DataUnavailable`] if a datacenter has no forecast
    ///   points. Partial coverage is not an error: sampling clamps to the
    ///   nearest boundary point.
    pub fn new(
        workloads: &'a [Workload],
        datacenters: &'a [Datacenter],
        snapshot: &'a ForecastSnapshot,
    ) -> Result<Self> {
        if datacenters.is_empty() {
            return Err(ConfigurationError::EmptyDatacenters.into());
        }
        if let Some(dc) = datacenters.iter().find(|dc| !snapshot.has_coverage(&dc.id)) {
            return Err(EngineError::DataUnavailable {
                datacenter_id: dc.id.clone(),
            });
        }
        Ok(Self {
            workloads,
            datacenters,
            snapshot,
        })
    }

    /// Index of a datacenter by ID.
    pub fn datacenter_index(&self, id: &str) -> Option<usize> {
        self.datacenters.iter().position(|dc| dc.id == id)
    }
}
