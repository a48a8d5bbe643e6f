//! Carbon-greedy scheduler.
//!
//! # Algorithm
//!
//! Workloads are taken by priority (descending), then submission time,
//! then ID. For each workload, every datacenter offers its earliest start
//! slot (inside the workload's window) with room for the workload's whole
//! run; the candidate with the lowest estimated emissions wins, ties broken
//! by cost and then datacenter ID. Capacity is reserved before the next
//! workload is considered.
//!
//! Greedy never looks ahead: a cheaper slot later in the horizon is only
//! taken when earlier slots on that datacenter are full.
//!
//! # Complexity
//! O(n log n + n·D·T) where D = datacenters, T = slots.

use tracing::{debug, info};

use super::grid::{CapacityLedger, Demand, StartWindow};
use super::placement::{priority_order, Placement, Placer};
use super::{AlgorithmKind, CarbonScheduler, SchedulingProblem};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::{Schedule, Workload};

/// Myopic minimum-emission placement.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use u_carbon_schedule::config::EngineConfig;
/// use u_carbon_schedule::models::{Datacenter, ForecastSnapshot, Workload};
/// use u_carbon_schedule::scheduler::{CarbonScheduler, GreedyScheduler, SchedulingProblem};
///
/// let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
/// let snapshot = ForecastSnapshot::constant(now, &[("A", 50.0, 80.0), ("B", 300.0, 20.0)]);
/// let dcs = vec![Datacenter::new("A"), Datacenter::new("B")];
/// let workloads = vec![Workload::new("W1", 2.0, 4.0, 1.0).submitted_at(now)];
///
/// let problem = SchedulingProblem::new(&workloads, &dcs, &snapshot).unwrap();
/// let schedule = GreedyScheduler::new(EngineConfig::default()).schedule(&problem).unwrap();
/// assert_eq!(schedule.assignments[0].datacenter_id, "A");
/// ```
#[derive(Debug, Clone, Default)]
pub struct GreedyScheduler {
    config: EngineConfig,
}

impl GreedyScheduler {
    /// Creates a greedy scheduler.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl CarbonScheduler for GreedyScheduler {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Greedy
    }

    fn schedule(&self, problem: &SchedulingProblem<'_>) -> Result<Schedule> {
        let placer = Placer::new(*problem, &self.config);
        let order = priority_order(problem.workloads);
        let windows = placer.windows(true);

        let choices = plan(&placer, &order, &windows)?;
        let schedule = placer.build(AlgorithmKind::Greedy, &order, &windows, &choices);

        info!(
            algorithm = "greedy",
            scheduled = schedule.summary.tasks_scheduled,
            unscheduled = schedule.summary.unscheduled_count,
            total_carbon = schedule.total_carbon(),
            "schedule complete"
        );
        Ok(schedule)
    }
}

/// Greedy choices, one per position in `order`.
pub(super) fn plan(
    placer: &Placer<'_>,
    order: &[usize],
    windows: &[Option<StartWindow>],
) -> Result<Vec<Option<Placement>>> {
    let mut ledger = placer.ledger();
    let mut choices = Vec::with_capacity(order.len());

    for &i in order {
        let workload = &placer.problem.workloads[i];
        let choice = match &windows[i] {
            Some(window) => choose(placer, &ledger, workload, window)?,
            None => None,
        };
        if let Some(p) = &choice {
            ledger.reserve(p.dc, placer.occupied(workload, p.slot), Demand::of(workload));
            debug!(
                workload = %workload.id,
                datacenter = %placer.problem.datacenters[p.dc].id,
                slot = p.slot,
                carbon = p.estimate.carbon_emissions,
                "greedy placement"
            );
        }
        choices.push(choice);
    }
    Ok(choices)
}

/// Cheapest of each datacenter's earliest feasible placement.
fn choose(
    placer: &Placer<'_>,
    ledger: &CapacityLedger,
    workload: &Workload,
    window: &StartWindow,
) -> Result<Option<Placement>> {
    let demand = Demand::of(workload);
    let mut best: Option<Placement> = None;

    for dc in 0..placer.datacenter_count() {
        if !ledger.admits(dc, demand) {
            continue;
        }
        let slot = window
            .slots
            .clone()
            .find(|&s| ledger.fits(dc, placer.occupied(workload, s), demand));
        let Some(slot) = slot else {
            continue;
        };
        let candidate = placer.place(workload, dc, slot)?;
        best = match best {
            Some(b) if placer.cheaper(&b, &candidate).is_le() => Some(b),
            _ => Some(candidate),
        };
    }
    Ok(best)
}
