//! Shared placement plumbing: processing orders, candidate pricing and
//! assignment construction.

use std::cmp::Ordering;
use std::ops::Range;

use chrono::{DateTime, Utc};

use super::emission::{estimate, Estimate};
use super::grid::{CapacityLedger, SlotGrid, StartWindow};
use super::{AlgorithmKind, SchedulingProblem};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::{Schedule, ScheduleAssignment, ScheduleWarning, Workload};

/// A priced (datacenter, slot) candidate for one workload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Placement {
    /// Datacenter index in problem order.
    pub dc: usize,
    /// Start slot.
    pub slot: usize,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub estimate: Estimate,
}

/// Per-run pricing context.
#[derive(Debug, Clone)]
pub(crate) struct Placer<'a> {
    pub problem: SchedulingProblem<'a>,
    pub grid: SlotGrid,
    config: &'a EngineConfig,
}

impl<'a> Placer<'a> {
    pub fn new(problem: SchedulingProblem<'a>, config: &'a EngineConfig) -> Self {
        Self {
            grid: SlotGrid::from_config(problem.snapshot.taken_at, config),
            problem,
            config,
        }
    }

    pub fn datacenter_count(&self) -> usize {
        self.problem.datacenters.len()
    }

    /// A full ledger for this run.
    pub fn ledger(&self) -> CapacityLedger {
        CapacityLedger::new(
            self.problem.datacenters,
            self.grid.slot_count(),
            self.config.enforce_capacity,
        )
    }

    /// Start windows indexed like `problem.workloads`.
    pub fn windows(&self, respect_deadline: bool) -> Vec<Option<StartWindow>> {
        self.problem
            .workloads
            .iter()
            .map(|w| self.grid.window(w, respect_deadline))
            .collect()
    }

    /// Prices `workload` on datacenter `dc` starting in `slot`.
    pub fn place(&self, workload: &Workload, dc: usize, slot: usize) -> Result<Placement> {
        let start = self.grid.start_in_slot(workload, slot);
        let estimate = estimate(
            workload,
            &self.problem.datacenters[dc],
            self.problem.snapshot,
            start,
            &self.config.power_model,
        )?;
        Ok(Placement {
            dc,
            slot,
            start,
            end: start + workload.duration(),
            estimate,
        })
    }

    /// Slots a run started in `slot` occupies.
    pub fn occupied(&self, workload: &Workload, slot: usize) -> Range<usize> {
        let start = self.grid.start_in_slot(workload, slot);
        self.grid.occupied(start, start + workload.duration())
    }

    /// Carbon-first ordering: emissions, then cost, then datacenter ID.
    pub fn cheaper(&self, a: &Placement, b: &Placement) -> Ordering {
        a.estimate
            .carbon_emissions
            .total_cmp(&b.estimate.carbon_emissions)
            .then_with(|| a.estimate.cost.total_cmp(&b.estimate.cost))
            .then_with(|| {
                self.problem.datacenters[a.dc]
                    .id
                    .cmp(&self.problem.datacenters[b.dc].id)
            })
            .then_with(|| a.slot.cmp(&b.slot))
    }

    pub fn assignment(&self, workload: &Workload, p: &Placement) -> ScheduleAssignment {
        ScheduleAssignment {
            workload_id: workload.id.clone(),
            datacenter_id: self.problem.datacenters[p.dc].id.clone(),
            start_time: p.start,
            end_time: p.end,
            carbon_emissions: p.estimate.carbon_emissions,
            cost: p.estimate.cost,
            carbon_intensity: p.estimate.carbon_intensity,
            renewable_percentage: p.estimate.renewable_percentage,
        }
    }

    /// Warning for a workload that got no placement.
    pub fn unplaced(&self, workload: &Workload, window: Option<&StartWindow>) -> ScheduleWarning {
        match window {
            None => ScheduleWarning::horizon_exceeded(
                &workload.id,
                format!(
                    "Workload '{}' submitted at {} is past the horizon end {}",
                    workload.id,
                    workload.submitted_at,
                    self.grid.horizon_end()
                ),
            ),
            Some(_) => ScheduleWarning::capacity_exhausted(
                &workload.id,
                format!(
                    "No datacenter has room for workload '{}' ({} cores, {} GB) within the horizon",
                    workload.id, workload.cpu_cores, workload.memory_gb
                ),
            ),
        }
    }

    /// Assembles a schedule from per-position choices.
    ///
    /// `choices[k]` is the placement of `workloads[order[k]]`.
    pub fn build(
        &self,
        kind: AlgorithmKind,
        order: &[usize],
        windows: &[Option<StartWindow>],
        choices: &[Option<Placement>],
    ) -> Schedule {
        let mut schedule = Schedule::new(kind);
        for (&i, choice) in order.iter().zip(choices) {
            let workload = &self.problem.workloads[i];
            let window = windows[i].as_ref();
            if window.is_some_and(|w| w.deadline_relaxed) {
                schedule.add_warning(self.deadline_relaxed(workload));
            }
            match choice {
                Some(p) => schedule.add_assignment(self.assignment(workload, p)),
                None => schedule.mark_unscheduled(self.unplaced(workload, window)),
            }
        }
        schedule
    }

    pub fn deadline_relaxed(&self, workload: &Workload) -> ScheduleWarning {
        ScheduleWarning::deadline_relaxed(
            &workload.id,
            format!(
                "No start slot lets workload '{}' finish by its deadline; deadline ignored",
                workload.id
            ),
        )
    }
}

/// Indices sorted by priority (descending), then submission time, then ID.
pub(crate) fn priority_order(workloads: &[Workload]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..workloads.len()).collect();
    indices.sort_by(|&a, &b| {
        let (wa, wb) = (&workloads[a], &workloads[b]);
        wb.priority
            .cmp(&wa.priority)
            .then_with(|| wa.submitted_at.cmp(&wb.submitted_at))
            .then_with(|| wa.id.cmp(&wb.id))
    });
    indices
}

/// Indices sorted by submission time, then ID.
pub(crate) fn submission_order(workloads: &[Workload]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..workloads.len()).collect();
    indices.sort_by(|&a, &b| {
        let (wa, wb) = (&workloads[a], &workloads[b]);
        wa.submitted_at
            .cmp(&wb.submitted_at)
            .then_with(|| wa.id.cmp(&wb.id))
    });
    indices
}
