//! Forecast-aware dynamic-programming scheduler.
//!
//! # Algorithm
//!
//! Workloads are processed in the same order as Greedy (priority
//! descending, then submission time, then ID). For workload `k` the cost
//! matrix holds every (datacenter, start slot) cell inside its window whose
//! datacenter could ever admit it, priced with the shared emission model
//! and sorted cheapest first.
//!
//! The state is `(k, remaining capacity per datacenter per slot)`. From a
//! state the search either assigns workload `k` to a cell that still fits
//! (reserving capacity over every slot the run overlaps) or leaves it
//! unscheduled. It minimizes total emissions, breaking ties on the number
//! of unscheduled workloads, and never leaves more workloads unscheduled
//! than Greedy does on the same input.
//!
//! Search is depth-first branch and bound:
//!
//! - The incumbent is seeded with the Greedy solution, so the result never
//!   emits more than Greedy.
//! - Lower bound: cheapest-cell emissions of every remaining workload, less
//!   the largest remaining cell cost for each unscheduled slot still
//!   allowed.
//! - Memo: `(k, capacity fingerprint)` records the best prefix seen; a
//!   state reached again with a prefix that is no better is dropped.
//!
//! Without capacity limits the first descent already reaches the bound
//! and the search ends immediately. Expansion is capped by
//! `dp_node_limit`; on reaching it the best solution found so far is
//! returned.
//!
//! # Complexity
//! Worst case O(n·T²·D²) cell evaluations per frontier, bounded in
//! practice by the node limit.
//!
//! # Reference
//! Wiesner et al. (2021), "Let's Wait Awhile: How Temporal Workload
//! Shifting Can Reduce Carbon Emissions in the Cloud", Middleware '21

use std::collections::HashMap;
use std::ops::Range;

use tracing::{debug, info, warn};

use super::greedy;
use super::grid::{CapacityLedger, Demand, StartWindow};
use super::placement::{priority_order, Placement, Placer};
use super::{AlgorithmKind, CarbonScheduler, SchedulingProblem};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::Schedule;

const EPSILON: f64 = 1e-9;

/// Minimum-total-emission placement over the whole batch.
#[derive(Debug, Clone, Default)]
pub struct DpScheduler {
    config: EngineConfig,
}

impl DpScheduler {
    /// Creates a DP scheduler.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl CarbonScheduler for DpScheduler {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::DynamicProgramming
    }

    fn schedule(&self, problem: &SchedulingProblem<'_>) -> Result<Schedule> {
        let placer = Placer::new(*problem, &self.config);
        let order = priority_order(problem.workloads);
        let windows = placer.windows(true);

        let seed = greedy::plan(&placer, &order, &windows)?;
        let cells = cost_matrix(&placer, &order, &windows)?;

        let mut search = Search::new(cells, seed, placer.ledger(), self.config.dp_node_limit);
        search.run();
        if search.truncated {
            warn!(
                nodes = search.nodes,
                limit = self.config.dp_node_limit,
                "dp search hit node limit; returning best solution found"
            );
        }
        debug!(
            nodes = search.nodes,
            memo = search.memo.len(),
            improved = search.improved,
            "dp search finished"
        );

        let schedule = placer.build(
            AlgorithmKind::DynamicProgramming,
            &order,
            &windows,
            &search.best,
        );
        info!(
            algorithm = "dp",
            scheduled = schedule.summary.tasks_scheduled,
            unscheduled = schedule.summary.unscheduled_count,
            total_carbon = schedule.total_carbon(),
            "schedule complete"
        );
        Ok(schedule)
    }
}

/// A priced cell with the slots its run occupies.
#[derive(Debug, Clone)]
struct Cell {
    placement: Placement,
    occupied: Range<usize>,
    demand: Demand,
}

/// Per-position candidate cells, cheapest first.
fn cost_matrix(
    placer: &Placer<'_>,
    order: &[usize],
    windows: &[Option<StartWindow>],
) -> Result<Vec<Vec<Cell>>> {
    let ledger = placer.ledger();
    let mut matrix = Vec::with_capacity(order.len());

    for &i in order {
        let workload = &placer.problem.workloads[i];
        let demand = Demand::of(workload);
        let mut cells = Vec::new();
        if let Some(window) = &windows[i] {
            for dc in (0..placer.datacenter_count()).filter(|&dc| ledger.admits(dc, demand)) {
                for slot in window.slots.clone() {
                    cells.push(Cell {
                        placement: placer.place(workload, dc, slot)?,
                        occupied: placer.occupied(workload, slot),
                        demand,
                    });
                }
            }
        }
        cells.sort_by(|a, b| placer.cheaper(&a.placement, &b.placement));
        matrix.push(cells);
    }
    Ok(matrix)
}

/// Objective value: emissions first, then unscheduled count.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Score {
    carbon: f64,
    unscheduled: usize,
}

impl Score {
    const ZERO: Score = Score {
        carbon: 0.0,
        unscheduled: 0,
    };

    fn of(choices: &[Option<Placement>]) -> Self {
        choices.iter().fold(Self::ZERO, |acc, c| match c {
            Some(p) => acc.assign(p.estimate.carbon_emissions),
            None => acc.skip(),
        })
    }

    fn assign(self, carbon: f64) -> Self {
        Self {
            carbon: self.carbon + carbon,
            ..self
        }
    }

    fn skip(self) -> Self {
        Self {
            unscheduled: self.unscheduled + 1,
            ..self
        }
    }

    /// Strictly better.
    fn beats(&self, other: &Score) -> bool {
        if self.carbon < other.carbon - EPSILON {
            return true;
        }
        self.carbon <= other.carbon + EPSILON && self.unscheduled < other.unscheduled
    }

    /// No worse on either component.
    fn dominates(&self, other: &Score) -> bool {
        self.carbon <= other.carbon + EPSILON && self.unscheduled <= other.unscheduled
    }
}

/// Suffix tables for the lower bound.
#[derive(Debug)]
struct Bounds {
    /// Sum of cheapest-cell emissions over positions `k..`.
    min_carbon: Vec<f64>,
    /// Largest cheapest-cell emission over positions `k..`.
    max_min_carbon: Vec<f64>,
    /// Positions `k..` with no cells at all.
    forced_skips: Vec<usize>,
}

impl Bounds {
    fn new(cells: &[Vec<Cell>]) -> Self {
        let n = cells.len();
        let mut min_carbon = vec![0.0; n + 1];
        let mut max_min_carbon = vec![0.0_f64; n + 1];
        let mut forced_skips = vec![0; n + 1];
        for k in (0..n).rev() {
            match cells[k].first() {
                Some(c) => {
                    let carbon = c.placement.estimate.carbon_emissions;
                    min_carbon[k] = min_carbon[k + 1] + carbon;
                    max_min_carbon[k] = max_min_carbon[k + 1].max(carbon);
                    forced_skips[k] = forced_skips[k + 1];
                }
                None => {
                    min_carbon[k] = min_carbon[k + 1];
                    max_min_carbon[k] = max_min_carbon[k + 1];
                    forced_skips[k] = forced_skips[k + 1] + 1;
                }
            }
        }
        Self {
            min_carbon,
            max_min_carbon,
            forced_skips,
        }
    }
}

#[derive(Debug)]
struct Search {
    cells: Vec<Vec<Cell>>,
    bounds: Bounds,
    ledger: CapacityLedger,
    /// Unscheduled count never to exceed (Greedy's).
    skip_budget: usize,
    best: Vec<Option<Placement>>,
    best_score: Score,
    path: Vec<Option<usize>>,
    memo: HashMap<(usize, u64), Score>,
    node_limit: usize,
    nodes: usize,
    truncated: bool,
    improved: bool,
}

impl Search {
    fn new(
        cells: Vec<Vec<Cell>>,
        seed: Vec<Option<Placement>>,
        ledger: CapacityLedger,
        node_limit: usize,
    ) -> Self {
        let best_score = Score::of(&seed);
        Self {
            bounds: Bounds::new(&cells),
            path: Vec::with_capacity(cells.len()),
            cells,
            ledger,
            skip_budget: best_score.unscheduled,
            best: seed,
            best_score,
            memo: HashMap::new(),
            node_limit,
            nodes: 0,
            truncated: false,
            improved: false,
        }
    }

    fn run(&mut self) {
        self.visit(0, Score::ZERO);
    }

    fn visit(&mut self, k: usize, prefix: Score) {
        if self.nodes >= self.node_limit {
            self.truncated = true;
            return;
        }
        self.nodes += 1;

        if k == self.cells.len() {
            if prefix.beats(&self.best_score) {
                self.record(prefix);
            }
            return;
        }
        if !self.bound(k, prefix).beats(&self.best_score) {
            return;
        }

        let key = (k, self.ledger.fingerprint());
        match self.memo.get(&key) {
            Some(seen) if seen.dominates(&prefix) => return,
            _ => {
                self.memo.insert(key, prefix);
            }
        }

        for c in 0..self.cells[k].len() {
            if self.truncated {
                return;
            }
            let (dc, occupied, demand, carbon) = {
                let cell = &self.cells[k][c];
                (
                    cell.placement.dc,
                    cell.occupied.clone(),
                    cell.demand,
                    cell.placement.estimate.carbon_emissions,
                )
            };
            let next = prefix.assign(carbon);
            if !self.bound(k + 1, next).beats(&self.best_score) {
                // Cells are sorted by emissions; no later cell can do better.
                break;
            }
            if !self.ledger.fits(dc, occupied.clone(), demand) {
                continue;
            }
            self.ledger.reserve(dc, occupied.clone(), demand);
            self.path.push(Some(c));
            self.visit(k + 1, next);
            self.path.pop();
            self.ledger.release(dc, occupied, demand);
        }

        let skipped = prefix.skip();
        if !self.truncated && skipped.unscheduled + self.bounds.forced_skips[k + 1] <= self.skip_budget {
            self.path.push(None);
            self.visit(k + 1, skipped);
            self.path.pop();
        }
    }

    /// Optimistic completion of `prefix` from position `k`.
    fn bound(&self, k: usize, prefix: Score) -> Score {
        let forced = self.bounds.forced_skips[k];
        let optional_skips = self
            .skip_budget
            .saturating_sub(prefix.unscheduled + forced);
        let relief = optional_skips as f64 * self.bounds.max_min_carbon[k];
        Score {
            carbon: prefix.carbon + (self.bounds.min_carbon[k] - relief).max(0.0),
            unscheduled: prefix.unscheduled + forced,
        }
    }

    fn record(&mut self, score: Score) {
        self.best = self
            .path
            .iter()
            .enumerate()
            .map(|(k, c)| c.map(|c| self.cells[k][c].placement))
            .collect();
        self.best_score = score;
        self.improved = true;
    }
}
