//! Side-by-side algorithm comparison.
//!
//! FCFS runs once and serves as the baseline for every algorithm's
//! metrics, whether or not FCFS itself was requested. Each requested
//! algorithm gets a fresh scheduler instance and is timed around its
//! `schedule` call only.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::metrics::{MetricsCalculator, ScheduleMetrics};
use super::{AlgorithmKind, SchedulingProblem};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::Schedule;

/// Outcome of one algorithm in a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmResult {
    pub algorithm: AlgorithmKind,
    pub schedule: Schedule,
    pub metrics: ScheduleMetrics,
}

/// Outcome of a comparison run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// One entry per requested algorithm, in request order.
    pub results: Vec<AlgorithmResult>,
    /// Lowest total emissions; ties go to the faster run.
    pub best_algorithm: AlgorithmKind,
    pub workload_count: usize,
}

impl ComparisonResult {
    /// Result for an algorithm, if it was run.
    pub fn result(&self, algorithm: AlgorithmKind) -> Option<&AlgorithmResult> {
        self.results.iter().find(|r| r.algorithm == algorithm)
    }

    /// The winning result.
    pub fn best(&self) -> Option<&AlgorithmResult> {
        self.result(self.best_algorithm)
    }
}

/// Runs several algorithms over one problem.
#[derive(Debug, Clone, Default)]
pub struct ComparisonRunner {
    config: EngineConfig,
}

impl ComparisonRunner {
    /// Creates a runner.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Compares `algorithms` (all four when empty) on `problem`.
    ///
    /// Duplicate entries are run once.
    pub fn run(
        &self,
        problem: &SchedulingProblem<'_>,
        algorithms: &[AlgorithmKind],
    ) -> Result<ComparisonResult> {
        let requested = dedup(if algorithms.is_empty() {
            &AlgorithmKind::ALL[..]
        } else {
            algorithms
        });

        let (baseline, baseline_ms) = self.timed(AlgorithmKind::Fcfs, problem)?;

        let mut results = Vec::with_capacity(requested.len());
        for kind in requested {
            let (schedule, elapsed_ms) = if kind == AlgorithmKind::Fcfs {
                (baseline.clone(), baseline_ms)
            } else {
                self.timed(kind, problem)?
            };
            let metrics = MetricsCalculator::calculate(
                &schedule,
                Some(&baseline),
                problem.datacenters,
                elapsed_ms,
                self.config.green_threshold_pct,
            );
            info!(
                algorithm = kind.id(),
                total_carbon = metrics.carbon.total_carbon_optimized,
                percent_reduction = metrics.carbon.percent_reduction,
                execution_time_ms = elapsed_ms,
                "algorithm compared"
            );
            results.push(AlgorithmResult {
                algorithm: kind,
                schedule,
                metrics,
            });
        }

        let best_algorithm = results
            .iter()
            .min_by(|a, b| rank(&a.metrics, &b.metrics))
            .map_or(AlgorithmKind::Fcfs, |r| r.algorithm);

        Ok(ComparisonResult {
            results,
            best_algorithm,
            workload_count: problem.workloads.len(),
        })
    }

    fn timed(&self, kind: AlgorithmKind, problem: &SchedulingProblem<'_>) -> Result<(Schedule, f64)> {
        let scheduler = kind.scheduler(&self.config);
        let started = Instant::now();
        let schedule = scheduler.schedule(problem)?;
        Ok((schedule, started.elapsed().as_secs_f64() * 1000.0))
    }
}

/// Orders by total emissions, then execution time.
fn rank(a: &ScheduleMetrics, b: &ScheduleMetrics) -> std::cmp::Ordering {
    let (ca, cb) = (a.carbon.total_carbon_optimized, b.carbon.total_carbon_optimized);
    let tolerance = 1e-9 * ca.abs().max(cb.abs()).max(1.0);
    if (ca - cb).abs() <= tolerance {
        a.performance
            .execution_time_ms
            .total_cmp(&b.performance.execution_time_ms)
    } else {
        ca.total_cmp(&cb)
    }
}

fn dedup(kinds: &[AlgorithmKind]) -> Vec<AlgorithmKind> {
    let mut seen = Vec::with_capacity(kinds.len());
    for &k in kinds {
        if !seen.contains(&k) {
            seen.push(k);
        }
    }
    seen
}
