//! Request-level entry points.
//!
//! [`CarbonOptimizer`] ties the pieces together for one request:
//!
//! 1. Resolve the datacenter selection against the registry.
//! 2. Capture one forecast snapshot from the provider.
//! 3. Validate workloads, datacenters and snapshot together.
//! 4. Dispatch to the requested algorithm(s) and compute metrics against
//!    the FCFS baseline.
//!
//! The snapshot is captured exactly once per call, so every algorithm in a
//! comparison sees identical data.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::{ConfigurationError, EngineError, Result};
use crate::forecast::{ForecastProvider, SyntheticForecastProvider};
use crate::models::{Datacenter, ForecastSnapshot, Schedule, Workload};
use crate::registry::DatacenterRegistry;
use crate::scheduler::{
    AlgorithmKind, ComparisonResult, ComparisonRunner, MetricsCalculator, ScheduleMetrics,
    SchedulingProblem,
};
use crate::validation::validate_input;

/// Result of a single-algorithm request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Optimization {
    pub schedule: Schedule,
    /// Metrics against `baseline`.
    pub metrics: ScheduleMetrics,
    /// FCFS schedule on the same input.
    pub baseline: Schedule,
}

/// Carbon-aware scheduling engine.
#[derive(Debug)]
pub struct CarbonOptimizer {
    config: EngineConfig,
    registry: DatacenterRegistry,
    provider: Box<dyn ForecastProvider>,
}

impl CarbonOptimizer {
    /// Creates an engine.
    ///
    /// # Errors
    /// [`ConfigurationError::Invalid`] if `config` does not validate.
    pub fn new(
        config: EngineConfig,
        registry: DatacenterRegistry,
        provider: impl ForecastProvider + 'static,
    ) -> std::result::Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self {
            config,
            registry,
            provider: Box::new(provider),
        })
    }

    /// UK default regions with the synthetic offline forecast.
    pub fn uk_defaults() -> Self {
        Self {
            config: EngineConfig::default(),
            registry: DatacenterRegistry::uk_defaults(),
            provider: Box::new(SyntheticForecastProvider::uk_defaults()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &DatacenterRegistry {
        &self.registry
    }

    /// Schedules `workloads` with one algorithm.
    ///
    /// `datacenter_ids` restricts the candidates (registry order is kept);
    /// `None` uses the whole registry.
    ///
    /// # Errors
    /// - [`EngineError::Validation`] for malformed input.
    /// - [`EngineError::Configuration`] for an empty or unknown datacenter
    ///   selection, or too many workloads.
    /// - [`EngineError::Forecast`] / [`EngineError::DataUnavailable`] when
    ///   forecast data cannot be obtained.
    pub fn optimize(
        &self,
        workloads: &[Workload],
        algorithm: AlgorithmKind,
        datacenter_ids: Option<&[String]>,
    ) -> Result<Optimization> {
        let (datacenters, snapshot) = self.prepare(workloads, datacenter_ids)?;
        self.optimize_with(workloads, &datacenters, &snapshot, algorithm)
    }

    /// Runs several algorithms on one snapshot. An empty `algorithms`
    /// slice runs all four.
    ///
    /// # Errors
    /// As [`CarbonOptimizer::optimize`].
    pub fn compare(
        &self,
        workloads: &[Workload],
        algorithms: &[AlgorithmKind],
        datacenter_ids: Option<&[String]>,
    ) -> Result<ComparisonResult> {
        let (datacenters, snapshot) = self.prepare(workloads, datacenter_ids)?;
        self.compare_with(workloads, &datacenters, &snapshot, algorithms)
    }

    /// [`CarbonOptimizer::optimize`] on caller-supplied datacenters and
    /// snapshot, bypassing the registry and provider.
    pub fn optimize_with(
        &self,
        workloads: &[Workload],
        datacenters: &[Datacenter],
        snapshot: &ForecastSnapshot,
        algorithm: AlgorithmKind,
    ) -> Result<Optimization> {
        let problem = self.problem(workloads, datacenters, snapshot)?;

        let (baseline, baseline_ms) = self.timed(AlgorithmKind::Fcfs, &problem)?;
        let (schedule, elapsed_ms) = if algorithm == AlgorithmKind::Fcfs {
            (baseline.clone(), baseline_ms)
        } else {
            self.timed(algorithm, &problem)?
        };

        let metrics = MetricsCalculator::calculate(
            &schedule,
            Some(&baseline),
            datacenters,
            elapsed_ms,
            self.config.green_threshold_pct,
        );
        if schedule.summary.unscheduled_count > 0 {
            warn!(
                algorithm = algorithm.id(),
                unscheduled = schedule.summary.unscheduled_count,
                "some workloads could not be placed"
            );
        }
        info!(
            algorithm = algorithm.id(),
            workloads = workloads.len(),
            datacenters = datacenters.len(),
            carbon_saved = metrics.carbon.carbon_saved,
            percent_reduction = metrics.carbon.percent_reduction,
            "optimization complete"
        );
        Ok(Optimization {
            schedule,
            metrics,
            baseline,
        })
    }

    /// [`CarbonOptimizer::compare`] on caller-supplied datacenters and
    /// snapshot.
    pub fn compare_with(
        &self,
        workloads: &[Workload],
        datacenters: &[Datacenter],
        snapshot: &ForecastSnapshot,
        algorithms: &[AlgorithmKind],
    ) -> Result<ComparisonResult> {
        let problem = self.problem(workloads, datacenters, snapshot)?;
        let result = ComparisonRunner::new(self.config.clone()).run(&problem, algorithms)?;
        info!(
            workloads = workloads.len(),
            algorithms = result.results.len(),
            best = result.best_algorithm.id(),
            "comparison complete"
        );
        Ok(result)
    }

    fn prepare(
        &self,
        workloads: &[Workload],
        datacenter_ids: Option<&[String]>,
    ) -> Result<(Vec<Datacenter>, ForecastSnapshot)> {
        self.check_request_size(workloads)?;
        let datacenters = match datacenter_ids {
            Some(ids) => self.registry.select(ids)?,
            None => self.registry.all().to_vec(),
        };
        if datacenters.is_empty() {
            return Err(ConfigurationError::EmptyDatacenters.into());
        }

        let ids: Vec<String> = datacenters.iter().map(|dc| dc.id.clone()).collect();
        let hours = self.config.horizon_hours().ceil().max(1.0) as u32;
        let snapshot = self.provider.forecast(&ids, hours)?;
        Ok((datacenters, snapshot))
    }

    fn problem<'a>(
        &self,
        workloads: &'a [Workload],
        datacenters: &'a [Datacenter],
        snapshot: &'a ForecastSnapshot,
    ) -> Result<SchedulingProblem<'a>> {
        self.check_request_size(workloads)?;
        if datacenters.is_empty() {
            return Err(ConfigurationError::EmptyDatacenters.into());
        }
        validate_input(workloads, datacenters, snapshot).map_err(EngineError::Validation)?;
        SchedulingProblem::new(workloads, datacenters, snapshot)
    }

    fn timed(&self, kind: AlgorithmKind, problem: &SchedulingProblem<'_>) -> Result<(Schedule, f64)> {
        let scheduler = kind.scheduler(&self.config);
        let started = Instant::now();
        let schedule = scheduler.schedule(problem)?;
        Ok((schedule, started.elapsed().as_secs_f64() * 1000.0))
    }

    fn check_request_size(&self, workloads: &[Workload]) -> Result<()> {
        let max = self.config.max_workloads_per_request;
        if workloads.len() > max {
            return Err(ConfigurationError::TooManyWorkloads {
                count: workloads.len(),
                max,
            }
            .into());
        }
        Ok(())
    }
}
