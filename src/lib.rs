//! Carbon-aware workload scheduling.
//!
//! Assigns compute workloads to geographically distributed datacenters and
//! start times so as to minimize cumulative carbon emissions, given
//! per-datacenter carbon-intensity forecasts, and measures the result
//! against carbon-unaware baselines.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Workload`, `Datacenter`, `ForecastSnapshot`,
//!   `Schedule`, `ScheduleAssignment`, `ScheduleWarning`
//! - **`scheduler`**: Greedy, dynamic-programming, FCFS and round-robin
//!   algorithms, the shared emission model, metrics and comparison
//! - **`validation`**: Input integrity checks (duplicate IDs, resource
//!   bounds, forecast ordering)
//! - **`engine`**: Request-level entry point (`CarbonOptimizer`)
//! - **`registry`** / **`forecast`**: Datacenter list and forecast providers
//! - **`config`** / **`error`** / **`telemetry`**: Ambient plumbing
//!
//! # Example
//!
//! ```
//! use u_carbon_schedule::engine::CarbonOptimizer;
//! use u_carbon_schedule::models::Workload;
//! use u_carbon_schedule::scheduler::AlgorithmKind;
//!
//! let engine = CarbonOptimizer::uk_defaults();
//! let workloads = vec![
//!     Workload::new("etl", 8.0, 32.0, 2.0),
//!     Workload::new("train", 16.0, 64.0, 6.0).with_priority(8),
//! ];
//! let comparison = engine.compare(&workloads, &[], None).unwrap();
//! assert_eq!(comparison.results.len(), AlgorithmKind::ALL.len());
//! ```
//!
//! # References
//!
//! - Wiesner et al. (2021), "Let's Wait Awhile: How Temporal Workload
//!   Shifting Can Reduce Carbon Emissions in the Cloud"
//! - Radovanović et al. (2022), "Carbon-Aware Computing for Datacenters"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"

pub mod config;
pub mod engine;
pub mod error;
pub mod forecast;
pub mod models;
pub mod registry;
pub mod scheduler;
pub mod telemetry;
pub mod validation;

pub use config::{EngineConfig, PowerModel};
pub use engine::{CarbonOptimizer, Optimization};
pub use error::{ConfigurationError, EngineError, ForecastError, Result};
pub use scheduler::{AlgorithmKind, CarbonScheduler, ComparisonResult, SchedulingProblem};
