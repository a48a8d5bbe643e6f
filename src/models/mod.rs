//! Carbon-scheduling domain models.
//!
//! Inputs ([`Workload`], [`Datacenter`], [`ForecastSnapshot`]) are built by
//! callers before any algorithm runs and are only ever read by the engine.
//! Outputs ([`Schedule`]) are created fresh per invocation.
//!
//! # Domain Mappings
//!
//! | u-carbon-schedule | Batch cloud | HPC | Edge |
//! |-------------------|-------------|-----|------|
//! | Workload | Job / container | Batch job | Inference task |
//! | Datacenter | Region / zone | Cluster | Site |
//! | ForecastSnapshot | Grid carbon feed | Facility meter | Local grid |
//! | Schedule | Placement plan | Job queue | Dispatch plan |

mod datacenter;
mod forecast;
mod schedule;
mod workload;

pub use datacenter::{Capacity, Datacenter};
pub use forecast::{ForecastPoint, ForecastSnapshot};
pub use schedule::{Schedule, ScheduleAssignment, ScheduleSummary, ScheduleWarning, WarningKind};
pub use workload::Workload;
