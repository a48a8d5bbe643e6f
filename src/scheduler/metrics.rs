//! Schedule quality metrics.
//!
//! Derives carbon, cost, renewable, performance and distribution figures
//! from a completed schedule, optionally against a baseline schedule
//! (conventionally FCFS) on the same input.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Carbon saved | baseline − optimized (gCO2) |
//! | Percent reduction | saved / baseline × 100, 0 when baseline is 0 |
//! | Trees equivalent | saved / 21 000 (g absorbed per tree per year) |
//! | Miles saved | saved / 404 (g per passenger-car mile) |
//! | Smartphone charges | saved / 8.22 |
//! | LED bulb hours | saved / 5 |
//! | Green tasks | assignments with renewable share above the threshold |
//!
//! Every ratio returns 0 instead of NaN or infinity.
//!
//! # Reference
//! US EPA, "Greenhouse Gas Equivalencies Calculator" (2023)

use serde::{Deserialize, Serialize};

use crate::models::{Datacenter, Schedule};

/// Grams of CO2 one tree absorbs per year.
pub const GRAMS_PER_TREE_YEAR: f64 = 21_000.0;
/// Grams of CO2 per mile driven by an average passenger car.
pub const GRAMS_PER_MILE: f64 = 404.0;
/// Grams of CO2 per smartphone charge.
pub const GRAMS_PER_SMARTPHONE_CHARGE: f64 = 8.22;
/// Grams of CO2 per hour of a 10 W LED bulb.
pub const GRAMS_PER_LED_HOUR: f64 = 5.0;

/// All metrics for one schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleMetrics {
    pub carbon: CarbonMetrics,
    pub cost: CostMetrics,
    pub renewable: RenewableMetrics,
    pub performance: PerformanceMetrics,
    /// Per-datacenter totals in configured order.
    pub distribution: Vec<DatacenterShare>,
}

/// Emissions and their everyday equivalents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CarbonMetrics {
    /// Sum of assignment emissions (gCO2).
    pub total_carbon_optimized: f64,
    /// Sum of baseline emissions (gCO2); 0 without a baseline.
    pub total_carbon_baseline: f64,
    /// `baseline - optimized`; negative when the schedule is worse.
    pub carbon_saved: f64,
    /// `carbon_saved / baseline * 100`.
    pub percent_reduction: f64,
    pub carbon_per_task: f64,
    pub trees_equivalent: f64,
    pub miles_driven_saved: f64,
    pub smartphone_charges: f64,
    pub led_bulb_hours: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostMetrics {
    pub total_cost: f64,
    pub cost_per_task: f64,
    /// Cost per gram of CO2 emitted.
    pub cost_per_carbon: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RenewableMetrics {
    /// Mean renewable share across assignments (0..=100).
    pub avg_renewable: f64,
    pub min_renewable: f64,
    pub max_renewable: f64,
    /// Assignments whose renewable share is strictly above the threshold.
    pub tasks_on_green_dc: usize,
    /// `tasks_on_green_dc` as a share of assignments (0..=100).
    pub green_percentage: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub tasks_scheduled: usize,
    pub unscheduled_count: usize,
    pub avg_duration_hours: f64,
    pub total_duration_hours: f64,
    pub avg_carbon_intensity: f64,
    /// Wall-clock time of the algorithm run, measured by the caller.
    pub execution_time_ms: f64,
}

/// Totals for one datacenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatacenterShare {
    pub datacenter_id: String,
    pub count: usize,
    pub total_carbon: f64,
    pub total_cost: f64,
}

/// Stateless metrics computation.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Computes metrics for a schedule.
    ///
    /// # Arguments
    /// * `schedule` - The schedule to evaluate.
    /// * `baseline` - Reference schedule on the same input, if any.
    /// * `datacenters` - Datacenters in configured order (distribution order).
    /// * `execution_time_ms` - Measured run time of the algorithm.
    /// * `green_threshold_pct` - Renewable share above which a task is green.
    pub fn calculate(
        schedule: &Schedule,
        baseline: Option<&Schedule>,
        datacenters: &[Datacenter],
        execution_time_ms: f64,
        green_threshold_pct: f64,
    ) -> ScheduleMetrics {
        let n = schedule.assignments.len();

        let optimized = schedule.total_carbon();
        let base = baseline.map_or(0.0, Schedule::total_carbon);
        let saved = if baseline.is_some() { base - optimized } else { 0.0 };
        let carbon = CarbonMetrics {
            total_carbon_optimized: optimized,
            total_carbon_baseline: base,
            carbon_saved: saved,
            percent_reduction: ratio(saved, base) * 100.0,
            carbon_per_task: ratio(optimized, n as f64),
            trees_equivalent: saved / GRAMS_PER_TREE_YEAR,
            miles_driven_saved: saved / GRAMS_PER_MILE,
            smartphone_charges: saved / GRAMS_PER_SMARTPHONE_CHARGE,
            led_bulb_hours: saved / GRAMS_PER_LED_HOUR,
        };

        let total_cost = schedule.total_cost();
        let cost = CostMetrics {
            total_cost,
            cost_per_task: ratio(total_cost, n as f64),
            cost_per_carbon: ratio(total_cost, optimized),
        };

        let renewables = schedule.assignments.iter().map(|a| a.renewable_percentage);
        let green = schedule
            .assignments
            .iter()
            .filter(|a| a.renewable_percentage > green_threshold_pct)
            .count();
        let renewable = RenewableMetrics {
            avg_renewable: schedule.avg_renewable(),
            min_renewable: renewables.clone().reduce(f64::min).unwrap_or(0.0),
            max_renewable: renewables.reduce(f64::max).unwrap_or(0.0),
            tasks_on_green_dc: green,
            green_percentage: ratio(green as f64, n as f64) * 100.0,
        };

        let total_duration: f64 = schedule
            .assignments
            .iter()
            .map(|a| a.duration_hours())
            .sum();
        let performance = PerformanceMetrics {
            tasks_scheduled: n,
            unscheduled_count: schedule.unscheduled.len(),
            avg_duration_hours: ratio(total_duration, n as f64),
            total_duration_hours: total_duration,
            avg_carbon_intensity: schedule.avg_carbon_intensity(),
            execution_time_ms: finite(execution_time_ms),
        };

        let distribution = datacenters
            .iter()
            .map(|dc| {
                let placed = schedule.assignments_for_datacenter(&dc.id);
                DatacenterShare {
                    datacenter_id: dc.id.clone(),
                    count: placed.len(),
                    total_carbon: placed.iter().map(|a| a.carbon_emissions).sum(),
                    total_cost: placed.iter().map(|a| a.cost).sum(),
                }
            })
            .collect();

        ScheduleMetrics {
            carbon,
            cost,
            renewable,
            performance,
            distribution,
        }
    }
}

/// `num / den`, or 0 when the result would not be finite.
fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        return 0.0;
    }
    finite(num / den)
}

fn finite(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScheduleAssignment, ScheduleWarning};
    use crate::scheduler::AlgorithmKind;
    use chrono::{Duration, TimeZone, Utc};

    fn assignment(workload: &str, dc: &str, carbon: f64, cost: f64, renewable: f64) -> ScheduleAssignment {
        let start = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap();
        ScheduleAssignment {
            workload_id: workload.into(),
            datacenter_id: dc.into(),
            start_time: start,
            end_time: start + Duration::hours(2),
            carbon_emissions: carbon,
            cost,
            carbon_intensity: carbon / 2.0,
            renewable_percentage: renewable,
        }
    }

    fn schedule(kind: AlgorithmKind, assignments: Vec<ScheduleAssignment>) -> Schedule {
        let mut s = Schedule::new(kind);
        for a in assignments {
            s.add_assignment(a);
        }
        s
    }

    fn dcs() -> Vec<Datacenter> {
        vec![Datacenter::new("B"), Datacenter::new("A")]
    }

    #[test]
    fn test_carbon_savings() {
        let optimized = schedule(
            AlgorithmKind::Greedy,
            vec![assignment("W1", "A", 100.0, 1.0, 80.0), assignment("W2", "A", 50.0, 1.0, 60.0)],
        );
        let baseline = schedule(
            AlgorithmKind::Fcfs,
            vec![assignment("W1", "B", 300.0, 1.0, 20.0), assignment("W2", "B", 100.0, 1.0, 20.0)],
        );

        let m = MetricsCalculator::calculate(&optimized, Some(&baseline), &dcs(), 3.5, 50.0);
        assert!((m.carbon.total_carbon_optimized - 150.0).abs() < 1e-10);
        assert!((m.carbon.total_carbon_baseline - 400.0).abs() < 1e-10);
        assert!((m.carbon.carbon_saved - 250.0).abs() < 1e-10);
        assert!((m.carbon.percent_reduction - 62.5).abs() < 1e-10);
        assert!((m.carbon.carbon_per_task - 75.0).abs() < 1e-10);
        assert!((m.carbon.miles_driven_saved - 250.0 / 404.0).abs() < 1e-10);
        assert!((m.carbon.trees_equivalent - 250.0 / 21_000.0).abs() < 1e-10);
        assert!((m.carbon.led_bulb_hours - 50.0).abs() < 1e-10);
        assert!((m.performance.execution_time_ms - 3.5).abs() < 1e-10);
    }

    #[test]
    fn test_zero_baseline_no_nan() {
        let empty = Schedule::new(AlgorithmKind::Greedy);
        let baseline = Schedule::new(AlgorithmKind::Fcfs);

        let m = MetricsCalculator::calculate(&empty, Some(&baseline), &dcs(), 0.0, 50.0);
        assert_eq!(m.carbon.percent_reduction, 0.0);
        assert_eq!(m.carbon.carbon_per_task, 0.0);
        assert_eq!(m.cost.cost_per_task, 0.0);
        assert_eq!(m.cost.cost_per_carbon, 0.0);
        assert_eq!(m.renewable.avg_renewable, 0.0);
        assert_eq!(m.renewable.min_renewable, 0.0);
        assert_eq!(m.renewable.green_percentage, 0.0);
        assert_eq!(m.performance.avg_duration_hours, 0.0);
        assert_eq!(m.performance.avg_carbon_intensity, 0.0);
    }

    #[test]
    fn test_without_baseline() {
        let s = schedule(AlgorithmKind::Greedy, vec![assignment("W1", "A", 100.0, 2.0, 80.0)]);
        let m = MetricsCalculator::calculate(&s, None, &dcs(), 1.0, 50.0);
        assert_eq!(m.carbon.total_carbon_baseline, 0.0);
        assert_eq!(m.carbon.carbon_saved, 0.0);
        assert_eq!(m.carbon.percent_reduction, 0.0);
        assert!((m.cost.cost_per_carbon - 0.02).abs() < 1e-10);
    }

    #[test]
    fn test_negative_savings_reported() {
        let worse = schedule(AlgorithmKind::RoundRobin, vec![assignment("W1", "B", 200.0, 1.0, 20.0)]);
        let baseline = schedule(AlgorithmKind::Fcfs, vec![assignment("W1", "A", 100.0, 1.0, 80.0)]);

        let m = MetricsCalculator::calculate(&worse, Some(&baseline), &dcs(), 0.0, 50.0);
        assert!((m.carbon.carbon_saved + 100.0).abs() < 1e-10);
        assert!((m.carbon.percent_reduction + 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_renewable_and_green() {
        let s = schedule(
            AlgorithmKind::Greedy,
            vec![
                assignment("W1", "A", 10.0, 1.0, 80.0),
                assignment("W2", "A", 10.0, 1.0, 50.0),
                assignment("W3", "B", 10.0, 1.0, 20.0),
            ],
        );
        let m = MetricsCalculator::calculate(&s, None, &dcs(), 0.0, 50.0);
        assert!((m.renewable.avg_renewable - 50.0).abs() < 1e-10);
        assert!((m.renewable.min_renewable - 20.0).abs() < 1e-10);
        assert!((m.renewable.max_renewable - 80.0).abs() < 1e-10);
        // 50 is not strictly above the threshold
        assert_eq!(m.renewable.tasks_on_green_dc, 1);
        assert!((m.renewable.green_percentage - 100.0 / 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_distribution_follows_datacenter_order() {
        let mut s = schedule(
            AlgorithmKind::Greedy,
            vec![
                assignment("W1", "A", 10.0, 1.0, 80.0),
                assignment("W2", "A", 30.0, 2.0, 80.0),
            ],
        );
        s.mark_unscheduled(ScheduleWarning::capacity_exhausted("W3", "full"));

        let m = MetricsCalculator::calculate(&s, None, &dcs(), 0.0, 50.0);
        let ids: Vec<&str> = m.distribution.iter().map(|d| d.datacenter_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
        assert_eq!(m.distribution[0].count, 0);
        assert_eq!(m.distribution[1].count, 2);
        assert!((m.distribution[1].total_carbon - 40.0).abs() < 1e-10);
        assert!((m.distribution[1].total_cost - 3.0).abs() < 1e-10);
        assert_eq!(m.performance.unscheduled_count, 1);
        assert!((m.performance.total_duration_hours - 4.0).abs() < 1e-10);
        assert!((m.performance.avg_duration_hours - 2.0).abs() < 1e-10);
    }
}
