//! Carbon-unaware baselines.
//!
//! Both process workloads by submission time (then ID), ignore deadlines
//! and never read forecast values to decide placement. Emissions are still
//! priced with the shared model so the results are comparable.
//!
//! - [`FcfsScheduler`]: earliest slot, first datacenter in configured order
//!   with room.
//! - [`RoundRobinScheduler`]: workload `i` goes to datacenter `i mod d`,
//!   deferring to later slots on that datacenter while it is full.

use tracing::info;

use super::grid::Demand;
use super::placement::{submission_order, Placement, Placer};
use super::{AlgorithmKind, CarbonScheduler, SchedulingProblem};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::Schedule;

/// First-come-first-served placement.
#[derive(Debug, Clone, Default)]
pub struct FcfsScheduler {
    config: EngineConfig,
}

impl FcfsScheduler {
    /// Creates an FCFS scheduler.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl CarbonScheduler for FcfsScheduler {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Fcfs
    }

    fn schedule(&self, problem: &SchedulingProblem<'_>) -> Result<Schedule> {
        let placer = Placer::new(*problem, &self.config);
        let order = submission_order(problem.workloads);
        let windows = placer.windows(false);
        let mut ledger = placer.ledger();
        let mut choices: Vec<Option<Placement>> = Vec::with_capacity(order.len());

        for &i in &order {
            let workload = &problem.workloads[i];
            let demand = Demand::of(workload);
            let mut choice = None;
            if let Some(window) = &windows[i] {
                'slots: for slot in window.slots.clone() {
                    for dc in 0..placer.datacenter_count() {
                        let occupied = placer.occupied(workload, slot);
                        if ledger.fits(dc, occupied.clone(), demand) {
                            ledger.reserve(dc, occupied, demand);
                            choice = Some(placer.place(workload, dc, slot)?);
                            break 'slots;
                        }
                    }
                }
            }
            choices.push(choice);
        }

        let schedule = placer.build(AlgorithmKind::Fcfs, &order, &windows, &choices);
        log_complete(&schedule);
        Ok(schedule)
    }
}

/// Round-robin placement across datacenters in configured order.
#[derive(Debug, Clone, Default)]
pub struct RoundRobinScheduler {
    config: EngineConfig,
}

impl RoundRobinScheduler {
    /// Creates a round-robin scheduler.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl CarbonScheduler for RoundRobinScheduler {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::RoundRobin
    }

    fn schedule(&self, problem: &SchedulingProblem<'_>) -> Result<Schedule> {
        let placer = Placer::new(*problem, &self.config);
        let order = submission_order(problem.workloads);
        let windows = placer.windows(false);
        let mut ledger = placer.ledger();
        let d = placer.datacenter_count();
        let mut choices: Vec<Option<Placement>> = Vec::with_capacity(order.len());

        for (position, &i) in order.iter().enumerate() {
            let workload = &problem.workloads[i];
            let demand = Demand::of(workload);
            let dc = position % d;
            let slot = windows[i].as_ref().and_then(|window| {
                window
                    .slots
                    .clone()
                    .find(|&s| ledger.fits(dc, placer.occupied(workload, s), demand))
            });
            let choice = match slot {
                Some(slot) => {
                    ledger.reserve(dc, placer.occupied(workload, slot), demand);
                    Some(placer.place(workload, dc, slot)?)
                }
                None => None,
            };
            choices.push(choice);
        }

        let schedule = placer.build(AlgorithmKind::RoundRobin, &order, &windows, &choices);
        log_complete(&schedule);
        Ok(schedule)
    }
}

fn log_complete(schedule: &Schedule) {
    info!(
        algorithm = schedule.algorithm_used.id(),
        scheduled = schedule.summary.tasks_scheduled,
        unscheduled = schedule.summary.unscheduled_count,
        total_carbon = schedule.total_carbon(),
        "schedule complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Datacenter, ForecastSnapshot, WarningKind, Workload};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap()
    }

    fn run(
        scheduler: &dyn CarbonScheduler,
        workloads: &[Workload],
        dcs: &[Datacenter],
        snapshot: &ForecastSnapshot,
    ) -> Schedule {
        let problem = SchedulingProblem::new(workloads, dcs, snapshot).unwrap();
        scheduler.schedule(&problem).unwrap()
    }

    fn fcfs() -> FcfsScheduler {
        FcfsScheduler::new(EngineConfig::default())
    }

    fn rr() -> RoundRobinScheduler {
        RoundRobinScheduler::new(EngineConfig::default())
    }

    #[test]
    fn test_fcfs_uses_configured_order() {
        let snapshot = ForecastSnapshot::constant(t0(), &[("A", 50.0, 80.0), ("B", 300.0, 20.0)]);
        let dcs = vec![Datacenter::new("B"), Datacenter::new("A")];
        let workloads = vec![Workload::new("W1", 2.0, 4.0, 1.0).submitted_at(t0())];

        let s = run(&fcfs(), &workloads, &dcs, &snapshot);
        assert_eq!(s.assignments[0].datacenter_id, "B");
        assert!((s.assignments[0].carbon_intensity - 300.0).abs() < 1e-10);
    }

    #[test]
    fn test_fcfs_submission_order_ignores_priority() {
        let snapshot = ForecastSnapshot::constant(t0(), &[("A", 100.0, 0.0)]);
        let dcs = vec![Datacenter::new("A")];
        let workloads = vec![
            Workload::new("late", 1.0, 1.0, 1.0)
                .with_priority(10)
                .submitted_at(t0() + Duration::minutes(5)),
            Workload::new("early", 1.0, 1.0, 1.0).with_priority(1).submitted_at(t0()),
        ];

        let s = run(&fcfs(), &workloads, &dcs, &snapshot);
        assert_eq!(s.assignments[0].workload_id, "early");
        assert_eq!(s.assignments[1].workload_id, "late");
        assert_eq!(s.assignments[1].start_time, t0() + Duration::minutes(5));
    }

    #[test]
    fn test_fcfs_spills_then_defers() {
        let snapshot = ForecastSnapshot::constant(t0(), &[("A", 100.0, 0.0), ("B", 100.0, 0.0)]);
        let dcs = vec![
            Datacenter::new("A").with_capacity(4.0, 64.0),
            Datacenter::new("B").with_capacity(4.0, 64.0),
        ];
        let workloads: Vec<Workload> = (0..3)
            .map(|i| Workload::new(format!("W{i}"), 4.0, 8.0, 1.0).submitted_at(t0()))
            .collect();

        let s = run(&fcfs(), &workloads, &dcs, &snapshot);
        let w0 = s.assignment_for_workload("W0").unwrap();
        let w1 = s.assignment_for_workload("W1").unwrap();
        let w2 = s.assignment_for_workload("W2").unwrap();
        assert_eq!((w0.datacenter_id.as_str(), w0.start_time), ("A", t0()));
        assert_eq!((w1.datacenter_id.as_str(), w1.start_time), ("B", t0()));
        assert_eq!(
            (w2.datacenter_id.as_str(), w2.start_time),
            ("A", t0() + Duration::hours(1))
        );
    }

    #[test]
    fn test_fcfs_ignores_deadline() {
        let snapshot = ForecastSnapshot::constant(t0(), &[("A", 100.0, 0.0)]);
        let dcs = vec![Datacenter::new("A")];
        let workloads = vec![Workload::new("W1", 1.0, 1.0, 4.0)
            .submitted_at(t0())
            .with_deadline(t0() + Duration::hours(1))];

        let s = run(&fcfs(), &workloads, &dcs, &snapshot);
        assert_eq!(s.assignments.len(), 1);
        assert!(s.warnings.is_empty());
    }

    #[test]
    fn test_round_robin_cycles() {
        let snapshot = ForecastSnapshot::constant(
            t0(),
            &[("A", 100.0, 0.0), ("B", 200.0, 0.0), ("C", 300.0, 0.0)],
        );
        let dcs = vec![Datacenter::new("A"), Datacenter::new("B"), Datacenter::new("C")];
        let workloads: Vec<Workload> = (0..5)
            .map(|i| {
                Workload::new(format!("W{i}"), 1.0, 1.0, 1.0)
                    .submitted_at(t0() + Duration::minutes(i))
            })
            .collect();

        let s = run(&rr(), &workloads, &dcs, &snapshot);
        let placed: Vec<&str> = s.assignments.iter().map(|a| a.datacenter_id.as_str()).collect();
        assert_eq!(placed, vec!["A", "B", "C", "A", "B"]);
    }

    #[test]
    fn test_round_robin_defers_on_same_datacenter() {
        let snapshot = ForecastSnapshot::constant(t0(), &[("A", 100.0, 0.0), ("B", 100.0, 0.0)]);
        let dcs = vec![
            Datacenter::new("A").with_capacity(2.0, 64.0),
            Datacenter::new("B"),
        ];
        let workloads: Vec<Workload> = (0..3)
            .map(|i| Workload::new(format!("W{i}"), 2.0, 1.0, 1.0).submitted_at(t0()))
            .collect();

        let s = run(&rr(), &workloads, &dcs, &snapshot);
        // W0 → A@0, W1 → B@0, W2 → A but A is full in slot 0.
        let w2 = s.assignment_for_workload("W2").unwrap();
        assert_eq!(w2.datacenter_id, "A");
        assert_eq!(w2.start_time, t0() + Duration::hours(1));
    }

    #[test]
    fn test_round_robin_too_big_for_target() {
        let snapshot = ForecastSnapshot::constant(t0(), &[("A", 100.0, 0.0), ("B", 100.0, 0.0)]);
        let dcs = vec![
            Datacenter::new("A").with_capacity(1.0, 64.0),
            Datacenter::new("B"),
        ];
        let workloads = vec![Workload::new("W0", 2.0, 1.0, 1.0).submitted_at(t0())];

        let s = run(&rr(), &workloads, &dcs, &snapshot);
        assert!(s.is_unscheduled("W0"));
        assert_eq!(s.warnings[0].kind, WarningKind::CapacityExhausted);
    }

    #[test]
    fn test_single_datacenter_same_placement_set() {
        let snapshot = ForecastSnapshot::constant(t0(), &[("A", 100.0, 0.0)]);
        let dcs = vec![Datacenter::new("A")];
        let workloads: Vec<Workload> = (0..3)
            .map(|i| Workload::new(format!("W{i}"), 1.0, 2.0, 1.0).submitted_at(t0()))
            .collect();

        let a = run(&fcfs(), &workloads, &dcs, &snapshot);
        let b = run(&rr(), &workloads, &dcs, &snapshot);
        let placed = |s: &Schedule| {
            let mut v: Vec<(String, String)> = s
                .assignments
                .iter()
                .map(|a| (a.workload_id.clone(), a.datacenter_id.clone()))
                .collect();
            v.sort();
            v
        };
        assert_eq!(placed(&a), placed(&b));
        assert!((a.total_carbon() - b.total_carbon()).abs() < 1e-10);
    }

    #[test]
    fn test_placement_independent_of_forecast_values() {
        let dcs = vec![Datacenter::new("A"), Datacenter::new("B")];
        let workloads: Vec<Workload> = (0..4)
            .map(|i| Workload::new(format!("W{i}"), 1.0, 1.0, 1.0).submitted_at(t0()))
            .collect();
        let clean_a = ForecastSnapshot::constant(t0(), &[("A", 10.0, 0.0), ("B", 500.0, 0.0)]);
        let clean_b = ForecastSnapshot::constant(t0(), &[("A", 500.0, 0.0), ("B", 10.0, 0.0)]);

        let (fcfs, rr) = (fcfs(), rr());
        for scheduler in [&fcfs as &dyn CarbonScheduler, &rr] {
            let x = run(scheduler, &workloads, &dcs, &clean_a);
            let y = run(scheduler, &workloads, &dcs, &clean_b);
            let key = |s: &Schedule| -> Vec<(String, String, DateTime<Utc>)> {
                s.assignments
                    .iter()
                    .map(|a| (a.workload_id.clone(), a.datacenter_id.clone(), a.start_time))
                    .collect()
            };
            assert_eq!(key(&x), key(&y));
        }
    }
}
