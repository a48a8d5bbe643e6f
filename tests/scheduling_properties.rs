//! Behavioural properties that hold across all four algorithms.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use u_carbon_schedule::engine::CarbonOptimizer;
use u_carbon_schedule::forecast::{ForecastProvider, SyntheticForecastProvider};
use u_carbon_schedule::models::{Datacenter, ForecastPoint, ForecastSnapshot, Schedule, Workload};
use u_carbon_schedule::registry::DatacenterRegistry;
use u_carbon_schedule::scheduler::{
    AlgorithmKind, ComparisonRunner, MetricsCalculator, SchedulingProblem, SlotGrid,
};
use u_carbon_schedule::EngineConfig;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 5, 0, 0, 0).unwrap()
}

fn random_workloads(rng: &mut StdRng, n: usize) -> Vec<Workload> {
    (0..n)
        .map(|i| {
            Workload::new(
                format!("W{i:03}"),
                rng.random_range(1..=16) as f64,
                rng.random_range(1..=64) as f64,
                rng.random_range(1..=8) as f64,
            )
            .with_priority(rng.random_range(1..=10))
            .submitted_at(t0() + Duration::minutes(rng.random_range(0..240)))
        })
        .collect()
}

/// Hourly series with a random walk per datacenter.
fn random_snapshot(rng: &mut StdRng, ids: &[&str]) -> ForecastSnapshot {
    let mut snapshot = ForecastSnapshot::new(t0());
    for id in ids {
        let mut intensity: f64 = rng.random_range(60.0..350.0);
        let points = (0..24)
            .map(|h| {
                intensity = (intensity + rng.random_range(-40.0..40.0)).clamp(20.0, 500.0);
                ForecastPoint::new(*id, t0() + Duration::hours(h), intensity, rng.random_range(5.0..95.0))
            })
            .collect();
        snapshot = snapshot.with_series(*id, points);
    }
    snapshot
}

fn tight_datacenters() -> Vec<Datacenter> {
    vec![
        Datacenter::new("north").with_capacity(24.0, 128.0).with_cost_rate(0.045),
        Datacenter::new("south").with_capacity(16.0, 96.0).with_cost_rate(0.055),
        Datacenter::new("west").with_capacity(20.0, 128.0).with_cost_rate(0.044),
    ]
}

fn run(kind: AlgorithmKind, problem: &SchedulingProblem<'_>) -> Schedule {
    kind.scheduler(&EngineConfig::default()).schedule(problem).unwrap()
}

fn placements(schedule: &Schedule) -> Vec<(String, String, DateTime<Utc>)> {
    schedule
        .assignments
        .iter()
        .map(|a| (a.workload_id.clone(), a.datacenter_id.clone(), a.start_time))
        .collect()
}

#[test]
fn test_each_workload_accounted_for_once() {
    let mut rng = StdRng::seed_from_u64(7);
    let workloads = random_workloads(&mut rng, 30);
    let dcs = tight_datacenters();
    let snapshot = random_snapshot(&mut rng, &["north", "south", "west"]);
    let problem = SchedulingProblem::new(&workloads, &dcs, &snapshot).unwrap();

    for kind in AlgorithmKind::ALL {
        let s = run(kind, &problem);
        let mut seen = HashSet::new();
        for a in &s.assignments {
            assert!(seen.insert(a.workload_id.clone()), "{kind}: {} assigned twice", a.workload_id);
        }
        for id in &s.unscheduled {
            assert!(seen.insert(id.clone()), "{kind}: {id} both placed and unscheduled");
        }
        assert_eq!(seen.len(), workloads.len(), "{kind}");
        assert_eq!(s.summary.tasks_scheduled + s.summary.unscheduled_count, workloads.len());
    }
}

#[test]
fn test_capacity_never_exceeded() {
    let mut rng = StdRng::seed_from_u64(11);
    let workloads = random_workloads(&mut rng, 30);
    let dcs = tight_datacenters();
    let snapshot = random_snapshot(&mut rng, &["north", "south", "west"]);
    let problem = SchedulingProblem::new(&workloads, &dcs, &snapshot).unwrap();
    let grid = SlotGrid::new(t0(), 60, 24);
    let by_id: HashMap<&str, &Workload> = workloads.iter().map(|w| (w.id.as_str(), w)).collect();

    for kind in AlgorithmKind::ALL {
        let s = run(kind, &problem);
        let mut load: HashMap<(String, usize), f64> = HashMap::new();
        for a in &s.assignments {
            let cpu = by_id[a.workload_id.as_str()].cpu_cores;
            for slot in grid.occupied(a.start_time, a.end_time) {
                *load.entry((a.datacenter_id.clone(), slot)).or_default() += cpu;
            }
        }
        for ((dc, slot), cpu) in load {
            let limit = dcs.iter().find(|d| d.id == dc).unwrap().capacity.unwrap().cpu_cores;
            assert!(cpu <= limit + 1e-9, "{kind}: {dc} slot {slot} runs {cpu} > {limit}");
        }
    }
}

#[test]
fn test_metrics_total_matches_assignments() {
    let mut rng = StdRng::seed_from_u64(3);
    let workloads = random_workloads(&mut rng, 25);
    let dcs = tight_datacenters();
    let snapshot = random_snapshot(&mut rng, &["north", "south", "west"]);
    let problem = SchedulingProblem::new(&workloads, &dcs, &snapshot).unwrap();
    let baseline = run(AlgorithmKind::Fcfs, &problem);

    for kind in AlgorithmKind::ALL {
        let s = run(kind, &problem);
        let m = MetricsCalculator::calculate(&s, Some(&baseline), &dcs, 0.0, 50.0);
        let sum: f64 = s.assignments.iter().map(|a| a.carbon_emissions).sum();
        assert!((sum - m.carbon.total_carbon_optimized).abs() < 1e-9);
        let by_dc: f64 = m.distribution.iter().map(|d| d.total_carbon).sum();
        assert!((sum - by_dc).abs() < 1e-6);
        assert!(m.carbon.percent_reduction.is_finite());
    }
}

#[test]
fn test_dp_never_worse_than_greedy() {
    for seed in 0..8 {
        let mut rng = StdRng::seed_from_u64(100 + seed);
        let workloads = random_workloads(&mut rng, 12);
        let dcs = tight_datacenters();
        let snapshot = random_snapshot(&mut rng, &["north", "south", "west"]);
        let problem = SchedulingProblem::new(&workloads, &dcs, &snapshot).unwrap();

        let greedy = run(AlgorithmKind::Greedy, &problem);
        let dp = run(AlgorithmKind::DynamicProgramming, &problem);
        assert!(
            dp.total_carbon() <= greedy.total_carbon() + 1e-9,
            "seed {seed}: dp {} > greedy {}",
            dp.total_carbon(),
            greedy.total_carbon()
        );
        assert!(dp.summary.unscheduled_count <= greedy.summary.unscheduled_count);
    }
}

#[test]
fn test_baselines_ignore_forecast_values() {
    let mut rng = StdRng::seed_from_u64(21);
    let workloads = random_workloads(&mut rng, 20);
    let dcs = tight_datacenters();
    let ids = ["north", "south", "west"];
    let original = random_snapshot(&mut rng, &ids);

    // Same timestamps, intensities shuffled between datacenters and hours.
    let mut values: Vec<f64> = ids
        .iter()
        .flat_map(|id| original.points(id).unwrap().iter().map(|p| p.intensity_gco2_per_kwh))
        .collect();
    values.shuffle(&mut rng);
    let mut values = values.into_iter();
    let mut permuted = ForecastSnapshot::new(t0());
    for id in ids {
        let points = original
            .points(id)
            .unwrap()
            .iter()
            .map(|p| {
                let v = values.next().unwrap();
                ForecastPoint::new(id, p.timestamp, v, p.renewable_percentage)
            })
            .collect();
        permuted = permuted.with_series(id, points);
    }

    for kind in [AlgorithmKind::Fcfs, AlgorithmKind::RoundRobin] {
        let a = run(kind, &SchedulingProblem::new(&workloads, &dcs, &original).unwrap());
        let b = run(kind, &SchedulingProblem::new(&workloads, &dcs, &permuted).unwrap());
        assert_eq!(placements(&a), placements(&b), "{kind}");
        assert_eq!(a.unscheduled, b.unscheduled);
    }
}

#[test]
fn test_idempotent() {
    let mut rng = StdRng::seed_from_u64(5);
    let workloads = random_workloads(&mut rng, 20);
    let dcs = tight_datacenters();
    let snapshot = random_snapshot(&mut rng, &["north", "south", "west"]);
    let problem = SchedulingProblem::new(&workloads, &dcs, &snapshot).unwrap();

    for kind in AlgorithmKind::ALL {
        assert_eq!(run(kind, &problem), run(kind, &problem), "{kind}");
    }
}

#[test]
fn test_input_order_does_not_matter() {
    let mut rng = StdRng::seed_from_u64(9);
    let workloads = random_workloads(&mut rng, 15);
    let dcs = tight_datacenters();
    let snapshot = random_snapshot(&mut rng, &["north", "south", "west"]);
    let mut shuffled = workloads.clone();
    shuffled.shuffle(&mut rng);

    for kind in AlgorithmKind::ALL {
        let a = run(kind, &SchedulingProblem::new(&workloads, &dcs, &snapshot).unwrap());
        let b = run(kind, &SchedulingProblem::new(&shuffled, &dcs, &snapshot).unwrap());
        assert_eq!(a, b, "{kind}");
    }
}

#[test]
fn test_zero_baseline_percent_is_zero() {
    let dcs = vec![Datacenter::new("A"), Datacenter::new("B")];
    let snapshot = ForecastSnapshot::constant(t0(), &[("A", 0.0, 100.0), ("B", 0.0, 100.0)]);
    let workloads = vec![Workload::new("W1", 2.0, 4.0, 1.0).submitted_at(t0())];
    let problem = SchedulingProblem::new(&workloads, &dcs, &snapshot).unwrap();

    let result = ComparisonRunner::default().run(&problem, &[]).unwrap();
    for r in &result.results {
        assert_eq!(r.metrics.carbon.total_carbon_baseline, 0.0);
        assert_eq!(r.metrics.carbon.percent_reduction, 0.0);
    }
}

#[test]
fn test_two_datacenter_scenario() {
    let dcs = vec![
        Datacenter::new("B").with_capacity(32.0, 128.0).with_cost_rate(0.05),
        Datacenter::new("A").with_capacity(32.0, 128.0).with_cost_rate(0.05),
    ];
    let snapshot = ForecastSnapshot::constant(t0(), &[("A", 50.0, 70.0), ("B", 300.0, 20.0)]);
    let workloads = vec![Workload::new("W1", 2.0, 4.0, 1.0).submitted_at(t0())];
    let problem = SchedulingProblem::new(&workloads, &dcs, &snapshot).unwrap();

    assert_eq!(run(AlgorithmKind::Greedy, &problem).assignments[0].datacenter_id, "A");
    assert_eq!(
        run(AlgorithmKind::DynamicProgramming, &problem).assignments[0].datacenter_id,
        "A"
    );
    assert_eq!(run(AlgorithmKind::Fcfs, &problem).assignments[0].datacenter_id, "B");
}

#[test]
fn test_single_datacenter_baselines_agree() {
    let dcs = vec![Datacenter::new("only").with_capacity(64.0, 256.0)];
    let snapshot = ForecastSnapshot::constant(t0(), &[("only", 180.0, 40.0)]);
    let workloads: Vec<Workload> = (0..3)
        .map(|i| Workload::new(format!("W{i}"), 4.0, 8.0, 2.0).submitted_at(t0()))
        .collect();
    let problem = SchedulingProblem::new(&workloads, &dcs, &snapshot).unwrap();

    let fcfs = run(AlgorithmKind::Fcfs, &problem);
    let rr = run(AlgorithmKind::RoundRobin, &problem);
    let set = |s: &Schedule| -> HashSet<(String, String)> {
        s.assignments
            .iter()
            .map(|a| (a.workload_id.clone(), a.datacenter_id.clone()))
            .collect()
    };
    assert_eq!(set(&fcfs), set(&rr));
    assert_eq!(fcfs.assignments.len(), 3);
}

#[test]
fn test_fifty_workload_comparison() {
    let mut rng = StdRng::seed_from_u64(2026);
    let workloads = random_workloads(&mut rng, 50);
    let engine = CarbonOptimizer::new(
        EngineConfig::default(),
        DatacenterRegistry::uk_defaults(),
        SyntheticForecastProvider::uk_defaults().at(t0()),
    )
    .unwrap();

    let result = engine.compare(&workloads, &[], None).unwrap();
    assert_eq!(result.workload_count, 50);
    assert_eq!(result.results.len(), 4);
    let best = result.best().unwrap().metrics.carbon.total_carbon_optimized;
    for r in &result.results {
        assert!(best <= r.metrics.carbon.total_carbon_optimized + 1e-9);
    }

    let greedy = result.result(AlgorithmKind::Greedy).unwrap();
    let dp = result.result(AlgorithmKind::DynamicProgramming).unwrap();
    assert!(dp.metrics.carbon.total_carbon_optimized <= greedy.metrics.carbon.total_carbon_optimized + 1e-9);
    assert!(greedy.metrics.carbon.percent_reduction > 0.0);
}

#[test]
fn test_single_snapshot_per_comparison() {
    let provider = SyntheticForecastProvider::uk_defaults().at(t0());
    let ids = DatacenterRegistry::uk_defaults().ids();
    let snapshot = provider.forecast(&ids, 24).unwrap();
    let dcs = DatacenterRegistry::uk_defaults().all().to_vec();
    let mut rng = StdRng::seed_from_u64(1);
    let workloads = random_workloads(&mut rng, 10);

    let engine = CarbonOptimizer::new(EngineConfig::default(), DatacenterRegistry::uk_defaults(), provider)
        .unwrap();
    let via_provider = engine.compare(&workloads, &[], None).unwrap();
    let via_snapshot = engine.compare_with(&workloads, &dcs, &snapshot, &[]).unwrap();

    for (a, b) in via_provider.results.iter().zip(&via_snapshot.results) {
        assert_eq!(a.schedule, b.schedule);
    }
}
