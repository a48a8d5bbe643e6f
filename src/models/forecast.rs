//! Carbon-intensity forecast model.
//!
//! A [`ForecastSnapshot`] is an immutable, per-datacenter, time-ascending
//! series of [`ForecastPoint`]s captured once per run. Every scheduler and
//! the metrics layer read intensities from the same snapshot, which is what
//! makes runs deterministic against a live, time-varying feed.
//!
//! # Sampling
//! Between two points values are interpolated linearly. Before the first
//! point or after the last, the nearest boundary value is used; there is no
//! extrapolation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single forecast sample for one datacenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Datacenter the sample belongs to.
    pub datacenter_id: String,
    /// Sample time.
    pub timestamp: DateTime<Utc>,
    /// Grid carbon intensity (gCO2/kWh, >= 0).
    pub intensity_gco2_per_kwh: f64,
    /// Share of supply from renewables (0..=100).
    pub renewable_percentage: f64,
}

impl ForecastPoint {
    /// Creates a forecast point.
    pub fn new(
        datacenter_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        intensity_gco2_per_kwh: f64,
        renewable_percentage: f64,
    ) -> Self {
        Self {
            datacenter_id: datacenter_id.into(),
            timestamp,
            intensity_gco2_per_kwh,
            renewable_percentage,
        }
    }
}

/// Immutable forecast snapshot for one scheduling run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastSnapshot {
    /// Capture time. The slot grid starts here.
    pub taken_at: DateTime<Utc>,
    /// Datacenter ID → time-ascending points.
    pub series: BTreeMap<String, Vec<ForecastPoint>>,
}

impl ForecastSnapshot {
    /// Creates an empty snapshot captured at `taken_at`.
    pub fn new(taken_at: DateTime<Utc>) -> Self {
        Self {
            taken_at,
            series: BTreeMap::new(),
        }
    }

    /// Adds (or replaces) the series for one datacenter.
    ///
    /// Points must already be in ascending timestamp order; they are stored
    /// as given.
    pub fn with_series(mut self, datacenter_id: impl Into<String>, points: Vec<ForecastPoint>) -> Self {
        self.series.insert(datacenter_id.into(), points);
        self
    }

    /// Builds a snapshot from a flat list of points, grouped by datacenter
    /// in input order.
    pub fn from_points(taken_at: DateTime<Utc>, points: Vec<ForecastPoint>) -> Self {
        let mut snapshot = Self::new(taken_at);
        for p in points {
            snapshot
                .series
                .entry(p.datacenter_id.clone())
                .or_default()
                .push(p);
        }
        snapshot
    }

    /// Builds a constant-intensity snapshot: one point per datacenter at
    /// `taken_at`.
    pub fn constant(taken_at: DateTime<Utc>, values: &[(&str, f64, f64)]) -> Self {
        let mut snapshot = Self::new(taken_at);
        for &(id, intensity, renewable) in values {
            snapshot.series.insert(
                id.to_string(),
                vec![ForecastPoint::new(id, taken_at, intensity, renewable)],
            );
        }
        snapshot
    }

    /// Points for a datacenter, if any.
    pub fn points(&self, datacenter_id: &str) -> Option<&[ForecastPoint]> {
        self.series
            .get(datacenter_id)
            .map(Vec::as_slice)
            .filter(|p| !p.is_empty())
    }

    /// Whether the snapshot has at least one point for the datacenter.
    pub fn has_coverage(&self, datacenter_id: &str) -> bool {
        self.points(datacenter_id).is_some()
    }

    /// Whether the series for a datacenter reaches `until`.
    pub fn covers(&self, datacenter_id: &str, until: DateTime<Utc>) -> bool {
        self.points(datacenter_id)
            .and_then(|p| p.last())
            .is_some_and(|last| last.timestamp >= until)
    }

    /// Carbon intensity at `at` (gCO2/kWh). `None` if the datacenter has no
    /// points.
    pub fn intensity_at(&self, datacenter_id: &str, at: DateTime<Utc>) -> Option<f64> {
        self.sample(datacenter_id, at, |p| p.intensity_gco2_per_kwh)
    }

    /// Renewable percentage at `at`. `None` if the datacenter has no points.
    pub fn renewable_at(&self, datacenter_id: &str, at: DateTime<Utc>) -> Option<f64> {
        self.sample(datacenter_id, at, |p| p.renewable_percentage)
    }

    fn sample(
        &self,
        datacenter_id: &str,
        at: DateTime<Utc>,
        value: impl Fn(&ForecastPoint) -> f64,
    ) -> Option<f64> {
        let points = self.points(datacenter_id)?;

        // First index with timestamp > at
        let upper = points.partition_point(|p| p.timestamp <= at);
        if upper == 0 {
            return Some(value(&points[0]));
        }
        if upper == points.len() {
            return Some(value(&points[points.len() - 1]));
        }

        let lo = &points[upper - 1];
        let hi = &points[upper];
        let span = (hi.timestamp - lo.timestamp).num_milliseconds();
        if span <= 0 {
            return Some(value(lo));
        }
        let frac = (at - lo.timestamp).num_milliseconds() as f64 / span as f64;
        Some(value(lo) + (value(hi) - value(lo)) * frac)
    }
}
