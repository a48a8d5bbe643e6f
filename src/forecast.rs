//! Forecast acquisition.
//!
//! Providers sit outside the scheduling boundary: the engine asks once per
//! request for a [`ForecastSnapshot`] and every algorithm reads from that
//! snapshot only. Providers must return points in ascending timestamp
//! order; the engine does not sort or de-duplicate them.
//!
//! - [`StaticForecastProvider`]: serves a fixed snapshot (tests, replays).
//! - [`SyntheticForecastProvider`]: offline fallback with per-region
//!   baselines and a repeating 8-hour swing.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, DurationRound, Utc};
use tracing::debug;

use crate::error::ForecastError;
use crate::models::{ForecastPoint, ForecastSnapshot};

/// Floor applied to synthetic intensities (gCO2/kWh).
pub const MIN_CARBON_THRESHOLD: f64 = 50.0;

/// Source of carbon-intensity data.
pub trait ForecastProvider: Send + Sync + fmt::Debug {
    /// Current sample per datacenter.
    fn current(&self, datacenter_ids: &[String])
        -> Result<BTreeMap<String, ForecastPoint>, ForecastError>;

    /// Forecast covering at least `hours` from now, one series per
    /// datacenter.
    fn forecast(&self, datacenter_ids: &[String], hours: u32)
        -> Result<ForecastSnapshot, ForecastError>;
}

/// Serves a fixed snapshot.
#[derive(Debug, Clone)]
pub struct StaticForecastProvider {
    snapshot: ForecastSnapshot,
}

impl StaticForecastProvider {
    pub fn new(snapshot: ForecastSnapshot) -> Self {
        Self { snapshot }
    }
}

impl ForecastProvider for StaticForecastProvider {
    fn current(
        &self,
        datacenter_ids: &[String],
    ) -> Result<BTreeMap<String, ForecastPoint>, ForecastError> {
        let at = self.snapshot.taken_at;
        datacenter_ids
            .iter()
            .map(|id| {
                let missing = || ForecastError::MissingDatacenter(id.clone());
                let intensity = self.snapshot.intensity_at(id, at).ok_or_else(missing)?;
                let renewable = self.snapshot.renewable_at(id, at).ok_or_else(missing)?;
                Ok((id.clone(), ForecastPoint::new(id.as_str(), at, intensity, renewable)))
            })
            .collect()
    }

    /// Returns the stored series for the requested datacenters. `hours` is
    /// not enforced: short series are clamped at sampling time.
    fn forecast(
        &self,
        datacenter_ids: &[String],
        _hours: u32,
    ) -> Result<ForecastSnapshot, ForecastError> {
        let mut snapshot = ForecastSnapshot::new(self.snapshot.taken_at);
        for id in datacenter_ids {
            let points = self
                .snapshot
                .points(id)
                .ok_or_else(|| ForecastError::MissingDatacenter(id.clone()))?;
            snapshot = snapshot.with_series(id.as_str(), points.to_vec());
        }
        Ok(snapshot)
    }
}

/// Per-region baseline of the synthetic feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionBaseline {
    pub intensity: f64,
    pub renewable: f64,
}

/// Hourly synthetic forecast.
///
/// Hour `h` of the forecast carries `baseline + (h % 8 - 4) * 10`
/// gCO2/kWh, floored at [`MIN_CARBON_THRESHOLD`]. Renewable share stays at
/// the baseline.
#[derive(Debug, Clone)]
pub struct SyntheticForecastProvider {
    baselines: BTreeMap<String, RegionBaseline>,
    origin: Option<DateTime<Utc>>,
}

impl SyntheticForecastProvider {
    /// Creates a provider with no regions.
    pub fn new() -> Self {
        Self {
            baselines: BTreeMap::new(),
            origin: None,
        }
    }

    /// Baselines for the six UK default regions.
    pub fn uk_defaults() -> Self {
        [
            ("UK-Scotland", 85.0, 80.0),
            ("UK-North", 145.0, 55.0),
            ("UK-Wales", 195.0, 42.0),
            ("UK-Midlands", 180.0, 45.0),
            ("UK-East", 165.0, 50.0),
            ("UK-South", 230.0, 35.0),
        ]
        .into_iter()
        .fold(Self::new(), |p, (id, intensity, renewable)| {
            p.with_region(id, intensity, renewable)
        })
    }

    /// Adds or replaces a region baseline.
    pub fn with_region(mut self, id: impl Into<String>, intensity: f64, renewable: f64) -> Self {
        self.baselines
            .insert(id.into(), RegionBaseline { intensity, renewable });
        self
    }

    /// Pins the forecast origin instead of the current hour.
    pub fn at(mut self, origin: DateTime<Utc>) -> Self {
        self.origin = Some(origin);
        self
    }

    fn origin(&self) -> DateTime<Utc> {
        self.origin.unwrap_or_else(|| {
            let now = Utc::now();
            now.duration_trunc(Duration::hours(1)).unwrap_or(now)
        })
    }

    fn baseline(&self, id: &str) -> Result<RegionBaseline, ForecastError> {
        self.baselines
            .get(id)
            .copied()
            .ok_or_else(|| ForecastError::MissingDatacenter(id.to_string()))
    }
}

impl Default for SyntheticForecastProvider {
    fn default() -> Self {
        Self::uk_defaults()
    }
}

/// Synthetic intensity for hour `h` of the forecast.
pub fn synthetic_intensity(baseline: f64, hour: u32) -> f64 {
    let variation = (f64::from(hour % 8) - 4.0) * 10.0;
    (baseline + variation).max(MIN_CARBON_THRESHOLD)
}

impl ForecastProvider for SyntheticForecastProvider {
    fn current(
        &self,
        datacenter_ids: &[String],
    ) -> Result<BTreeMap<String, ForecastPoint>, ForecastError> {
        let at = self.origin();
        datacenter_ids
            .iter()
            .map(|id| {
                let b = self.baseline(id)?;
                Ok((id.clone(), ForecastPoint::new(id.as_str(), at, b.intensity, b.renewable)))
            })
            .collect()
    }

    fn forecast(
        &self,
        datacenter_ids: &[String],
        hours: u32,
    ) -> Result<ForecastSnapshot, ForecastError> {
        let origin = self.origin();
        let mut snapshot = ForecastSnapshot::new(origin);
        for id in datacenter_ids {
            let b = self.baseline(id)?;
            let points = (0..hours.max(1))
                .map(|h| {
                    ForecastPoint::new(
                        id.as_str(),
                        origin + Duration::hours(i64::from(h)),
                        synthetic_intensity(b.intensity, h),
                        b.renewable,
                    )
                })
                .collect();
            snapshot = snapshot.with_series(id.as_str(), points);
        }
        debug!(
            datacenters = datacenter_ids.len(),
            hours,
            "synthetic forecast generated"
        );
        Ok(snapshot)
    }
}
