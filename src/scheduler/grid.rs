//! Time-slot grid and capacity ledger.
//!
//! The horizon `[origin, origin + T * width)` is cut into `T` fixed-width
//! slots. A workload placed in slot `s` starts at the later of its earliest
//! start and the slot's start, and occupies every slot its run overlaps
//! (clipped to the horizon).
//!
//! [`CapacityLedger`] tracks remaining concurrent capacity per
//! (datacenter, slot) cell in a flat, index-addressed arena. Quantities are
//! kept in integer milli-cores and MB so reserve/release are exact and the
//! state can be fingerprinted for memoization.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::ops::Range;

use chrono::{DateTime, Duration, Utc};

use crate::config::EngineConfig;
use crate::models::{Datacenter, Workload};

/// Fixed-width slot discretization of the forecast horizon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotGrid {
    origin: DateTime<Utc>,
    slot_width: Duration,
    slot_count: usize,
}

/// Start slots a workload may use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartWindow {
    /// Candidate start slots, ascending.
    pub slots: Range<usize>,
    /// The deadline could not be met by any slot and was ignored.
    pub deadline_relaxed: bool,
}

impl SlotGrid {
    /// Creates a grid of `slot_count` slots of `slot_minutes` each.
    pub fn new(origin: DateTime<Utc>, slot_minutes: i64, slot_count: usize) -> Self {
        Self {
            origin,
            slot_width: Duration::minutes(slot_minutes.max(1)),
            slot_count,
        }
    }

    /// Creates the grid described by an engine configuration.
    pub fn from_config(origin: DateTime<Utc>, config: &EngineConfig) -> Self {
        Self::new(origin, config.slot_minutes, config.slot_count)
    }

    /// Number of slots (T).
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Grid origin.
    pub fn origin(&self) -> DateTime<Utc> {
        self.origin
    }

    /// Start of a slot. Saturates at the latest representable time.
    pub fn slot_start(&self, slot: usize) -> DateTime<Utc> {
        i32::try_from(slot)
            .ok()
            .and_then(|s| self.slot_width.checked_mul(s))
            .and_then(|offset| self.origin.checked_add_signed(offset))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// End of the horizon (exclusive).
    pub fn horizon_end(&self) -> DateTime<Utc> {
        self.slot_start(self.slot_count)
    }

    /// Slot containing `at`. Times before the origin map to slot 0; times
    /// at or past the horizon end have no slot.
    pub fn slot_of(&self, at: DateTime<Utc>) -> Option<usize> {
        let offset = (at - self.origin).num_milliseconds().max(0);
        let width = self.slot_width.num_milliseconds();
        let slot = usize::try_from(offset / width).ok()?;
        (slot < self.slot_count).then_some(slot)
    }

    /// Earliest permissible start: submission time, never before the origin.
    pub fn earliest_start(&self, workload: &Workload) -> DateTime<Utc> {
        workload.submitted_at.max(self.origin)
    }

    /// Start time of a workload placed in `slot`.
    pub fn start_in_slot(&self, workload: &Workload, slot: usize) -> DateTime<Utc> {
        self.earliest_start(workload).max(self.slot_start(slot))
    }

    /// Slots overlapped by a run `[start, end)`, clipped to the horizon.
    pub fn occupied(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Range<usize> {
        let Some(first) = self.slot_of(start) else {
            return 0..0;
        };
        let last = if end > start {
            self.slot_of(end - Duration::milliseconds(1))
                .unwrap_or(self.slot_count - 1)
        } else {
            first
        };
        first..last.max(first) + 1
    }

    /// Candidate start slots for a workload.
    ///
    /// Slots run from the one containing the earliest start to the end of
    /// the horizon. With `respect_deadline`, slots whose run would end after
    /// the deadline are dropped; if that leaves nothing, the full window is
    /// returned with `deadline_relaxed` set.
    ///
    /// Returns `None` if the workload is submitted at or after the horizon
    /// end.
    pub fn window(&self, workload: &Workload, respect_deadline: bool) -> Option<StartWindow> {
        let first = self.slot_of(self.earliest_start(workload))?;
        let full = StartWindow {
            slots: first..self.slot_count,
            deadline_relaxed: false,
        };

        let deadline = match (respect_deadline, workload.deadline) {
            (true, Some(d)) => d,
            _ => return Some(full),
        };
        let latest_start = deadline - workload.duration();
        let end = (first..self.slot_count)
            .take_while(|&s| self.start_in_slot(workload, s) <= latest_start)
            .last()
            .map(|s| s + 1);

        Some(match end {
            Some(end) => StartWindow {
                slots: first..end,
                deadline_relaxed: false,
            },
            None => StartWindow {
                deadline_relaxed: true,
                ..full
            },
        })
    }
}

/// Resource demand in integer units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Demand {
    /// Milli-cores.
    pub cpu_milli: i64,
    /// Megabytes.
    pub memory_mb: i64,
}

impl Demand {
    /// Demand of a workload.
    pub fn of(workload: &Workload) -> Self {
        Self::new(workload.cpu_cores, workload.memory_gb)
    }

    fn new(cpu_cores: f64, memory_gb: f64) -> Self {
        Self {
            cpu_milli: (cpu_cores * 1000.0).round() as i64,
            memory_mb: (memory_gb * 1024.0).round() as i64,
        }
    }
}

/// Remaining capacity per (datacenter, slot).
///
/// Datacenters without a ceiling (or every datacenter when enforcement is
/// off) are unbounded and never tracked.
#[derive(Debug, Clone)]
pub struct CapacityLedger {
    slot_count: usize,
    limits: Vec<Option<Demand>>,
    cpu: Vec<i64>,
    memory: Vec<i64>,
}

impl CapacityLedger {
    /// Creates a full-capacity ledger in datacenter order.
    pub fn new(datacenters: &[Datacenter], slot_count: usize, enforce: bool) -> Self {
        let limits: Vec<Option<Demand>> = datacenters
            .iter()
            .map(|dc| {
                dc.capacity
                    .filter(|_| enforce)
                    .map(|c| Demand::new(c.cpu_cores, c.memory_gb))
            })
            .collect();

        let mut cpu = vec![0; limits.len() * slot_count];
        let mut memory = vec![0; limits.len() * slot_count];
        for (dc, limit) in limits.iter().enumerate() {
            if let Some(limit) = limit {
                let cells = dc * slot_count..(dc + 1) * slot_count;
                cpu[cells.clone()].fill(limit.cpu_milli);
                memory[cells].fill(limit.memory_mb);
            }
        }

        Self {
            slot_count,
            limits,
            cpu,
            memory,
        }
    }

    /// Whether any datacenter is bounded.
    pub fn is_tracking(&self) -> bool {
        self.limits.iter().any(Option::is_some)
    }

    /// Whether the demand could ever fit the datacenter (empty grid).
    pub fn admits(&self, dc: usize, demand: Demand) -> bool {
        match self.limits.get(dc).copied().flatten() {
            None => true,
            Some(limit) => demand.cpu_milli <= limit.cpu_milli && demand.memory_mb <= limit.memory_mb,
        }
    }

    /// Whether the demand fits every slot in `slots` on the datacenter.
    pub fn fits(&self, dc: usize, slots: Range<usize>, demand: Demand) -> bool {
        if !self.is_bounded(dc) {
            return true;
        }
        slots.into_iter().all(|s| {
            let i = self.cell(dc, s);
            self.cpu[i] >= demand.cpu_milli && self.memory[i] >= demand.memory_mb
        })
    }

    /// Takes the demand from every slot in `slots`.
    pub fn reserve(&mut self, dc: usize, slots: Range<usize>, demand: Demand) {
        self.apply(dc, slots, demand, -1);
    }

    /// Returns the demand to every slot in `slots`.
    pub fn release(&mut self, dc: usize, slots: Range<usize>, demand: Demand) {
        self.apply(dc, slots, demand, 1);
    }

    /// Remaining CPU cores in a cell. `None` if the datacenter is unbounded.
    pub fn remaining_cpu(&self, dc: usize, slot: usize) -> Option<f64> {
        self.is_bounded(dc)
            .then(|| self.cpu[self.cell(dc, slot)] as f64 / 1000.0)
    }

    /// Hash of the remaining-capacity state.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.cpu.hash(&mut hasher);
        self.memory.hash(&mut hasher);
        hasher.finish()
    }

    fn apply(&mut self, dc: usize, slots: Range<usize>, demand: Demand, sign: i64) {
        if !self.is_bounded(dc) {
            return;
        }
        for s in slots {
            let i = self.cell(dc, s);
            self.cpu[i] += sign * demand.cpu_milli;
            self.memory[i] += sign * demand.memory_mb;
        }
    }

    fn is_bounded(&self, dc: usize) -> bool {
        matches!(self.limits.get(dc), Some(Some(_)))
    }

    #[inline]
    fn cell(&self, dc: usize, slot: usize) -> usize {
        dc * self.slot_count + slot
    }
}
