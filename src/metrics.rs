//! Per-tick metrics series.

use serde::{Deserialize, Serialize};

/// Metrics recorded at the start of one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: usize,
    /// Infected agents at the time of the snapshot, recomputed live.
    pub infected_count: usize,
    /// Cumulative agent-to-agent transmission events, read from the engine.
    pub direct_infection_count: usize,
    /// Cumulative environment-mediated transmission events, read from the engine.
    pub location_infection_count: usize,
}

/// Append-only log of per-tick snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsCollector {
    snapshots: Vec<Snapshot>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn series(&self) -> &[Snapshot] {
        &self.snapshots
    }
}
