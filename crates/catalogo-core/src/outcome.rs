//! Per-unit, per-target and per-run harvest results.

use crate::models::CanonicalRecord;

/// Outcome of harvesting one domain or one registry endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitReport {
    /// Domain or base URL.
    pub source: String,
    /// Records kept for this unit (at most the per-target cap).
    pub records: usize,
    /// Why pagination stopped early, if it did.
    pub error: Option<String>,
}

impl UnitReport {
    pub fn is_truncated(&self) -> bool {
        self.error.is_some()
    }
}

/// Records harvested for one target, before date filtering.
#[derive(Debug, Clone, Default)]
pub struct TargetHarvest {
    pub records: Vec<CanonicalRecord>,
    pub units: Vec<UnitReport>,
    /// Set when the target's platform has no client.
    pub unsupported: bool,
}

/// Result of processing a single target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetHarvestResult {
    pub name: String,
    pub platform: String,
    /// Records harvested before the date filter.
    pub harvested: usize,
    /// Records written after the date filter.
    pub retained: usize,
    pub units: Vec<UnitReport>,
    pub unsupported: bool,
}

impl TargetHarvestResult {
    /// Error texts of the truncated units, prefixed with their source.
    pub fn errors(&self) -> Vec<String> {
        self.units
            .iter()
            .filter_map(|u| u.error.as_ref().map(|e| format!("{}: {}", u.source, e)))
            .collect()
    }
}

/// Summary of a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub targets: Vec<TargetHarvestResult>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, result: TargetHarvestResult) {
        self.targets.push(result);
    }

    /// Grand total of records written across all targets.
    pub fn total_records(&self) -> usize {
        self.targets.iter().map(|t| t.retained).sum()
    }

    /// Number of harvest units that stopped on an error.
    pub fn failed_sources(&self) -> usize {
        self.targets
            .iter()
            .flat_map(|t| &t.units)
            .filter(|u| u.is_truncated())
            .count()
    }
}

/// Everything a run produced: the summary and the concatenated records of
/// every target, in target order.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub records: Vec<CanonicalRecord>,
}
