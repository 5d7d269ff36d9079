//! Progress reporting for harvest runs.
//!
//! The runner emits [`HarvestEvent`]s instead of logging directly, so the
//! CLI can log them while tests stay silent.

use tracing::{info, warn};

use crate::outcome::RunSummary;

/// Events emitted while a run progresses.
#[derive(Debug, Clone)]
pub enum HarvestEvent<'a> {
    /// A run over `total_targets` targets is starting.
    RunStarted { total_targets: usize },
    TargetStarted {
        target_index: usize,
        total_targets: usize,
        target_name: &'a str,
        platform: &'a str,
    },
    /// The target names a platform with no client; it yields nothing.
    UnsupportedPlatform {
        target_name: &'a str,
        platform: &'a str,
    },
    /// A discovery target lists no domains.
    NoSources { target_name: &'a str },
    /// One domain or registry endpoint is about to be paginated.
    SourceStarted {
        target_name: &'a str,
        source: &'a str,
    },
    /// A harvest unit finished, possibly truncated by `error`.
    SourceCompleted {
        target_name: &'a str,
        source: &'a str,
        records: usize,
        error: Option<&'a str>,
    },
    /// A target's records were filtered and handed to the sink.
    TargetCompleted {
        target_index: usize,
        total_targets: usize,
        target_name: &'a str,
        harvested: usize,
        retained: usize,
    },
    RunCompleted { summary: &'a RunSummary },
}

/// Receives [`HarvestEvent`]s.
///
/// The default implementation does nothing (silent mode).
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: HarvestEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that ignores all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

/// Reporter that logs events through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, event: HarvestEvent<'_>) {
        match event {
            HarvestEvent::RunStarted { total_targets } => {
                info!(targets = total_targets, "Starting harvest run");
            }
            HarvestEvent::TargetStarted {
                target_index,
                total_targets,
                target_name,
                platform,
            } => {
                info!(
                    "[{}/{}] Harvesting {} ({})",
                    target_index + 1,
                    total_targets,
                    target_name,
                    platform
                );
            }
            HarvestEvent::UnsupportedPlatform {
                target_name,
                platform,
            } => {
                warn!(
                    target_name,
                    platform, "Platform not supported, target yields no records"
                );
            }
            HarvestEvent::NoSources { target_name } => {
                warn!(target_name, "Target lists no domains");
            }
            HarvestEvent::SourceStarted {
                target_name,
                source,
            } => {
                tracing::debug!(target_name, source, "Paginating source");
            }
            HarvestEvent::SourceCompleted {
                target_name,
                source,
                records,
                error,
            } => match error {
                Some(error) => warn!(
                    target_name,
                    source,
                    records,
                    error,
                    "Source harvest truncated"
                ),
                None => info!(target_name, source, records, "Source harvested"),
            },
            HarvestEvent::TargetCompleted {
                target_index,
                total_targets,
                target_name,
                harvested,
                retained,
            } => {
                info!(
                    "[{}/{}] {} done: {} harvested, {} after date filter",
                    target_index + 1,
                    total_targets,
                    target_name,
                    harvested,
                    retained
                );
            }
            HarvestEvent::RunCompleted { summary } => {
                info!(
                    targets = summary.targets.len(),
                    records = summary.total_records(),
                    failed_sources = summary.failed_sources(),
                    "Harvest run completed"
                );
            }
        }
    }
}
