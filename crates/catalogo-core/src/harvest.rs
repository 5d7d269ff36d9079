//! Harvest service: multi-target runs over catalog sources.
//!
//! # Architecture
//!
//! The [`HarvestService`] is generic over a [`CatalogClientFactory`], so the
//! whole pipeline can run against in-memory mocks:
//!
//! ```text
//! targets ─▶ harvest units ─▶ paginate ─▶ normalize ─▶ cap
//!                                                      │
//!        sink ◀─ summarize ◀─ date filter ◀────────────┘
//! ```
//!
//! A target is split into harvest units: one per domain for discovery
//! targets, a single one for registry targets. Each unit is capped
//! independently. Pagination is lazy, so reaching the cap stops page
//! requests for that unit.
//!
//! # Error policy
//!
//! - Transport and protocol errors truncate the current unit only. Their
//!   text is kept in the [`UnitReport`] and the run moves on.
//! - An unsupported platform yields zero records and a warning.
//! - An unknown `--target` name fails in [`select_targets`], before any
//!   request is made.
//! - Sink errors abort the run.
//!
//! # Example
//!
//! ```ignore
//! use catalogo_core::harvest::{HarvestService, select_targets};
//! use catalogo_core::progress::TracingReporter;
//!
//! let service = HarvestService::with_config(factory, HarvestConfig::default());
//! let targets = select_targets(&config, Some("colombia"))?;
//! let outcome = service
//!     .run_with_progress(&targets, &query, &range, &mut sink, &TracingReporter)
//!     .await?;
//! println!("Total records: {}", outcome.summary.total_records());
//! ```

use futures::StreamExt;

use crate::config::{HarvestConfig, PlatformKind, TargetEntry, TargetsConfig};
use crate::error::AppError;
use crate::export::CatalogSink;
use crate::filter::{DateRange, filter_by_publication_date};
use crate::models::CanonicalRecord;
use crate::outcome::{RunOutcome, RunSummary, TargetHarvest, TargetHarvestResult, UnitReport};
use crate::pagination::PaginationLimits;
use crate::progress::{HarvestEvent, ProgressReporter, SilentReporter};
use crate::summary::summarize;
use crate::traits::{CatalogClient, CatalogClientFactory, CatalogQuery, HarvestSource};

/// Picks the targets for a run.
///
/// With a name, exactly the target whose name matches ignoring case, even if
/// it is disabled; no match is [`AppError::TargetNotFound`]. Without a name,
/// every enabled target in configuration order.
pub fn select_targets<'a>(
    config: &'a TargetsConfig,
    name: Option<&str>,
) -> Result<Vec<&'a TargetEntry>, AppError> {
    match name {
        Some(name) => {
            let target = config.require(name)?;
            if !target.enabled {
                tracing::info!(
                    target_name = %target.name,
                    "Target is disabled for batch runs, harvesting it because it was selected by name"
                );
            }
            Ok(vec![target])
        }
        None => Ok(config.enabled_targets()),
    }
}

/// Splits a target into its harvest units.
///
/// Returns `None` for platforms without a client.
pub fn harvest_sources(target: &TargetEntry) -> Option<Vec<HarvestSource>> {
    match &target.platform {
        PlatformKind::Discovery => Some(
            target
                .domains
                .iter()
                .map(|domain| HarvestSource::Discovery {
                    domain: domain.clone(),
                })
                .collect(),
        ),
        PlatformKind::Registry => Some(vec![HarvestSource::Registry {
            base_url: target.registry_base_url().to_string(),
            url_template: target.url_template.clone(),
            language: target.language().to_string(),
        }]),
        PlatformKind::Unsupported(_) => None,
    }
}

/// Service for harvesting catalog targets.
///
/// # Example
///
/// ```ignore
/// let service = HarvestService::new(factory);
/// let harvest = service.harvest_target(&target, &CatalogQuery::default(), &SilentReporter).await;
/// println!("{} records", harvest.records.len());
/// ```
pub struct HarvestService<F>
where
    F: CatalogClientFactory,
{
    factory: F,
    config: HarvestConfig,
}

impl<F> Clone for HarvestService<F>
where
    F: CatalogClientFactory + Clone,
{
    fn clone(&self) -> Self {
        Self {
            factory: self.factory.clone(),
            config: self.config,
        }
    }
}

impl<F> HarvestService<F>
where
    F: CatalogClientFactory,
{
    /// Creates a service with default [`HarvestConfig`].
    pub fn new(factory: F) -> Self {
        Self::with_config(factory, HarvestConfig::default())
    }

    pub fn with_config(factory: F, config: HarvestConfig) -> Self {
        Self { factory, config }
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Harvests one unit, returning at most `per_target_cap` records in
    /// source order.
    ///
    /// The cap is checked before each item is pulled, so no page beyond the
    /// one holding the last needed item is requested. Errors never escape:
    /// they end the unit and are recorded in the report.
    pub async fn harvest_source(
        &self,
        source: &HarvestSource,
        query: &CatalogQuery,
    ) -> (Vec<CanonicalRecord>, UnitReport) {
        let label = source.label().to_string();
        let cap = self.config.per_target_cap;

        let client = match self.factory.create(source) {
            Ok(client) => client,
            Err(e) => {
                return (
                    Vec::new(),
                    UnitReport {
                        source: label,
                        records: 0,
                        error: Some(e.to_string()),
                    },
                );
            }
        };

        tracing::debug!(source = %label, platform = %client.platform(), cap, "Harvesting unit");

        let limits = PaginationLimits::new(self.config.page_size, self.config.max_pages);
        let mut stream = client.paginate(query, limits);
        let mut records = Vec::with_capacity(cap.min(self.config.page_size));
        let mut error = None;

        while records.len() < cap {
            match stream.next().await {
                Some(Ok(item)) => records.push(client.normalize(item)),
                Some(Err(e)) => {
                    error = Some(e.to_string());
                    break;
                }
                None => break,
            }
        }

        let report = UnitReport {
            source: label,
            records: records.len(),
            error,
        };
        (records, report)
    }

    /// Harvests every unit of `target`, concatenating records in unit order.
    pub async fn harvest_target<R: ProgressReporter>(
        &self,
        target: &TargetEntry,
        query: &CatalogQuery,
        reporter: &R,
    ) -> TargetHarvest {
        let platform = target.platform.to_string();
        let Some(sources) = harvest_sources(target) else {
            reporter.report(HarvestEvent::UnsupportedPlatform {
                target_name: &target.name,
                platform: &platform,
            });
            return TargetHarvest {
                unsupported: true,
                ..Default::default()
            };
        };

        if sources.is_empty() {
            reporter.report(HarvestEvent::NoSources {
                target_name: &target.name,
            });
        }

        let mut harvest = TargetHarvest::default();
        for source in &sources {
            reporter.report(HarvestEvent::SourceStarted {
                target_name: &target.name,
                source: source.label(),
            });

            let (records, report) = self.harvest_source(source, query).await;

            reporter.report(HarvestEvent::SourceCompleted {
                target_name: &target.name,
                source: source.label(),
                records: report.records,
                error: report.error.as_deref(),
            });
            harvest.records.extend(records);
            harvest.units.push(report);
        }
        harvest
    }

    /// Runs targets one after another without progress reporting.
    pub async fn run<S: CatalogSink>(
        &self,
        targets: &[&TargetEntry],
        query: &CatalogQuery,
        range: &DateRange,
        sink: &mut S,
    ) -> Result<RunOutcome, AppError> {
        self.run_with_progress(targets, query, range, sink, &SilentReporter)
            .await
    }

    /// Runs targets one after another.
    ///
    /// For each target: harvest, apply the date filter, summarize, and hand
    /// the result to `sink`. The returned records are the filtered records
    /// of every target, concatenated in target order.
    pub async fn run_with_progress<S: CatalogSink, R: ProgressReporter>(
        &self,
        targets: &[&TargetEntry],
        query: &CatalogQuery,
        range: &DateRange,
        sink: &mut S,
        reporter: &R,
    ) -> Result<RunOutcome, AppError> {
        let total = targets.len();
        let mut outcome = RunOutcome {
            summary: RunSummary::new(),
            records: Vec::new(),
        };

        reporter.report(HarvestEvent::RunStarted {
            total_targets: total,
        });

        for (i, target) in targets.iter().enumerate() {
            let platform = target.platform.to_string();
            reporter.report(HarvestEvent::TargetStarted {
                target_index: i,
                total_targets: total,
                target_name: &target.name,
                platform: &platform,
            });

            let harvest = self.harvest_target(target, query, reporter).await;
            let harvested = harvest.records.len();
            let retained = filter_by_publication_date(harvest.records, range);
            let summary = summarize(&retained);

            sink.write_target(target, &retained, &summary)?;

            reporter.report(HarvestEvent::TargetCompleted {
                target_index: i,
                total_targets: total,
                target_name: &target.name,
                harvested,
                retained: retained.len(),
            });

            outcome.summary.add(TargetHarvestResult {
                name: target.name.clone(),
                platform,
                harvested,
                retained: retained.len(),
                units: harvest.units,
                unsupported: harvest.unsupported,
            });
            outcome.records.extend(retained);
        }

        reporter.report(HarvestEvent::RunCompleted {
            summary: &outcome.summary,
        });

        Ok(outcome)
    }
}
