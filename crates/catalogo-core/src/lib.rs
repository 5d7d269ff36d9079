//! Catalogo Core - Domain types, pipeline stages, and the harvest runner.
//!
//! This crate provides everything in a harvest run that does not speak HTTP:
//!
//! - **Domain models**: [`CanonicalRecord`], [`SummaryRow`]
//! - **Configuration**: [`TargetsConfig`] loaded from `targets.toml` or a legacy JSON target map
//! - **Pagination**: [`paginate`] turns any [`PageFetcher`] into a lazy, bounded stream
//! - **Pipeline stages**: per-unit cap in [`HarvestService`], [`DateRange`] filter, [`summarize`]
//! - **Sinks**: [`CatalogSink`] with the file-based [`DirectorySink`]
//! - **Traits**: [`CatalogClient`], [`CatalogClientFactory`] for dependency injection
//! - **Progress reporting**: [`ProgressReporter`] trait for decoupled logging
//!
//! # Architecture
//!
//! Source clients live in `catalogo-client` and plug in through the traits:
//!
//! - [`CatalogClient`] - paginates one source and normalizes its raw items
//! - [`CatalogClientFactory`] - builds the client for a [`HarvestSource`]
//! - [`CatalogSink`] - receives each target's filtered records and summary
//!
//! # Example
//!
//! ```ignore
//! use catalogo_core::{DateRange, DirectorySink, HarvestService, TracingReporter, select_targets};
//!
//! let service = HarvestService::with_config(factory, harvest_config);
//! let targets = select_targets(&targets_config, None)?;
//! let mut sink = DirectorySink::new("output");
//! let outcome = service
//!     .run_with_progress(&targets, &query, &DateRange::parse(Some("2024-01-01"), None), &mut sink, &TracingReporter)
//!     .await?;
//! ```

pub mod config;
pub mod credentials;
pub mod error;
pub mod export;
pub mod filter;
pub mod harvest;
pub mod i18n;
pub mod models;
pub mod outcome;
pub mod pagination;
pub mod progress;
pub mod summary;
pub mod traits;

// Configuration
pub use config::{
    DEFAULT_DISCOVERY_BASE, DEFAULT_REGISTRY_BASE, HarvestConfig, HttpConfig, PlatformKind,
    RunOptions, TargetEntry, TargetsConfig, default_config_path, load_run_options,
    load_targets_config,
};

// Credentials
pub use credentials::{AppToken, TokenSource, default_secrets_path, resolve_app_token};

// Error handling
pub use error::AppError;

// Internationalization
pub use i18n::LocalizedText;

// Domain models
pub use models::{CanonicalRecord, SummaryMetric, SummaryRow};

// Pagination
pub use pagination::{Page, PageFetcher, PageRequest, PaginationLimits, paginate};

// Pipeline stages
pub use filter::{DateRange, filter_by_publication_date, parse_record_date};
pub use summary::summarize;

// Results
pub use outcome::{RunOutcome, RunSummary, TargetHarvest, TargetHarvestResult, UnitReport};

// Progress reporting
pub use progress::{HarvestEvent, ProgressReporter, SilentReporter, TracingReporter};

// Traits for dependency injection
pub use traits::{CatalogClient, CatalogClientFactory, CatalogQuery, HarvestSource};

// Services and sinks
pub use export::{CatalogSink, DirectorySink};
pub use harvest::{HarvestService, harvest_sources, select_targets};
