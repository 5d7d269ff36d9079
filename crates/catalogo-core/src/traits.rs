//! Trait definitions for catalog sources.
//!
//! The harvest orchestrator only sees these traits, so it can be exercised
//! with in-memory mocks and stays independent of HTTP details:
//!
//! - [`CatalogClient`] - the `{paginate, normalize}` capability of one source
//! - [`CatalogClientFactory`] - picks and builds the client for a [`HarvestSource`]

use futures::stream::BoxStream;

use crate::config::PlatformKind;
use crate::error::AppError;
use crate::models::CanonicalRecord;
use crate::pagination::PaginationLimits;

/// Filters shared by every platform.
///
/// Discovery sources receive `categories` as category filters; registry
/// sources receive them as group filters, OR-combined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    /// Free-text search term.
    pub q: Option<String>,
    pub categories: Vec<String>,
    /// Registry organization slug; ignored by discovery sources.
    pub organization: Option<String>,
}

/// One unit of harvesting: a single portal domain or a single registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestSource {
    /// One domain of the federated Discovery API.
    Discovery { domain: String },
    /// A registry portal rooted at `base_url`.
    Registry {
        base_url: String,
        url_template: Option<String>,
        language: String,
    },
}

impl HarvestSource {
    /// Domain or base URL, for logs and reports.
    pub fn label(&self) -> &str {
        match self {
            Self::Discovery { domain } => domain,
            Self::Registry { base_url, .. } => base_url,
        }
    }
}

/// Client for one catalog source.
///
/// `paginate` must be lazy: pages are requested only while the returned
/// stream is polled. Each call starts a fresh sequence from the first page.
pub trait CatalogClient: Send + Sync {
    /// Source-native record type.
    type RawItem: Send + 'static;

    fn platform(&self) -> PlatformKind;

    /// Streams raw items. Errors follow [`crate::pagination::paginate`]'s
    /// policy: at most one trailing `Err`, never a panic.
    fn paginate(
        &self,
        query: &CatalogQuery,
        limits: PaginationLimits,
    ) -> BoxStream<'static, Result<Self::RawItem, AppError>>;

    /// Maps one raw item to a canonical record. Pure and total.
    fn normalize(&self, item: Self::RawItem) -> CanonicalRecord;
}

/// Factory for catalog clients.
pub trait CatalogClientFactory: Send + Sync {
    type Client: CatalogClient;

    /// Builds the client for `source`.
    ///
    /// Fails when the source's URL or the client's HTTP stack cannot be set
    /// up; the orchestrator records that as the unit's error.
    fn create(&self, source: &HarvestSource) -> Result<Self::Client, AppError>;
}
