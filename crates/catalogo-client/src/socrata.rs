//! Socrata Discovery API client.
//!
//! The Discovery API is a federated catalog search over every Socrata
//! portal: one endpoint, filtered by `domains`. Pages are requested with
//! `limit`/`offset`; the API caps `limit` at 100. Pagination ends on the
//! first empty page.
//!
//! API reference: <https://dev.socrata.com/docs/other/discovery>
//!
//! # Examples
//!
//! ```no_run
//! use catalogo_client::http::CatalogHttp;
//! use catalogo_client::socrata::SocrataClient;
//! use catalogo_core::{CatalogClient, CatalogQuery, HttpConfig, PaginationLimits};
//! use futures::StreamExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let http = CatalogHttp::new(&HttpConfig::default())?;
//! let client = SocrataClient::new(
//!     catalogo_core::DEFAULT_DISCOVERY_BASE,
//!     Some("www.datos.gov.co"),
//!     http,
//!     None,
//! )?;
//! let mut items = client.paginate(&CatalogQuery::default(), PaginationLimits::new(100, 2));
//! while let Some(item) = items.next().await {
//!     println!("{}", client.normalize(item?).name);
//! }
//! # Ok(())
//! # }
//! ```

use catalogo_core::error::AppError;
use catalogo_core::pagination::{Page, PageFetcher, PageRequest, PaginationLimits, paginate};
use catalogo_core::traits::{CatalogClient, CatalogQuery};
use catalogo_core::{CanonicalRecord, PlatformKind};
use futures::stream::BoxStream;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

use crate::http::{CatalogHttp, parse_base_url};
use crate::lenient::{decode_items, opt_string_list, opt_u64};

/// Filters for one Discovery API pagination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryQuery {
    pub domain: Option<String>,
    pub q: Option<String>,
    pub categories: Vec<String>,
}

/// Discovery API search response. Entries are decoded one by one.
#[derive(Deserialize, Debug, Default)]
struct DiscoveryResponse {
    #[serde(default)]
    results: Option<Vec<Value>>,
}

impl DiscoveryResponse {
    fn into_page(self, source: &str) -> Page<DiscoveryItem> {
        let (items, skipped) = decode_items(self.results.unwrap_or_default(), source);
        Page::new(items).with_skipped(skipped)
    }
}

/// One catalog entry as returned by the Discovery API.
///
/// Every nested object may be missing or `null`; normalization treats both
/// as empty.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DiscoveryItem {
    #[serde(default)]
    pub resource: Option<DiscoveryResource>,
    #[serde(default)]
    pub classification: Option<DiscoveryClassification>,
    #[serde(default)]
    pub metadata: Option<DiscoveryMetadata>,
    #[serde(default)]
    pub view: Option<DiscoveryView>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "opt_u64")]
    pub download_count: Option<u64>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DiscoveryResource {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub publication_date: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DiscoveryClassification {
    #[serde(default)]
    pub domain_category: Option<String>,
    #[serde(default, deserialize_with = "opt_string_list")]
    pub categories: Option<Vec<String>>,
    #[serde(default, deserialize_with = "opt_string_list")]
    pub tags: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DiscoveryMetadata {
    #[serde(default)]
    pub domain: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DiscoveryView {
    #[serde(default, deserialize_with = "opt_u64")]
    pub download_count: Option<u64>,
    #[serde(default)]
    pub publication_date: Option<String>,
}

/// Maps a Discovery API item to a [`CanonicalRecord`].
///
/// `download_count` prefers a non-zero `view.download_count` over the
/// top-level value; `publication_date` prefers a non-empty
/// `view.publication_date` over `resource.publication_date`.
pub fn normalize_discovery(item: DiscoveryItem) -> CanonicalRecord {
    let resource = item.resource.unwrap_or_default();
    let classification = item.classification.unwrap_or_default();
    let metadata = item.metadata.unwrap_or_default();
    let view = item.view.unwrap_or_default();

    let publication_date = view
        .publication_date
        .filter(|d| !d.is_empty())
        .or(resource.publication_date)
        .unwrap_or_default();

    CanonicalRecord {
        name: resource.name.unwrap_or_default(),
        id: resource.id.unwrap_or_default(),
        record_type: resource.resource_type.unwrap_or_default(),
        description: resource.description.unwrap_or_default(),
        domain: metadata.domain,
        permalink: item.permalink.unwrap_or_default(),
        link: item.link.unwrap_or_default(),
        domain_category: classification.domain_category.unwrap_or_default(),
        categories: classification.categories.unwrap_or_default().join(","),
        tags: classification.tags.unwrap_or_default().join(","),
        download_count: view
            .download_count
            .filter(|&n| n != 0)
            .or(item.download_count),
        publication_date,
        num_resources: None,
        license: None,
        organization: None,
    }
}

/// HTTP client for one Discovery API domain.
#[derive(Clone)]
pub struct SocrataClient {
    http: CatalogHttp,
    base_url: Url,
    domain: Option<String>,
    app_token: Option<String>,
}

impl SocrataClient {
    /// The API rejects larger pages.
    pub const MAX_PAGE_SIZE: usize = 100;

    /// Creates a client for `domain` (or for the whole federation when
    /// `None`).
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidUrl` if `base_url` is not an HTTP(S) URL.
    pub fn new(
        base_url: &str,
        domain: Option<&str>,
        http: CatalogHttp,
        app_token: Option<String>,
    ) -> Result<Self, AppError> {
        Ok(Self {
            http,
            base_url: parse_base_url(base_url)?,
            domain: domain
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            app_token,
        })
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Builds the Discovery query for this client's domain.
    pub fn discovery_query(&self, query: &CatalogQuery) -> DiscoveryQuery {
        DiscoveryQuery {
            domain: self.domain.clone(),
            q: query.q.clone().filter(|q| !q.is_empty()),
            categories: query.categories.clone(),
        }
    }

    /// Streams raw items for `query`, lazily.
    pub fn paginate_query(
        &self,
        query: DiscoveryQuery,
        limits: PaginationLimits,
    ) -> BoxStream<'static, Result<DiscoveryItem, AppError>> {
        let pager = DiscoveryPager {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            app_token: self.app_token.clone(),
            query,
        };
        paginate(pager, 0, limits.clamped(Self::MAX_PAGE_SIZE))
    }
}

impl CatalogClient for SocrataClient {
    type RawItem = DiscoveryItem;

    fn platform(&self) -> PlatformKind {
        PlatformKind::Discovery
    }

    fn paginate(
        &self,
        query: &CatalogQuery,
        limits: PaginationLimits,
    ) -> BoxStream<'static, Result<DiscoveryItem, AppError>> {
        self.paginate_query(self.discovery_query(query), limits)
    }

    fn normalize(&self, item: DiscoveryItem) -> CanonicalRecord {
        normalize_discovery(item)
    }
}

struct DiscoveryPager {
    http: CatalogHttp,
    base_url: Url,
    app_token: Option<String>,
    query: DiscoveryQuery,
}

impl PageFetcher for DiscoveryPager {
    type Item = DiscoveryItem;

    fn label(&self) -> String {
        self.query
            .domain
            .clone()
            .unwrap_or_else(|| self.base_url.to_string())
    }

    async fn fetch_page(&self, request: PageRequest) -> Result<Page<DiscoveryItem>, AppError> {
        let url = page_url(&self.base_url, &self.query, request);
        tracing::debug!(url = %url, "Requesting Discovery API page");
        let label = self.label();
        let response: DiscoveryResponse = self
            .http
            .get_json(url, &label, self.app_token.as_deref())
            .await?;
        Ok(response.into_page(&label))
    }
}

/// `GET {base}?limit=&offset=[&domains=][&q=][&categories=a,b]`
pub fn page_url(base_url: &Url, query: &DiscoveryQuery, request: PageRequest) -> Url {
    let mut url = base_url.clone();
    {
        let mut pairs = url.query_pairs_mut();
        pairs
            .append_pair("limit", &request.size.to_string())
            .append_pair("offset", &request.offset.to_string());
        if let Some(domain) = &query.domain {
            pairs.append_pair("domains", domain);
        }
        if let Some(q) = &query.q {
            pairs.append_pair("q", q);
        }
        if !query.categories.is_empty() {
            pairs.append_pair("categories", &query.categories.join(","));
        }
    }
    url
}
