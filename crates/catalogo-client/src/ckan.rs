//! CKAN client for harvesting catalog records from registry portals.
//!
//! Records come from `package_search`, paged with `start`/`rows`. The
//! server-reported `count` ends pagination without a trailing empty request.

use catalogo_core::error::AppError;
use catalogo_core::pagination::{Page, PageFetcher, PageRequest, PaginationLimits, paginate};
use catalogo_core::traits::{CatalogClient, CatalogQuery};
use catalogo_core::{CanonicalRecord, LocalizedText, PlatformKind};
use futures::stream::BoxStream;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

use crate::http::{CatalogHttp, parse_base_url};
use crate::lenient::{decode_items, opt_object_list, opt_u64};

/// Generic wrapper for CKAN API responses.
///
/// CKAN API reference: <https://docs.ckan.org/en/2.9/api/>
///
/// CKAN always returns responses with the structure:
/// ```json
/// {
///     "success": bool,
///     "result": T
/// }
/// ```
///
/// A body without `success` is treated as unsuccessful.
#[derive(Deserialize, Debug)]
struct CkanResponse<T> {
    #[serde(default)]
    success: bool,
    result: Option<T>,
}

/// Response structure for CKAN package_search API.
///
/// Packages stay raw until [`into_page`] decodes them one by one.
#[derive(Deserialize, Debug, Default)]
struct PackageSearchResult {
    #[serde(default, deserialize_with = "opt_u64")]
    count: Option<u64>,
    #[serde(default)]
    results: Option<Vec<Value>>,
}

/// Turns a `package_search` body into a page.
///
/// A body whose `success` is false or missing is
/// [`AppError::UnsuccessfulResponse`], which ends pagination. A missing
/// `count` counts as zero, so the page is the last one.
fn into_page(
    response: CkanResponse<PackageSearchResult>,
    source: &str,
) -> Result<Page<CkanPackage>, AppError> {
    if !response.success {
        return Err(AppError::UnsuccessfulResponse(format!(
            "package_search on {}",
            source
        )));
    }

    let result = response.result.unwrap_or_default();
    let total = usize::try_from(result.count.unwrap_or(0)).unwrap_or(usize::MAX);
    let (packages, skipped) = decode_items(result.results.unwrap_or_default(), source);
    Ok(Page::with_total(packages, total).with_skipped(skipped))
}

/// Search filters for `package_search`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryQuery {
    pub q: Option<String>,
    pub organization: Option<String>,
    pub groups: Vec<String>,
}

impl RegistryQuery {
    /// Builds the Solr `fq` parameter.
    ///
    /// # Examples
    ///
    /// ```
    /// use catalogo_client::ckan::RegistryQuery;
    ///
    /// let query = RegistryQuery {
    ///     q: None,
    ///     organization: Some("inegi".to_string()),
    ///     groups: vec!["economia".to_string(), "salud".to_string()],
    /// };
    /// assert_eq!(
    ///     query.filter_query().as_deref(),
    ///     Some("organization:inegi AND (groups:economia OR groups:salud)")
    /// );
    /// ```
    pub fn filter_query(&self) -> Option<String> {
        let organization = self
            .organization
            .as_deref()
            .filter(|o| !o.is_empty())
            .map(|o| format!("organization:{}", o));
        let groups = (!self.groups.is_empty()).then(|| {
            let terms: Vec<String> = self.groups.iter().map(|g| format!("groups:{}", g)).collect();
            format!("({})", terms.join(" OR "))
        });

        match (organization, groups) {
            (Some(o), Some(g)) => Some(format!("{} AND {}", o, g)),
            (o, g) => o.or(g),
        }
    }
}

/// Data Transfer Object for one `package_search` result.
///
/// Every field is optional; portals disagree on which ones they fill in.
/// `title` and `notes` may be plain strings or multilingual objects
/// (e.g., `{"es": "...", "en": "..."}`).
///
/// # Examples
///
/// ```
/// use catalogo_client::ckan::CkanPackage;
///
/// let json = r#"{
///     "id": "f3b1",
///     "name": "presupuesto-2024",
///     "title": {"es": "Presupuesto 2024", "en": "Budget 2024"},
///     "organization": null
/// }"#;
///
/// let package: CkanPackage = serde_json::from_str(json).unwrap();
/// assert_eq!(package.title.unwrap().resolve("es"), "Presupuesto 2024");
/// assert!(package.organization.is_none());
/// ```
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CkanPackage {
    #[serde(default)]
    pub id: Option<String>,
    /// URL slug.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<LocalizedText>,
    #[serde(default)]
    pub notes: Option<LocalizedText>,
    /// Portal root some instances report per package.
    #[serde(default)]
    pub ckan_url: Option<String>,
    #[serde(default, deserialize_with = "opt_object_list")]
    pub tags: Option<Vec<CkanTag>>,
    #[serde(default, deserialize_with = "opt_object_list")]
    pub groups: Option<Vec<CkanGroup>>,
    #[serde(default)]
    pub organization: Option<CkanOrganization>,
    #[serde(default)]
    pub metadata_created: Option<String>,
    #[serde(default, deserialize_with = "opt_u64")]
    pub num_resources: Option<u64>,
    #[serde(default)]
    pub license_title: Option<String>,
    #[serde(default)]
    pub license_id: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CkanTag {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CkanGroup {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CkanOrganization {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Portal settings that shape registry landing-page links and text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryLinks {
    pub base_url: String,
    /// Landing page template with `{id}` and `{name}` placeholders.
    pub url_template: Option<String>,
    /// Preferred language for multilingual fields.
    pub language: String,
}

impl RegistryLinks {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            url_template: None,
            language: "en".to_string(),
        }
    }
}

/// First value that is present and non-empty.
fn first_non_empty<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> &'a str {
    candidates
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

/// Maps a CKAN package to a [`CanonicalRecord`].
///
/// `link` is always `{ckan_url or base_url}/dataset/{name}`; `permalink`
/// uses the URL template instead when one is configured. A package without
/// a slug yields a link ending in `/dataset/`.
///
/// # Examples
///
/// ```
/// use catalogo_client::ckan::{CkanPackage, RegistryLinks, normalize_registry};
///
/// let package: CkanPackage = serde_json::from_str(
///     r#"{"id": "abc-123", "name": "calidad-aire", "title": "Calidad del aire"}"#,
/// )
/// .unwrap();
///
/// let record = normalize_registry(package, &RegistryLinks::new("https://datos.gob.mx/"));
/// assert_eq!(record.name, "Calidad del aire");
/// assert_eq!(record.link, "https://datos.gob.mx/dataset/calidad-aire");
/// assert_eq!(record.num_resources, Some(0));
/// ```
pub fn normalize_registry(package: CkanPackage, links: &RegistryLinks) -> CanonicalRecord {
    let language = links.language.as_str();
    let slug = package.name.unwrap_or_default();
    let id = package.id.unwrap_or_default();

    let root = package
        .ckan_url
        .as_deref()
        .filter(|u| !u.is_empty())
        .unwrap_or(&links.base_url)
        .trim_end_matches('/');
    let link = format!("{}/dataset/{}", root, slug);
    let permalink = match &links.url_template {
        Some(template) => template.replace("{id}", &id).replace("{name}", &slug),
        None => link.clone(),
    };

    let title = package
        .title
        .map(|t| t.resolve(language))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| slug.clone());

    let tags: Vec<&str> = package
        .tags
        .iter()
        .flatten()
        .map(|t| first_non_empty([t.display_name.as_deref(), t.name.as_deref()]))
        .collect();
    let groups: Vec<&str> = package
        .groups
        .iter()
        .flatten()
        .map(|g| {
            first_non_empty([
                g.display_name.as_deref(),
                g.title.as_deref(),
                g.name.as_deref(),
            ])
        })
        .collect();

    let organization = package.organization.unwrap_or_default();
    let organization =
        first_non_empty([organization.title.as_deref(), organization.name.as_deref()]).to_string();
    let license = first_non_empty([
        package.license_title.as_deref(),
        package.license_id.as_deref(),
    ])
    .to_string();

    CanonicalRecord {
        name: title,
        id,
        record_type: "dataset".to_string(),
        description: package
            .notes
            .map(|n| n.resolve(language))
            .unwrap_or_default(),
        domain: None,
        permalink,
        link,
        domain_category: organization.clone(),
        categories: groups.join(","),
        tags: tags.join(","),
        download_count: None,
        publication_date: package.metadata_created.unwrap_or_default(),
        num_resources: Some(package.num_resources.unwrap_or(0)),
        license: Some(license),
        organization: Some(organization),
    }
}

/// HTTP client for interacting with CKAN open data portals.
///
/// CKAN (Comprehensive Knowledge Archive Network) is an open-source data management
/// system used by many government open data portals worldwide.
///
/// # Examples
///
/// ```no_run
/// use catalogo_client::CkanClient;
/// use catalogo_client::ckan::RegistryQuery;
/// use catalogo_client::http::CatalogHttp;
/// use catalogo_core::{HttpConfig, PaginationLimits};
/// use futures::StreamExt;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = CkanClient::new("https://datos.gob.mx", CatalogHttp::new(&HttpConfig::default())?)?;
/// let packages: Vec<_> = client
///     .paginate_from(RegistryQuery::default(), 0, PaginationLimits::new(1000, 5))
///     .collect()
///     .await;
/// println!("Fetched {} packages", packages.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CkanClient {
    http: CatalogHttp,
    base_url: Url,
    links: RegistryLinks,
}

impl CkanClient {
    /// `package_search` refuses larger `rows`.
    pub const MAX_ROWS: usize = 1000;

    /// Creates a new CKAN client for the portal at `base_url_str`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidUrl` if the URL is invalid or not HTTP(S).
    pub fn new(base_url_str: &str, http: CatalogHttp) -> Result<Self, AppError> {
        let base_url = parse_base_url(base_url_str)?;
        Ok(Self {
            http,
            base_url,
            links: RegistryLinks::new(base_url_str.trim()),
        })
    }

    pub fn with_url_template(mut self, template: Option<&str>) -> Self {
        self.links.url_template = template.map(str::to_string);
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.links.language = language.to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn links(&self) -> &RegistryLinks {
        &self.links
    }

    /// Maps the shared query onto registry filters: categories are groups.
    pub fn registry_query(query: &CatalogQuery) -> RegistryQuery {
        RegistryQuery {
            q: query.q.clone().filter(|q| !q.is_empty()),
            organization: query.organization.clone(),
            groups: query.categories.clone(),
        }
    }

    /// Streams packages matching `query`, starting at `start`.
    pub fn paginate_from(
        &self,
        query: RegistryQuery,
        start: usize,
        limits: PaginationLimits,
    ) -> BoxStream<'static, Result<CkanPackage, AppError>> {
        let pager = RegistryPager {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            query,
        };
        paginate(pager, start, limits.clamped(Self::MAX_ROWS))
    }
}

impl CatalogClient for CkanClient {
    type RawItem = CkanPackage;

    fn platform(&self) -> PlatformKind {
        PlatformKind::Registry
    }

    fn paginate(
        &self,
        query: &CatalogQuery,
        limits: PaginationLimits,
    ) -> BoxStream<'static, Result<CkanPackage, AppError>> {
        self.paginate_from(Self::registry_query(query), 0, limits)
    }

    fn normalize(&self, item: CkanPackage) -> CanonicalRecord {
        normalize_registry(item, &self.links)
    }
}

struct RegistryPager {
    http: CatalogHttp,
    base_url: Url,
    query: RegistryQuery,
}

impl PageFetcher for RegistryPager {
    type Item = CkanPackage;

    fn label(&self) -> String {
        self.base_url.to_string()
    }

    async fn fetch_page(&self, request: PageRequest) -> Result<Page<CkanPackage>, AppError> {
        let url = search_url(&self.base_url, &self.query, request)?;
        tracing::debug!(url = %url, "Requesting package_search page");

        let label = self.label();
        let response: CkanResponse<PackageSearchResult> =
            self.http.get_json(url, &label, None).await?;
        into_page(response, &label)
    }
}

/// `GET {base}/api/3/action/package_search?start=&rows=[&q=][&fq=]`
pub fn search_url(
    base_url: &Url,
    query: &RegistryQuery,
    request: PageRequest,
) -> Result<Url, AppError> {
    let root = base_url.as_str().trim_end_matches('/');
    let mut url = Url::parse(&format!("{}/api/3/action/package_search", root))
        .map_err(|e| AppError::InvalidUrl(e.to_string()))?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs
            .append_pair("start", &request.offset.to_string())
            .append_pair("rows", &request.size.to_string());
        if let Some(q) = &query.q {
            pairs.append_pair("q", q);
        }
        if let Some(fq) = query.filter_query() {
            pairs.append_pair("fq", &fq);
        }
    }
    Ok(url)
}
