//! Catalog client factory and enum dispatch.
//!
//! This module provides a unified interface for working with different
//! catalog clients through the [`CatalogClientEnum`] enum.
//!
//! # Why an Enum Instead of `dyn Trait`?
//!
//! [`CatalogClient`] has an associated `RawItem` type, making it not
//! object-safe. We use an enum for static dispatch, one variant per
//! supported platform.

use std::sync::Arc;

use catalogo_core::config::{HttpConfig, PlatformKind};
use catalogo_core::error::AppError;
use catalogo_core::models::CanonicalRecord;
use catalogo_core::pagination::PaginationLimits;
use catalogo_core::traits::{CatalogClient, CatalogClientFactory, CatalogQuery, HarvestSource};
use futures::StreamExt;
use futures::stream::BoxStream;

use crate::ckan::{CkanClient, CkanPackage, RegistryLinks, normalize_registry};
use crate::http::CatalogHttp;
use crate::socrata::{DiscoveryItem, SocrataClient, normalize_discovery};

/// Platform-specific raw item, wrapping the concrete type of each client.
///
/// Registry packages travel with the link settings of the portal they came
/// from, so any item normalizes the same way whichever client receives it.
#[derive(Debug, Clone)]
pub enum RawItemEnum {
    Discovery(DiscoveryItem),
    Registry(CkanPackage, Arc<RegistryLinks>),
}

/// Unified catalog client that wraps concrete implementations.
#[derive(Clone)]
pub enum CatalogClientEnum {
    Discovery(SocrataClient),
    Registry(CkanClient),
}

impl CatalogClient for CatalogClientEnum {
    type RawItem = RawItemEnum;

    fn platform(&self) -> PlatformKind {
        match self {
            Self::Discovery(c) => c.platform(),
            Self::Registry(c) => c.platform(),
        }
    }

    fn paginate(
        &self,
        query: &CatalogQuery,
        limits: PaginationLimits,
    ) -> BoxStream<'static, Result<RawItemEnum, AppError>> {
        match self {
            Self::Discovery(c) => c
                .paginate(query, limits)
                .map(|item| item.map(RawItemEnum::Discovery))
                .boxed(),
            Self::Registry(c) => {
                let links = Arc::new(c.links().clone());
                c.paginate(query, limits)
                    .map(move |item| {
                        item.map(|pkg| RawItemEnum::Registry(pkg, Arc::clone(&links)))
                    })
                    .boxed()
            }
        }
    }

    fn normalize(&self, item: RawItemEnum) -> CanonicalRecord {
        match item {
            RawItemEnum::Discovery(item) => normalize_discovery(item),
            RawItemEnum::Registry(pkg, links) => normalize_registry(pkg, &links),
        }
    }
}

/// Factory that creates the appropriate catalog client for a harvest source.
///
/// All clients share one [`CatalogHttp`]. The Discovery base URL and app
/// token are fixed at construction.
#[derive(Clone)]
pub struct CatalogClientFactoryEnum {
    http: CatalogHttp,
    discovery_base: String,
    app_token: Option<String>,
}

impl CatalogClientFactoryEnum {
    /// Creates a new catalog client factory.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ClientError` if the HTTP client cannot be built.
    pub fn new(
        http_config: &HttpConfig,
        discovery_base: &str,
        app_token: Option<String>,
    ) -> Result<Self, AppError> {
        Ok(Self {
            http: CatalogHttp::new(http_config)?,
            discovery_base: discovery_base.to_string(),
            app_token,
        })
    }
}

impl CatalogClientFactory for CatalogClientFactoryEnum {
    type Client = CatalogClientEnum;

    fn create(&self, source: &HarvestSource) -> Result<Self::Client, AppError> {
        match source {
            HarvestSource::Discovery { domain } => Ok(CatalogClientEnum::Discovery(
                SocrataClient::new(
                    &self.discovery_base,
                    Some(domain),
                    self.http.clone(),
                    self.app_token.clone(),
                )?,
            )),
            HarvestSource::Registry {
                base_url,
                url_template,
                language,
            } => Ok(CatalogClientEnum::Registry(
                CkanClient::new(base_url, self.http.clone())?
                    .with_url_template(url_template.as_deref())
                    .with_language(language),
            )),
        }
    }
}
