//! Catalogo Client - HTTP clients for open-data catalog APIs
//!
//! This crate provides HTTP clients for interacting with:
//!
//! - [`socrata`] - the federated Socrata Discovery API
//! - [`ckan`] - CKAN registry portals (`package_search`)
//!
//! # Overview
//!
//! Both clients implement [`catalogo_core::CatalogClient`]: they turn
//! pagination requests into HTTP calls and normalize raw items into
//! canonical records. [`catalog::CatalogClientFactoryEnum`] picks the
//! right client for each harvest source.

pub mod catalog;
pub mod ckan;
pub mod http;
pub mod lenient;
pub mod socrata;

// Re-export main client types
pub use catalog::{CatalogClientEnum, CatalogClientFactoryEnum, RawItemEnum};
pub use ckan::CkanClient;
pub use http::CatalogHttp;
pub use socrata::SocrataClient;
