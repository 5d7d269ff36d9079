//! Domain models shared by every source adapter and sink.

use serde::{Deserialize, Serialize};

/// A harvested dataset in the unified, source-agnostic shape.
///
/// Records are created by a normalizer from exactly one raw source item and
/// are never modified afterwards; filtering and aggregation only select or
/// count them.
///
/// `name`, `id` and `record_type` are always present (possibly empty). The
/// three registry-only fields are omitted from the serialized form when
/// `None`, so discovery records never carry `num_resources`, `license` or
/// `organization` keys.
///
/// # Examples
///
/// ```
/// use catalogo_core::CanonicalRecord;
///
/// let record = CanonicalRecord {
///     name: "Calidad del aire".to_string(),
///     id: "abcd-1234".to_string(),
///     record_type: "dataset".to_string(),
///     ..Default::default()
/// };
///
/// let json = serde_json::to_value(&record).unwrap();
/// assert_eq!(json["type"], "dataset");
/// assert!(json["domain"].is_null());
/// assert!(json.get("license").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Dataset title.
    pub name: String,
    /// Source-native identifier.
    pub id: String,
    /// Resource kind in the source's own vocabulary (e.g. "dataset", "map").
    #[serde(rename = "type")]
    pub record_type: String,
    pub description: String,
    /// Portal domain, absent for sources without a domain concept.
    pub domain: Option<String>,
    pub permalink: String,
    pub link: String,
    /// Coarse classification: organization title or source category.
    pub domain_category: String,
    /// Comma-joined category labels, in source order.
    pub categories: String,
    /// Comma-joined tag labels, in source order.
    pub tags: String,
    pub download_count: Option<u64>,
    /// Raw publication timestamp as returned by the source, or empty.
    pub publication_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_resources: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

impl CanonicalRecord {
    /// Iterates the individual category labels, trimmed, skipping empties.
    pub fn category_labels(&self) -> impl Iterator<Item = &str> {
        self.categories
            .split(',')
            .map(str::trim)
            .filter(|label| !label.is_empty())
    }
}

/// Which dimension a [`SummaryRow`] counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryMetric {
    Type,
    Category,
}

/// One line of the per-run summary table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub metric: SummaryMetric,
    pub key: String,
    pub count: usize,
}
