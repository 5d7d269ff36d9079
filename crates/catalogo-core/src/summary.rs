//! Summary tabulation over harvested records.

use std::collections::HashMap;

use crate::models::{CanonicalRecord, SummaryMetric, SummaryRow};

/// Key used for records whose `type` is empty.
pub const UNKNOWN_TYPE: &str = "unknown";

/// Counts records by type and by category label.
///
/// Every `type` row precedes every `category` row. Within each metric, rows
/// are ordered by descending count, then ascending key.
///
/// # Examples
///
/// ```
/// use catalogo_core::{CanonicalRecord, SummaryMetric, summarize};
///
/// let records = vec![
///     CanonicalRecord { record_type: "dataset".into(), categories: "Salud, Educación".into(), ..Default::default() },
///     CanonicalRecord { record_type: "".into(), categories: "Salud".into(), ..Default::default() },
/// ];
///
/// let rows = summarize(&records);
/// assert_eq!(rows[0].metric, SummaryMetric::Type);
/// assert_eq!(rows[0].key, "dataset");
/// assert_eq!(rows[1].key, "unknown");
/// assert_eq!((rows[2].key.as_str(), rows[2].count), ("Salud", 2));
/// ```
pub fn summarize(records: &[CanonicalRecord]) -> Vec<SummaryRow> {
    let mut by_type: HashMap<&str, usize> = HashMap::new();
    let mut by_category: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let kind = if record.record_type.is_empty() {
            UNKNOWN_TYPE
        } else {
            record.record_type.as_str()
        };
        *by_type.entry(kind).or_default() += 1;

        for label in record.category_labels() {
            *by_category.entry(label).or_default() += 1;
        }
    }

    let mut rows = ranked(SummaryMetric::Type, by_type);
    rows.extend(ranked(SummaryMetric::Category, by_category));
    rows
}

fn ranked(metric: SummaryMetric, counts: HashMap<&str, usize>) -> Vec<SummaryRow> {
    let mut rows: Vec<SummaryRow> = counts
        .into_iter()
        .map(|(key, count)| SummaryRow {
            metric,
            key: key.to_string(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    rows
}
