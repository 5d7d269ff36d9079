//! Output sinks for harvested records.
//!
//! Each target produces three files in the output directory:
//!
//! - `{stem}_catalog.json` - pretty-printed JSON array of records
//! - `{stem}_catalog.csv` - the same records, same order, as CSV
//! - `{stem}_summary.csv` - the [`SummaryRow`] table
//!
//! where `{stem}` is [`TargetEntry::file_stem`]. CSV headers are the sorted
//! union of the serialized keys of every row, so optional registry-only
//! fields appear as columns only when some record carries them.
//!
//! # Example
//!
//! ```no_run
//! use catalogo_core::export::{CatalogSink, DirectorySink};
//! use catalogo_core::TargetEntry;
//!
//! let mut sink = DirectorySink::new("output");
//! let target = TargetEntry::discovery("Colombia", &["www.datos.gov.co"]);
//! sink.write_target(&target, &[], &[])?;
//! # Ok::<(), catalogo_core::AppError>(())
//! ```

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::config::TargetEntry;
use crate::error::AppError;
use crate::models::{CanonicalRecord, SummaryRow};

/// Header used for a catalog CSV with no records.
pub const EMPTY_CATALOG_HEADER: &[&str] =
    &["name", "id", "type", "domain", "permalink", "domain_category"];

/// Header used for a summary CSV with no rows.
pub const EMPTY_SUMMARY_HEADER: &[&str] = &["count", "key", "metric"];

/// Destination for one target's filtered records and summary.
///
/// Sink failures are fatal for the run: the runner propagates them instead
/// of recording them per target.
pub trait CatalogSink {
    fn write_target(
        &mut self,
        target: &TargetEntry,
        records: &[CanonicalRecord],
        summary: &[SummaryRow],
    ) -> Result<(), AppError>;
}

/// Writes per-target files into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths of the catalog JSON, catalog CSV and summary CSV for `target`.
    pub fn paths_for(&self, target: &TargetEntry) -> (PathBuf, PathBuf, PathBuf) {
        let stem = target.file_stem();
        (
            self.dir.join(format!("{}_catalog.json", stem)),
            self.dir.join(format!("{}_catalog.csv", stem)),
            self.dir.join(format!("{}_summary.csv", stem)),
        )
    }
}

impl CatalogSink for DirectorySink {
    fn write_target(
        &mut self,
        target: &TargetEntry,
        records: &[CanonicalRecord],
        summary: &[SummaryRow],
    ) -> Result<(), AppError> {
        std::fs::create_dir_all(&self.dir)?;
        let (json_path, csv_path, summary_path) = self.paths_for(target);

        write_json(BufWriter::new(File::create(&json_path)?), records)?;
        write_csv(
            File::create(&csv_path)?,
            records,
            EMPTY_CATALOG_HEADER,
        )?;
        write_csv(
            File::create(&summary_path)?,
            summary,
            EMPTY_SUMMARY_HEADER,
        )?;

        tracing::debug!(
            target_name = %target.name,
            records = records.len(),
            json = %json_path.display(),
            csv = %csv_path.display(),
            summary = %summary_path.display(),
            "Wrote target outputs"
        );
        Ok(())
    }
}

/// Writes `rows` as a pretty-printed JSON array (UTF-8, non-ASCII kept as is).
pub fn write_json<W: Write, T: Serialize>(mut writer: W, rows: &[T]) -> Result<(), AppError> {
    serde_json::to_writer_pretty(&mut writer, rows)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Writes `rows` as CSV and returns the number of data rows written.
///
/// Every row must serialize to a JSON object. The header is the sorted union
/// of all keys, or `fallback_header` when `rows` is empty. Missing keys and
/// `null` values become empty cells; nested values are written as JSON text.
pub fn write_csv<W: Write, T: Serialize>(
    writer: W,
    rows: &[T],
    fallback_header: &[&str],
) -> Result<usize, AppError> {
    let objects = rows
        .iter()
        .map(|row| match serde_json::to_value(row)? {
            Value::Object(map) => Ok(map),
            other => Err(AppError::Generic(format!(
                "CSV rows must serialize to objects, got: {}",
                other
            ))),
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    let header: Vec<String> = if objects.is_empty() {
        fallback_header.iter().map(|h| h.to_string()).collect()
    } else {
        objects
            .iter()
            .flat_map(|map| map.keys().cloned())
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect()
    };

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&header)?;
    for map in &objects {
        csv_writer.write_record(header.iter().map(|key| cell(map.get(key))))?;
    }
    csv_writer.flush()?;
    Ok(objects.len())
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
