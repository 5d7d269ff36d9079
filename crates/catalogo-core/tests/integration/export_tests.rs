//! Integration tests for the file sink.
//!
//! These tests run a harvest into a `DirectorySink` in a temporary
//! directory and read the written files back.

use std::collections::BTreeSet;
use std::path::Path;

use crate::integration::common::{MockCatalogClientFactory, MockSource, items};
use catalogo_core::export::{CatalogSink, DirectorySink, write_csv};
use catalogo_core::harvest::HarvestService;
use catalogo_core::{CanonicalRecord, CatalogQuery, DateRange, TargetEntry};

fn read_json(path: &Path) -> Vec<serde_json::Map<String, serde_json::Value>> {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn read_csv(path: &Path) -> (Vec<String>, usize) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let header = reader.headers().unwrap().iter().map(str::to_string).collect();
    let rows = reader.records().count();
    (header, rows)
}

#[tokio::test]
async fn test_run_writes_three_files_per_target() {
    let dir = tempfile::tempdir().unwrap();
    let factory = MockCatalogClientFactory::new()
        .with_source("www.datos.gov.co", MockSource::serving(items("co", 7)))
        .with_source("data.pr.gov", MockSource::serving(items("pr", 2)));
    let service = HarvestService::new(factory);

    let colombia = TargetEntry::discovery("Colombia", &["www.datos.gov.co"]);
    let puerto_rico = TargetEntry::discovery("Puerto Rico", &["data.pr.gov"]);
    let mut sink = DirectorySink::new(dir.path());

    service
        .run(
            &[&colombia, &puerto_rico],
            &CatalogQuery::default(),
            &DateRange::default(),
            &mut sink,
        )
        .await
        .unwrap();

    for (stem, expected) in [("colombia", 7), ("puerto_rico", 2)] {
        let json = read_json(&dir.path().join(format!("{}_catalog.json", stem)));
        let (header, rows) = read_csv(&dir.path().join(format!("{}_catalog.csv", stem)));
        assert_eq!(json.len(), expected);
        assert_eq!(rows, json.len());
        for object in &json {
            assert!(object.keys().all(|k| header.contains(k)));
        }

        let (summary_header, _) = read_csv(&dir.path().join(format!("{}_summary.csv", stem)));
        assert_eq!(summary_header, vec!["count", "key", "metric"]);
    }
}

#[test]
fn test_csv_matches_json_for_mixed_sources() {
    let dir = tempfile::tempdir().unwrap();
    let discovery = CanonicalRecord {
        name: "Calidad del aire".to_string(),
        id: "abcd-1234".to_string(),
        record_type: "dataset".to_string(),
        domain: Some("www.datos.gov.co".to_string()),
        download_count: Some(42),
        ..Default::default()
    };
    let registry = CanonicalRecord {
        name: "Presupuesto".to_string(),
        id: "f3b1".to_string(),
        record_type: "dataset".to_string(),
        num_resources: Some(0),
        license: Some(String::new()),
        organization: Some("SHCP".to_string()),
        ..Default::default()
    };
    let target = TargetEntry::discovery("Mixed", &[]);
    let mut sink = DirectorySink::new(dir.path());

    sink.write_target(&target, &[discovery, registry], &[])
        .unwrap();

    let (json_path, csv_path, _) = sink.paths_for(&target);
    let json = read_json(&json_path);
    let (header, rows) = read_csv(&csv_path);

    assert_eq!(rows, 2);
    let union: BTreeSet<&String> = json.iter().flat_map(|o| o.keys()).collect();
    let header_set: BTreeSet<&String> = header.iter().collect();
    assert_eq!(union, header_set);
    // Only the registry record carries these keys.
    assert!(json[0].get("license").is_none());
    assert!(json[1].contains_key("license"));
}

#[test]
fn test_empty_target_writes_fallback_headers() {
    let dir = tempfile::tempdir().unwrap();
    let target = TargetEntry::registry("Vacío", "https://example.org");
    let mut sink = DirectorySink::new(dir.path().join("nested").join("out"));

    sink.write_target(&target, &[], &[]).unwrap();

    let (json_path, csv_path, summary_path) = sink.paths_for(&target);
    assert!(read_json(&json_path).is_empty());
    assert_eq!(
        std::fs::read_to_string(csv_path).unwrap(),
        "name,id,type,domain,permalink,domain_category\n"
    );
    assert_eq!(
        std::fs::read_to_string(summary_path).unwrap(),
        "count,key,metric\n"
    );
}

#[test]
fn test_write_csv_counts_rows() {
    let records: Vec<CanonicalRecord> = (0..5)
        .map(|i| CanonicalRecord {
            id: i.to_string(),
            ..Default::default()
        })
        .collect();
    let mut out = Vec::new();
    assert_eq!(write_csv(&mut out, &records, &[]).unwrap(), 5);
}
