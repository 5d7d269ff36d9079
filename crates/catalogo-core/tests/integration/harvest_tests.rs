//! Integration tests for HarvestService.
//!
//! These tests drive the real pagination engine, date filter and summary
//! through mock sources.

use std::sync::Mutex;

use crate::integration::common::{
    FailingSink, MemorySink, MockCatalogClientFactory, MockItem, MockSource, items,
};
use catalogo_core::harvest::{HarvestService, select_targets};
use catalogo_core::{
    AppError, CatalogQuery, DateRange, HarvestConfig, HarvestEvent, PlatformKind,
    ProgressReporter, RunOptions, SilentReporter, SummaryMetric, TargetEntry, TargetsConfig,
};

const REGISTRY_URL: &str = "https://catalog.example.org";

fn config(cap: usize, page_size: usize) -> HarvestConfig {
    HarvestConfig::default()
        .with_per_target_cap(cap)
        .with_page_size(page_size)
}

fn all_dates() -> DateRange {
    DateRange::parse(None, None)
}

#[tokio::test]
async fn test_registry_total_drives_page_count() {
    let factory = MockCatalogClientFactory::new()
        .with_source(REGISTRY_URL, MockSource::serving(items("pkg", 250)).with_total());
    let service = HarvestService::with_config(factory.clone(), config(1000, 100));
    let target = TargetEntry::registry("Registry", REGISTRY_URL);

    let harvest = service
        .harvest_target(&target, &CatalogQuery::default(), &SilentReporter)
        .await;

    assert_eq!(harvest.records.len(), 250);
    // ceil(250 / 100) pages, no trailing empty request
    assert_eq!(factory.page_requests(REGISTRY_URL), 3);
    assert!(harvest.units[0].error.is_none());
}

#[tokio::test]
async fn test_cap_stops_pagination() {
    let factory = MockCatalogClientFactory::new()
        .with_source("big.example", MockSource::serving(items("d", 1000)));
    let service = HarvestService::with_config(factory.clone(), config(150, 100));
    let target = TargetEntry::discovery("Big", &["big.example"]);

    let harvest = service
        .harvest_target(&target, &CatalogQuery::default(), &SilentReporter)
        .await;

    assert_eq!(harvest.records.len(), 150);
    assert_eq!(harvest.records[0].id, "d-0");
    assert_eq!(harvest.records[149].id, "d-149");
    assert_eq!(factory.page_requests("big.example"), 2);
}

#[tokio::test]
async fn test_zero_cap_makes_no_requests() {
    let factory = MockCatalogClientFactory::new()
        .with_source("big.example", MockSource::serving(items("d", 10)));
    let service = HarvestService::with_config(factory.clone(), config(0, 100));
    let target = TargetEntry::discovery("Big", &["big.example"]);

    let harvest = service
        .harvest_target(&target, &CatalogQuery::default(), &SilentReporter)
        .await;

    assert!(harvest.records.is_empty());
    assert_eq!(factory.total_page_requests(), 0);
}

#[tokio::test]
async fn test_cap_applies_per_domain() {
    let factory = MockCatalogClientFactory::new()
        .with_source("a.example", MockSource::serving(items("a", 300)))
        .with_source("b.example", MockSource::serving(items("b", 300)));
    let service = HarvestService::with_config(factory, config(200, 100));
    let target = TargetEntry::discovery("Two", &["a.example", "b.example"]);

    let harvest = service
        .harvest_target(&target, &CatalogQuery::default(), &SilentReporter)
        .await;

    assert_eq!(harvest.records.len(), 400);
    assert_eq!(harvest.units.len(), 2);
    assert!(harvest.units.iter().all(|u| u.records == 200));
    assert!(harvest.records[..200].iter().all(|r| r.id.starts_with("a-")));
    assert!(harvest.records[200..].iter().all(|r| r.id.starts_with("b-")));
}

#[tokio::test]
async fn test_missing_domain_is_quietly_empty() {
    let factory = MockCatalogClientFactory::new();
    let service = HarvestService::with_config(factory.clone(), config(100, 10));
    let target = TargetEntry::discovery("Ghost", &["ghost.example"]);

    let harvest = service
        .harvest_target(&target, &CatalogQuery::default(), &SilentReporter)
        .await;

    assert!(harvest.records.is_empty());
    assert!(harvest.units[0].error.is_none());
    assert_eq!(factory.page_requests("ghost.example"), 1);
}

#[tokio::test]
async fn test_unsupported_platform_yields_nothing() {
    let factory = MockCatalogClientFactory::new();
    let service = HarvestService::new(factory.clone());
    let mut target = TargetEntry::discovery("Elsewhere", &["x.example"]);
    target.platform = PlatformKind::Unsupported("arcgis".to_string());

    let mut sink = MemorySink::new();
    let outcome = service
        .run(&[&target], &CatalogQuery::default(), &all_dates(), &mut sink)
        .await
        .unwrap();

    assert!(outcome.records.is_empty());
    assert!(outcome.summary.targets[0].unsupported);
    assert_eq!(factory.total_page_requests(), 0);
    // Empty outputs are still written for the target.
    assert!(sink.write_for("Elsewhere").unwrap().records.is_empty());
}

#[tokio::test]
async fn test_failing_target_does_not_affect_others() {
    let factory = MockCatalogClientFactory::new()
        .with_source("flaky.example", MockSource::serving(items("f", 250)).failing_at(100))
        .with_source(REGISTRY_URL, MockSource::serving(items("r", 30)).with_total());
    let service = HarvestService::with_config(factory, config(1000, 100));

    let flaky = TargetEntry::discovery("Flaky", &["flaky.example"]);
    let healthy = TargetEntry::registry("Healthy", REGISTRY_URL);
    let mut sink = MemorySink::new();

    let outcome = service
        .run(
            &[&flaky, &healthy],
            &CatalogQuery::default(),
            &all_dates(),
            &mut sink,
        )
        .await
        .unwrap();

    let flaky_result = &outcome.summary.targets[0];
    assert_eq!(flaky_result.retained, 100);
    assert_eq!(flaky_result.errors().len(), 1);
    assert!(flaky_result.errors()[0].contains("503"));

    let healthy_result = &outcome.summary.targets[1];
    assert_eq!(healthy_result.retained, 30);
    assert!(healthy_result.errors().is_empty());

    assert_eq!(outcome.summary.total_records(), 130);
    assert_eq!(outcome.summary.failed_sources(), 1);
    assert_eq!(outcome.records.len(), 130);
    assert!(outcome.records[..100].iter().all(|r| r.id.starts_with("f-")));
}

#[tokio::test]
async fn test_date_filter_runs_before_sink_and_summary() {
    let mut dated = vec![
        MockItem::new("old", "2019-06-01T12:00:00"),
        MockItem::new("edge", "2024-03-15T00:00:00Z"),
        MockItem::new("undated", ""),
        MockItem::new("new", "2024-03-16"),
    ];
    dated[1].category = "Salud".to_string();

    let factory = MockCatalogClientFactory::new()
        .with_source("dated.example", MockSource::serving(dated));
    let service = HarvestService::new(factory);
    let target = TargetEntry::discovery("Dated", &["dated.example"]);
    let range = DateRange::parse(Some("2024-03-15"), Some("2024/03/15"));

    let mut sink = MemorySink::new();
    let outcome = service
        .run(&[&target], &CatalogQuery::default(), &range, &mut sink)
        .await
        .unwrap();

    let result = &outcome.summary.targets[0];
    assert_eq!(result.harvested, 4);
    assert_eq!(result.retained, 1);

    let write = sink.write_for("Dated").unwrap();
    assert_eq!(write.records.len(), 1);
    assert_eq!(write.records[0].id, "edge");
    assert_eq!(write.summary.len(), 2);
    assert_eq!(write.summary[0].metric, SummaryMetric::Type);
    assert_eq!(write.summary[1].key, "Salud");
}

#[tokio::test]
async fn test_sink_failure_aborts_run() {
    let factory = MockCatalogClientFactory::new()
        .with_source("a.example", MockSource::serving(items("a", 5)));
    let service = HarvestService::new(factory);
    let target = TargetEntry::discovery("A", &["a.example"]);

    let result = service
        .run(
            &[&target],
            &CatalogQuery::default(),
            &all_dates(),
            &mut FailingSink,
        )
        .await;

    assert!(matches!(result, Err(AppError::IoError(_))));
}

#[tokio::test]
async fn test_unknown_target_fails_before_any_request() {
    let factory = MockCatalogClientFactory::new()
        .with_source("a.example", MockSource::serving(items("a", 5)));
    let targets = TargetsConfig {
        targets: vec![TargetEntry::discovery("Colombia", &["a.example"])],
        defaults: RunOptions::default(),
    };

    let selected = select_targets(&targets, Some("Narnia"));

    assert!(matches!(selected, Err(AppError::TargetNotFound(name)) if name == "Narnia"));
    assert_eq!(factory.total_page_requests(), 0);
}

#[derive(Default)]
struct EventLog(Mutex<Vec<String>>);

impl ProgressReporter for EventLog {
    fn report(&self, event: HarvestEvent<'_>) {
        let entry = match event {
            HarvestEvent::RunStarted { total_targets } => format!("run:{}", total_targets),
            HarvestEvent::TargetStarted { target_name, .. } => format!("target:{}", target_name),
            HarvestEvent::SourceCompleted {
                source, records, error, ..
            } => format!("source:{}:{}:{}", source, records, error.is_some()),
            HarvestEvent::TargetCompleted { retained, .. } => format!("done:{}", retained),
            HarvestEvent::RunCompleted { summary } => {
                format!("end:{}", summary.total_records())
            }
            HarvestEvent::NoSources { target_name } => format!("empty:{}", target_name),
            _ => return,
        };
        self.0.lock().unwrap().push(entry);
    }
}

#[tokio::test]
async fn test_progress_events_in_order() {
    let factory = MockCatalogClientFactory::new()
        .with_source("a.example", MockSource::serving(items("a", 3)));
    let service = HarvestService::new(factory);
    let with_domain = TargetEntry::discovery("A", &["a.example"]);
    let without_domains = TargetEntry::discovery("B", &[]);

    let log = EventLog::default();
    service
        .run_with_progress(
            &[&with_domain, &without_domains],
            &CatalogQuery::default(),
            &all_dates(),
            &mut MemorySink::new(),
            &log,
        )
        .await
        .unwrap();

    assert_eq!(
        *log.0.lock().unwrap(),
        vec![
            "run:2",
            "target:A",
            "source:a.example:3:false",
            "done:3",
            "target:B",
            "empty:B",
            "done:0",
            "end:3",
        ]
    );
}
