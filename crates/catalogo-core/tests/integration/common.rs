//! Test utilities and mock implementations for integration tests.
//!
//! Provides an in-memory catalog source built on the real pagination
//! engine, a factory that scripts one source per label, and a recording
//! sink, so `HarvestService` runs end to end without HTTP.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use catalogo_core::pagination::{Page, PageFetcher, PageRequest, PaginationLimits, paginate};
use catalogo_core::traits::{CatalogClient, CatalogClientFactory, CatalogQuery, HarvestSource};
use catalogo_core::{AppError, CanonicalRecord, CatalogSink, PlatformKind, SummaryRow, TargetEntry};
use futures::stream::BoxStream;

// =============================================================================
// Mock source data
// =============================================================================

/// Raw item served by a mock source.
#[derive(Clone, Debug)]
pub struct MockItem {
    pub id: String,
    pub title: String,
    pub published: String,
    pub category: String,
}

impl MockItem {
    pub fn new(id: &str, published: &str) -> Self {
        Self {
            id: id.to_string(),
            title: format!("Dataset {}", id),
            published: published.to_string(),
            category: String::new(),
        }
    }
}

/// Generates `n` items with ids `{prefix}-0 .. {prefix}-(n-1)`.
pub fn items(prefix: &str, n: usize) -> Vec<MockItem> {
    (0..n)
        .map(|i| MockItem::new(&format!("{}-{}", prefix, i), "2024-03-15T00:00:00Z"))
        .collect()
}

/// How a mock source behaves.
#[derive(Clone, Debug, Default)]
pub struct MockSource {
    pub items: Vec<MockItem>,
    /// Report `count` like a registry API does.
    pub report_total: bool,
    /// Fail the page request starting at this offset.
    pub fail_at_offset: Option<usize>,
    /// Answer every page request with "not found".
    pub missing: bool,
}

impl MockSource {
    pub fn serving(items: Vec<MockItem>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }

    pub fn with_total(mut self) -> Self {
        self.report_total = true;
        self
    }

    pub fn failing_at(mut self, offset: usize) -> Self {
        self.fail_at_offset = Some(offset);
        self
    }

    pub fn missing() -> Self {
        Self {
            missing: true,
            ..Default::default()
        }
    }
}

// =============================================================================
// MockCatalogClient
// =============================================================================

struct MockPager {
    label: String,
    source: MockSource,
    page_requests: Arc<AtomicUsize>,
}

impl PageFetcher for MockPager {
    type Item = MockItem;

    fn label(&self) -> String {
        self.label.clone()
    }

    async fn fetch_page(&self, request: PageRequest) -> Result<Page<MockItem>, AppError> {
        self.page_requests.fetch_add(1, Ordering::SeqCst);
        if self.source.missing {
            return Err(AppError::NotFound(self.label.clone()));
        }
        if self.source.fail_at_offset == Some(request.offset) {
            return Err(AppError::ClientError("HTTP 503 Service Unavailable".to_string()));
        }
        let total = self.source.items.len();
        let start = request.offset.min(total);
        let end = (request.offset + request.size).min(total);
        let page_items = self.source.items[start..end].to_vec();
        Ok(if self.source.report_total {
            Page::with_total(page_items, total)
        } else {
            Page::new(page_items)
        })
    }
}

/// Mock client paginating a scripted item list.
pub struct MockCatalogClient {
    label: String,
    source: MockSource,
    page_requests: Arc<AtomicUsize>,
}

impl CatalogClient for MockCatalogClient {
    type RawItem = MockItem;

    fn platform(&self) -> PlatformKind {
        PlatformKind::Discovery
    }

    fn paginate(
        &self,
        _query: &CatalogQuery,
        limits: PaginationLimits,
    ) -> BoxStream<'static, Result<MockItem, AppError>> {
        let pager = MockPager {
            label: self.label.clone(),
            source: self.source.clone(),
            page_requests: self.page_requests.clone(),
        };
        paginate(pager, 0, limits)
    }

    fn normalize(&self, item: MockItem) -> CanonicalRecord {
        CanonicalRecord {
            name: item.title,
            id: item.id,
            record_type: "dataset".to_string(),
            domain: Some(self.label.clone()),
            categories: item.category,
            publication_date: item.published,
            ..Default::default()
        }
    }
}

// =============================================================================
// MockCatalogClientFactory
// =============================================================================

/// Factory serving one scripted [`MockSource`] per source label.
///
/// Labels without a script behave like an absent domain.
#[derive(Clone, Default)]
pub struct MockCatalogClientFactory {
    sources: HashMap<String, MockSource>,
    page_requests: Arc<Mutex<HashMap<String, Arc<AtomicUsize>>>>,
}

impl MockCatalogClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, label: &str, source: MockSource) -> Self {
        self.sources.insert(label.to_string(), source);
        self
    }

    /// Page requests made so far against `label`.
    pub fn page_requests(&self, label: &str) -> usize {
        self.page_requests
            .lock()
            .unwrap()
            .get(label)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Page requests made so far against every source.
    pub fn total_page_requests(&self) -> usize {
        self.page_requests
            .lock()
            .unwrap()
            .values()
            .map(|c| c.load(Ordering::SeqCst))
            .sum()
    }

    fn counter(&self, label: &str) -> Arc<AtomicUsize> {
        self.page_requests
            .lock()
            .unwrap()
            .entry(label.to_string())
            .or_default()
            .clone()
    }
}

impl CatalogClientFactory for MockCatalogClientFactory {
    type Client = MockCatalogClient;

    fn create(&self, source: &HarvestSource) -> Result<Self::Client, AppError> {
        let label = source.label().to_string();
        let script = self
            .sources
            .get(&label)
            .cloned()
            .unwrap_or_else(MockSource::missing);
        Ok(MockCatalogClient {
            page_requests: self.counter(&label),
            label,
            source: script,
        })
    }
}

// =============================================================================
// MemorySink
// =============================================================================

/// One `write_target` call captured by [`MemorySink`].
#[derive(Clone, Debug)]
pub struct SinkWrite {
    pub target: String,
    pub records: Vec<CanonicalRecord>,
    pub summary: Vec<SummaryRow>,
}

/// Sink that keeps every write in memory.
#[derive(Default)]
pub struct MemorySink {
    pub writes: Vec<SinkWrite>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_for(&self, target: &str) -> Option<&SinkWrite> {
        self.writes.iter().find(|w| w.target == target)
    }
}

impl CatalogSink for MemorySink {
    fn write_target(
        &mut self,
        target: &TargetEntry,
        records: &[CanonicalRecord],
        summary: &[SummaryRow],
    ) -> Result<(), AppError> {
        self.writes.push(SinkWrite {
            target: target.name.clone(),
            records: records.to_vec(),
            summary: summary.to_vec(),
        });
        Ok(())
    }
}

/// Sink whose every write fails like a full disk.
pub struct FailingSink;

impl CatalogSink for FailingSink {
    fn write_target(
        &mut self,
        _target: &TargetEntry,
        _records: &[CanonicalRecord],
        _summary: &[SummaryRow],
    ) -> Result<(), AppError> {
        Err(AppError::IoError(std::io::Error::other("No space left on device")))
    }
}
