// Repository trait for health sample storage
use crate::domain::dashboard::DateSpan;
use crate::domain::sample::{HealthSample, SampleKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Totals answered from store counters, without scanning samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub records: usize,
    pub metadata_entries: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCount {
    pub type_identifier: String,
    pub count: usize,
}

/// Half-open `[from, to)` range over sample start times; `None` is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }
}

pub type SampleFilter = dyn Fn(&HealthSample) -> bool + Send + Sync;

#[async_trait]
pub trait SampleRepository: Send + Sync {
    /// Commit a validated batch as a unit. Returns the number of samples added.
    async fn append_batch(&self, batch: Vec<HealthSample>) -> anyhow::Result<usize>;

    async fn counts(&self) -> anyhow::Result<StoreCounts>;

    /// Per type identifier, most frequent first.
    async fn count_by_type(&self) -> anyhow::Result<Vec<TypeCount>>;

    async fn date_span(&self) -> anyhow::Result<Option<DateSpan>>;

    /// Samples of one kind whose start falls in `range`, oldest first.
    async fn samples(
        &self,
        kind: SampleKind,
        range: TimeRange,
    ) -> anyhow::Result<Vec<Arc<HealthSample>>>;

    /// The newest `limit` samples of one kind accepted by `filter`, newest first.
    async fn most_recent(
        &self,
        kind: SampleKind,
        limit: usize,
        filter: &SampleFilter,
    ) -> anyhow::Result<Vec<Arc<HealthSample>>>;
}
