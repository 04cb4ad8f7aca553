// In-memory sample store with an optional on-disk journal
use crate::application::sample_repository::{
    SampleFilter, SampleRepository, StoreCounts, TimeRange, TypeCount,
};
use crate::domain::dashboard::DateSpan;
use crate::domain::sample::{HealthSample, SampleKind};
use crate::infrastructure::journal::Journal;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Index key: start instant, then record id to keep equal starts apart.
type TimeKey = (DateTime<Utc>, u64);

#[derive(Default)]
struct StoreInner {
    next_id: u64,
    records: HashMap<u64, Arc<HealthSample>>,
    by_kind: HashMap<SampleKind, BTreeMap<TimeKey, Arc<HealthSample>>>,
    type_counts: HashMap<String, usize>,
    metadata_entries: usize,
    span: Option<DateSpan>,
}

impl StoreInner {
    fn insert(&mut self, sample: HealthSample) {
        let id = self.next_id;
        self.next_id += 1;

        self.metadata_entries += sample.metadata.len();
        *self
            .type_counts
            .entry(sample.type_identifier.clone())
            .or_default() += 1;

        self.span = Some(match self.span {
            Some(span) => DateSpan {
                start: if sample.start < span.start { sample.start } else { span.start },
                end: if sample.start > span.end { sample.start } else { span.end },
            },
            None => DateSpan {
                start: sample.start,
                end: sample.start,
            },
        });

        let sample = Arc::new(sample);
        self.by_kind
            .entry(sample.kind)
            .or_default()
            .insert((sample.start.with_timezone(&Utc), id), sample.clone());
        self.records.insert(id, sample);
    }
}

/// Append-only store. Readers share a lock; appends are serialized and
/// become visible as a whole batch.
pub struct InMemoryStore {
    inner: RwLock<StoreInner>,
    journal: Mutex<Option<Journal>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            journal: Mutex::new(None),
        }
    }

    /// Durable store backed by a journal file, replaying what it holds.
    pub async fn with_journal(path: impl AsRef<Path>) -> Result<Self> {
        let (journal, batches) = Journal::open(path.as_ref()).await?;

        let mut inner = StoreInner::default();
        let mut replayed = 0;
        for batch in batches {
            replayed += batch.len();
            for sample in batch {
                inner.insert(sample);
            }
        }
        tracing::info!(
            "Replayed {} samples from {}",
            replayed,
            path.as_ref().display()
        );

        Ok(Self {
            inner: RwLock::new(inner),
            journal: Mutex::new(Some(journal)),
        })
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SampleRepository for InMemoryStore {
    async fn append_batch(&self, batch: Vec<HealthSample>) -> Result<usize> {
        // Held for the whole append so concurrent uploads cannot interleave.
        let mut journal = self.journal.lock().await;
        if let Some(journal) = journal.as_mut() {
            journal.append(&batch).await?;
        }

        let added = batch.len();
        let mut inner = self.inner.write().await;
        for sample in batch {
            inner.insert(sample);
        }
        tracing::debug!("Committed batch of {} samples ({} total)", added, inner.records.len());
        Ok(added)
    }

    async fn counts(&self) -> Result<StoreCounts> {
        let inner = self.inner.read().await;
        Ok(StoreCounts {
            records: inner.records.len(),
            metadata_entries: inner.metadata_entries,
        })
    }

    async fn count_by_type(&self) -> Result<Vec<TypeCount>> {
        let inner = self.inner.read().await;
        let mut counts: Vec<TypeCount> = inner
            .type_counts
            .iter()
            .map(|(type_identifier, count)| TypeCount {
                type_identifier: type_identifier.clone(),
                count: *count,
            })
            .collect();
        counts.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.type_identifier.cmp(&b.type_identifier))
        });
        Ok(counts)
    }

    async fn date_span(&self) -> Result<Option<DateSpan>> {
        Ok(self.inner.read().await.span)
    }

    async fn samples(&self, kind: SampleKind, range: TimeRange) -> Result<Vec<Arc<HealthSample>>> {
        let inner = self.inner.read().await;
        let Some(index) = inner.by_kind.get(&kind) else {
            return Ok(Vec::new());
        };

        let lower = match range.from {
            Some(from) => Bound::Included((from, 0)),
            None => Bound::Unbounded,
        };
        let upper = match range.to {
            Some(to) => Bound::Excluded((to, 0)),
            None => Bound::Unbounded,
        };
        if let (Some(from), Some(to)) = (range.from, range.to) {
            if from >= to {
                return Ok(Vec::new());
            }
        }

        Ok(index.range((lower, upper)).map(|(_, s)| s.clone()).collect())
    }

    async fn most_recent(
        &self,
        kind: SampleKind,
        limit: usize,
        filter: &SampleFilter,
    ) -> Result<Vec<Arc<HealthSample>>> {
        let inner = self.inner.read().await;
        let Some(index) = inner.by_kind.get(&kind) else {
            return Ok(Vec::new());
        };
        Ok(index
            .values()
            .rev()
            .filter(|sample| filter(sample))
            .take(limit)
            .cloned()
            .collect())
    }
}
