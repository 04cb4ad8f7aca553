// Ingest service - Use case for loading a health export into the store
use crate::application::sample_repository::{SampleRepository, StoreCounts};
use crate::domain::sample::SampleError;
use crate::infrastructure::health_xml::{read_samples, ExportParseError};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncBufRead;

/// Raised by the upload reader once the byte budget is spent.
#[derive(Debug, Error)]
#[error("upload exceeds the {limit} byte limit")]
pub struct UploadTooLarge {
    pub limit: u64,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Invalid record {record}: {source}")]
    Validation { record: usize, source: SampleError },
    #[error("Malformed XML: {0}")]
    Malformed(quick_xml::Error),
    #[error(transparent)]
    TooLarge(UploadTooLarge),
    #[error("Failed to read upload: {0}")]
    Io(Arc<std::io::Error>),
    #[error("Storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<ExportParseError> for IngestError {
    fn from(err: ExportParseError) -> Self {
        match err {
            ExportParseError::InvalidRecord { index, source } => IngestError::Validation {
                record: index,
                source,
            },
            ExportParseError::Xml(quick_xml::Error::Io(io)) => {
                match io.get_ref().and_then(|e| e.downcast_ref::<UploadTooLarge>()) {
                    Some(too_large) => IngestError::TooLarge(UploadTooLarge {
                        limit: too_large.limit,
                    }),
                    None => IngestError::Io(io),
                }
            }
            ExportParseError::Xml(other) => IngestError::Malformed(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    pub ingested: usize,
    pub counts: StoreCounts,
}

#[derive(Clone)]
pub struct IngestService {
    repository: Arc<dyn SampleRepository>,
}

impl IngestService {
    pub fn new(repository: Arc<dyn SampleRepository>) -> Self {
        Self { repository }
    }

    /// Parse an export and commit it as one batch. Nothing is stored unless
    /// every record is valid.
    pub async fn ingest<R>(&self, export: R) -> Result<IngestReport, IngestError>
    where
        R: AsyncBufRead + Unpin,
    {
        let samples = read_samples(export).await?;
        let ingested = self.repository.append_batch(samples).await?;
        let counts = self.repository.counts().await?;

        tracing::info!(
            "Ingested {} records ({} stored, {} metadata entries)",
            ingested,
            counts.records,
            counts.metadata_entries
        );
        Ok(IngestReport { ingested, counts })
    }

    pub async fn counts(&self) -> anyhow::Result<StoreCounts> {
        self.repository.counts().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory_store::InMemoryStore;

    fn export(records: &[&str]) -> String {
        format!("<HealthData>\n{}\n</HealthData>", records.join("\n"))
    }

    const STEPS: &str = r#"<Record type="HKQuantityTypeIdentifierStepCount" unit="count" startDate="2024-03-01 09:00:00 +0000" endDate="2024-03-01 09:10:00 +0000" value="812"/>"#;
    const HEART: &str = r#"<Record type="HKQuantityTypeIdentifierHeartRate" unit="count/min" startDate="2024-03-01 09:00:00 +0000" endDate="2024-03-01 09:00:00 +0000" value="64"><MetadataEntry key="HKMetadataKeyHeartRateMotionContext" value="0"/></Record>"#;
    const BAD_VALUE: &str = r#"<Record type="HKQuantityTypeIdentifierStepCount" unit="count" startDate="2024-03-01 09:00:00 +0000" endDate="2024-03-01 09:10:00 +0000" value="many"/>"#;

    #[tokio::test]
    async fn test_ingest_adds_every_record() {
        let service = IngestService::new(Arc::new(InMemoryStore::new()));
        let before = service.counts().await.unwrap();

        let report = service
            .ingest(export(&[STEPS, HEART, STEPS]).as_bytes())
            .await
            .unwrap();

        assert_eq!(report.ingested, 3);
        assert_eq!(report.counts.records, before.records + 3);
        assert_eq!(report.counts.metadata_entries, 1);
    }

    #[tokio::test]
    async fn test_invalid_batch_leaves_store_untouched() {
        let service = IngestService::new(Arc::new(InMemoryStore::new()));
        service.ingest(export(&[STEPS]).as_bytes()).await.unwrap();

        let err = service
            .ingest(export(&[HEART, STEPS, BAD_VALUE]).as_bytes())
            .await
            .unwrap_err();
        match err {
            IngestError::Validation { record, source } => {
                assert_eq!(record, 3);
                assert_eq!(source, SampleError::NonNumericValue("many".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }

        let counts = service.counts().await.unwrap();
        assert_eq!(counts.records, 1);
        assert_eq!(counts.metadata_entries, 0);
    }

    #[test]
    fn test_too_large_is_recognised_through_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, UploadTooLarge { limit: 10 });
        let parse_err = ExportParseError::Xml(quick_xml::Error::Io(Arc::new(io)));
        assert!(matches!(
            IngestError::from(parse_err),
            IngestError::TooLarge(UploadTooLarge { limit: 10 })
        ));
    }
}
