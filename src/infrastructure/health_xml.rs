// Streaming reader for health export XML
use crate::domain::sample::{HealthSample, MetadataEntry, SampleError, SampleRecord};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;
use tokio::io::AsyncBufRead;

const RECORD_TAG: &[u8] = b"Record";
const METADATA_TAG: &[u8] = b"MetadataEntry";

#[derive(Debug, Error)]
pub enum ExportParseError {
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
    #[error("record {index}: {source}")]
    InvalidRecord { index: usize, source: SampleError },
}

/// Parse every `<Record>` of an export, validating as it goes.
///
/// The input is consumed incrementally. The first invalid record aborts the
/// whole read, so callers either get every sample or none.
pub async fn read_samples<R>(input: R) -> Result<Vec<HealthSample>, ExportParseError>
where
    R: AsyncBufRead + Unpin,
{
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();
    let mut samples = Vec::new();
    let mut open_record: Option<SampleRecord> = None;

    loop {
        match reader.read_event_into_async(&mut buf).await? {
            Event::Start(e) if e.name().as_ref() == RECORD_TAG => {
                open_record = Some(record_from_attributes(&e)?);
            }
            Event::Empty(e) if e.name().as_ref() == RECORD_TAG => {
                let record = record_from_attributes(&e)?;
                push_validated(&mut samples, record)?;
            }
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == METADATA_TAG => {
                // Metadata outside a record (workouts, correlations) is not kept.
                if let Some(record) = open_record.as_mut() {
                    if let Some(entry) = metadata_from_attributes(&e)? {
                        record.metadata.push(entry);
                    }
                }
            }
            Event::End(e) if e.name().as_ref() == RECORD_TAG => {
                if let Some(record) = open_record.take() {
                    push_validated(&mut samples, record)?;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    tracing::debug!("Parsed {} samples from export", samples.len());
    Ok(samples)
}

fn push_validated(
    samples: &mut Vec<HealthSample>,
    record: SampleRecord,
) -> Result<(), ExportParseError> {
    let index = samples.len() + 1;
    let sample = record
        .validate()
        .map_err(|source| ExportParseError::InvalidRecord { index, source })?;
    samples.push(sample);
    Ok(())
}

fn record_from_attributes(e: &BytesStart<'_>) -> Result<SampleRecord, quick_xml::Error> {
    let mut record = SampleRecord::default();
    for attr in e.attributes() {
        let attr = attr?;
        let value = Some(attr.unescape_value()?.into_owned());
        match attr.key.as_ref() {
            b"type" => record.type_identifier = value,
            b"unit" => record.unit = value,
            b"value" => record.value = value,
            b"sourceName" => record.source_name = value,
            b"sourceVersion" => record.source_version = value,
            b"device" => record.device = value,
            b"creationDate" => record.creation_date = value,
            b"startDate" => record.start_date = value,
            b"endDate" => record.end_date = value,
            _ => {}
        }
    }
    Ok(record)
}

fn metadata_from_attributes(e: &BytesStart<'_>) -> Result<Option<MetadataEntry>, quick_xml::Error> {
    let mut key = None;
    let mut value = None;
    for attr in e.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"key" => key = Some(attr.unescape_value()?.into_owned()),
            b"value" => value = Some(attr.unescape_value()?.into_owned()),
            _ => {}
        }
    }
    Ok(match (key, value) {
        (Some(key), Some(value)) if !key.is_empty() && !value.is_empty() => {
            Some(MetadataEntry { key, value })
        }
        _ => None,
    })
}
