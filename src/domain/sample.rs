// Health sample domain model
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Timestamp layout used by health exports, e.g. `2024-03-01 07:15:00 +0100`.
pub const EXPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

pub const STEP_COUNT_TYPE: &str = "HKQuantityTypeIdentifierStepCount";
pub const HEART_RATE_TYPE: &str = "HKQuantityTypeIdentifierHeartRate";
pub const ACTIVE_ENERGY_TYPE: &str = "HKQuantityTypeIdentifierActiveEnergyBurned";
pub const DISTANCE_TYPE: &str = "HKQuantityTypeIdentifierDistanceWalkingRunning";
pub const SLEEP_ANALYSIS_TYPE: &str = "HKCategoryTypeIdentifierSleepAnalysis";

const QUANTITY_TYPE_PREFIX: &str = "HKQuantityTypeIdentifier";
const CATEGORY_TYPE_PREFIX: &str = "HKCategoryTypeIdentifier";
const SLEEP_VALUE_PREFIX: &str = "HKCategoryValueSleepAnalysis";

pub const BEATS_PER_MINUTE: &str = "count/min";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleKind {
    Steps,
    HeartRate,
    ActiveEnergy,
    Distance,
    Sleep,
    Other,
}

impl SampleKind {
    pub fn from_type_identifier(type_identifier: &str) -> Self {
        match type_identifier {
            STEP_COUNT_TYPE => SampleKind::Steps,
            HEART_RATE_TYPE => SampleKind::HeartRate,
            ACTIVE_ENERGY_TYPE => SampleKind::ActiveEnergy,
            DISTANCE_TYPE => SampleKind::Distance,
            SLEEP_ANALYSIS_TYPE => SampleKind::Sleep,
            _ => SampleKind::Other,
        }
    }
}

/// Category records carry a symbolic value, everything else a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleValue {
    Quantity(f64),
    Category(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum SampleError {
    #[error("missing required attribute `{0}`")]
    MissingAttribute(&'static str),
    #[error("malformed timestamp `{value}` in `{attribute}`")]
    MalformedTimestamp {
        attribute: &'static str,
        value: String,
    },
    #[error("value `{0}` is not a finite number")]
    NonNumericValue(String),
    #[error("category value must not be empty")]
    EmptyCategory,
    #[error("endDate {end} is before startDate {start}")]
    EndBeforeStart { start: String, end: String },
}

/// Attribute bag for one `<Record>` element as it appears in an export,
/// before any validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleRecord {
    pub type_identifier: Option<String>,
    pub unit: Option<String>,
    pub value: Option<String>,
    pub source_name: Option<String>,
    pub source_version: Option<String>,
    pub device: Option<String>,
    pub creation_date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub metadata: Vec<MetadataEntry>,
}

impl SampleRecord {
    pub fn validate(self) -> Result<HealthSample, SampleError> {
        let type_identifier = non_empty(self.type_identifier)
            .ok_or(SampleError::MissingAttribute("type"))?;
        let raw_start = non_empty(self.start_date)
            .ok_or(SampleError::MissingAttribute("startDate"))?;
        let raw_value = self.value.ok_or(SampleError::MissingAttribute("value"))?;

        let start = parse_export_timestamp("startDate", &raw_start)?;
        let end = match non_empty(self.end_date) {
            Some(raw) => parse_export_timestamp("endDate", &raw)?,
            None => start,
        };
        if end < start {
            return Err(SampleError::EndBeforeStart {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        let creation_date = non_empty(self.creation_date)
            .map(|raw| parse_export_timestamp("creationDate", &raw))
            .transpose()?;

        let value = if type_identifier.starts_with(CATEGORY_TYPE_PREFIX) {
            let trimmed = raw_value.trim();
            if trimmed.is_empty() {
                return Err(SampleError::EmptyCategory);
            }
            SampleValue::Category(trimmed.to_string())
        } else {
            match raw_value.trim().parse::<f64>() {
                Ok(number) if number.is_finite() => SampleValue::Quantity(number),
                _ => return Err(SampleError::NonNumericValue(raw_value)),
            }
        };

        let metadata = self
            .metadata
            .into_iter()
            .filter(|entry| !entry.key.is_empty() && !entry.value.is_empty())
            .collect();

        Ok(HealthSample {
            kind: SampleKind::from_type_identifier(&type_identifier),
            type_identifier,
            unit: non_empty(self.unit),
            value,
            source_name: non_empty(self.source_name),
            source_version: non_empty(self.source_version),
            device: non_empty(self.device),
            creation_date,
            start,
            end,
            metadata,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn parse_export_timestamp(
    attribute: &'static str,
    raw: &str,
) -> Result<DateTime<FixedOffset>, SampleError> {
    DateTime::parse_from_str(raw.trim(), EXPORT_TIMESTAMP_FORMAT).map_err(|_| {
        SampleError::MalformedTimestamp {
            attribute,
            value: raw.to_string(),
        }
    })
}

/// A validated, immutable health sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSample {
    pub type_identifier: String,
    pub kind: SampleKind,
    pub unit: Option<String>,
    pub value: SampleValue,
    pub source_name: Option<String>,
    pub source_version: Option<String>,
    pub device: Option<String>,
    pub creation_date: Option<DateTime<FixedOffset>>,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

impl AsRef<HealthSample> for HealthSample {
    fn as_ref(&self) -> &HealthSample {
        self
    }
}

impl HealthSample {
    /// Calendar day of the sample in the offset it was recorded with.
    pub fn local_date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    pub fn quantity(&self) -> Option<f64> {
        match self.value {
            SampleValue::Quantity(v) => Some(v),
            SampleValue::Category(_) => None,
        }
    }

    pub fn category(&self) -> Option<&str> {
        match &self.value {
            SampleValue::Category(v) => Some(v),
            SampleValue::Quantity(_) => None,
        }
    }

    pub fn unit_is(&self, unit: &str) -> bool {
        self.unit.as_deref() == Some(unit)
    }

    /// Heart rate in beats per minute; other units are ignored.
    pub fn beats_per_minute(&self) -> Option<f64> {
        if self.kind == SampleKind::HeartRate && self.unit_is(BEATS_PER_MINUTE) {
            self.quantity()
        } else {
            None
        }
    }

    pub fn step_count(&self) -> Option<f64> {
        (self.kind == SampleKind::Steps)
            .then(|| self.quantity())
            .flatten()
    }

    pub fn energy_kcal(&self) -> Option<f64> {
        if self.kind != SampleKind::ActiveEnergy {
            return None;
        }
        let value = self.quantity()?;
        match self.unit.as_deref() {
            Some("kJ") => Some(value / 4.184),
            _ => Some(value),
        }
    }

    pub fn distance_km(&self) -> Option<f64> {
        if self.kind != SampleKind::Distance {
            return None;
        }
        let value = self.quantity()?;
        match self.unit.as_deref() {
            Some("mi") => Some(value * 1.609_344),
            Some("m") => Some(value / 1000.0),
            _ => Some(value),
        }
    }

    pub fn is_asleep(&self) -> bool {
        self.kind == SampleKind::Sleep
            && self
                .category()
                .map(|v| v.starts_with(SLEEP_VALUE_PREFIX) && v.contains("Asleep"))
                .unwrap_or(false)
    }

    /// Type identifier without the vendor prefix, split into words:
    /// `HKQuantityTypeIdentifierBodyMass` becomes `Body Mass`.
    pub fn display_type(&self) -> String {
        let bare = self
            .type_identifier
            .trim_start_matches(QUANTITY_TYPE_PREFIX)
            .trim_start_matches(CATEGORY_TYPE_PREFIX);

        let mut words = String::with_capacity(bare.len() + 4);
        let mut previous: Option<char> = None;
        for c in bare.chars() {
            if let Some(p) = previous {
                if c.is_uppercase() && p.is_lowercase() {
                    words.push(' ');
                }
            }
            words.push(c);
            previous = Some(c);
        }
        words
    }

    /// Category value without its vendor prefix, e.g. `AsleepCore`.
    pub fn display_category(&self) -> Option<&str> {
        self.category()
            .map(|v| v.trim_start_matches(SLEEP_VALUE_PREFIX))
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_validate_quantity_record() {
        let mut rec = record(HEART_RATE_TYPE, "72", "2024-03-01 07:15:00 +0100", "");
        rec.unit = Some(BEATS_PER_MINUTE.to_string());
        rec.metadata = vec![
            MetadataEntry {
                key: "HKMetadataKeyHeartRateMotionContext".to_string(),
                value: "0".to_string(),
            },
            MetadataEntry {
                key: "".to_string(),
                value: "dropped".to_string(),
            },
        ];

        let sample = rec.validate().unwrap();
        assert_eq!(sample.kind, SampleKind::HeartRate);
        assert_eq!(sample.beats_per_minute(), Some(72.0));
        assert_eq!(sample.end, sample.start);
        assert_eq!(sample.metadata.len(), 1);
        assert_eq!(
            sample.local_date(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
    }

    #[test]
    fn test_local_date_uses_recorded_offset() {
        let sample = steps(10.0, "2024-03-01 23:30:00 -0500");
        // 04:30 UTC on March 2nd, but still March 1st where it was recorded.
        assert_eq!(
            sample.local_date(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
    }

    #[test]
    fn test_rejects_malformed_timestamp() {
        let rec = record(STEP_COUNT_TYPE, "10", "2024-03-01T07:15:00Z", "");
        assert!(matches!(
            rec.validate(),
            Err(SampleError::MalformedTimestamp {
                attribute: "startDate",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_non_numeric_quantity() {
        let rec = record(
            STEP_COUNT_TYPE,
            "lots",
            "2024-03-01 07:15:00 +0000",
            "2024-03-01 07:16:00 +0000",
        );
        assert_eq!(
            rec.validate(),
            Err(SampleError::NonNumericValue("lots".to_string()))
        );

        let rec = record(STEP_COUNT_TYPE, "NaN", "2024-03-01 07:15:00 +0000", "");
        assert!(matches!(rec.validate(), Err(SampleError::NonNumericValue(_))));
    }

    #[test]
    fn test_rejects_end_before_start() {
        let rec = record(
            STEP_COUNT_TYPE,
            "10",
            "2024-03-01 07:15:00 +0000",
            "2024-03-01 07:00:00 +0000",
        );
        assert!(matches!(
            rec.validate(),
            Err(SampleError::EndBeforeStart { .. })
        ));
    }

    #[test]
    fn test_missing_attributes() {
        let mut rec = record(STEP_COUNT_TYPE, "10", "2024-03-01 07:15:00 +0000", "");
        rec.type_identifier = None;
        assert_eq!(rec.validate(), Err(SampleError::MissingAttribute("type")));

        let mut rec = record(STEP_COUNT_TYPE, "10", "2024-03-01 07:15:00 +0000", "");
        rec.value = None;
        assert_eq!(rec.validate(), Err(SampleError::MissingAttribute("value")));
    }

    #[test]
    fn test_category_value_kept_as_text() {
        let sample = sleep(
            "AsleepCore",
            "2024-03-01 23:00:00 +0000",
            "2024-03-02 06:00:00 +0000",
        );
        assert_eq!(sample.kind, SampleKind::Sleep);
        assert!(sample.is_asleep());
        assert_eq!(sample.display_category(), Some("AsleepCore"));

        let in_bed = sleep(
            "InBed",
            "2024-03-01 23:00:00 +0000",
            "2024-03-02 06:00:00 +0000",
        );
        assert!(!in_bed.is_asleep());
    }

    #[test]
    fn test_unit_conversions() {
        let kj = quantity(ACTIVE_ENERGY_TYPE, "kJ", 418.4, "2024-03-01 07:15:00 +0000");
        assert!((kj.energy_kcal().unwrap() - 100.0).abs() < 1e-9);

        let miles = quantity(DISTANCE_TYPE, "mi", 1.0, "2024-03-01 07:15:00 +0000");
        assert!((miles.distance_km().unwrap() - 1.609_344).abs() < 1e-9);

        let bpm_other_unit = quantity(HEART_RATE_TYPE, "count/s", 1.2, "2024-03-01 07:15:00 +0000");
        assert_eq!(bpm_other_unit.beats_per_minute(), None);
    }

    #[test]
    fn test_display_type() {
        let sample = quantity(
            "HKQuantityTypeIdentifierBodyMassIndex",
            "count",
            22.5,
            "2024-03-01 07:15:00 +0000",
        );
        assert_eq!(sample.display_type(), "Body Mass Index");
    }
}
