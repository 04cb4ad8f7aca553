// Recent activity feed entries
use super::sample::{HealthSample, SampleKind};
use chrono::{DateTime, FixedOffset};
use std::sync::Arc;

pub const MAX_FEED_ENTRIES: usize = 20;

/// Minimum step count for a step record to show up in the feed.
pub const SIGNIFICANT_STEPS: f64 = 100.0;

/// How many of the newest records each kind contributes to the feed.
pub fn feed_quota(kind: SampleKind) -> usize {
    match kind {
        SampleKind::Sleep => 3,
        _ => 5,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEntry {
    pub icon: &'static str,
    pub label: String,
    pub value: String,
    pub at: DateTime<FixedOffset>,
}

impl ActivityEntry {
    pub fn from_sample(sample: &HealthSample) -> Self {
        let (icon, label, value) = match sample.kind {
            SampleKind::HeartRate => (
                "fas fa-heartbeat",
                "Heart Rate".to_string(),
                format!("{} BPM", whole(sample.quantity())),
            ),
            SampleKind::Steps => (
                "fas fa-running",
                "Steps".to_string(),
                format!("{} steps", thousands(whole(sample.quantity()))),
            ),
            SampleKind::ActiveEnergy => (
                "fas fa-fire",
                "Calories".to_string(),
                format!("{} cal", whole(sample.energy_kcal())),
            ),
            SampleKind::Sleep => (
                "fas fa-bed",
                "Sleep".to_string(),
                sample.display_category().unwrap_or_default().to_string(),
            ),
            SampleKind::Distance | SampleKind::Other => (
                "fas fa-chart-line",
                sample.display_type(),
                other_value(sample),
            ),
        };

        Self {
            icon,
            label,
            value,
            at: sample.start,
        }
    }

    pub fn time(&self) -> String {
        self.at.format("%H:%M").to_string()
    }

    pub fn date(&self) -> String {
        self.at.format("%b %d").to_string()
    }
}

fn whole(value: Option<f64>) -> i64 {
    value.map(|v| v.trunc() as i64).unwrap_or(0)
}

fn other_value(sample: &HealthSample) -> String {
    let value = match (sample.quantity(), sample.category()) {
        (Some(q), _) => format!("{q}"),
        (None, Some(c)) => c.to_string(),
        (None, None) => String::new(),
    };
    match &sample.unit {
        Some(unit) => format!("{value} {unit}"),
        None => value,
    }
}

/// `12345` becomes `12,345`.
pub fn thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Merge per-kind slices into one feed, newest first, capped at
/// [`MAX_FEED_ENTRIES`].
pub fn build_feed(groups: Vec<Vec<Arc<HealthSample>>>) -> Vec<ActivityEntry> {
    let mut entries: Vec<ActivityEntry> = groups
        .iter()
        .flatten()
        .map(|s| ActivityEntry::from_sample(s))
        .collect();
    entries.sort_by(|a, b| b.at.cmp(&a.at));
    entries.truncate(MAX_FEED_ENTRIES);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::fixtures::*;

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1234567), "1,234,567");
        assert_eq!(thousands(-4500), "-4,500");
    }

    #[test]
    fn test_entry_formatting() {
        let entry = ActivityEntry::from_sample(&heart_rate(72.6, "2024-03-01 07:05:00 +0100"));
        assert_eq!(entry.label, "Heart Rate");
        assert_eq!(entry.value, "72 BPM");
        assert_eq!(entry.icon, "fas fa-heartbeat");
        assert_eq!(entry.time(), "07:05");
        assert_eq!(entry.date(), "Mar 01");

        let entry = ActivityEntry::from_sample(&steps(12345.0, "2024-03-01 07:05:00 +0000"));
        assert_eq!(entry.value, "12,345 steps");

        let entry = ActivityEntry::from_sample(&sleep(
            "AsleepDeep",
            "2024-03-01 01:00:00 +0000",
            "2024-03-01 02:00:00 +0000",
        ));
        assert_eq!(entry.value, "AsleepDeep");

        let entry = ActivityEntry::from_sample(&quantity(
            "HKQuantityTypeIdentifierBodyMass",
            "kg",
            71.5,
            "2024-03-01 07:05:00 +0000",
        ));
        assert_eq!(entry.label, "Body Mass");
        assert_eq!(entry.value, "71.5 kg");
    }

    #[test]
    fn test_feed_is_newest_first_and_capped() {
        let hearts: Vec<Arc<HealthSample>> = (0..15_i32)
            .map(|i| Arc::new(heart_rate(60.0 + f64::from(i), &format!("2024-03-01 {:02}:00:00 +0000", i))))
            .collect();
        let energy = vec![Arc::new(energy(250.0, "2024-03-02 09:00:00 +0000"))];
        let walks: Vec<Arc<HealthSample>> = (0..10_i32)
            .map(|i| Arc::new(steps(500.0, &format!("2024-02-28 {:02}:30:00 +0000", i))))
            .collect();

        let feed = build_feed(vec![hearts, energy, walks]);
        assert_eq!(feed.len(), MAX_FEED_ENTRIES);
        assert_eq!(feed[0].label, "Calories");
        assert_eq!(feed[1].value, "74 BPM");
        assert!(feed.windows(2).all(|w| w[0].at >= w[1].at));
    }
}
