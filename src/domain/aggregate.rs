// Windowed aggregation over health samples
use super::sample::HealthSample;
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use std::collections::BTreeMap;

/// Running count/sum/min/max over a set of values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricStats {
    pub count: usize,
    pub sum: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl MetricStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    pub fn avg(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl FromIterator<f64> for MetricStats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = MetricStats::default();
        for value in iter {
            stats.push(value);
        }
        stats
    }
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl DayWindow {
    /// `days` calendar days ending on (and including) `last`.
    pub fn trailing(last: NaiveDate, days: u32) -> Self {
        let span = u64::from(days.max(1) - 1);
        let first = last.checked_sub_days(Days::new(span)).unwrap_or(NaiveDate::MIN);
        Self { first, last }
    }

    pub fn single(day: NaiveDate) -> Self {
        Self {
            first: day,
            last: day,
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.first <= day && day <= self.last
    }

    pub fn len(&self) -> usize {
        ((self.last - self.first).num_days() + 1).max(0) as usize
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.first.iter_days().take(self.len())
    }

    /// UTC instants that cover every local day in the window whatever offset
    /// a sample was recorded with (offsets stay within ±14h).
    pub fn utc_bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let from = self
            .first
            .checked_sub_days(Days::new(1))
            .unwrap_or(self.first)
            .and_time(NaiveTime::MIN)
            .and_utc();
        let to = self
            .last
            .checked_add_days(Days::new(2))
            .unwrap_or(self.last)
            .and_time(NaiveTime::MIN)
            .and_utc();
        (from, to)
    }
}

/// One calendar day of a metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub stats: MetricStats,
}

/// Aggregate of every value `extract` yields for samples whose local day is
/// inside the window. An empty window yields empty stats, never an error.
pub fn aggregate<S, F>(samples: &[S], window: DayWindow, extract: F) -> MetricStats
where
    S: AsRef<HealthSample>,
    F: Fn(&HealthSample) -> Option<f64>,
{
    samples
        .iter()
        .map(AsRef::<HealthSample>::as_ref)
        .filter(|s| window.contains(s.local_date()))
        .filter_map(extract)
        .collect()
}

/// Exactly one entry per calendar day of the window, in order. Days without
/// samples carry empty stats.
pub fn daily_aggregates<S, F>(samples: &[S], window: DayWindow, extract: F) -> Vec<DailyAggregate>
where
    S: AsRef<HealthSample>,
    F: Fn(&HealthSample) -> Option<f64>,
{
    let mut by_day: BTreeMap<NaiveDate, MetricStats> =
        window.days().map(|d| (d, MetricStats::default())).collect();

    for sample in samples.iter().map(AsRef::<HealthSample>::as_ref) {
        let Some(stats) = by_day.get_mut(&sample.local_date()) else {
            continue;
        };
        if let Some(value) = extract(sample) {
            stats.push(value);
        }
    }

    by_day
        .into_iter()
        .map(|(date, stats)| DailyAggregate { date, stats })
        .collect()
}

/// Asleep hours per night, keyed by the local day the sleep ended on.
/// Overlapping intervals (several sources recording the same night) are
/// merged before summing.
pub fn nightly_sleep_hours<S: AsRef<HealthSample>>(
    samples: &[S],
    window: Option<DayWindow>,
) -> BTreeMap<NaiveDate, f64> {
    let mut intervals: BTreeMap<NaiveDate, Vec<(i64, i64)>> = BTreeMap::new();
    for sample in samples.iter().map(AsRef::<HealthSample>::as_ref).filter(|s| s.is_asleep()) {
        let night = sample.end.date_naive();
        if window.is_some_and(|w| !w.contains(night)) {
            continue;
        }
        intervals
            .entry(night)
            .or_default()
            .push((sample.start.timestamp(), sample.end.timestamp()));
    }

    intervals
        .into_iter()
        .map(|(night, mut spans)| {
            spans.sort_unstable();
            let mut total = 0_i64;
            let mut current: Option<(i64, i64)> = None;
            for (start, end) in spans {
                current = match current {
                    Some((s, e)) if start <= e => Some((s, e.max(end))),
                    Some((s, e)) => {
                        total += e - s;
                        Some((start, end))
                    }
                    None => Some((start, end)),
                };
            }
            if let Some((s, e)) = current {
                total += e - s;
            }
            (night, total as f64 / 3600.0)
        })
        .collect()
}

/// Mean asleep hours across nights that have sleep data.
pub fn average_sleep_hours<S: AsRef<HealthSample>>(
    samples: &[S],
    window: Option<DayWindow>,
) -> Option<f64> {
    nightly_sleep_hours(samples, window)
        .into_values()
        .collect::<MetricStats>()
        .avg()
}

/// Round to a fixed number of decimals for presentation.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}
