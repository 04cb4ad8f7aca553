// Dashboard read models assembled per request
use super::aggregate::DailyAggregate;
use super::recommendation::{ActivityLoad, Recommendation};
use super::recovery::RecoveryScore;
use chrono::{DateTime, FixedOffset, NaiveDate};

/// Earliest and latest sample start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateSpan {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthStats {
    pub total_records: usize,
    pub unique_types: usize,
    pub date_span: Option<DateSpan>,
    pub avg_heart_rate: Option<f64>,
    pub total_steps: f64,
    pub total_kcal: f64,
    pub avg_sleep_hours: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub steps: Vec<DailyAggregate>,
    pub heart_rate: Vec<DailyAggregate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub steps: f64,
    pub kcal: f64,
    pub avg_heart_rate: Option<f64>,
    pub distance_km: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthInsights {
    pub load: ActivityLoad,
    pub avg_heart_rate: Option<f64>,
    pub avg_sleep_hours: Option<f64>,
    pub recovery: RecoveryScore,
    pub recommendation: Recommendation,
}
