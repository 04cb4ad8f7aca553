// JSON bodies returned by the HTTP handlers
use crate::application::ingest_service::IngestReport;
use crate::application::sample_repository::{StoreCounts, TypeCount};
use crate::domain::activity::ActivityEntry;
use crate::domain::aggregate::{round_to, DailyAggregate};
use crate::domain::dashboard::{DailySummary, HealthInsights, HealthStats, Timeline};
use crate::domain::recommendation::{Confidence, RecommendationCategory};
use crate::domain::recovery::RecoveryLevel;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;

// Missing averages are reported as 0 so dashboard widgets always get a number.
fn one_decimal(value: Option<f64>) -> f64 {
    value.map(|v| round_to(v, 1)).unwrap_or(0.0)
}

fn whole(value: f64) -> i64 {
    value.trunc() as i64
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl From<IngestReport> for MessageResponse {
    fn from(report: IngestReport) -> Self {
        Self {
            message: format!("Successfully ingested {} records.", report.ingested),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub records: usize,
    pub metadata_entries: usize,
}

impl From<StoreCounts> for CountResponse {
    fn from(counts: StoreCounts) -> Self {
        Self {
            records: counts.records,
            metadata_entries: counts.metadata_entries,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DateRangeDto {
    pub start: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Serialize)]
pub struct HealthStatsResponse {
    pub total_records: usize,
    pub unique_types: usize,
    pub date_range: DateRangeDto,
    pub avg_heart_rate: f64,
    pub total_steps: i64,
    pub total_calories: i64,
    pub avg_sleep_hours: f64,
}

impl From<HealthStats> for HealthStatsResponse {
    fn from(stats: HealthStats) -> Self {
        Self {
            total_records: stats.total_records,
            unique_types: stats.unique_types,
            date_range: DateRangeDto {
                start: stats.date_span.map(|s| s.start),
                end: stats.date_span.map(|s| s.end),
            },
            avg_heart_rate: one_decimal(stats.avg_heart_rate),
            total_steps: whole(stats.total_steps),
            total_calories: whole(stats.total_kcal),
            avg_sleep_hours: one_decimal(stats.avg_sleep_hours),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DataTypeDto {
    #[serde(rename = "type")]
    pub type_identifier: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct DataTypesResponse {
    pub data_types: Vec<DataTypeDto>,
}

impl From<Vec<TypeCount>> for DataTypesResponse {
    fn from(types: Vec<TypeCount>) -> Self {
        Self {
            data_types: types
                .into_iter()
                .map(|t| DataTypeDto {
                    type_identifier: t.type_identifier,
                    count: t.count,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DailyStepsDto {
    pub date: NaiveDate,
    pub steps: i64,
}

#[derive(Debug, Serialize)]
pub struct DailyHeartRateDto {
    pub date: NaiveDate,
    pub heart_rate: f64,
}

#[derive(Debug, Serialize)]
pub struct TimelineResponse {
    pub daily_steps: Vec<DailyStepsDto>,
    pub daily_heart_rate: Vec<DailyHeartRateDto>,
}

impl From<Timeline> for TimelineResponse {
    fn from(timeline: Timeline) -> Self {
        Self {
            daily_steps: timeline
                .steps
                .into_iter()
                .map(|day| DailyStepsDto {
                    date: day.date,
                    steps: whole(day.stats.sum),
                })
                .collect(),
            daily_heart_rate: timeline
                .heart_rate
                .into_iter()
                .map(|day| DailyHeartRateDto {
                    date: day.date,
                    heart_rate: one_decimal(day.stats.avg()),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HeartRateTrendDto {
    pub date: NaiveDate,
    pub avg: f64,
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Serialize)]
pub struct HeartRateTrendsResponse {
    pub heart_rate_trends: Vec<HeartRateTrendDto>,
}

impl From<Vec<DailyAggregate>> for HeartRateTrendsResponse {
    fn from(days: Vec<DailyAggregate>) -> Self {
        Self {
            heart_rate_trends: days
                .into_iter()
                .map(|day| HeartRateTrendDto {
                    date: day.date,
                    avg: one_decimal(day.stats.avg()),
                    min: whole(day.stats.min.unwrap_or(0.0)),
                    max: whole(day.stats.max.unwrap_or(0.0)),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DailySummaryDto {
    pub date: NaiveDate,
    pub steps: i64,
    pub calories: i64,
    pub avg_heart_rate: f64,
    pub distance_km: f64,
}

#[derive(Debug, Serialize)]
pub struct DailySummaryResponse {
    pub daily_summary: DailySummaryDto,
}

impl From<DailySummary> for DailySummaryResponse {
    fn from(summary: DailySummary) -> Self {
        Self {
            daily_summary: DailySummaryDto {
                date: summary.date,
                steps: whole(summary.steps),
                calories: whole(summary.kcal),
                avg_heart_rate: one_decimal(summary.avg_heart_rate),
                distance_km: round_to(summary.distance_km, 2),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecentLoadDto {
    pub avg_daily_steps: i64,
    pub avg_daily_calories: i64,
    pub avg_heart_rate: f64,
    pub avg_sleep_hours: f64,
}

#[derive(Debug, Serialize)]
pub struct YesterdayDto {
    pub steps: i64,
    pub calories: i64,
}

#[derive(Debug, Serialize)]
pub struct RecoveryBreakdownDto {
    pub sleep_score: Option<f64>,
    pub heart_rate_score: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct RecoveryScoreDto {
    pub score: f64,
    pub level: RecoveryLevel,
    pub breakdown: RecoveryBreakdownDto,
}

#[derive(Debug, Serialize)]
pub struct WorkoutRecommendationDto {
    pub recommendation: RecommendationCategory,
    pub confidence: Confidence,
    pub reason: &'static str,
    pub suggestions: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct InsightsDto {
    pub recent_activity: RecentLoadDto,
    pub yesterday_activity: YesterdayDto,
    pub recovery_score: RecoveryScoreDto,
    pub workout_recommendation: WorkoutRecommendationDto,
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub insights: InsightsDto,
}

impl From<HealthInsights> for InsightsResponse {
    fn from(insights: HealthInsights) -> Self {
        let HealthInsights {
            load,
            avg_heart_rate,
            avg_sleep_hours,
            recovery,
            recommendation,
        } = insights;

        Self {
            insights: InsightsDto {
                recent_activity: RecentLoadDto {
                    avg_daily_steps: whole(load.avg_daily_steps),
                    avg_daily_calories: whole(load.avg_daily_kcal),
                    avg_heart_rate: one_decimal(avg_heart_rate),
                    avg_sleep_hours: one_decimal(avg_sleep_hours),
                },
                yesterday_activity: YesterdayDto {
                    steps: whole(load.yesterday_steps),
                    calories: whole(load.yesterday_kcal),
                },
                recovery_score: RecoveryScoreDto {
                    score: recovery.score,
                    level: recovery.level,
                    breakdown: RecoveryBreakdownDto {
                        sleep_score: recovery.sleep_score,
                        heart_rate_score: recovery.heart_rate_score,
                    },
                },
                workout_recommendation: WorkoutRecommendationDto {
                    recommendation: recommendation.category,
                    confidence: recommendation.confidence,
                    reason: recommendation.reason,
                    suggestions: recommendation.suggestions,
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActivityDto {
    pub icon: &'static str,
    #[serde(rename = "type")]
    pub label: String,
    pub value: String,
    pub time: String,
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct RecentActivityResponse {
    pub recent_activity: Vec<ActivityDto>,
}

impl From<Vec<ActivityEntry>> for RecentActivityResponse {
    fn from(entries: Vec<ActivityEntry>) -> Self {
        Self {
            recent_activity: entries
                .into_iter()
                .map(|entry| ActivityDto {
                    icon: entry.icon,
                    time: entry.time(),
                    date: entry.date(),
                    label: entry.label,
                    value: entry.value,
                })
                .collect(),
        }
    }
}
