// Analytics service - Use cases behind the dashboard widgets
use crate::application::sample_repository::{SampleRepository, TimeRange, TypeCount};
use crate::domain::activity::{build_feed, feed_quota, ActivityEntry, SIGNIFICANT_STEPS};
use crate::domain::aggregate::{
    aggregate, average_sleep_hours, daily_aggregates, DailyAggregate, DayWindow, MetricStats,
};
use crate::domain::dashboard::{DailySummary, HealthInsights, HealthStats, Timeline};
use crate::domain::recommendation::{recommend, ActivityLoad};
use crate::domain::recovery::recovery_score;
use crate::domain::sample::{HealthSample, SampleKind};
use crate::infrastructure::config::{AnalyticsSettings, WindowAnchor};
use anyhow::Result;
use chrono::{DateTime, Days, FixedOffset, NaiveDate, Utc};
use std::sync::Arc;

pub const TOP_DATA_TYPES: usize = 10;
pub const MAX_WINDOW_DAYS: u32 = 366;

#[derive(Clone)]
pub struct AnalyticsService {
    repository: Arc<dyn SampleRepository>,
    settings: AnalyticsSettings,
    offset: FixedOffset,
}

impl AnalyticsService {
    pub fn new(repository: Arc<dyn SampleRepository>, settings: AnalyticsSettings) -> Result<Self> {
        let offset = settings.utc_offset()?;
        Ok(Self {
            repository,
            settings,
            offset,
        })
    }

    pub fn timeline_days(&self) -> u32 {
        self.settings.timeline_days
    }

    /// The day treated as "today" for windowed widgets.
    pub async fn anchor_day(&self, now: DateTime<Utc>) -> Result<NaiveDate> {
        let today = now.with_timezone(&self.offset).date_naive();
        match self.settings.anchor {
            WindowAnchor::Now => Ok(today),
            WindowAnchor::LatestSample => Ok(self
                .repository
                .date_span()
                .await?
                .map(|span| span.end.date_naive())
                .unwrap_or(today)),
        }
    }

    async fn fetch(&self, kind: SampleKind, window: DayWindow) -> Result<Vec<Arc<HealthSample>>> {
        let (from, to) = window.utc_bounds();
        tracing::debug!("Fetching {:?} samples for {} .. {}", kind, window.first, window.last);
        self.repository
            .samples(kind, TimeRange::between(from, to))
            .await
    }

    pub async fn health_stats(&self) -> Result<HealthStats> {
        let counts = self.repository.counts().await?;
        let types = self.repository.count_by_type().await?;
        let date_span = self.repository.date_span().await?;

        let heart = self.repository.samples(SampleKind::HeartRate, TimeRange::all()).await?;
        let steps = self.repository.samples(SampleKind::Steps, TimeRange::all()).await?;
        let energy = self.repository.samples(SampleKind::ActiveEnergy, TimeRange::all()).await?;
        let sleep = self.repository.samples(SampleKind::Sleep, TimeRange::all()).await?;

        let heart_stats: MetricStats = heart.iter().filter_map(|s| s.beats_per_minute()).collect();
        let step_stats: MetricStats = steps.iter().filter_map(|s| s.step_count()).collect();
        let energy_stats: MetricStats = energy.iter().filter_map(|s| s.energy_kcal()).collect();

        Ok(HealthStats {
            total_records: counts.records,
            unique_types: types.len(),
            date_span,
            avg_heart_rate: heart_stats.avg(),
            total_steps: step_stats.sum,
            total_kcal: energy_stats.sum,
            avg_sleep_hours: average_sleep_hours(&sleep, None),
        })
    }

    pub async fn data_types(&self) -> Result<Vec<TypeCount>> {
        let mut types = self.repository.count_by_type().await?;
        types.truncate(TOP_DATA_TYPES);
        Ok(types)
    }

    /// Daily step totals and heart-rate averages, one point per day.
    pub async fn timeline(&self, now: DateTime<Utc>, days: u32) -> Result<Timeline> {
        let window = DayWindow::trailing(self.anchor_day(now).await?, clamp_days(days));

        let steps = self.fetch(SampleKind::Steps, window).await?;
        let heart = self.fetch(SampleKind::HeartRate, window).await?;

        Ok(Timeline {
            steps: daily_aggregates(&steps, window, HealthSample::step_count),
            heart_rate: daily_aggregates(&heart, window, HealthSample::beats_per_minute),
        })
    }

    /// Per-day heart-rate spread, only for days that have readings.
    pub async fn heart_rate_trends(&self, now: DateTime<Utc>, days: u32) -> Result<Vec<DailyAggregate>> {
        let window = DayWindow::trailing(self.anchor_day(now).await?, clamp_days(days));
        let heart = self.fetch(SampleKind::HeartRate, window).await?;

        Ok(daily_aggregates(&heart, window, HealthSample::beats_per_minute)
            .into_iter()
            .filter(|day| !day.stats.is_empty())
            .collect())
    }

    pub async fn daily_summary(&self, now: DateTime<Utc>) -> Result<DailySummary> {
        let date = self.anchor_day(now).await?;
        let window = DayWindow::single(date);

        let steps = self.fetch(SampleKind::Steps, window).await?;
        let energy = self.fetch(SampleKind::ActiveEnergy, window).await?;
        let heart = self.fetch(SampleKind::HeartRate, window).await?;
        let distance = self.fetch(SampleKind::Distance, window).await?;

        Ok(DailySummary {
            date,
            steps: aggregate(&steps, window, HealthSample::step_count).sum,
            kcal: aggregate(&energy, window, HealthSample::energy_kcal).sum,
            avg_heart_rate: aggregate(&heart, window, HealthSample::beats_per_minute).avg(),
            distance_km: aggregate(&distance, window, HealthSample::distance_km).sum,
        })
    }

    pub async fn insights(&self, now: DateTime<Utc>) -> Result<HealthInsights> {
        let anchor = self.anchor_day(now).await?;
        let recent = DayWindow::trailing(anchor, clamp_days(self.settings.insight_days));
        let yesterday = DayWindow::single(
            anchor
                .checked_sub_days(Days::new(1))
                .unwrap_or(anchor),
        );
        let covering = DayWindow {
            first: recent.first.min(yesterday.first),
            last: anchor,
        };

        let steps = self.fetch(SampleKind::Steps, covering).await?;
        let energy = self.fetch(SampleKind::ActiveEnergy, covering).await?;
        let heart = self.fetch(SampleKind::HeartRate, recent).await?;
        let sleep = self.fetch(SampleKind::Sleep, recent).await?;

        let days = recent.len() as f64;
        let load = ActivityLoad {
            avg_daily_steps: aggregate(&steps, recent, HealthSample::step_count).sum / days,
            avg_daily_kcal: aggregate(&energy, recent, HealthSample::energy_kcal).sum / days,
            yesterday_steps: aggregate(&steps, yesterday, HealthSample::step_count).sum,
            yesterday_kcal: aggregate(&energy, yesterday, HealthSample::energy_kcal).sum,
        };
        let avg_heart_rate = aggregate(&heart, recent, HealthSample::beats_per_minute).avg();
        let avg_sleep_hours = average_sleep_hours(&sleep, Some(recent));

        let recovery = recovery_score(avg_sleep_hours, avg_heart_rate);
        let recommendation = recommend(&recovery, &load);
        tracing::debug!(
            "Recovery {} ({}), recommending {:?}",
            recovery.score,
            recovery.level.as_str(),
            recommendation.category
        );

        Ok(HealthInsights {
            load,
            avg_heart_rate,
            avg_sleep_hours,
            recovery,
            recommendation,
        })
    }

    pub async fn recent_activity(&self) -> Result<Vec<ActivityEntry>> {
        let bpm = |s: &HealthSample| s.beats_per_minute().is_some();
        let significant = |s: &HealthSample| s.step_count().unwrap_or(0.0) > SIGNIFICANT_STEPS;
        let any = |_: &HealthSample| true;

        let repo = &self.repository;
        let mut groups = vec![
            repo.most_recent(SampleKind::HeartRate, feed_quota(SampleKind::HeartRate), &bpm)
                .await?,
            repo.most_recent(SampleKind::Steps, feed_quota(SampleKind::Steps), &significant)
                .await?,
            repo.most_recent(SampleKind::ActiveEnergy, feed_quota(SampleKind::ActiveEnergy), &any)
                .await?,
            repo.most_recent(SampleKind::Sleep, feed_quota(SampleKind::Sleep), &any)
                .await?,
        ];

        // Distance and every unmapped type share one slot in the feed.
        let quota = feed_quota(SampleKind::Other);
        let mut others = repo.most_recent(SampleKind::Other, quota, &any).await?;
        others.extend(repo.most_recent(SampleKind::Distance, quota, &any).await?);
        others.sort_by(|a, b| b.start.cmp(&a.start));
        others.truncate(quota);
        groups.push(others);

        Ok(build_feed(groups))
    }
}

fn clamp_days(days: u32) -> u32 {
    days.clamp(1, MAX_WINDOW_DAYS)
}
