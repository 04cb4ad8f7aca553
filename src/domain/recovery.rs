// Recovery score derived from sleep and heart-rate aggregates
use super::aggregate::round_to;
use serde::Serialize;

/// Nightly sleep that earns a full sleep component.
pub const TARGET_SLEEP_HOURS: f64 = 8.0;
pub const SLEEP_WEIGHT: f64 = 0.6;
pub const HEART_RATE_WEIGHT: f64 = 0.4;

/// Upper (exclusive) heart-rate bounds and the component they earn.
const HEART_RATE_TIERS: [(f64, f64); 3] = [(70.0, 100.0), (80.0, 80.0), (90.0, 60.0)];
const HEART_RATE_FLOOR_SCORE: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryLevel {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl RecoveryLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            RecoveryLevel::Excellent
        } else if score >= 60.0 {
            RecoveryLevel::Good
        } else if score >= 40.0 {
            RecoveryLevel::Fair
        } else {
            RecoveryLevel::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryLevel::Poor => "poor",
            RecoveryLevel::Fair => "fair",
            RecoveryLevel::Good => "good",
            RecoveryLevel::Excellent => "excellent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecoveryScore {
    pub score: f64,
    pub level: RecoveryLevel,
    pub sleep_score: Option<f64>,
    pub heart_rate_score: Option<f64>,
}

pub fn sleep_component(avg_sleep_hours: f64) -> f64 {
    (avg_sleep_hours.max(0.0) / TARGET_SLEEP_HOURS * 100.0).min(100.0)
}

pub fn heart_rate_component(avg_heart_rate: f64) -> f64 {
    HEART_RATE_TIERS
        .iter()
        .find(|(bound, _)| avg_heart_rate < *bound)
        .map(|(_, score)| *score)
        .unwrap_or(HEART_RATE_FLOOR_SCORE)
}

impl RecoveryScore {
    /// Whether any sleep or heart-rate data went into the score.
    pub fn has_inputs(&self) -> bool {
        self.sleep_score.is_some() || self.heart_rate_score.is_some()
    }
}

/// Weighted 0-100 score. A missing input contributes nothing, so recording
/// more data never lowers the score.
pub fn recovery_score(avg_sleep_hours: Option<f64>, avg_heart_rate: Option<f64>) -> RecoveryScore {
    let sleep_score = avg_sleep_hours.map(sleep_component);
    let heart_rate_score = avg_heart_rate.map(heart_rate_component);

    let raw = sleep_score.unwrap_or(0.0) * SLEEP_WEIGHT
        + heart_rate_score.unwrap_or(0.0) * HEART_RATE_WEIGHT;
    let score = round_to(raw.clamp(0.0, 100.0), 1);

    RecoveryScore {
        score,
        level: RecoveryLevel::from_score(score),
        sleep_score: sleep_score.map(|s| round_to(s, 1)),
        heart_rate_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_boundaries() {
        assert_eq!(RecoveryLevel::from_score(100.0), RecoveryLevel::Excellent);
        assert_eq!(RecoveryLevel::from_score(80.0), RecoveryLevel::Excellent);
        assert_eq!(RecoveryLevel::from_score(79.9), RecoveryLevel::Good);
        assert_eq!(RecoveryLevel::from_score(60.0), RecoveryLevel::Good);
        assert_eq!(RecoveryLevel::from_score(59.9), RecoveryLevel::Fair);
        assert_eq!(RecoveryLevel::from_score(40.0), RecoveryLevel::Fair);
        assert_eq!(RecoveryLevel::from_score(39.9), RecoveryLevel::Poor);
        assert_eq!(RecoveryLevel::from_score(0.0), RecoveryLevel::Poor);
    }

    #[test]
    fn test_heart_rate_tier_boundaries() {
        assert_eq!(heart_rate_component(55.0), 100.0);
        assert_eq!(heart_rate_component(69.9), 100.0);
        assert_eq!(heart_rate_component(70.0), 80.0);
        assert_eq!(heart_rate_component(79.9), 80.0);
        assert_eq!(heart_rate_component(80.0), 60.0);
        assert_eq!(heart_rate_component(89.9), 60.0);
        assert_eq!(heart_rate_component(90.0), 40.0);
        assert_eq!(heart_rate_component(140.0), 40.0);
    }

    #[test]
    fn test_sleep_component_caps_at_target() {
        assert_eq!(sleep_component(0.0), 0.0);
        assert_eq!(sleep_component(4.0), 50.0);
        assert_eq!(sleep_component(8.0), 100.0);
        assert_eq!(sleep_component(11.0), 100.0);
    }

    #[test]
    fn test_combined_score() {
        // 6h sleep -> 75, 65 bpm -> 100; 0.6 * 75 + 0.4 * 100 = 85
        let score = recovery_score(Some(6.0), Some(65.0));
        assert_eq!(score.score, 85.0);
        assert_eq!(score.level, RecoveryLevel::Excellent);
        assert_eq!(score.sleep_score, Some(75.0));
        assert_eq!(score.heart_rate_score, Some(100.0));

        // 4h sleep -> 50, 95 bpm -> 40; 30 + 16 = 46
        let score = recovery_score(Some(4.0), Some(95.0));
        assert_eq!(score.score, 46.0);
        assert_eq!(score.level, RecoveryLevel::Fair);
    }

    #[test]
    fn test_missing_inputs() {
        // 75 bpm -> 80, weighted 0.4
        let only_heart = recovery_score(None, Some(75.0));
        assert_eq!(only_heart.score, 32.0);
        assert_eq!(only_heart.sleep_score, None);
        assert!(only_heart.has_inputs());

        // 7h -> 87.5, weighted 0.6
        let only_sleep = recovery_score(Some(7.0), None);
        assert_eq!(only_sleep.score, 52.5);

        let nothing = recovery_score(None, None);
        assert_eq!(nothing.score, 0.0);
        assert_eq!(nothing.level, RecoveryLevel::Poor);
        assert!(!nothing.has_inputs());
    }

    #[test]
    fn test_recording_sleep_never_lowers_score() {
        for heart_rate in [None, Some(55.0), Some(72.0), Some(85.0), Some(110.0)] {
            let without = recovery_score(None, heart_rate).score;
            for hours in [0.0, 0.5, 1.0, 4.0, 8.0] {
                let with = recovery_score(Some(hours), heart_rate).score;
                assert!(with >= without, "{hours}h of sleep lowered {heart_rate:?}");
            }
        }
        for hours in [None, Some(1.0), Some(6.0), Some(9.0)] {
            let without = recovery_score(hours, None).score;
            let with = recovery_score(hours, Some(120.0)).score;
            assert!(with >= without, "heart rate lowered {hours:?}");
        }
    }

    #[test]
    fn test_more_sleep_never_lowers_score() {
        for heart_rate in [55.0, 72.0, 85.0, 110.0] {
            let mut previous = f64::MIN;
            for tenth in 0..=140 {
                let hours = f64::from(tenth) / 10.0;
                let score = recovery_score(Some(hours), Some(heart_rate)).score;
                assert!(score >= previous, "score dropped at {hours}h / {heart_rate}bpm");
                assert!((0.0..=100.0).contains(&score));
                previous = score;
            }
        }
    }

    #[test]
    fn test_lower_heart_rate_never_lowers_score() {
        let mut previous = f64::MIN;
        for bpm in (40..=150).rev() {
            let score = recovery_score(Some(7.0), Some(f64::from(bpm))).score;
            assert!(score >= previous, "score dropped at {bpm}bpm");
            previous = score;
        }
    }
}
