// Workout recommendation from recovery and recent activity load
use super::recovery::{RecoveryLevel, RecoveryScore};
use serde::Serialize;

pub const HIGH_LOAD_STEPS: f64 = 10_000.0;
pub const HIGH_LOAD_KCAL: f64 = 500.0;
pub const MODERATE_LOAD_STEPS: f64 = 7_000.0;
pub const MODERATE_LOAD_KCAL: f64 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LoadLevel {
    Low,
    Moderate,
    High,
}

impl LoadLevel {
    pub fn classify(steps: f64, kcal: f64) -> Self {
        if steps > HIGH_LOAD_STEPS || kcal > HIGH_LOAD_KCAL {
            LoadLevel::High
        } else if steps > MODERATE_LOAD_STEPS || kcal > MODERATE_LOAD_KCAL {
            LoadLevel::Moderate
        } else {
            LoadLevel::Low
        }
    }
}

/// Daily activity volume feeding the recommendation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActivityLoad {
    pub avg_daily_steps: f64,
    pub avg_daily_kcal: f64,
    pub yesterday_steps: f64,
    pub yesterday_kcal: f64,
}

impl ActivityLoad {
    pub fn recent_level(&self) -> LoadLevel {
        LoadLevel::classify(self.avg_daily_steps, self.avg_daily_kcal)
    }

    pub fn yesterday_level(&self) -> LoadLevel {
        LoadLevel::classify(self.yesterday_steps, self.yesterday_kcal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationCategory {
    Rest,
    LightActivity,
    ModerateWorkout,
    Workout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub category: RecommendationCategory,
    pub confidence: Confidence,
    pub reason: &'static str,
    pub suggestions: &'static [&'static str],
}

const OVERTRAINED: Recommendation = Recommendation {
    category: RecommendationCategory::Rest,
    confidence: Confidence::High,
    reason: "Both yesterday and the past week were high-load. Take time to recover to avoid overtraining and injury.",
    suggestions: &[
        "Take a full rest day",
        "Do some light stretching or yoga",
        "Aim for 7-9 hours of sleep tonight",
        "Stay hydrated and eat well",
    ],
};

const POORLY_RECOVERED: Recommendation = Recommendation {
    category: RecommendationCategory::Rest,
    confidence: Confidence::Medium,
    reason: "Your sleep and heart rate point to poor recovery. Resting today lets your body catch up.",
    suggestions: &[
        "Skip intense training today",
        "Prioritise an early night",
        "Keep movement gentle, such as a short walk",
        "Check in again tomorrow before training",
    ],
};

const AFTER_HARD_DAY: Recommendation = Recommendation {
    category: RecommendationCategory::LightActivity,
    confidence: Confidence::Medium,
    reason: "Yesterday was intense while the rest of the week was lighter. Easy movement will help you recover.",
    suggestions: &[
        "Go for a gentle 30-45 minute walk",
        "Try light yoga or mobility work",
        "Swim or cycle at low intensity",
        "Stop if you feel tired",
    ],
};

const READY_TO_TRAIN: Recommendation = Recommendation {
    category: RecommendationCategory::ModerateWorkout,
    confidence: Confidence::High,
    reason: "Your activity has been steady and your recovery looks good. You are ready for a solid workout.",
    suggestions: &[
        "Do a strength or cardio session",
        "Aim for 45-60 minutes of exercise",
        "Mix cardio and strength work",
        "Keep an eye on your heart rate while training",
    ],
};

const UNDER_ACTIVE: Recommendation = Recommendation {
    category: RecommendationCategory::Workout,
    confidence: Confidence::High,
    reason: "Your recent activity has been low. A workout would do your health and fitness good.",
    suggestions: &[
        "Start with a moderate-intensity session",
        "Aim for 30-45 minutes of exercise",
        "Include both cardio and strength training",
        "Build up intensity gradually over the coming weeks",
    ],
};

const KEEP_MOVING: Recommendation = Recommendation {
    category: RecommendationCategory::LightActivity,
    confidence: Confidence::Medium,
    reason: "You have been active but recovery is only fair. A lighter day will keep you moving without adding strain.",
    suggestions: &[
        "Go for a walk or an easy jog",
        "Try a beginner-friendly workout",
        "Focus on staying active throughout the day",
        "Save harder sessions for when recovery improves",
    ],
};

const ACTIVE_UNTRACKED: Recommendation = Recommendation {
    category: RecommendationCategory::LightActivity,
    confidence: Confidence::Medium,
    reason: "You have been active, but there is no sleep or heart-rate data to judge recovery. Keep today light.",
    suggestions: &[
        "Go for a walk or an easy jog",
        "Keep the intensity conversational",
        "Wear your watch overnight to track sleep",
        "Check in again once recovery data is available",
    ],
};

/// Total over every (recovery, load) combination; rules are checked in order.
pub fn recommend(recovery: &RecoveryScore, load: &ActivityLoad) -> Recommendation {
    let yesterday = load.yesterday_level();
    let recent = load.recent_level();

    // Without sleep or heart-rate data the choice follows load alone.
    if !recovery.has_inputs() {
        return match (yesterday, recent) {
            (LoadLevel::High, LoadLevel::High) => OVERTRAINED,
            (LoadLevel::High, _) => AFTER_HARD_DAY,
            (_, LoadLevel::Low) => UNDER_ACTIVE,
            (_, LoadLevel::Moderate | LoadLevel::High) => ACTIVE_UNTRACKED,
        };
    }

    match (recovery.level, yesterday, recent) {
        (_, LoadLevel::High, LoadLevel::High) => OVERTRAINED,
        (RecoveryLevel::Poor, _, _) => POORLY_RECOVERED,
        (_, LoadLevel::High, _) => AFTER_HARD_DAY,
        (RecoveryLevel::Good | RecoveryLevel::Excellent, _, LoadLevel::Moderate | LoadLevel::High) => {
            READY_TO_TRAIN
        }
        (_, _, LoadLevel::Low) => UNDER_ACTIVE,
        (RecoveryLevel::Fair, _, LoadLevel::Moderate | LoadLevel::High) => KEEP_MOVING,
    }
}
