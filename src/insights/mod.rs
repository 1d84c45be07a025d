//! Derived state computed from activity records. Everything here is a pure
//! function of the entry lists and a [`DayContext`].

use serde::Serialize;

use crate::config::palette::EmotionPalette;
use crate::records::ActivityEntry;

pub mod achievements;
pub mod dates;
pub mod emotions;
pub mod mood;
pub mod streak;

pub use achievements::{
    evaluate_achievements, AchievementCounts, AchievementStatus, GoalDimension, MilestoneProgress,
};
pub use dates::{DayContext, DayKey};
pub use emotions::{
    compute_emotion_distribution, compute_week_over_week_delta, compute_weekly_trend,
    positivity_percent, EmotionShare, PositiveSet, TrendDirection, TrendPoint, WeekDelta,
};
pub use mood::{summarize_moods, MoodSummary};
pub use streak::{compute_streak, StreakState, StreakSummary};

/// Tunables that shape the derived values.
#[derive(Debug, Clone)]
pub struct InsightSettings {
    pub palette: EmotionPalette,
    pub positive: PositiveSet,
    pub positivity_window: usize,
}

impl Default for InsightSettings {
    fn default() -> Self {
        Self {
            palette: EmotionPalette::default(),
            positive: PositiveSet::default(),
            positivity_window: 10,
        }
    }
}

/// Streaks as already tracked by the caller, one per activity kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakSet {
    pub journal: StreakSummary,
    pub mood: StreakSummary,
    pub chat: StreakSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub today: DayKey,
    pub streaks: StreakSet,
    pub streak_milestone: MilestoneProgress,
    pub positivity_percent: u32,
    pub achievements: Vec<AchievementStatus>,
    pub entry_milestone: MilestoneProgress,
    pub emotion_distribution: Vec<EmotionShare>,
    pub weekly_trend: [TrendPoint; 7],
    pub week_over_week: WeekDelta,
    pub mood: MoodSummary,
}

/// Everything the presentation layer shows, derived in one pass.
pub fn derive_insights(
    journals: &[ActivityEntry],
    moods: &[ActivityEntry],
    streaks: StreakSet,
    chat_sessions: usize,
    settings: &InsightSettings,
    ctx: &DayContext,
) -> Insights {
    let positivity =
        positivity_percent(journals, settings.positivity_window, &settings.positive);
    let counts = AchievementCounts {
        streak_length: streaks.journal.streak_length,
        total_entries: streaks.journal.total_entries,
        chat_sessions: chat_sessions as u32,
        positivity_percent: positivity,
    };
    Insights {
        today: ctx.today(),
        streaks,
        streak_milestone: achievements::streak_milestone(streaks.journal.streak_length),
        positivity_percent: positivity,
        achievements: evaluate_achievements(&counts),
        entry_milestone: achievements::dimension_milestones(GoalDimension::EntryCount, &counts),
        emotion_distribution: compute_emotion_distribution(journals, &settings.palette),
        weekly_trend: compute_weekly_trend(journals, ctx),
        week_over_week: compute_week_over_week_delta(journals, ctx),
        mood: summarize_moods(moods),
    }
}
