//! Emotion scoring, distribution and weekly trend derived from journal
//! entries.
//!
//! Every entry contributes exactly once: entries without a detected emotion
//! are bucketed as `neutral` so aggregate counts always match entry counts.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Serialize;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};
use time::Weekday;

use super::dates::{DayContext, DayKey};
use crate::config::palette::EmotionPalette;
use crate::records::ActivityEntry;

/// Distribution output is capped to this many labels.
pub const DISTRIBUTION_LIMIT: usize = 6;

pub const NEUTRAL_LABEL: &str = "neutral";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumIter, EnumString, Serialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Joy,
    Love,
    Surprise,
    Neutral,
    Fear,
    Sadness,
    Anger,
}

impl Emotion {
    pub fn score(self) -> i32 {
        match self {
            Emotion::Joy | Emotion::Love => 2,
            Emotion::Surprise => 1,
            Emotion::Neutral => 0,
            Emotion::Fear => -1,
            Emotion::Sadness | Emotion::Anger => -2,
        }
    }

    pub fn is_positive(self) -> bool {
        self.score() > 0
    }
}

/// Lowercased, trimmed label; absent or blank labels become `neutral`.
pub fn normalize_label(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(label) if !label.is_empty() => label.to_lowercase(),
        _ => NEUTRAL_LABEL.to_string(),
    }
}

/// Signed score for a label. Unknown labels score like `neutral`.
pub fn label_score(label: &str) -> i32 {
    Emotion::from_str(label.trim()).map(Emotion::score).unwrap_or(0)
}

pub fn entry_score(entry: &ActivityEntry) -> i32 {
    label_score(&normalize_label(entry.primary_emotion()))
}

/// Labels that count toward the positivity score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositiveSet {
    labels: HashSet<String>,
}

impl PositiveSet {
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let labels = labels
            .into_iter()
            .map(|label| normalize_label(Some(label.as_ref())))
            .collect();
        Self { labels }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for PositiveSet {
    fn default() -> Self {
        Self::from_labels(
            Emotion::iter()
                .filter(|emotion| emotion.is_positive())
                .map(|emotion| emotion.as_ref().to_string()),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionShare {
    pub label: String,
    pub count: u32,
    pub percentage: u32,
    pub color: String,
}

pub fn compute_emotion_distribution(
    entries: &[ActivityEntry],
    palette: &EmotionPalette,
) -> Vec<EmotionShare> {
    let mut counts: IndexMap<String, u32> = IndexMap::new();
    for entry in entries {
        *counts.entry(normalize_label(entry.primary_emotion())).or_insert(0) += 1;
    }
    let total: u32 = counts.values().sum();
    if total == 0 {
        return Vec::new();
    }

    let mut buckets: Vec<(String, u32)> = counts.into_iter().collect();
    buckets.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let percentages = largest_remainder_percentages(&buckets, total);

    buckets
        .into_iter()
        .zip(percentages)
        .take(DISTRIBUTION_LIMIT)
        .map(|((label, count), percentage)| EmotionShare {
            color: palette.color_for(&label).to_string(),
            label,
            count,
            percentage,
        })
        .collect()
}

/// Integer percentages that sum to exactly 100 across all buckets. Leftover
/// points go to the largest fractional remainders, earlier buckets first on
/// ties.
fn largest_remainder_percentages(buckets: &[(String, u32)], total: u32) -> Vec<u32> {
    let total = u64::from(total);
    let mut shares: Vec<u32> = Vec::with_capacity(buckets.len());
    let mut remainders: Vec<(usize, u64)> = Vec::with_capacity(buckets.len());
    for (idx, (_, count)) in buckets.iter().enumerate() {
        let scaled = u64::from(*count) * 100;
        shares.push((scaled / total) as u32);
        remainders.push((idx, scaled % total));
    }
    let assigned: u32 = shares.iter().sum();
    let leftover = 100u32.saturating_sub(assigned) as usize;
    remainders.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    for &(idx, _) in remainders.iter().take(leftover) {
        shares[idx] += 1;
    }
    shares
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub day_label: &'static str,
    pub day: DayKey,
    /// Sum of entry scores for the day; `None` when nothing was written.
    pub score: Option<i32>,
}

pub fn weekday_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sunday => "Sun",
        Weekday::Monday => "Mon",
        Weekday::Tuesday => "Tue",
        Weekday::Wednesday => "Wed",
        Weekday::Thursday => "Thu",
        Weekday::Friday => "Fri",
        Weekday::Saturday => "Sat",
    }
}

/// Sunday through Saturday of the week containing `ctx.today()`.
pub fn compute_weekly_trend(entries: &[ActivityEntry], ctx: &DayContext) -> [TrendPoint; 7] {
    let start = ctx.current_week_start();
    let mut scores: [Option<i32>; 7] = [None; 7];
    for entry in entries {
        let Some(created_at) = entry.created_at else {
            continue;
        };
        let Some(day) = ctx.day_of(created_at) else {
            continue;
        };
        let offset = start.days_until(day);
        if !(0..7).contains(&offset) {
            continue;
        }
        let slot = &mut scores[offset as usize];
        *slot = Some(slot.unwrap_or(0) + entry_score(entry));
    }
    std::array::from_fn(|idx| {
        let day = start.offset_days(idx as i64).unwrap_or(start);
        TrendPoint {
            day_label: weekday_label(day.weekday()),
            day,
            score: scores[idx],
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekDelta {
    /// Magnitude of the change; the sign lives in `direction`.
    pub percentage: u32,
    pub direction: TrendDirection,
}

impl WeekDelta {
    pub const NEUTRAL: WeekDelta = WeekDelta {
        percentage: 0,
        direction: TrendDirection::Neutral,
    };

    fn full_swing(average: f64) -> Self {
        match average.partial_cmp(&0.0) {
            Some(Ordering::Greater) => WeekDelta {
                percentage: 100,
                direction: TrendDirection::Up,
            },
            Some(Ordering::Less) => WeekDelta {
                percentage: 100,
                direction: TrendDirection::Down,
            },
            _ => Self::NEUTRAL,
        }
    }
}

/// Compares the average per-entry score of the current week with the week
/// before it.
pub fn compute_week_over_week_delta(entries: &[ActivityEntry], ctx: &DayContext) -> WeekDelta {
    let current_start = ctx.current_week_start();
    let Some(previous_start) = current_start.offset_days(-7) else {
        return WeekDelta::NEUTRAL;
    };
    let current = week_average(entries, ctx, current_start);
    let previous = week_average(entries, ctx, previous_start);

    match (current, previous) {
        (None, None) => WeekDelta::NEUTRAL,
        (Some(current), None) => WeekDelta::full_swing(current),
        (current, Some(previous)) => {
            let current = current.unwrap_or(0.0);
            if previous == 0.0 {
                return WeekDelta::full_swing(current);
            }
            let change = (current - previous) / previous.abs() * 100.0;
            let percentage = change.abs().round() as u32;
            let direction = if percentage == 0 {
                TrendDirection::Neutral
            } else if change > 0.0 {
                TrendDirection::Up
            } else {
                TrendDirection::Down
            };
            WeekDelta {
                percentage,
                direction,
            }
        }
    }
}

fn week_average(entries: &[ActivityEntry], ctx: &DayContext, start: DayKey) -> Option<f64> {
    let mut sum = 0i64;
    let mut count = 0u32;
    for entry in entries {
        let Some(day) = entry.created_at.and_then(|ts| ctx.day_of(ts)) else {
            continue;
        };
        if (0..7).contains(&start.days_until(day)) {
            sum += i64::from(entry_score(entry));
            count += 1;
        }
    }
    (count > 0).then(|| sum as f64 / f64::from(count))
}

/// Share of the `window` most recent entries whose primary emotion is
/// positive, as a rounded percentage. A zero window looks at every entry.
pub fn positivity_percent(entries: &[ActivityEntry], window: usize, positive: &PositiveSet) -> u32 {
    if entries.is_empty() {
        return 0;
    }
    let mut recent: Vec<&ActivityEntry> = entries.iter().collect();
    recent.sort_by(|a, b| match (a.created_at, b.created_at) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    if window > 0 {
        recent.truncate(window);
    }
    let positives = recent
        .iter()
        .filter(|entry| positive.contains(&normalize_label(entry.primary_emotion())))
        .count();
    ((positives as f64 / recent.len() as f64) * 100.0).round() as u32
}
