use std::cmp::Ordering;

use indexmap::IndexMap;
use serde::Serialize;

use super::emotions::normalize_label;
use crate::records::ActivityEntry;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodSummary {
    pub check_ins: u32,
    /// Mean score rounded to one decimal place.
    pub average_score: Option<f64>,
    pub latest_score: Option<u8>,
    pub most_common_emotion: Option<String>,
}

pub fn summarize_moods(entries: &[ActivityEntry]) -> MoodSummary {
    let scored: Vec<(&ActivityEntry, u8)> = entries
        .iter()
        .filter_map(|entry| entry.mood_score().map(|score| (entry, score)))
        .collect();
    if scored.is_empty() {
        return MoodSummary::default();
    }

    let sum: u32 = scored.iter().map(|(_, score)| u32::from(*score)).sum();
    let average = f64::from(sum) / scored.len() as f64;

    // Undated check-ins never beat dated ones; among equals the later one in
    // the list wins.
    let latest_score = scored
        .iter()
        .max_by(|(a, _), (b, _)| match (a.created_at, b.created_at) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        })
        .map(|(_, score)| *score);

    let mut emotions: IndexMap<String, u32> = IndexMap::new();
    for (entry, _) in &scored {
        *emotions.entry(normalize_label(entry.primary_emotion())).or_insert(0) += 1;
    }
    // First label to reach the top count wins ties.
    let most_common_emotion = emotions
        .iter()
        .fold(None::<(&String, u32)>, |best, (label, &count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((label, count)),
        })
        .map(|(label, _)| label.clone());

    MoodSummary {
        check_ins: scored.len() as u32,
        average_score: Some((average * 10.0).round() / 10.0),
        latest_score,
        most_common_emotion,
    }
}
