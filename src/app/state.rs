use std::sync::Arc;

use parking_lot::Mutex;
use time::UtcOffset;

use crate::insights::{
    derive_insights, DayContext, DayKey, InsightSettings, Insights, StreakSet, StreakState,
    StreakSummary,
};
use crate::records::{ActivityEntry, ActivityKind, ImportedRecords};

#[derive(Debug)]
struct CachedInsights {
    version: u64,
    today: DayKey,
    insights: Arc<Insights>,
}

/// The in-memory record lists plus their streak bookkeeping.
///
/// Every mutation bumps `version`; derived insights are cached against the
/// version and the reference day, so repeated reads between changes reuse
/// one snapshot.
#[derive(Debug)]
pub struct AppState {
    offset: UtcOffset,
    settings: InsightSettings,
    journals: Vec<ActivityEntry>,
    moods: Vec<ActivityEntry>,
    chat_sessions: Vec<ActivityEntry>,
    journal_streak: StreakState,
    mood_streak: StreakState,
    chat_streak: StreakState,
    version: u64,
    cache: Mutex<Option<CachedInsights>>,
}

impl AppState {
    pub fn new(offset: UtcOffset, settings: InsightSettings) -> Self {
        Self {
            offset,
            settings,
            journals: Vec::new(),
            moods: Vec::new(),
            chat_sessions: Vec::new(),
            journal_streak: StreakState::default(),
            mood_streak: StreakState::default(),
            chat_streak: StreakState::default(),
            version: 0,
            cache: Mutex::new(None),
        }
    }

    pub fn from_records(
        records: ImportedRecords,
        offset: UtcOffset,
        settings: InsightSettings,
    ) -> Self {
        let mut state = Self::new(offset, settings);
        state.journals = records.journals;
        state.moods = records.moods;
        state.chat_sessions = records.chat_sessions;
        for kind in [ActivityKind::Journal, ActivityKind::Mood, ActivityKind::Chat] {
            state.rebuild_streak(kind);
        }
        state.version = 1;
        tracing::info!(
            journals = state.journals.len(),
            moods = state.moods.len(),
            chat_sessions = state.chat_sessions.len(),
            "activity state loaded"
        );
        state
    }

    pub fn offset(&self) -> UtcOffset {
        self.offset
    }

    pub fn settings(&self) -> &InsightSettings {
        &self.settings
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn entries(&self, kind: ActivityKind) -> &[ActivityEntry] {
        match kind {
            ActivityKind::Journal => &self.journals,
            ActivityKind::Mood => &self.moods,
            ActivityKind::Chat => &self.chat_sessions,
        }
    }

    pub fn streak_state(&self, kind: ActivityKind) -> &StreakState {
        match kind {
            ActivityKind::Journal => &self.journal_streak,
            ActivityKind::Mood => &self.mood_streak,
            ActivityKind::Chat => &self.chat_streak,
        }
    }

    pub fn streak(&self, kind: ActivityKind, today: DayKey) -> StreakSummary {
        self.streak_state(kind).summary(today)
    }

    pub fn context(&self, today: DayKey) -> DayContext {
        DayContext::new(self.offset, today)
    }

    /// Appends a new entry and advances that kind's streak in place.
    pub fn record(&mut self, entry: ActivityEntry) {
        let kind = entry.kind();
        let offset = self.offset;
        let day = entry
            .created_at
            .and_then(|ts| DayKey::from_timestamp(ts, offset));
        tracing::debug!(%kind, id = %entry.id, ?day, "recording activity");
        self.entries_mut(kind).push(entry);
        self.streak_state_mut(kind).record(day);
        self.touch();
    }

    /// Removes an entry by id and recomputes that kind's streak from the
    /// remaining list.
    pub fn remove(&mut self, kind: ActivityKind, id: &str) -> Option<ActivityEntry> {
        let entries = self.entries_mut(kind);
        let position = entries.iter().position(|entry| entry.id == id)?;
        let removed = entries.remove(position);
        self.rebuild_streak(kind);
        self.touch();
        tracing::debug!(%kind, id, "removed activity");
        Some(removed)
    }

    pub fn insights(&self, today: DayKey) -> Arc<Insights> {
        let mut cache = self.cache.lock();
        if let Some(cached) = cache.as_ref() {
            if cached.version == self.version && cached.today == today {
                return Arc::clone(&cached.insights);
            }
        }
        let ctx = self.context(today);
        let streaks = StreakSet {
            journal: self.streak(ActivityKind::Journal, today),
            mood: self.streak(ActivityKind::Mood, today),
            chat: self.streak(ActivityKind::Chat, today),
        };
        let insights = Arc::new(derive_insights(
            &self.journals,
            &self.moods,
            streaks,
            self.chat_sessions.len(),
            &self.settings,
            &ctx,
        ));
        *cache = Some(CachedInsights {
            version: self.version,
            today,
            insights: Arc::clone(&insights),
        });
        insights
    }

    fn entries_mut(&mut self, kind: ActivityKind) -> &mut Vec<ActivityEntry> {
        match kind {
            ActivityKind::Journal => &mut self.journals,
            ActivityKind::Mood => &mut self.moods,
            ActivityKind::Chat => &mut self.chat_sessions,
        }
    }

    fn streak_state_mut(&mut self, kind: ActivityKind) -> &mut StreakState {
        match kind {
            ActivityKind::Journal => &mut self.journal_streak,
            ActivityKind::Mood => &mut self.mood_streak,
            ActivityKind::Chat => &mut self.chat_streak,
        }
    }

    fn rebuild_streak(&mut self, kind: ActivityKind) {
        let offset = self.offset;
        let days: Vec<Option<DayKey>> = self
            .entries(kind)
            .iter()
            .map(|entry| {
                entry
                    .created_at
                    .and_then(|ts| DayKey::from_timestamp(ts, offset))
            })
            .collect();
        self.streak_state_mut(kind).rebuild(days);
    }

    fn touch(&mut self) {
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::compute_streak;
    use crate::records::{ChatSessionPayload, EmotionAnalysis, JournalPayload};

    fn day(y: i32, m: u8, d: u8) -> DayKey {
        DayKey::from_ymd(y, m, d).expect("valid day")
    }

    fn journal(id: &str, on: DayKey, emotion: &str) -> ActivityEntry {
        ActivityEntry::journal(
            id,
            Some(on.noon_anchor(UtcOffset::UTC)),
            JournalPayload {
                title: format!("Entry {id}"),
                content: String::new(),
                mood: None,
                analysis: Some(EmotionAnalysis {
                    primary_emotion: emotion.to_string(),
                    emotion_confidence: Some(0.7),
                }),
            },
        )
    }

    fn state_with(entries: Vec<ActivityEntry>) -> AppState {
        let mut state = AppState::new(UtcOffset::UTC, InsightSettings::default());
        for entry in entries {
            state.record(entry);
        }
        state
    }

    #[test]
    fn deleting_middle_day_recomputes_streak() {
        let today = day(2024, 5, 3);
        let mut state = state_with(vec![
            journal("a", day(2024, 5, 1), "joy"),
            journal("b", day(2024, 5, 2), "joy"),
            journal("c", today, "joy"),
        ]);
        assert_eq!(state.streak(ActivityKind::Journal, today).streak_length, 3);

        let removed = state.remove(ActivityKind::Journal, "b").expect("entry removed");
        assert_eq!(removed.id, "b");
        let summary = state.streak(ActivityKind::Journal, today);
        assert_eq!(summary.streak_length, 1);
        assert_eq!(summary.total_entries, 2);
        assert!(state.remove(ActivityKind::Journal, "missing").is_none());
    }

    #[test]
    fn tracked_streak_agrees_with_pure_computation() {
        let today = day(2024, 5, 10);
        let entries = vec![
            journal("a", day(2024, 5, 8), "joy"),
            journal("b", day(2024, 5, 10), "fear"),
            journal("c", day(2024, 5, 9), "love"),
            journal("d", day(2024, 5, 2), "anger"),
        ];
        let state = state_with(entries.clone());
        let ctx = state.context(today);
        assert_eq!(
            state.streak(ActivityKind::Journal, today),
            compute_streak(&entries, &ctx)
        );
    }

    #[test]
    fn entries_beyond_the_supported_years_are_kept_but_undated() {
        let today = day(2024, 5, 3);
        let far_future = ActivityEntry::journal(
            "far",
            Some(time::macros::datetime!(9999-12-31 23:30 -1)),
            JournalPayload {
                title: "Far".into(),
                content: String::new(),
                mood: None,
                analysis: None,
            },
        );
        let mut state = state_with(vec![journal("a", today, "joy"), far_future]);
        let summary = state.streak(ActivityKind::Journal, today);
        assert_eq!(summary.total_entries, 2);
        assert_eq!(summary.total_distinct_days, 1);
        assert_eq!(summary.streak_length, 1);

        let insights = state.insights(today);
        assert_eq!(insights.streaks.journal.streak_length, 1);

        state.remove(ActivityKind::Journal, "a").expect("entry removed");
        assert_eq!(state.streak(ActivityKind::Journal, today).total_distinct_days, 0);
    }

    #[test]
    fn insights_are_reused_until_state_changes() {
        let today = day(2024, 5, 3);
        let mut state = state_with(vec![journal("a", today, "joy")]);
        let first = state.insights(today);
        let second = state.insights(today);
        assert!(Arc::ptr_eq(&first, &second));

        let other_day = state.insights(day(2024, 5, 4));
        assert!(!Arc::ptr_eq(&first, &other_day));

        state.record(ActivityEntry::chat_session(
            "s1",
            Some(today.noon_anchor(UtcOffset::UTC)),
            ChatSessionPayload {
                message_count: 3,
                last_message_at: None,
            },
        ));
        let refreshed = state.insights(today);
        assert!(!Arc::ptr_eq(&first, &refreshed));
        let first_chat = refreshed
            .achievements
            .iter()
            .find(|status| status.id == "first-chat")
            .expect("first-chat achievement");
        assert!(first_chat.achieved);
    }

    #[test]
    fn insights_combine_all_derivations() {
        let today = day(2024, 5, 3);
        let state = state_with(vec![
            journal("a", day(2024, 5, 1), "joy"),
            journal("b", day(2024, 5, 2), "sadness"),
            journal("c", today, "joy"),
        ]);
        let insights = state.insights(today);
        assert_eq!(insights.today, today);
        assert_eq!(insights.streaks.journal.streak_length, 3);
        assert_eq!(insights.streak_milestone.current, Some(3));
        assert_eq!(insights.streak_milestone.next, Some(7));
        assert_eq!(insights.positivity_percent, 67);
        assert_eq!(insights.emotion_distribution[0].label, "joy");
        assert_eq!(insights.entry_milestone.current, Some(1));
        assert_eq!(insights.mood.check_ins, 0);
    }

    #[test]
    fn from_records_builds_streaks_for_each_kind() {
        let today = day(2024, 5, 3);
        let records = ImportedRecords {
            journals: vec![journal("a", today, "joy")],
            chat_sessions: vec![ActivityEntry::chat_session(
                "s1",
                Some(day(2024, 5, 2).noon_anchor(UtcOffset::UTC)),
                ChatSessionPayload {
                    message_count: 1,
                    last_message_at: None,
                },
            )],
            ..Default::default()
        };
        let state = AppState::from_records(records, UtcOffset::UTC, InsightSettings::default());
        assert_eq!(state.version(), 1);
        assert_eq!(state.streak(ActivityKind::Journal, today).streak_length, 1);
        assert_eq!(state.streak(ActivityKind::Chat, today).streak_length, 1);
        assert_eq!(state.streak(ActivityKind::Mood, today).total_entries, 0);
    }
}
