use std::collections::BTreeSet;

use serde::Serialize;
use time::OffsetDateTime;

use super::dates::{DayContext, DayKey};
use crate::records::ActivityEntry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakSummary {
    pub streak_length: u32,
    pub total_distinct_days: u32,
    pub total_entries: u32,
    pub longest_streak: u32,
    pub last_active_day: Option<DayKey>,
}

pub fn compute_streak(entries: &[ActivityEntry], ctx: &DayContext) -> StreakSummary {
    streak_from_timestamps(entries.iter().map(|entry| entry.created_at), ctx)
}

pub fn streak_from_timestamps<I>(timestamps: I, ctx: &DayContext) -> StreakSummary
where
    I: IntoIterator<Item = Option<OffsetDateTime>>,
{
    let mut state = StreakState::default();
    state.rebuild(timestamps.into_iter().map(|ts| ts.and_then(|ts| ctx.day_of(ts))));
    state.summary(ctx.today())
}

/// Running streak bookkeeping for one activity kind.
///
/// `record` keeps the counters current as entries arrive in order. A
/// back-dated day, or any removal, goes through `rebuild`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreakState {
    days: BTreeSet<DayKey>,
    total_entries: u32,
    /// Length of the consecutive run that ends on `last_day`.
    run_length: u32,
    longest: u32,
}

impl StreakState {
    pub fn from_days<I>(days: I) -> Self
    where
        I: IntoIterator<Item = Option<DayKey>>,
    {
        let mut state = Self::default();
        state.rebuild(days);
        state
    }

    pub fn last_day(&self) -> Option<DayKey> {
        self.days.iter().next_back().copied()
    }

    pub fn total_entries(&self) -> u32 {
        self.total_entries
    }

    pub fn distinct_days(&self) -> u32 {
        self.days.len() as u32
    }

    pub fn record(&mut self, day: Option<DayKey>) {
        self.total_entries += 1;
        let Some(day) = day else {
            return;
        };
        match self.last_day() {
            None => {
                self.days.insert(day);
                self.run_length = 1;
            }
            Some(last) if day == last => {}
            Some(last) if day > last => {
                self.days.insert(day);
                self.run_length = if last.next() == Some(day) {
                    self.run_length + 1
                } else {
                    1
                };
            }
            Some(_) => {
                if self.days.insert(day) {
                    self.recount_runs();
                }
                return;
            }
        }
        self.longest = self.longest.max(self.run_length);
    }

    pub fn rebuild<I>(&mut self, days: I)
    where
        I: IntoIterator<Item = Option<DayKey>>,
    {
        self.days.clear();
        self.total_entries = 0;
        for day in days {
            self.total_entries += 1;
            if let Some(day) = day {
                self.days.insert(day);
            }
        }
        self.recount_runs();
    }

    pub fn summary(&self, today: DayKey) -> StreakSummary {
        StreakSummary {
            streak_length: self.current_streak(today),
            total_distinct_days: self.distinct_days(),
            total_entries: self.total_entries,
            longest_streak: self.longest,
            last_active_day: self.last_day(),
        }
    }

    /// Consecutive days ending today, or ending yesterday when nothing has
    /// been logged yet today. Days after `today` are ignored.
    pub fn current_streak(&self, today: DayKey) -> u32 {
        let Some(latest) = self.days.range(..=today).next_back().copied() else {
            return 0;
        };
        if latest.days_until(today) > 1 {
            return 0;
        }
        if Some(latest) == self.last_day() {
            return self.run_length;
        }
        let mut streak = 0;
        let mut cursor = Some(latest);
        while let Some(day) = cursor {
            if !self.days.contains(&day) {
                break;
            }
            streak += 1;
            cursor = day.previous();
        }
        streak
    }

    fn recount_runs(&mut self) {
        let mut run = 0u32;
        let mut longest = 0u32;
        let mut prev: Option<DayKey> = None;
        for &day in &self.days {
            run = match prev {
                Some(p) if p.next() == Some(day) => run + 1,
                _ => 1,
            };
            longest = longest.max(run);
            prev = Some(day);
        }
        self.run_length = run;
        self.longest = longest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, offset};
    use time::UtcOffset;

    fn day(y: i32, m: u8, d: u8) -> DayKey {
        DayKey::from_ymd(y, m, d).expect("valid day")
    }

    fn noon(day: DayKey) -> Option<OffsetDateTime> {
        Some(day.noon_anchor(UtcOffset::UTC))
    }

    fn ctx(today: DayKey) -> DayContext {
        DayContext::utc(today)
    }

    #[test]
    fn empty_input_is_all_zero() {
        let summary = streak_from_timestamps(Vec::new(), &ctx(day(2024, 5, 3)));
        assert_eq!(summary, StreakSummary::default());
    }

    #[test]
    fn three_consecutive_days_ending_today() {
        let today = day(2024, 5, 3);
        let stamps = [day(2024, 5, 1), day(2024, 5, 2), today].map(noon);
        let summary = streak_from_timestamps(stamps, &ctx(today));
        assert_eq!(summary.streak_length, 3);
        assert_eq!(summary.total_distinct_days, 3);
        assert_eq!(summary.total_entries, 3);
        assert_eq!(summary.longest_streak, 3);
        assert_eq!(summary.last_active_day, Some(today));
    }

    #[test]
    fn removing_the_middle_day_leaves_only_today() {
        let today = day(2024, 5, 3);
        let stamps = [day(2024, 5, 1), today].map(noon);
        let summary = streak_from_timestamps(stamps, &ctx(today));
        assert_eq!(summary.streak_length, 1);
        assert_eq!(summary.total_distinct_days, 2);
    }

    #[test]
    fn streak_still_alive_when_today_is_missing() {
        let today = day(2024, 5, 3);
        let stamps = [day(2024, 5, 1), day(2024, 5, 2)].map(noon);
        let summary = streak_from_timestamps(stamps, &ctx(today));
        assert_eq!(summary.streak_length, 2);
    }

    #[test]
    fn missing_yesterday_with_today_present_counts_today_only() {
        let today = day(2024, 5, 3);
        let stamps = [day(2024, 5, 1), today].map(noon);
        let summary = streak_from_timestamps(stamps, &ctx(today));
        assert_eq!(summary.streak_length, 1);
    }

    #[test]
    fn two_day_gap_before_today_breaks_streak() {
        let today = day(2024, 5, 4);
        let stamps = [day(2024, 5, 1), day(2024, 5, 2)].map(noon);
        let summary = streak_from_timestamps(stamps, &ctx(today));
        assert_eq!(summary.streak_length, 0);
        assert_eq!(summary.longest_streak, 2);
    }

    #[test]
    fn n_consecutive_days_give_streak_n() {
        let today = day(2024, 3, 15);
        for n in 1..=20i64 {
            let stamps: Vec<_> = (0..n)
                .map(|back| noon(today.offset_days(-back).expect("in range")))
                .collect();
            let summary = streak_from_timestamps(stamps, &ctx(today));
            assert_eq!(summary.streak_length, n as u32);
        }
    }

    #[test]
    fn same_day_entries_count_once_for_days() {
        let today = day(2024, 5, 3);
        let stamps = vec![
            Some(datetime!(2024-05-03 06:00 UTC)),
            Some(datetime!(2024-05-03 22:30 UTC)),
            Some(datetime!(2024-05-02 23:59 UTC)),
        ];
        let summary = streak_from_timestamps(stamps, &ctx(today));
        assert_eq!(summary.total_entries, 3);
        assert_eq!(summary.total_distinct_days, 2);
        assert_eq!(summary.streak_length, 2);
        assert!(summary.total_distinct_days <= summary.total_entries);
    }

    #[test]
    fn malformed_timestamps_count_as_entries_but_not_days() {
        let today = day(2024, 5, 3);
        let summary = streak_from_timestamps(vec![None, noon(today)], &ctx(today));
        assert_eq!(summary.total_entries, 2);
        assert_eq!(summary.total_distinct_days, 1);
        assert_eq!(summary.streak_length, 1);
    }

    #[test]
    fn unrepresentable_local_day_counts_as_undated() {
        let today = day(2024, 5, 3);
        let stamps = vec![Some(datetime!(9999-12-31 23:30 -1)), noon(today)];
        let summary = streak_from_timestamps(stamps, &ctx(today));
        assert_eq!(summary.total_entries, 2);
        assert_eq!(summary.total_distinct_days, 1);
        assert_eq!(summary.streak_length, 1);
    }

    #[test]
    fn future_days_do_not_extend_current_streak() {
        let today = day(2024, 5, 3);
        let stamps = [day(2024, 5, 2), today, day(2024, 5, 6)].map(noon);
        let summary = streak_from_timestamps(stamps, &ctx(today));
        assert_eq!(summary.streak_length, 2);
        assert_eq!(summary.total_distinct_days, 3);
    }

    #[test]
    fn local_offset_moves_late_entries_to_previous_day() {
        let today = DayKey::new(date!(2024 - 05 - 03));
        let ctx = DayContext::new(offset!(-5), today);
        // 02:00 UTC on the 3rd is 21:00 on the 2nd at UTC-5.
        let stamps = vec![
            Some(datetime!(2024-05-03 02:00 UTC)),
            Some(datetime!(2024-05-03 15:00 UTC)),
        ];
        let summary = streak_from_timestamps(stamps, &ctx);
        assert_eq!(summary.total_distinct_days, 2);
        assert_eq!(summary.streak_length, 2);
    }

    #[test]
    fn incremental_record_matches_rebuild() {
        let today = day(2024, 5, 10);
        let sequence = [
            Some(day(2024, 5, 1)),
            Some(day(2024, 5, 2)),
            None,
            Some(day(2024, 5, 2)),
            Some(day(2024, 5, 5)),
            Some(day(2024, 5, 3)),
            Some(day(2024, 5, 4)),
            Some(day(2024, 5, 9)),
            Some(day(2024, 5, 10)),
        ];
        let mut incremental = StreakState::default();
        for (idx, entry) in sequence.iter().enumerate() {
            incremental.record(*entry);
            let rebuilt = StreakState::from_days(sequence[..=idx].iter().copied());
            assert_eq!(incremental.summary(today), rebuilt.summary(today), "after {idx}");
        }
        let summary = incremental.summary(today);
        assert_eq!(summary.streak_length, 2);
        assert_eq!(summary.longest_streak, 5);
        assert_eq!(summary.total_entries, 9);
    }
}
