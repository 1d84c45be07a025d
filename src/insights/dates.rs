use std::fmt;

use serde::{Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::macros::{format_description, time};
use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, UtcOffset, Weekday};

/// A local calendar day. Two timestamps are "the same day" iff they map to
/// equal keys under the same [`DayContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(Date);

impl DayKey {
    pub fn new(date: Date) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u8, day: u8) -> Option<Self> {
        let month = Month::try_from(month).ok()?;
        Date::from_calendar_date(year, month, day).ok().map(Self)
    }

    /// The local day `timestamp` falls on under `offset`, or `None` when the
    /// local form of the instant is outside the representable date range.
    pub fn from_timestamp(timestamp: OffsetDateTime, offset: UtcOffset) -> Option<Self> {
        timestamp
            .checked_to_offset(offset)
            .map(|local| Self(local.date()))
    }

    /// Parses a `YYYY-MM-DD` day.
    pub fn parse(raw: &str) -> Option<Self> {
        Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
            .ok()
            .map(Self)
    }

    pub fn date(self) -> Date {
        self.0
    }

    pub fn previous(self) -> Option<Self> {
        self.0.previous_day().map(Self)
    }

    pub fn next(self) -> Option<Self> {
        self.0.next_day().map(Self)
    }

    pub fn offset_days(self, days: i64) -> Option<Self> {
        self.0.checked_add(Duration::days(days)).map(Self)
    }

    /// Signed number of calendar days from `self` to `later`.
    pub fn days_until(self, later: DayKey) -> i64 {
        (later.0 - self.0).whole_days()
    }

    pub fn weekday(self) -> Weekday {
        self.0.weekday()
    }

    /// Sunday that opens the week containing this day.
    pub fn week_start(self) -> DayKey {
        let back = i64::from(self.0.weekday().number_days_from_sunday());
        self.offset_days(-back).unwrap_or(self)
    }

    /// The instant at 12:00 local time on this day. Date-only inputs are
    /// anchored here so a one-hour DST shift can never move them across a
    /// day boundary.
    pub fn noon_anchor(self, offset: UtcOffset) -> OffsetDateTime {
        PrimitiveDateTime::new(self.0, time!(12:00)).assume_offset(offset)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .0
            .format(format_description!("[year]-[month]-[day]"))
            .map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl Serialize for DayKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Local offset plus the reference "today" every derived computation is
/// evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayContext {
    offset: UtcOffset,
    today: DayKey,
}

impl DayContext {
    pub fn new(offset: UtcOffset, today: DayKey) -> Self {
        Self { offset, today }
    }

    pub fn now(offset: UtcOffset) -> Self {
        let today = DayKey(OffsetDateTime::now_utc().to_offset(offset).date());
        Self { offset, today }
    }

    pub fn utc(today: DayKey) -> Self {
        Self::new(UtcOffset::UTC, today)
    }

    pub fn offset(&self) -> UtcOffset {
        self.offset
    }

    pub fn today(&self) -> DayKey {
        self.today
    }

    pub fn with_today(self, today: DayKey) -> Self {
        Self { today, ..self }
    }

    pub fn day_of(&self, timestamp: OffsetDateTime) -> Option<DayKey> {
        DayKey::from_timestamp(timestamp, self.offset)
    }

    pub fn current_week_start(&self) -> DayKey {
        self.today.week_start()
    }
}

/// Picks the offset used for day bucketing. An explicit configured offset
/// wins; otherwise the system local offset, falling back to UTC when the
/// platform cannot report it.
pub fn resolve_offset(configured_minutes: Option<i32>) -> UtcOffset {
    if let Some(minutes) = configured_minutes {
        match UtcOffset::from_whole_seconds(minutes.saturating_mul(60)) {
            Ok(offset) => return offset,
            Err(err) => {
                tracing::warn!(minutes, %err, "configured utc offset out of range, ignoring");
            }
        }
    }
    UtcOffset::current_local_offset().unwrap_or_else(|err| {
        tracing::warn!(%err, "local offset unavailable, bucketing days in UTC");
        UtcOffset::UTC
    })
}

/// Parses a record timestamp. Accepts RFC 3339, a naive
/// `YYYY-MM-DDTHH:MM:SS[.fff]` read in `offset`, and a bare `YYYY-MM-DD`
/// anchored at local noon. Returns `None` for anything else, including
/// instants whose local form in `offset` falls outside the supported years.
pub fn parse_timestamp(raw: &str, offset: UtcOffset) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return ts.checked_to_offset(offset).map(|_| ts);
    }
    if let Ok(naive) = PrimitiveDateTime::parse(
        raw,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"),
    ) {
        return Some(naive.assume_offset(offset));
    }
    DayKey::parse(raw).map(|day| day.noon_anchor(offset))
}
