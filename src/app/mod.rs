use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use time::UtcOffset;

use crate::config::AppConfig;
use crate::insights::dates::resolve_offset;
use crate::insights::{DayContext, DayKey, Insights};
use crate::records::{RecordError, Snapshot};

pub mod state;

pub use state::AppState;

/// Where an activity snapshot is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotSource {
    Stdin,
    File(PathBuf),
}

impl SnapshotSource {
    pub fn read(&self) -> Result<Snapshot> {
        match self {
            SnapshotSource::Stdin => {
                Snapshot::from_reader(io::stdin().lock()).context("reading snapshot from stdin")
            }
            SnapshotSource::File(path) => Snapshot::from_path(path),
        }
    }
}

pub struct App {
    pub config: Arc<AppConfig>,
    state: AppState,
    skipped: Vec<RecordError>,
}

impl App {
    pub fn load(config: Arc<AppConfig>, source: &SnapshotSource) -> Result<Self> {
        let snapshot = source
            .read()
            .with_context(|| format!("loading activity snapshot from {source:?}"))?;
        Ok(Self::from_snapshot(config, snapshot))
    }

    pub fn from_snapshot(config: Arc<AppConfig>, snapshot: Snapshot) -> Self {
        let offset = resolve_offset(config.utc_offset_minutes);
        let mut records = snapshot.into_records(offset);
        let skipped = std::mem::take(&mut records.skipped);
        let state = AppState::from_records(records, offset, config.insight_settings());
        Self {
            config,
            state,
            skipped,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub fn offset(&self) -> UtcOffset {
        self.state.offset()
    }

    /// Records dropped during import, in input order.
    pub fn skipped(&self) -> &[RecordError] {
        &self.skipped
    }

    /// The reference day: the override when given, otherwise the current
    /// local date.
    pub fn today(&self, override_day: Option<DayKey>) -> DayKey {
        override_day.unwrap_or_else(|| DayContext::now(self.offset()).today())
    }

    pub fn insights(&self, override_day: Option<DayKey>) -> Arc<Insights> {
        self.state.insights(self.today(override_day))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    const SNAPSHOT: &str = r#"{
        "journals": [
            {"id": "j1", "createdAt": "2024-05-01T09:00:00Z", "title": "a", "mlAnalysis": {"primaryEmotion": "joy"}},
            {"id": "j2", "createdAt": "2024-05-02T09:00:00Z", "title": "b"}
        ],
        "moods": [
            {"id": "m1", "date": "2024-05-02", "mood": 7, "emotion": "calm"},
            {"id": "m2", "date": "2024-05-02", "mood": 42}
        ],
        "chatSessions": []
    }"#;

    fn utc_config() -> Arc<AppConfig> {
        Arc::new(AppConfig {
            utc_offset_minutes: Some(0),
            ..AppConfig::default()
        })
    }

    #[test]
    fn loads_snapshot_file_and_keeps_skipped_records() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("snapshot.json");
        std::fs::write(&path, SNAPSHOT)?;

        let app = App::load(utc_config(), &SnapshotSource::File(path))?;
        assert_eq!(app.offset(), UtcOffset::UTC);
        assert_eq!(app.skipped().len(), 1);
        assert_matches!(&app.skipped()[0], RecordError::MoodOutOfRange { score: 42, .. });

        let today = DayKey::from_ymd(2024, 5, 2);
        let insights = app.insights(today);
        assert_eq!(insights.streaks.journal.streak_length, 2);
        assert_eq!(insights.mood.check_ins, 1);
        Ok(())
    }

    #[test]
    fn missing_snapshot_file_is_an_error() {
        let err = App::load(
            utc_config(),
            &SnapshotSource::File(PathBuf::from("/nonexistent/snapshot.json")),
        )
        .err()
        .expect("missing file should fail");
        assert!(format!("{err:#}").contains("reading activity snapshot"));
    }

    #[test]
    fn today_override_wins() -> Result<()> {
        let snapshot = Snapshot::from_reader(SNAPSHOT.as_bytes())?;
        let app = App::from_snapshot(utc_config(), snapshot);
        let day = DayKey::from_ymd(2024, 6, 1);
        assert_eq!(Some(app.today(day)), day);
        Ok(())
    }
}
