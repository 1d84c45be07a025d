use serde::Serialize;
use strum::{Display, EnumIter, EnumString};
use thiserror::Error;
use time::OffsetDateTime;

mod wire;

pub use wire::{
    ChatSessionRecord, ImportedRecords, JournalRecord, MlAnalysisRecord, MoodRecord, RawId,
    Snapshot,
};

pub const MIN_MOOD_SCORE: i64 = 1;
pub const MAX_MOOD_SCORE: i64 = 10;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    Serialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Journal,
    Mood,
    Chat,
}

/// Why an incoming record was dropped during import.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("mood check-in {id} has no numeric score")]
    MissingMoodScore { id: String },
    #[error("mood check-in {id} score {score} outside 1..=10")]
    MoodOutOfRange { id: String, score: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmotionAnalysis {
    pub primary_emotion: String,
    pub emotion_confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JournalPayload {
    pub title: String,
    pub content: String,
    /// Label the user picked when writing the entry.
    pub mood: Option<String>,
    pub analysis: Option<EmotionAnalysis>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoodPayload {
    pub score: u8,
    pub emotion: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatSessionPayload {
    pub message_count: u32,
    pub last_message_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActivityPayload {
    Journal(JournalPayload),
    Mood(MoodPayload),
    ChatSession(ChatSessionPayload),
}

/// One user activity. `created_at` is `None` when the source timestamp was
/// absent or unparseable; such entries still count toward totals but never
/// toward a calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEntry {
    pub id: String,
    pub user_id: Option<String>,
    pub created_at: Option<OffsetDateTime>,
    pub payload: ActivityPayload,
}

impl ActivityEntry {
    pub fn journal(
        id: impl Into<String>,
        created_at: Option<OffsetDateTime>,
        payload: JournalPayload,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: None,
            created_at,
            payload: ActivityPayload::Journal(payload),
        }
    }

    pub fn mood(
        id: impl Into<String>,
        created_at: Option<OffsetDateTime>,
        payload: MoodPayload,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: None,
            created_at,
            payload: ActivityPayload::Mood(payload),
        }
    }

    pub fn chat_session(
        id: impl Into<String>,
        created_at: Option<OffsetDateTime>,
        payload: ChatSessionPayload,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: None,
            created_at,
            payload: ActivityPayload::ChatSession(payload),
        }
    }

    pub fn kind(&self) -> ActivityKind {
        match self.payload {
            ActivityPayload::Journal(_) => ActivityKind::Journal,
            ActivityPayload::Mood(_) => ActivityKind::Mood,
            ActivityPayload::ChatSession(_) => ActivityKind::Chat,
        }
    }

    /// The dominant emotion label: the ML analysis result when present,
    /// otherwise whatever the user tagged the entry with.
    pub fn primary_emotion(&self) -> Option<&str> {
        let label = match &self.payload {
            ActivityPayload::Journal(journal) => journal
                .analysis
                .as_ref()
                .map(|analysis| analysis.primary_emotion.as_str())
                .filter(|label| !label.trim().is_empty())
                .or(journal.mood.as_deref()),
            ActivityPayload::Mood(mood) => mood.emotion.as_deref(),
            ActivityPayload::ChatSession(_) => None,
        };
        label.filter(|label| !label.trim().is_empty())
    }

    pub fn mood_score(&self) -> Option<u8> {
        match &self.payload {
            ActivityPayload::Mood(mood) => Some(mood.score),
            _ => None,
        }
    }
}
