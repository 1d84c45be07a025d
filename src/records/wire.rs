use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_with::{serde_as, DefaultOnError};
use time::UtcOffset;
use uuid::Uuid;

use super::{
    ActivityEntry, ChatSessionPayload, EmotionAnalysis, JournalPayload, MoodPayload, RecordError,
    MAX_MOOD_SCORE, MIN_MOOD_SCORE,
};
use crate::insights::dates::parse_timestamp;

/// Identifiers arrive as strings from most endpoints and as integers from a few.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Number(i64),
}

impl RawId {
    fn into_string(self) -> Option<String> {
        match self {
            RawId::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            RawId::Number(n) => Some(n.to_string()),
        }
    }
}

fn id_or_generated(raw: Option<RawId>) -> String {
    raw.and_then(RawId::into_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MlAnalysisRecord {
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default, alias = "primary_emotion")]
    pub primary_emotion: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default, alias = "emotion_confidence")]
    pub emotion_confidence: Option<f64>,
}

#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalRecord {
    #[serde(default, alias = "_id")]
    pub id: Option<RawId>,
    #[serde(default, alias = "user_id", alias = "user")]
    pub user_id: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default, alias = "created_at")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub mood: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default, alias = "ml_analysis")]
    pub ml_analysis: Option<MlAnalysisRecord>,
}

impl JournalRecord {
    pub fn into_entry(self, offset: UtcOffset) -> ActivityEntry {
        let created_at = self
            .created_at
            .as_deref()
            .and_then(|raw| parse_timestamp(raw, offset));
        let analysis = self.ml_analysis.and_then(|ml| {
            ml.primary_emotion.map(|primary_emotion| EmotionAnalysis {
                primary_emotion,
                emotion_confidence: ml.emotion_confidence,
            })
        });
        let mut entry = ActivityEntry::journal(
            id_or_generated(self.id),
            created_at,
            JournalPayload {
                title: self.title.unwrap_or_default(),
                content: self.content.unwrap_or_default(),
                mood: self.mood,
                analysis,
            },
        );
        entry.user_id = self.user_id;
        entry
    }
}

#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodRecord {
    #[serde(default)]
    pub id: Option<RawId>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub date: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub mood: Option<i64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub emotion: Option<String>,
}

impl MoodRecord {
    pub fn into_entry(self, offset: UtcOffset) -> Result<ActivityEntry, RecordError> {
        let id = id_or_generated(self.id);
        let score = match self.mood {
            None => return Err(RecordError::MissingMoodScore { id }),
            Some(score) if !(MIN_MOOD_SCORE..=MAX_MOOD_SCORE).contains(&score) => {
                return Err(RecordError::MoodOutOfRange { id, score })
            }
            Some(score) => score as u8,
        };
        let created_at = self
            .date
            .as_deref()
            .and_then(|raw| parse_timestamp(raw, offset));
        Ok(ActivityEntry::mood(
            id,
            created_at,
            MoodPayload {
                score,
                emotion: self.emotion,
            },
        ))
    }
}

#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSessionRecord {
    #[serde(default, alias = "id", alias = "session_id")]
    pub session_id: Option<RawId>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default, alias = "created_at")]
    pub created_at: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default, alias = "last_message_at")]
    pub last_message_at: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default, alias = "message_count")]
    pub message_count: Option<u32>,
}

impl ChatSessionRecord {
    pub fn into_entry(self, offset: UtcOffset) -> ActivityEntry {
        let created_at = self
            .created_at
            .as_deref()
            .and_then(|raw| parse_timestamp(raw, offset));
        let last_message_at = self
            .last_message_at
            .as_deref()
            .and_then(|raw| parse_timestamp(raw, offset));
        ActivityEntry::chat_session(
            id_or_generated(self.session_id),
            created_at,
            ChatSessionPayload {
                message_count: self.message_count.unwrap_or(0),
                last_message_at,
            },
        )
    }
}

/// Everything the fetching layer hands over in one export.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    #[serde(alias = "journal", alias = "entries")]
    pub journals: Vec<JournalRecord>,
    #[serde(alias = "moodEntries", alias = "mood_entries")]
    pub moods: Vec<MoodRecord>,
    #[serde(alias = "chat_sessions", alias = "sessions")]
    pub chat_sessions: Vec<ChatSessionRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct ImportedRecords {
    pub journals: Vec<ActivityEntry>,
    pub moods: Vec<ActivityEntry>,
    pub chat_sessions: Vec<ActivityEntry>,
    pub skipped: Vec<RecordError>,
}

impl ImportedRecords {
    pub fn total(&self) -> usize {
        self.journals.len() + self.moods.len() + self.chat_sessions.len()
    }
}

impl Snapshot {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        serde_json::from_reader(reader).context("parsing activity snapshot json")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read(path)
            .with_context(|| format!("reading activity snapshot {}", path.display()))?;
        serde_json::from_slice(&raw)
            .with_context(|| format!("parsing activity snapshot {}", path.display()))
    }

    pub fn into_records(self, offset: UtcOffset) -> ImportedRecords {
        let mut imported = ImportedRecords::default();
        imported.journals = self
            .journals
            .into_iter()
            .map(|record| record.into_entry(offset))
            .collect();
        for record in self.moods {
            match record.into_entry(offset) {
                Ok(entry) => imported.moods.push(entry),
                Err(err) => {
                    tracing::warn!(%err, "skipping mood check-in");
                    imported.skipped.push(err);
                }
            }
        }
        imported.chat_sessions = self
            .chat_sessions
            .into_iter()
            .map(|record| record.into_entry(offset))
            .collect();

        let undated = imported
            .journals
            .iter()
            .chain(&imported.moods)
            .chain(&imported.chat_sessions)
            .filter(|entry| entry.created_at.is_none())
            .count();
        if undated > 0 {
            tracing::warn!(undated, "records without a usable timestamp are excluded from day bucketing");
        }
        tracing::debug!(
            journals = imported.journals.len(),
            moods = imported.moods.len(),
            chat_sessions = imported.chat_sessions.len(),
            skipped = imported.skipped.len(),
            "imported activity snapshot"
        );
        imported
    }
}
