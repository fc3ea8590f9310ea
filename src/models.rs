use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::categorize::ExerciseCategory;
use crate::error::ErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Exercise,
    Diet,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Exercise => "exercise",
            RecordKind::Diet => "diet",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "exercise" => Some(RecordKind::Exercise),
            "diet" => Some(RecordKind::Diet),
            _ => None,
        }
    }
}

/// One check-in as stored by the persistence layer. Read-only input.
#[derive(Debug, Clone, Serialize)]
pub struct RawRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub nickname: String,
    pub created_at: DateTime<Utc>,
    pub kind: RecordKind,
    pub content: String,
    pub photo_ref: String,
}

/// A raw record after per-run processing: positioned inside the window and
/// carrying both the raw and the sanitized content.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub nickname: String,
    pub created_at: DateTime<Utc>,
    pub kind: RecordKind,
    pub content: String,
    pub photo_ref: String,
    /// Offset from the window start, 0..=6.
    pub day_of_week: u8,
    pub sanitized_content: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DailyActivity {
    pub exercise_count: usize,
    pub diet_count: usize,
}

impl DailyActivity {
    pub fn is_active(&self) -> bool {
        self.exercise_count + self.diet_count > 0
    }
}

/// Weekly summary; a pure function of the processed records and the window.
#[derive(Debug, Clone, Serialize)]
pub struct WeeklyStats {
    pub total_count: usize,
    /// Distinct calendar dates with at least one exercise record.
    pub exercise_day_count: usize,
    /// Distinct calendar dates with at least one diet record.
    pub diet_day_count: usize,
    pub exercise_category_counts: BTreeMap<ExerciseCategory, usize>,
    /// round(active days / 7 * 100), 0..=100.
    pub consistency_score: u8,
    /// Always exactly 7 entries, one per calendar day, zero-filled.
    pub daily_breakdown: BTreeMap<NaiveDate, DailyActivity>,
}

/// The pipeline's output unit for one user, handed to the report generator.
#[derive(Debug, Clone, Serialize)]
pub struct UserWeekAggregate {
    pub user_id: Uuid,
    pub nickname: String,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub processed_records: Vec<ProcessedRecord>,
    pub stats: WeeklyStats,
    pub has_minimum_data: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedUser {
    pub user_id: Uuid,
    pub error_kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResult {
    pub succeeded: Vec<UserWeekAggregate>,
    pub failed: Vec<FailedUser>,
    /// Number of fixed-size groups that were launched.
    pub groups: usize,
}
