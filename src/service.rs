use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::batch::BatchOptions;
use crate::categorize::ExerciseCategorizer;
use crate::error::AggregationError;
use crate::fetch::RecordFetcher;
use crate::models::{ProcessedRecord, UserWeekAggregate};
use crate::sanitize::ContentSanitizer;
use crate::stats;
use crate::window::WeekWindow;

/// Fallback nickname when neither the records nor the profile lookup yield
/// one. Cosmetic only, never an error.
pub const UNKNOWN_NICKNAME: &str = "Unknown User";

/// Aggregates one user's week: validate -> fetch -> sanitize -> summarize ->
/// minimum-data check -> nickname resolution. Stateless between calls.
pub struct UserAggregationService {
    fetcher: Arc<dyn RecordFetcher>,
    sanitizer: ContentSanitizer,
    categorizer: ExerciseCategorizer,
    minimum_record_count: usize,
    minimum_distinct_days: usize,
}

impl UserAggregationService {
    pub fn new(fetcher: Arc<dyn RecordFetcher>, options: &BatchOptions) -> Self {
        Self {
            fetcher,
            sanitizer: ContentSanitizer::new(options.max_content_length),
            categorizer: ExerciseCategorizer::default(),
            minimum_record_count: options.minimum_record_count,
            minimum_distinct_days: options.minimum_distinct_days,
        }
    }

    pub async fn aggregate_user(
        &self,
        user_id: Uuid,
        week_start: NaiveDate,
        week_end: NaiveDate,
    ) -> Result<UserWeekAggregate, AggregationError> {
        let window = WeekWindow::new(week_start, week_end)
            .map_err(|cause| AggregationError::new(user_id, cause))?;

        let raw = self
            .fetcher
            .fetch_by_user_and_window(user_id, &window)
            .await
            .map_err(|cause| AggregationError::new(user_id, cause))?;

        let processed: Vec<ProcessedRecord> = raw
            .into_iter()
            .filter_map(|record| {
                let day_of_week = window.day_offset(record.created_at.date_naive())?;
                let sanitized_content = self.sanitizer.sanitize(&record.content);
                Some(ProcessedRecord {
                    id: record.id,
                    user_id: record.user_id,
                    nickname: record.nickname,
                    created_at: record.created_at,
                    kind: record.kind,
                    content: record.content,
                    photo_ref: record.photo_ref,
                    day_of_week,
                    sanitized_content,
                })
            })
            .collect();

        let stats = stats::aggregate(&processed, &window, &self.categorizer);

        let distinct_days: HashSet<NaiveDate> = processed
            .iter()
            .map(|record| record.created_at.date_naive())
            .collect();
        let has_minimum_data = processed.len() >= self.minimum_record_count
            && distinct_days.len() >= self.minimum_distinct_days;

        let nickname = self.resolve_nickname(user_id, &processed).await;

        Ok(UserWeekAggregate {
            user_id,
            nickname,
            week_start: window.start(),
            week_end: window.end(),
            processed_records: processed,
            stats,
            has_minimum_data,
        })
    }

    async fn resolve_nickname(&self, user_id: Uuid, records: &[ProcessedRecord]) -> String {
        if let Some(record) = records.iter().find(|r| !r.nickname.trim().is_empty()) {
            return record.nickname.clone();
        }
        match self.fetcher.fetch_nickname(user_id).await {
            Some(nickname) => nickname,
            None => {
                tracing::debug!(%user_id, "no nickname available, using fallback");
                UNKNOWN_NICKNAME.to_string()
            }
        }
    }
}
