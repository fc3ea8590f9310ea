use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::FetchError;
use crate::models::{RawRecord, RecordKind};
use crate::window::WeekWindow;

/// Read-only access to the record store. The pipeline only ever queries;
/// pooling and connection lifetime belong to the caller.
#[async_trait]
pub trait RecordFetcher: Send + Sync {
    /// One user's records inside the window, ordered by `created_at` ascending.
    async fn fetch_by_user_and_window(
        &self,
        user_id: Uuid,
        window: &WeekWindow,
    ) -> Result<Vec<RawRecord>, FetchError>;

    /// Users with at least one record inside the window.
    async fn list_user_ids_active_in_window(
        &self,
        window: &WeekWindow,
    ) -> Result<Vec<Uuid>, FetchError>;

    /// Profile nickname lookup. Cosmetic; failures become `None`, never an
    /// error.
    async fn fetch_nickname(&self, user_id: Uuid) -> Option<String>;
}

pub struct PgRecordFetcher {
    pool: PgPool,
}

impl PgRecordFetcher {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Timestamp bounds covering every instant of the window's calendar days.
fn window_bounds(window: &WeekWindow) -> (DateTime<Utc>, DateTime<Utc>) {
    let from = window.start().and_time(NaiveTime::MIN).and_utc();
    let to = (window.end() + Duration::days(1))
        .and_time(NaiveTime::MIN)
        .and_utc();
    (from, to)
}

#[async_trait]
impl RecordFetcher for PgRecordFetcher {
    async fn fetch_by_user_and_window(
        &self,
        user_id: Uuid,
        window: &WeekWindow,
    ) -> Result<Vec<RawRecord>, FetchError> {
        let (from, to) = window_bounds(window);
        let rows = sqlx::query(
            "SELECT r.id, r.user_id, u.nickname, r.kind, r.content, r.photo_ref, r.created_at \
             FROM weekly_recap.records r \
             JOIN weekly_recap.users u ON u.id = r.user_id \
             WHERE r.user_id = $1 AND r.created_at >= $2 AND r.created_at < $3 \
             ORDER BY r.created_at ASC",
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let id: Uuid = row.get("id");
            let kind_raw: String = row.get("kind");
            let kind = RecordKind::parse(&kind_raw).ok_or_else(|| FetchError::Decode {
                id,
                field: "kind",
                value: kind_raw.clone(),
            })?;

            records.push(RawRecord {
                id,
                user_id: row.get("user_id"),
                nickname: row.get("nickname"),
                created_at: row.get("created_at"),
                kind,
                content: row.get("content"),
                photo_ref: row.get("photo_ref"),
            });
        }

        Ok(records)
    }

    async fn list_user_ids_active_in_window(
        &self,
        window: &WeekWindow,
    ) -> Result<Vec<Uuid>, FetchError> {
        let (from, to) = window_bounds(window);
        let rows = sqlx::query(
            "SELECT DISTINCT user_id FROM weekly_recap.records \
             WHERE created_at >= $1 AND created_at < $2 \
             ORDER BY user_id",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|row| row.get("user_id")).collect())
    }

    async fn fetch_nickname(&self, user_id: Uuid) -> Option<String> {
        let lookup = sqlx::query("SELECT nickname FROM weekly_recap.users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await;

        match lookup {
            Ok(row) => row.and_then(|row| row.try_get("nickname").ok()),
            Err(error) => {
                tracing::warn!(%user_id, %error, "nickname lookup failed, falling back");
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::{HashMap, HashSet};

    use chrono::{Duration, NaiveDate, NaiveTime};

    use super::*;

    /// In-memory fetcher with scripted per-user failures, for service and
    /// batch tests.
    #[derive(Default)]
    pub struct FakeFetcher {
        pub records: HashMap<Uuid, Vec<RawRecord>>,
        pub nicknames: HashMap<Uuid, String>,
        pub failing: HashSet<Uuid>,
    }

    impl FakeFetcher {
        pub fn with_user(mut self, user_id: Uuid, records: Vec<RawRecord>) -> Self {
            self.records.insert(user_id, records);
            self
        }

        pub fn with_nickname(mut self, user_id: Uuid, nickname: &str) -> Self {
            self.nicknames.insert(user_id, nickname.to_string());
            self
        }

        pub fn failing_for(mut self, user_id: Uuid) -> Self {
            self.failing.insert(user_id);
            self
        }
    }

    #[async_trait]
    impl RecordFetcher for FakeFetcher {
        async fn fetch_by_user_and_window(
            &self,
            user_id: Uuid,
            _window: &WeekWindow,
        ) -> Result<Vec<RawRecord>, FetchError> {
            if self.failing.contains(&user_id) {
                return Err(FetchError::Transport("injected failure".to_string()));
            }
            let mut records = self.records.get(&user_id).cloned().unwrap_or_default();
            records.sort_by_key(|record| record.created_at);
            Ok(records)
        }

        async fn list_user_ids_active_in_window(
            &self,
            _window: &WeekWindow,
        ) -> Result<Vec<Uuid>, FetchError> {
            let mut ids: Vec<Uuid> = self.records.keys().copied().collect();
            ids.sort();
            Ok(ids)
        }

        async fn fetch_nickname(&self, user_id: Uuid) -> Option<String> {
            self.nicknames.get(&user_id).cloned()
        }
    }

    pub fn raw_record(
        user_id: Uuid,
        nickname: &str,
        date: NaiveDate,
        kind: RecordKind,
        content: &str,
    ) -> RawRecord {
        RawRecord {
            id: Uuid::new_v4(),
            user_id,
            nickname: nickname.to_string(),
            created_at: date
                .and_time(NaiveTime::MIN)
                .and_utc()
                + Duration::hours(9),
            kind,
            content: content.to_string(),
            photo_ref: "photos/fixture.jpg".to_string(),
        }
    }
}
