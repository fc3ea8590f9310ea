use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{BatchOptionsError, ErrorKind};
use crate::fetch::RecordFetcher;
use crate::models::{BatchResult, FailedUser};
use crate::service::UserAggregationService;
use crate::window::WINDOW_DAYS;

/// Configuration for a batch run. Defaults mirror the upstream store's
/// comfortable request rate.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Users aggregated concurrently per group.
    pub group_size: usize,
    /// Pacing delay between successive groups.
    pub inter_group_delay: Duration,
    pub minimum_record_count: usize,
    pub minimum_distinct_days: usize,
    pub max_content_length: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            group_size: 10,
            inter_group_delay: Duration::from_millis(100),
            minimum_record_count: 3,
            minimum_distinct_days: 3,
            max_content_length: 500,
        }
    }
}

impl BatchOptions {
    pub fn validate(&self) -> Result<(), BatchOptionsError> {
        if self.group_size == 0 {
            return Err(BatchOptionsError("group_size must be at least 1".into()));
        }
        if self.max_content_length < 2 {
            return Err(BatchOptionsError(
                "max_content_length must leave room for the truncation marker".into(),
            ));
        }
        if self.minimum_distinct_days > WINDOW_DAYS as usize {
            return Err(BatchOptionsError(format!(
                "minimum_distinct_days {} can never be met inside a {}-day window",
                self.minimum_distinct_days, WINDOW_DAYS
            )));
        }
        Ok(())
    }
}

/// Runs the per-user aggregation across a population in fixed-size groups.
/// Per-user failures are collected, never propagated; only invalid options
/// fail construction. Stateless between runs.
pub struct BatchOrchestrator {
    service: Arc<UserAggregationService>,
    options: BatchOptions,
}

impl BatchOrchestrator {
    pub fn new(
        fetcher: Arc<dyn RecordFetcher>,
        options: BatchOptions,
    ) -> Result<Self, BatchOptionsError> {
        options.validate()?;
        let service = Arc::new(UserAggregationService::new(fetcher, &options));
        Ok(Self { service, options })
    }

    /// Aggregate every user in `user_ids` for the window. Within a group all
    /// users run concurrently; groups run in sequence with the pacing delay
    /// between them. Cancelling stops launching further groups while
    /// in-flight work drains; users never launched are recorded as failed so
    /// the result accounts for the whole input set.
    pub async fn aggregate_batch(
        &self,
        user_ids: &[Uuid],
        week_start: NaiveDate,
        week_end: NaiveDate,
        cancel: &CancellationToken,
    ) -> BatchResult {
        let mut result = BatchResult::default();
        let groups: Vec<&[Uuid]> = user_ids.chunks(self.options.group_size).collect();
        let total_groups = groups.len();

        for (index, group) in groups.iter().enumerate() {
            if cancel.is_cancelled() {
                let remaining: Vec<Uuid> =
                    groups[index..].iter().copied().flatten().copied().collect();
                tracing::info!(
                    launched_groups = index,
                    remaining_users = remaining.len(),
                    "batch cancelled, draining in-flight work"
                );
                for user_id in remaining {
                    result.failed.push(FailedUser {
                        user_id,
                        error_kind: ErrorKind::Unknown,
                        message: "batch cancelled before aggregation started".to_string(),
                    });
                }
                break;
            }

            tracing::debug!(
                group = index + 1,
                total_groups,
                users = group.len(),
                "launching aggregation group"
            );

            let mut handles = Vec::with_capacity(group.len());
            for &user_id in *group {
                let service = Arc::clone(&self.service);
                handles.push((
                    user_id,
                    tokio::spawn(async move {
                        service.aggregate_user(user_id, week_start, week_end).await
                    }),
                ));
            }

            for (user_id, handle) in handles {
                match handle.await {
                    Ok(Ok(aggregate)) => result.succeeded.push(aggregate),
                    Ok(Err(error)) => {
                        tracing::warn!(%user_id, %error, "user aggregation failed");
                        result.failed.push(FailedUser {
                            user_id,
                            error_kind: error.kind(),
                            message: error.to_string(),
                        });
                    }
                    Err(join_error) => {
                        tracing::error!(%user_id, %join_error, "aggregation task aborted");
                        result.failed.push(FailedUser {
                            user_id,
                            error_kind: ErrorKind::Unknown,
                            message: format!("aggregation task aborted: {join_error}"),
                        });
                    }
                }
            }

            result.groups += 1;

            if index + 1 < total_groups && !cancel.is_cancelled() {
                tokio::time::sleep(self.options.inter_group_delay).await;
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::fetch::test_support::{raw_record, FakeFetcher};
    use crate::models::RecordKind;
    use chrono::Duration as ChronoDuration;

    fn week_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 24).unwrap()
    }

    fn week_end() -> NaiveDate {
        week_start() + ChronoDuration::days(6)
    }

    fn fast_options(group_size: usize) -> BatchOptions {
        BatchOptions {
            group_size,
            inter_group_delay: Duration::from_millis(1),
            ..BatchOptions::default()
        }
    }

    fn populated_fetcher(user_ids: &[Uuid]) -> FakeFetcher {
        let mut fetcher = FakeFetcher::default();
        for &user_id in user_ids {
            fetcher = fetcher.with_user(
                user_id,
                vec![raw_record(
                    user_id,
                    "회원",
                    week_start(),
                    RecordKind::Exercise,
                    "러닝",
                )],
            );
        }
        fetcher
    }

    #[tokio::test]
    async fn isolates_one_failing_user_and_counts_groups() {
        let user_ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let failing = user_ids[2];
        let fetcher = populated_fetcher(&user_ids).failing_for(failing);

        let orchestrator =
            BatchOrchestrator::new(Arc::new(fetcher), fast_options(2)).unwrap();
        let result = orchestrator
            .aggregate_batch(&user_ids, week_start(), week_end(), &CancellationToken::new())
            .await;

        assert_eq!(result.succeeded.len(), 4);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].user_id, failing);
        assert_eq!(result.failed[0].error_kind, ErrorKind::Fetch);
        // ceil(5 / 2)
        assert_eq!(result.groups, 3);
    }

    #[tokio::test]
    async fn empty_population_yields_empty_result() {
        let fetcher = FakeFetcher::default();
        let orchestrator =
            BatchOrchestrator::new(Arc::new(fetcher), fast_options(10)).unwrap();
        let result = orchestrator
            .aggregate_batch(&[], week_start(), week_end(), &CancellationToken::new())
            .await;

        assert!(result.succeeded.is_empty());
        assert!(result.failed.is_empty());
        assert_eq!(result.groups, 0);
    }

    #[tokio::test]
    async fn bad_window_fails_every_user_without_aborting_the_batch() {
        let user_ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let fetcher = populated_fetcher(&user_ids);
        let orchestrator =
            BatchOrchestrator::new(Arc::new(fetcher), fast_options(2)).unwrap();

        // Reversed window: every user's validation fails in isolation.
        let result = orchestrator
            .aggregate_batch(&user_ids, week_end(), week_start(), &CancellationToken::new())
            .await;

        assert!(result.succeeded.is_empty());
        assert_eq!(result.failed.len(), 3);
        assert!(result
            .failed
            .iter()
            .all(|f| f.error_kind == ErrorKind::Validation));
        assert_eq!(result.groups, 2);
    }

    #[tokio::test]
    async fn cancellation_stops_new_groups_and_accounts_for_unlaunched_users() {
        let user_ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let fetcher = populated_fetcher(&user_ids);
        let orchestrator =
            BatchOrchestrator::new(Arc::new(fetcher), fast_options(2)).unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = orchestrator
            .aggregate_batch(&user_ids, week_start(), week_end(), &cancel)
            .await;

        assert!(result.succeeded.is_empty());
        assert_eq!(result.failed.len(), 4);
        assert_eq!(result.groups, 0);
        assert!(result
            .failed
            .iter()
            .all(|f| f.error_kind == ErrorKind::Unknown));
    }

    #[tokio::test]
    async fn rejects_zero_group_size() {
        let options = BatchOptions {
            group_size: 0,
            ..BatchOptions::default()
        };
        let built = BatchOrchestrator::new(Arc::new(FakeFetcher::default()), options);
        assert!(built.is_err());
    }

    #[tokio::test]
    async fn rejects_unreachable_minimum_distinct_days() {
        let options = BatchOptions {
            minimum_distinct_days: 8,
            ..BatchOptions::default()
        };
        let built = BatchOrchestrator::new(Arc::new(FakeFetcher::default()), options);
        assert!(built.is_err());
    }
}
