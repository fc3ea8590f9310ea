use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Week-window contract violations, raised before any fetch happens.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("week start {start} must fall before week end {end}")]
    InvertedWindow { start: NaiveDate, end: NaiveDate },

    #[error("window spans {days} days inclusive, expected exactly 7")]
    WrongSpan { days: i64 },
}

/// Storage or transport failure while reading records.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("storage query failed: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("record {id} has malformed {field}: {value:?}")]
    Decode {
        id: Uuid,
        field: &'static str,
        value: String,
    },
}

#[derive(Debug, Error)]
pub enum AggregationCause {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// A single user's aggregation failure, carrying the underlying cause.
#[derive(Debug, Error)]
#[error("aggregation failed for user {user_id}: {cause}")]
pub struct AggregationError {
    pub user_id: Uuid,
    #[source]
    pub cause: AggregationCause,
}

impl AggregationError {
    pub fn new(user_id: Uuid, cause: impl Into<AggregationCause>) -> Self {
        Self {
            user_id,
            cause: cause.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self.cause {
            AggregationCause::Validation(_) => ErrorKind::Validation,
            AggregationCause::Fetch(_) => ErrorKind::Fetch,
        }
    }
}

/// Failure classification reported per user for external monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    Validation,
    Fetch,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Fetch => "fetch",
            ErrorKind::Unknown => "unknown",
        }
    }
}

/// Programming-contract violation on the batch entry point itself.
#[derive(Debug, Error)]
#[error("invalid batch options: {0}")]
pub struct BatchOptionsError(pub String);
