use thiserror::Error;

use crate::models::LeaveStatus;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database failure: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failure: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("stored value could not be decoded: {0}")]
    Decode(String),
}

/// Error taxonomy surfaced to callers. Validation and policy rejections are
/// recoverable and carry the payload the caller needs; store failures are
/// fatal to the single operation.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("missing required fields: {fields}")]
    MissingFields { fields: String },

    #[error("from_date must be on or before to_date")]
    InvalidDateRange,

    #[error("attendance is {percent}%, below the {floor}% required to apply online")]
    AttendanceTooLow { percent: i64, floor: i64 },

    #[error("monthly leave limit reached: {count} of {limit} used")]
    MonthlyLimitExceeded { count: i64, limit: i64 },

    #[error("leave request already {status}")]
    AlreadyDecided { status: LeaveStatus },

    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CoreError {
    /// Stable machine-readable code, one per rejection class.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingFields { .. } | Self::InvalidDateRange | Self::AlreadyDecided { .. } => {
                "VALIDATION_ERROR"
            }
            Self::AttendanceTooLow { .. } => "ATTENDANCE_LOW",
            Self::MonthlyLimitExceeded { .. } => "LIMIT_EXCEEDED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Store(_) => "STORE_ERROR",
        }
    }
}
