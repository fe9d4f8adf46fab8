use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SalesAttainmentError {
    #[error("Invalid period '{0}': expected YYYY-MM")]
    InvalidPeriod(String),

    #[error("Invalid day {day} for period {period}: must be between 1 and {days_in_period}")]
    InvalidDay {
        period: String,
        day: u32,
        days_in_period: u32,
    },

    #[error("Invalid argument {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("Invalid goal for '{key}': {value} (goals must be zero or positive)")]
    InvalidGoal { key: String, value: Decimal },

    #[error("Sales source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Goal store error: {0}")]
    GoalStore(String),

    #[error("{0} is not allowed to edit goals")]
    Unauthorized(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SalesAttainmentError>;
