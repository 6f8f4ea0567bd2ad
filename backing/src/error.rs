//! Backing error types

use meta_core::Timestamp;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackingError {
    #[error("Duration must be a positive multiple of {interval_secs}s, got {duration_secs}s")]
    InvalidDuration {
        duration_secs: i64,
        interval_secs: i64,
    },

    #[error("{start} plus {span_secs}s is outside the representable time range")]
    TimeOverflow { start: Timestamp, span_secs: i64 },

    #[error("Start time {0} is not on the allocation grid")]
    MisalignedStart(Timestamp),

    #[error("Restart at {current} is not before schedule end {end}")]
    RestartAfterEnd { current: Timestamp, end: Timestamp },

    #[error("Vesting duration of {minutes} minutes is below the minimum of {min}")]
    DurationTooShort { minutes: u32, min: u32 },

    #[error("Invalid appraised value: {0}")]
    InvalidAppraisedValue(u64),

    #[error("Invalid property options: {0}")]
    InvalidOptions(String),

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    #[error("Property {0} is already approved")]
    AlreadyApproved(u32),

    #[error("Approval deadline of property {claim_id} passed at {deadline}")]
    ApprovalDeadlinePassed { claim_id: u32, deadline: Timestamp },

    #[error("Approval counter of property {0} must be zero at restart")]
    ApprovalCounterNotZero(u32),

    #[error("Valuation of {symbol} would exceed max share supply: {value}")]
    ValuationOverflow { symbol: String, value: u128 },

    #[error("Valuation of {symbol} would drop below zero: {current} - {amount}")]
    ValuationUnderflow {
        symbol: String,
        current: u64,
        amount: u128,
    },
}

pub type Result<T> = std::result::Result<T, BackingError>;
