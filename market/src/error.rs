//! Market error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    #[error("Order sells and receives the same asset {0}")]
    SameAsset(String),

    #[error("Invalid order amount: {0}")]
    InvalidAmount(String),

    #[error("Order expiration {0} is not in the future")]
    Expired(String),

    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("Price feed for {symbol} is {age_secs}s old, maximum is {max_age_secs}s")]
    StaleFeed {
        symbol: String,
        age_secs: i64,
        max_age_secs: i64,
    },

    #[error("Order values {core_symbol} at {implied_usd:.8} USD, below the backing floor of {floor_usd:.8} USD")]
    BelowPriceFloor {
        core_symbol: String,
        implied_usd: f64,
        floor_usd: f64,
    },
}

pub type Result<T> = std::result::Result<T, MarketError>;
