//! Price feed error types

use meta_core::StoreError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("Account {0} is not an authorized price publisher")]
    UnauthorizedPublisher(String),

    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("Asset {0} is market issued and cannot take an external price")]
    MarketIssuedAsset(String),

    #[error("External prices cannot be published for the core asset {0}")]
    CoreAsset(String),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, OracleError>;
