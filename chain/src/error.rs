//! Chain error types

use meta_backing::BackingError;
use meta_core::{AccountId, StoreError};
use meta_market::MarketError;
use meta_oracle::OracleError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChainError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Backing error: {0}")]
    Backing(#[from] BackingError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Market error: {0}")]
    Market(#[from] MarketError),

    #[error("Signer {signer} does not control account {account}")]
    Unauthorized { signer: AccountId, account: AccountId },

    #[error("Account {0} may not perform this operation")]
    NotPermitted(String),

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("Property {0} not found")]
    PropertyNotFound(u32),

    #[error("Claim id {0} is already registered")]
    DuplicateClaimId(u32),

    #[error("No asset limitation for {0}")]
    LimitationNotFound(String),

    #[error("Asset limitation for {0} already exists")]
    DuplicateLimitation(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Invalid block: {0}")]
    InvalidBlock(String),

    #[error("Invalid genesis: {0}")]
    InvalidGenesis(String),

    #[error("Internal invariant broken: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, ChainError>;
