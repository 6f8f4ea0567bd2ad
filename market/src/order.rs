//! Limit orders
//!
//! Only creation-time validation lives here; matching is done elsewhere.

use crate::error::{MarketError, Result};
use meta_core::{AccountId, AssetAmount, Object, ObjectId, ObjectType, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrder {
    pub id: ObjectId,
    pub seller: AccountId,
    pub amount_to_sell: AssetAmount,
    pub min_to_receive: AssetAmount,
    pub expiration: Timestamp,
    pub created: Timestamp,
}

impl Object for LimitOrder {
    const OBJECT_TYPE: ObjectType = ObjectType::LimitOrder;
    type Key = ObjectId;

    fn unique_key(&self) -> ObjectId {
        self.id
    }
}

/// Structural checks every order must pass before any pricing rule
pub fn validate_order(
    amount_to_sell: &AssetAmount,
    min_to_receive: &AssetAmount,
    expiration: Timestamp,
    now: Timestamp,
) -> Result<()> {
    if amount_to_sell.symbol == min_to_receive.symbol {
        return Err(MarketError::SameAsset(amount_to_sell.symbol.clone()));
    }
    if amount_to_sell.amount == 0 {
        return Err(MarketError::InvalidAmount(format!(
            "amount to sell must be positive, got {}",
            amount_to_sell
        )));
    }
    if min_to_receive.amount == 0 {
        return Err(MarketError::InvalidAmount(format!(
            "minimum to receive must be positive, got {}",
            min_to_receive
        )));
    }
    if expiration <= now {
        return Err(MarketError::Expired(expiration.to_rfc3339()));
    }
    Ok(())
}
