//! Asset limitation records
//!
//! One record per backed symbol, holding the aggregated valuation of all the
//! properties backing it plus two issuer-controlled limit strings shown to
//! users. The limit strings are not used by the price floor.

use crate::error::{BackingError, Result};
use meta_core::constants::MAX_SHARE_SUPPLY;
use meta_core::{AccountId, Object, ObjectId, ObjectType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetLimitation {
    pub id: ObjectId,
    pub symbol: String,
    pub issuer: AccountId,
    pub cumulative_valuation: u64,
    pub sell_limit: String,
    pub buy_limit: String,
}

impl Object for AssetLimitation {
    const OBJECT_TYPE: ObjectType = ObjectType::AssetLimitation;
    type Key = String;

    fn unique_key(&self) -> String {
        self.symbol.clone()
    }
}

impl AssetLimitation {
    pub fn new(
        id: ObjectId,
        symbol: String,
        issuer: AccountId,
        sell_limit: String,
        buy_limit: String,
    ) -> Result<Self> {
        validate_limits(&sell_limit, &buy_limit)?;
        Ok(Self {
            id,
            symbol,
            issuer,
            cumulative_valuation: 0,
            sell_limit,
            buy_limit,
        })
    }

    pub fn set_limits(&mut self, sell_limit: &str, buy_limit: &str) -> Result<()> {
        validate_limits(sell_limit, buy_limit)?;
        self.sell_limit = sell_limit.to_string();
        self.buy_limit = buy_limit.to_string();
        Ok(())
    }

    /// Overwrite the valuation with a freshly aggregated sum
    pub fn set_valuation(&mut self, value: u128) -> Result<()> {
        if value > MAX_SHARE_SUPPLY as u128 {
            return Err(BackingError::ValuationOverflow {
                symbol: self.symbol.clone(),
                value,
            });
        }
        self.cumulative_valuation = value as u64;
        Ok(())
    }

    /// Roll back one property's contribution
    pub fn subtract_contribution(&mut self, amount: u128) -> Result<()> {
        let current = self.cumulative_valuation as u128;
        if amount > current {
            return Err(BackingError::ValuationUnderflow {
                symbol: self.symbol.clone(),
                current: self.cumulative_valuation,
                amount,
            });
        }
        self.cumulative_valuation = (current - amount) as u64;
        Ok(())
    }
}

/// A limit is a non-negative decimal: `digits` or `digits.digits`
fn parse_limit(name: &str, value: &str) -> Result<bool> {
    let (whole, frac) = match value.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (value, ""),
    };
    let well_formed = !whole.is_empty()
        && whole.chars().all(|c| c.is_ascii_digit())
        && (!value.contains('.') || !frac.is_empty())
        && frac.chars().all(|c| c.is_ascii_digit());
    if !well_formed {
        return Err(BackingError::InvalidLimit(format!(
            "{} must be a non-negative decimal, got {:?}",
            name, value
        )));
    }

    let is_positive = whole.chars().chain(frac.chars()).any(|c| c != '0');
    Ok(is_positive)
}

/// Sell limit must be `>= 0`, buy limit `> 0`
pub fn validate_limits(sell_limit: &str, buy_limit: &str) -> Result<()> {
    parse_limit("sell limit", sell_limit)?;
    if !parse_limit("buy limit", buy_limit)? {
        return Err(BackingError::InvalidLimit(format!(
            "buy limit must be greater than zero, got {:?}",
            buy_limit
        )));
    }
    Ok(())
}
