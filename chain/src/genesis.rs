//! Genesis file and chain parameters
//!
//! Accounts and assets are not created by operations in this node, so the
//! genesis file is where they come from.

use crate::error::{ChainError, Result};
use chrono::Duration;
use meta_core::constants::{CORE_ASSET_SYMBOL, DEFAULT_MAX_FEED_AGE_SECS};
use meta_core::Timestamp;
use meta_market::PriceFloorGuard;
use meta_oracle::PublisherSchedule;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

fn default_core_symbol() -> String {
    CORE_ASSET_SYMBOL.to_string()
}

fn default_max_feed_age() -> i64 {
    DEFAULT_MAX_FEED_AGE_SECS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParameters {
    /// Symbol of the backed core asset
    #[serde(default = "default_core_symbol")]
    pub core_symbol: String,
    /// Account allowed to create asset limitations
    pub limitation_admin: String,
    /// Oldest external price the order guard accepts
    #[serde(default = "default_max_feed_age")]
    pub max_feed_age_secs: i64,
    #[serde(default)]
    pub publishers: PublisherSchedule,
}

impl ChainParameters {
    pub fn max_feed_age(&self) -> Duration {
        Duration::seconds(self.max_feed_age_secs)
    }

    pub fn guard(&self) -> PriceFloorGuard {
        PriceFloorGuard::new(self.max_feed_age())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAsset {
    pub symbol: String,
    pub precision: u8,
    pub max_supply: u64,
    /// Issuer account name
    pub issuer: String,
    #[serde(default)]
    pub market_issued: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genesis {
    pub initial_timestamp: Timestamp,
    /// Account names, assigned ids `1.2.0`, `1.2.1`... in order
    pub accounts: Vec<String>,
    pub assets: Vec<GenesisAsset>,
    pub parameters: ChainParameters,
}

impl Genesis {
    pub fn from_json(json: &str) -> Result<Self> {
        let genesis: Genesis =
            serde_json::from_str(json).map_err(|e| ChainError::InvalidGenesis(e.to_string()))?;
        genesis.validate()?;
        Ok(genesis)
    }

    pub fn validate(&self) -> Result<()> {
        let names: BTreeSet<&str> = self.accounts.iter().map(String::as_str).collect();
        if names.len() != self.accounts.len() {
            return Err(ChainError::InvalidGenesis(
                "duplicate account name".to_string(),
            ));
        }
        if !names.contains(self.parameters.limitation_admin.as_str()) {
            return Err(ChainError::InvalidGenesis(format!(
                "limitation admin {} is not a genesis account",
                self.parameters.limitation_admin
            )));
        }
        if self.parameters.max_feed_age_secs <= 0 {
            return Err(ChainError::InvalidGenesis(
                "max feed age must be positive".to_string(),
            ));
        }

        for asset in &self.assets {
            if !names.contains(asset.issuer.as_str()) {
                return Err(ChainError::InvalidGenesis(format!(
                    "issuer {} of {} is not a genesis account",
                    asset.issuer, asset.symbol
                )));
            }
        }

        let core = self
            .assets
            .iter()
            .find(|a| a.symbol == self.parameters.core_symbol)
            .ok_or_else(|| {
                ChainError::InvalidGenesis(format!(
                    "core asset {} is missing",
                    self.parameters.core_symbol
                ))
            })?;
        if core.market_issued {
            return Err(ChainError::InvalidGenesis(
                "core asset cannot be market issued".to_string(),
            ));
        }
        // the price floor divides by the supply in whole units
        let one_unit = 10u64.checked_pow(core.precision as u32);
        if one_unit.map_or(true, |unit| core.max_supply < unit) {
            return Err(ChainError::InvalidGenesis(format!(
                "core asset {} has less than one whole unit of supply",
                core.symbol
            )));
        }
        Ok(())
    }
}
