//! Chain state: every object table plus the head block pointer

use crate::error::{ChainError, Result};
use crate::genesis::{ChainParameters, Genesis};
use meta_backing::{AssetLimitation, Property};
use meta_core::{Account, AccountId, Asset, Record, Table, Timestamp};
use meta_market::LimitOrder;
use meta_oracle::PriceFeeds;
use serde::{Deserialize, Serialize};

/// Id of the block preceding block 1
pub const GENESIS_BLOCK_ID: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainState {
    pub params: ChainParameters,
    pub accounts: Table<Account>,
    pub assets: Table<Asset>,
    pub properties: Table<Property>,
    pub limitations: Table<AssetLimitation>,
    pub feeds: PriceFeeds,
    pub orders: Table<LimitOrder>,
    pub head_block_num: u64,
    pub head_block_time: Timestamp,
    pub head_block_id: String,
}

impl ChainState {
    pub fn from_genesis(genesis: &Genesis) -> Result<Self> {
        genesis.validate()?;

        let mut accounts = Table::new();
        for name in &genesis.accounts {
            accounts.create(|id| Account {
                id: AccountId::from(id),
                name: name.clone(),
            })?;
        }

        let mut assets = Table::new();
        for spec in &genesis.assets {
            let issuer = accounts
                .find(spec.issuer.as_str())
                .map(|r| r.data.id)
                .ok_or_else(|| ChainError::UnknownAccount(spec.issuer.clone()))?;
            let asset = Asset {
                symbol: spec.symbol.clone(),
                precision: spec.precision,
                max_supply: spec.max_supply,
                issuer,
                market_issued: spec.market_issued,
            };
            asset.validate().map_err(ChainError::InvalidGenesis)?;
            assets.create(|_| asset)?;
        }

        log::info!(
            "Initialized chain state at {} with {} accounts and {} assets",
            genesis.initial_timestamp,
            accounts.len(),
            assets.len()
        );

        Ok(Self {
            params: genesis.parameters.clone(),
            accounts,
            assets,
            properties: Table::new(),
            limitations: Table::new(),
            feeds: PriceFeeds::new(),
            orders: Table::new(),
            head_block_num: 0,
            head_block_time: genesis.initial_timestamp,
            head_block_id: GENESIS_BLOCK_ID.to_string(),
        })
    }

    pub fn account(&self, id: AccountId) -> Result<&Account> {
        self.accounts
            .get(id.object_id())
            .map(|r| &r.data)
            .ok_or_else(|| ChainError::UnknownAccount(id.to_string()))
    }

    pub fn asset(&self, symbol: &str) -> Option<&Asset> {
        self.assets.find(symbol).map(|r| &r.data)
    }

    pub fn property(&self, claim_id: u32) -> Result<&Record<Property>> {
        self.properties
            .find(&claim_id)
            .ok_or(ChainError::PropertyNotFound(claim_id))
    }

    pub fn limitation(&self, symbol: &str) -> Option<&Record<AssetLimitation>> {
        self.limitations.find(symbol)
    }

    /// Properties backing `symbol`
    pub fn properties_of<'a>(&'a self, symbol: &'a str) -> impl Iterator<Item = &'a Property> + 'a {
        self.properties
            .iter()
            .map(|r| &r.data)
            .filter(move |p| p.backing_asset() == symbol)
    }
}
