//! Read-only queries

use crate::state::ChainState;
use meta_backing::{AssetLimitation, Progress, Property, Stage};
use meta_core::{AccountId, Timestamp};
use meta_market::LimitOrder;
use meta_oracle::ExternalPrice;
use serde::Serialize;

/// A property plus values derived from it at the current head time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyView {
    pub property: Property,
    pub stage: Stage,
    pub progress: Progress,
    /// `progress` as a fraction in `[0, 1]`, for display
    pub allocation_progress: f64,
    /// Value currently counted toward the backing symbol
    pub contribution: u128,
}

impl PropertyView {
    fn new(property: &Property, head_time: Timestamp) -> Self {
        let progress = property.progress();
        Self {
            property: property.clone(),
            stage: property.stage(head_time),
            progress,
            allocation_progress: progress.as_f64(),
            contribution: property.contribution(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChainApi<'a> {
    state: &'a ChainState,
}

impl<'a> ChainApi<'a> {
    pub fn new(state: &'a ChainState) -> Self {
        Self { state }
    }

    pub fn head_block_num(&self) -> u64 {
        self.state.head_block_num
    }

    pub fn head_block_time(&self) -> Timestamp {
        self.state.head_block_time
    }

    pub fn get_property(&self, claim_id: u32) -> Option<PropertyView> {
        self.state
            .properties
            .find(&claim_id)
            .map(|r| PropertyView::new(&r.data, self.state.head_block_time))
    }

    /// Properties backing `symbol`, in id order
    pub fn list_properties_by_symbol(&self, symbol: &str) -> Vec<PropertyView> {
        self.state
            .properties_of(symbol)
            .map(|p| PropertyView::new(p, self.state.head_block_time))
            .collect()
    }

    pub fn get_asset_limitation(&self, symbol: &str) -> Option<&'a AssetLimitation> {
        self.state.limitation(symbol).map(|r| &r.data)
    }

    pub fn get_external_price(&self, symbol: &str) -> Option<&'a ExternalPrice> {
        self.state.feeds.get(symbol)
    }

    pub fn get_limit_orders(&self, account: AccountId) -> Vec<&'a LimitOrder> {
        self.state
            .orders
            .iter()
            .map(|r| &r.data)
            .filter(|o| o.seller == account)
            .collect()
    }
}
