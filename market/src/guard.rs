//! Order price-floor guard
//!
//! An order trading the core asset against another asset `O` implies a USD
//! price for the core asset through `O`'s external price. That implied price
//! may not be lower than the valuation per whole core unit backed by the
//! asset limitation:
//!
//! ```text
//! o·num·N·10^max(0, pc−po)  >=  m·den·C·10^max(0, po−pc)
//! ```
//!
//! `o`/`m` are the order's amounts of `O` and the core asset in satoshis,
//! `num/den` the USD price of one whole `O`, `N` the core max supply in whole
//! units, `C` the cumulative valuation, `pc`/`po` the precisions. Both sides
//! are evaluated in arbitrary precision so no intermediate rounds.
//!
//! A feed that was never published means no floor applies. A feed that
//! exists but is older than the maximum age rejects the order.

use crate::error::{MarketError, Result};
use chrono::Duration;
use meta_backing::AssetLimitation;
use meta_core::{Asset, AssetAmount, Table, Timestamp};
use meta_oracle::{FeedStatus, PriceFeeds, UsdPrice};
use num_bigint::BigUint;

/// Operands of the floor inequality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloorInputs {
    /// Amount of the other asset `o`
    pub other_amount: u64,
    /// Amount of the core asset `m`
    pub core_amount: u64,
    /// Core max supply in whole units `N`
    pub core_supply: u64,
    /// Cumulative valuation `C`
    pub cumulative: u64,
    pub price: UsdPrice,
    pub core_precision: u8,
    pub other_precision: u8,
}

impl FloorInputs {
    fn scales(&self) -> (u32, u32) {
        let pc = self.core_precision as u32;
        let po = self.other_precision as u32;
        (pc.saturating_sub(po), po.saturating_sub(pc))
    }

    /// `o·num·N·10^max(0,pc−po)`
    pub fn offered(&self) -> BigUint {
        let (lhs_scale, _) = self.scales();
        BigUint::from(self.other_amount)
            * self.price.numerator
            * self.core_supply
            * BigUint::from(10u32).pow(lhs_scale)
    }

    /// `m·den·C·10^max(0,po−pc)`
    pub fn required(&self) -> BigUint {
        let (_, rhs_scale) = self.scales();
        BigUint::from(self.core_amount)
            * self.price.denominator
            * self.cumulative
            * BigUint::from(10u32).pow(rhs_scale)
    }

    pub fn is_satisfied(&self) -> bool {
        self.offered() >= self.required()
    }

    /// USD per whole core unit implied by the order (display only)
    pub fn implied_usd(&self) -> f64 {
        let o = self.other_amount as f64 / 10f64.powi(self.other_precision as i32);
        let m = self.core_amount as f64 / 10f64.powi(self.core_precision as i32);
        o * self.price.as_f64() / m
    }

    /// USD per whole core unit backed by the valuation (display only)
    pub fn floor_usd(&self) -> f64 {
        if self.core_supply == 0 {
            return 0.0;
        }
        self.cumulative as f64 / self.core_supply as f64
    }
}

/// Outcome of a guard check that did not reject the order
#[derive(Debug, Clone, PartialEq)]
pub enum FloorCheck {
    /// The order does not trade the core asset
    Exempt,
    /// `O` has never had an external price published
    NoFeed,
    /// The core asset has no asset limitation yet
    NoLimitation,
    /// The order meets the floor
    Passed(FloorInputs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceFloorGuard {
    max_feed_age: Duration,
}

impl PriceFloorGuard {
    pub fn new(max_feed_age: Duration) -> Self {
        Self { max_feed_age }
    }

    pub fn max_feed_age(&self) -> Duration {
        self.max_feed_age
    }

    /// Check an order selling `sell` for at least `receive`
    #[allow(clippy::too_many_arguments)]
    pub fn check(
        &self,
        sell: &AssetAmount,
        receive: &AssetAmount,
        core_symbol: &str,
        assets: &Table<Asset>,
        limitation: Option<&AssetLimitation>,
        feeds: &PriceFeeds,
        now: Timestamp,
    ) -> Result<FloorCheck> {
        if sell.symbol == receive.symbol {
            return Err(MarketError::SameAsset(sell.symbol.clone()));
        }

        let (core_amount, other) = if sell.symbol == core_symbol {
            (sell.amount, receive)
        } else if receive.symbol == core_symbol {
            (receive.amount, sell)
        } else {
            return Ok(FloorCheck::Exempt);
        };

        let price = match feeds.status(&other.symbol, now, self.max_feed_age) {
            FeedStatus::Absent => return Ok(FloorCheck::NoFeed),
            FeedStatus::Stale { age, max_age } => {
                return Err(MarketError::StaleFeed {
                    symbol: other.symbol.clone(),
                    age_secs: age.num_seconds(),
                    max_age_secs: max_age.num_seconds(),
                })
            }
            FeedStatus::Fresh(price) => price.usd_price,
        };

        let Some(limitation) = limitation else {
            return Ok(FloorCheck::NoLimitation);
        };

        let core_asset = assets
            .find(core_symbol)
            .ok_or_else(|| MarketError::UnknownAsset(core_symbol.to_string()))?;
        let other_asset = assets
            .find(other.symbol.as_str())
            .ok_or_else(|| MarketError::UnknownAsset(other.symbol.clone()))?;

        let inputs = FloorInputs {
            other_amount: other.amount,
            core_amount,
            core_supply: core_asset.whole_unit_supply(),
            cumulative: limitation.cumulative_valuation,
            price,
            core_precision: core_asset.precision,
            other_precision: other_asset.precision,
        };

        if !inputs.is_satisfied() {
            log::debug!(
                "Rejecting order {} for {}: implied {} USD below floor {} USD",
                sell,
                receive,
                inputs.implied_usd(),
                inputs.floor_usd()
            );
            return Err(MarketError::BelowPriceFloor {
                core_symbol: core_symbol.to_string(),
                implied_usd: inputs.implied_usd(),
                floor_usd: inputs.floor_usd(),
            });
        }

        Ok(FloorCheck::Passed(inputs))
    }
}
