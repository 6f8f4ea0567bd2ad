//! External price feed store
//!
//! One USD reference price per symbol. Publishing overwrites the previous
//! price; records are never removed. Staleness is judged by the reader.

use crate::error::{OracleError, Result};
use chrono::Duration;
use meta_core::{Asset, Object, ObjectId, ObjectType, Table, Timestamp};
use serde::{Deserialize, Serialize};

/// USD per whole unit of an asset, as `numerator / denominator`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsdPrice {
    pub numerator: u64,
    pub denominator: u64,
}

impl UsdPrice {
    pub fn new(numerator: u64, denominator: u64) -> Result<Self> {
        let price = Self {
            numerator,
            denominator,
        };
        price.validate()?;
        Ok(price)
    }

    pub fn validate(&self) -> Result<()> {
        if self.denominator == 0 {
            return Err(OracleError::InvalidPrice(
                "denominator must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn as_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalPrice {
    pub id: ObjectId,
    pub symbol: String,
    pub usd_price: UsdPrice,
    pub published: Timestamp,
}

impl Object for ExternalPrice {
    const OBJECT_TYPE: ObjectType = ObjectType::AssetPrice;
    type Key = String;

    fn unique_key(&self) -> String {
        self.symbol.clone()
    }
}

impl ExternalPrice {
    pub fn age(&self, now: Timestamp) -> Duration {
        now - self.published
    }
}

/// Freshness of a symbol's feed at a given time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus<'a> {
    /// Never published
    Absent,
    /// Published, but older than the allowed age
    Stale { age: Duration, max_age: Duration },
    Fresh(&'a ExternalPrice),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceFeeds {
    prices: Table<ExternalPrice>,
}

impl PriceFeeds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a publication against the asset it prices
    pub fn check_publishable(
        asset: Option<&Asset>,
        symbol: &str,
        core_symbol: &str,
        price: &UsdPrice,
    ) -> Result<()> {
        price.validate()?;
        let asset = asset.ok_or_else(|| OracleError::UnknownAsset(symbol.to_string()))?;
        if asset.symbol == core_symbol {
            return Err(OracleError::CoreAsset(asset.symbol.clone()));
        }
        if asset.market_issued {
            return Err(OracleError::MarketIssuedAsset(asset.symbol.clone()));
        }
        Ok(())
    }

    /// Insert or overwrite the price of `symbol`
    pub fn publish(&mut self, symbol: &str, price: UsdPrice, now: Timestamp) -> Result<ObjectId> {
        price.validate()?;
        let id = match self.prices.find(symbol).map(|r| r.id) {
            Some(id) => {
                self.prices.modify(id, |p| {
                    p.usd_price = price;
                    p.published = now;
                })?;
                id
            }
            None => {
                self.prices
                    .create(|id| ExternalPrice {
                        id,
                        symbol: symbol.to_string(),
                        usd_price: price,
                        published: now,
                    })?
                    .id
            }
        };

        log::info!(
            "Published {} price {}/{} USD at {}",
            symbol,
            price.numerator,
            price.denominator,
            now
        );
        Ok(id)
    }

    pub fn get(&self, symbol: &str) -> Option<&ExternalPrice> {
        self.prices.find(symbol).map(|r| &r.data)
    }

    pub fn status(&self, symbol: &str, now: Timestamp, max_age: Duration) -> FeedStatus<'_> {
        match self.get(symbol) {
            None => FeedStatus::Absent,
            Some(price) if price.age(now) > max_age => FeedStatus::Stale {
                age: price.age(now),
                max_age,
            },
            Some(price) => FeedStatus::Fresh(price),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExternalPrice> {
        self.prices.iter().map(|r| &r.data)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use meta_core::AccountId;

    fn at(secs: i64) -> Timestamp {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn asset(symbol: &str, market_issued: bool) -> Asset {
        Asset {
            symbol: symbol.to_string(),
            precision: 4,
            max_supply: 1_000_000_000,
            issuer: AccountId(1),
            market_issued,
        }
    }

    #[test]
    fn test_price_validation() {
        assert!(UsdPrice::new(1, 0).is_err());
        assert!(UsdPrice::new(0, 1).is_ok());
        assert_eq!(UsdPrice::new(3, 2).unwrap().as_f64(), 1.5);
    }

    #[test]
    fn test_check_publishable() {
        let price = UsdPrice::new(1, 1).unwrap();
        let usdt = asset("USDT", false);
        let bitusd = asset("BITUSD", true);
        let meta = asset("META1", false);

        assert!(PriceFeeds::check_publishable(Some(&usdt), "USDT", "META1", &price).is_ok());
        assert!(matches!(
            PriceFeeds::check_publishable(None, "NOPE", "META1", &price),
            Err(OracleError::UnknownAsset(_))
        ));
        assert!(matches!(
            PriceFeeds::check_publishable(Some(&bitusd), "BITUSD", "META1", &price),
            Err(OracleError::MarketIssuedAsset(_))
        ));
        assert!(matches!(
            PriceFeeds::check_publishable(Some(&meta), "META1", "META1", &price),
            Err(OracleError::CoreAsset(_))
        ));
    }

    #[test]
    fn test_publish_upserts() {
        let mut feeds = PriceFeeds::new();
        let first = feeds
            .publish("USDT", UsdPrice::new(1, 1).unwrap(), at(1_000))
            .unwrap();
        let second = feeds
            .publish("USDT", UsdPrice::new(99, 100).unwrap(), at(2_000))
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(feeds.len(), 1);
        let price = feeds.get("USDT").unwrap();
        assert_eq!(price.usd_price, UsdPrice::new(99, 100).unwrap());
        assert_eq!(price.published, at(2_000));
    }

    #[test]
    fn test_status_absent_stale_fresh() {
        let mut feeds = PriceFeeds::new();
        let max_age = Duration::seconds(600);
        assert_eq!(feeds.status("USDT", at(0), max_age), FeedStatus::Absent);

        feeds
            .publish("USDT", UsdPrice::new(1, 1).unwrap(), at(1_000))
            .unwrap();
        assert!(matches!(
            feeds.status("USDT", at(1_600), max_age),
            FeedStatus::Fresh(_)
        ));
        assert!(matches!(
            feeds.status("USDT", at(1_601), max_age),
            FeedStatus::Stale { .. }
        ));
    }
}
