//! Chain object identifiers and the genesis-level records (accounts, assets)

use crate::constants::{MAX_ASSET_PRECISION, MAX_SHARE_SUPPLY, PROTOCOL_SPACE};
use crate::store::Object;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Object types stored in the protocol space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectType {
    Account,
    Asset,
    LimitOrder,
    Property,
    AssetLimitation,
    AssetPrice,
}

impl ObjectType {
    /// Numeric type id used in the `space.type.instance` notation
    pub fn type_id(&self) -> u8 {
        match self {
            ObjectType::Account => 2,
            ObjectType::Asset => 3,
            ObjectType::LimitOrder => 7,
            ObjectType::Property => 20,
            ObjectType::AssetLimitation => 21,
            ObjectType::AssetPrice => 22,
        }
    }

    pub fn from_type_id(type_id: u8) -> Option<Self> {
        match type_id {
            2 => Some(ObjectType::Account),
            3 => Some(ObjectType::Asset),
            7 => Some(ObjectType::LimitOrder),
            20 => Some(ObjectType::Property),
            21 => Some(ObjectType::AssetLimitation),
            22 => Some(ObjectType::AssetPrice),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectType::Account => "account",
            ObjectType::Asset => "asset",
            ObjectType::LimitOrder => "limit_order",
            ObjectType::Property => "property",
            ObjectType::AssetLimitation => "asset_limitation",
            ObjectType::AssetPrice => "asset_price",
        };
        write!(f, "{}", name)
    }
}

/// Stable object id (`space.type.instance`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId {
    pub object_type: ObjectType,
    pub instance: u64,
}

impl ObjectId {
    pub fn new(object_type: ObjectType, instance: u64) -> Self {
        Self {
            object_type,
            instance,
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            PROTOCOL_SPACE,
            self.object_type.type_id(),
            self.instance
        )
    }
}

impl FromStr for ObjectId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return Err(format!("Expected space.type.instance, got {}", s));
        }

        let space: u8 = parts[0]
            .parse()
            .map_err(|_| format!("Invalid space in {}", s))?;
        if space != PROTOCOL_SPACE {
            return Err(format!("Unknown object space {}", space));
        }

        let type_id: u8 = parts[1]
            .parse()
            .map_err(|_| format!("Invalid type in {}", s))?;
        let object_type =
            ObjectType::from_type_id(type_id).ok_or_else(|| format!("Unknown object type {}", type_id))?;

        let instance: u64 = parts[2]
            .parse()
            .map_err(|_| format!("Invalid instance in {}", s))?;

        Ok(ObjectId::new(object_type, instance))
    }
}

/// Account identifier (`1.2.N`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u64);

impl AccountId {
    pub fn object_id(&self) -> ObjectId {
        ObjectId::new(ObjectType::Account, self.0)
    }
}

impl From<ObjectId> for AccountId {
    fn from(id: ObjectId) -> Self {
        AccountId(id.instance)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.object_id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
}

impl Object for Account {
    const OBJECT_TYPE: ObjectType = ObjectType::Account;
    type Key = String;

    fn unique_key(&self) -> String {
        self.name.clone()
    }
}

/// A tradable asset as registered at genesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub symbol: String,
    pub precision: u8,
    pub max_supply: u64,
    pub issuer: AccountId,
    /// Market-issued (collateral-backed) assets carry their own feeds and
    /// cannot receive external prices
    #[serde(default)]
    pub market_issued: bool,
}

impl Asset {
    /// `10^precision`
    pub fn precision_factor(&self) -> u64 {
        10u64.pow(self.precision as u32)
    }

    /// Maximum supply expressed in whole units
    pub fn whole_unit_supply(&self) -> u64 {
        self.max_supply / self.precision_factor()
    }

    pub fn validate(&self) -> Result<(), String> {
        if !is_valid_symbol(&self.symbol) {
            return Err(format!("Invalid asset symbol: {}", self.symbol));
        }
        if self.precision > MAX_ASSET_PRECISION {
            return Err(format!(
                "Precision {} of {} exceeds {}",
                self.precision, self.symbol, MAX_ASSET_PRECISION
            ));
        }
        if self.max_supply == 0 || self.max_supply > MAX_SHARE_SUPPLY {
            return Err(format!(
                "Max supply of {} must be in 1..={}",
                self.symbol, MAX_SHARE_SUPPLY
            ));
        }
        Ok(())
    }
}

impl Object for Asset {
    const OBJECT_TYPE: ObjectType = ObjectType::Asset;
    type Key = String;

    fn unique_key(&self) -> String {
        self.symbol.clone()
    }
}

/// An amount of a given asset in its smallest units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAmount {
    pub amount: u64,
    pub symbol: String,
}

impl AssetAmount {
    pub fn new(amount: u64, symbol: impl Into<String>) -> Self {
        Self {
            amount,
            symbol: symbol.into(),
        }
    }
}

impl fmt::Display for AssetAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.symbol)
    }
}

/// Asset symbols are 3..=16 characters of `A-Z`, `0-9` and `.`, starting
/// with a letter
pub fn is_valid_symbol(symbol: &str) -> bool {
    let len = symbol.len();
    if !(3..=16).contains(&len) {
        return false;
    }
    let mut chars = symbol.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() => {}
        _ => return false,
    }
    !symbol.ends_with('.')
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_roundtrip() {
        let id = ObjectId::new(ObjectType::Property, 42);
        assert_eq!(id.to_string(), "1.20.42");
        assert_eq!("1.20.42".parse::<ObjectId>().unwrap(), id);
        assert!("2.20.42".parse::<ObjectId>().is_err());
        assert!("1.99.1".parse::<ObjectId>().is_err());
        assert!("1.20".parse::<ObjectId>().is_err());
    }

    #[test]
    fn test_account_id_display() {
        assert_eq!(AccountId(17).to_string(), "1.2.17");
    }

    #[test]
    fn test_symbol_validation() {
        assert!(is_valid_symbol("META1"));
        assert!(is_valid_symbol("USDT"));
        assert!(is_valid_symbol("BIT.USD"));
        assert!(!is_valid_symbol("ab"));
        assert!(!is_valid_symbol("meta1"));
        assert!(!is_valid_symbol("1META"));
        assert!(!is_valid_symbol("META."));
    }

    #[test]
    fn test_whole_unit_supply() {
        let asset = Asset {
            symbol: "META1".to_string(),
            precision: 5,
            max_supply: 45_000_000_000_000,
            issuer: AccountId(1),
            market_issued: false,
        };
        assert!(asset.validate().is_ok());
        assert_eq!(asset.precision_factor(), 100_000);
        assert_eq!(asset.whole_unit_supply(), 450_000_000);
    }
}
