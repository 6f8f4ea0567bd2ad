//! Chain-wide protocol constants

/// Symbol of the chain's core asset, which is also the backed asset
pub const CORE_ASSET_SYMBOL: &str = "META1";

/// Allocation interval (one minute)
pub const ALLOCATION_INTERVAL_SECS: i64 = 60;

/// Shortest vesting duration a property may be registered with
pub const MIN_PROPERTY_DURATION_MINUTES: u32 = 4;

/// Maximum supply any single asset (or valuation) may reach: 10^15
pub const MAX_SHARE_SUPPLY: u64 = 1_000_000_000_000_000;

/// Factor applied to an appraised value when it is counted as backing
pub const VALUATION_MULTIPLIER: u64 = 10;

/// Highest decimal precision an asset may declare
pub const MAX_ASSET_PRECISION: u8 = 12;

/// Default maximum age of an external price before orders priced against it
/// are refused (24 hours)
pub const DEFAULT_MAX_FEED_AGE_SECS: i64 = 86_400;

/// Object space holding all protocol objects
pub const PROTOCOL_SPACE: u8 = 1;
