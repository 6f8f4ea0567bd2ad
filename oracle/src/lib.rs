//! META1 External Price Feeds
//!
//! USD reference prices published by allowlisted accounts for assets that
//! are neither market issued nor the core asset. The order price floor reads
//! them; absent and stale feeds are reported distinctly.

pub mod error;
pub mod feed;
pub mod publishers;

pub use error::{OracleError, Result};
pub use feed::{ExternalPrice, FeedStatus, PriceFeeds, UsdPrice};
pub use publishers::{PublisherSchedule, PublisherSet, HARDFORK_PUBLISHERS_V2_TIME};
