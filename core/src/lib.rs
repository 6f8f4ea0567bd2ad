//! META1 Core Library
//!
//! Chain primitives shared by every other crate: object ids, accounts and
//! assets, protocol constants, the minute-grid interval clock, indexed
//! object tables and sled persistence.

pub mod clock;
pub mod constants;
pub mod db;
pub mod error;
pub mod store;
pub mod types;

// Re-export main types
pub use clock::IntervalClock;
pub use db::ChainDb;
pub use error::{Result, StoreError};
pub use store::{Object, Record, Table};
pub use types::{Account, AccountId, Asset, AssetAmount, ObjectId, ObjectType};

/// Chain instants are UTC with second resolution
pub type Timestamp = chrono::DateTime<chrono::Utc>;
