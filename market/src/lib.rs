//! META1 Market Rules
//!
//! Creation-time validation of limit orders, including the price floor that
//! keeps orders from undervaluing the backed core asset.

pub mod error;
pub mod guard;
pub mod order;

pub use error::{MarketError, Result};
pub use guard::{FloorCheck, FloorInputs, PriceFloorGuard};
pub use order::{validate_order, LimitOrder};
