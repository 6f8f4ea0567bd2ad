//! META1 Asset Backing
//!
//! Tracks appraised real-world claims (properties) as they vest into the
//! backing of a tradable symbol, and aggregates them into each symbol's
//! cumulative valuation:
//! - schedule: initial/approval phase arithmetic on the minute grid
//! - property: per-claim state machine ticked once per block
//! - aggregate: pure fold from properties to per-symbol valuations
//! - limitation: the per-symbol record that stores the valuation

pub mod aggregate;
pub mod error;
pub mod limitation;
pub mod property;
pub mod schedule;

pub use aggregate::{committed_valuation, cumulative_valuations, valuation_of};
pub use error::{BackingError, Result};
pub use limitation::{validate_limits, AssetLimitation};
pub use property::{
    Progress, Property, PropertyOptions, PropertyUpdate, Stage, TerminalState, TickOutcome,
};
pub use schedule::{InitialParameters, RestartParameters, ScheduleCalculator};
