//! Authorized price publishers
//!
//! The allowlist is a protocol rule that changes at hard-fork boundaries, so
//! it is kept as a list of activation times with the account names that
//! become authorized from that time on.

use chrono::DateTime;
use meta_core::Timestamp;
use serde::{Deserialize, Serialize};

/// Activation of the second publisher set (2024-03-01T00:00:00Z)
pub const HARDFORK_PUBLISHERS_V2_TIME: i64 = 1_709_251_200;

const GENESIS_PUBLISHERS: &[&str] = &["meta1-oracle", "meta1-feeder"];
const V2_PUBLISHERS: &[&str] = &["meta1-oracle", "meta1-feeder", "usdt-feeder"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublisherSet {
    pub activation: Timestamp,
    pub publishers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublisherSchedule {
    sets: Vec<PublisherSet>,
}

impl PublisherSchedule {
    /// Build from arbitrary sets; they are ordered by activation
    pub fn new(mut sets: Vec<PublisherSet>) -> Self {
        sets.sort_by_key(|s| s.activation);
        Self { sets }
    }

    /// The protocol's own schedule
    pub fn protocol() -> Self {
        let owned = |names: &[&str]| -> Vec<String> { names.iter().map(|n| n.to_string()).collect() };
        Self::new(vec![
            PublisherSet {
                activation: DateTime::UNIX_EPOCH,
                publishers: owned(GENESIS_PUBLISHERS),
            },
            PublisherSet {
                activation: DateTime::from_timestamp(HARDFORK_PUBLISHERS_V2_TIME, 0)
                    .unwrap_or(DateTime::UNIX_EPOCH),
                publishers: owned(V2_PUBLISHERS),
            },
        ])
    }

    /// Publishers in force at `now`: the latest set activated at or before it
    pub fn active_at(&self, now: Timestamp) -> &[String] {
        self.sets
            .iter()
            .rev()
            .find(|s| s.activation <= now)
            .map(|s| s.publishers.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_authorized(&self, name: &str, now: Timestamp) -> bool {
        self.active_at(now).iter().any(|p| p == name)
    }
}

impl Default for PublisherSchedule {
    fn default() -> Self {
        Self::protocol()
    }
}
