//! Out-of-band reconciliation
//!
//! The per-block tick is the authority over property counters and stored
//! valuations. This job recomputes both independently, counters in closed
//! form from each schedule and the head time, valuations from a fresh fold,
//! and reports where the stored state disagrees. It never writes.
//!
//! Closed-form counters assume the head block has reached every allocation
//! point before it; a chain that skipped the exact 25% point can show an
//! expected drift here.

use crate::error::Result;
use crate::state::ChainState;
use meta_backing::{valuation_of, Property, TerminalState};
use meta_core::{IntervalClock, Timestamp};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    CounterDrift {
        claim_id: u32,
        /// `(initial_counter, approval_counter)`
        expected: (u32, u32),
        stored: (u32, u32),
    },
    ValuationDrift {
        symbol: String,
        expected: u128,
        stored: u64,
    },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::CounterDrift {
                claim_id,
                expected,
                stored,
            } => write!(
                f,
                "property {}: counters {:?}, expected {:?}",
                claim_id, stored, expected
            ),
            Finding::ValuationDrift {
                symbol,
                expected,
                stored,
            } => write!(
                f,
                "{}: stored valuation {}, fold gives {}",
                symbol, stored, expected
            ),
        }
    }
}

fn capped(clock: &IntervalClock, from: Timestamp, to: Timestamp, max: u32) -> u32 {
    clock.intervals_between(from, to).min(max as u64) as u32
}

/// `(initial_counter, approval_counter)` the schedule implies at `head`
pub fn expected_counters(property: &Property, head: Timestamp, clock: &IntervalClock) -> (u32, u32) {
    let icm = property.initial_counter_max;
    let acm = property.approval_counter_max;

    match property.terminal {
        Some(TerminalState::ExpiredUnapproved) => return (0, 0),
        Some(TerminalState::MaturedApproved) => return (icm, acm),
        None => {}
    }

    match property.approval_time {
        None => {
            let until = head.min(property.initial_end_date);
            (capped(clock, property.created, until, icm), 0)
        }
        Some(restart) if property.restarted => {
            (icm, capped(clock, restart, head, acm))
        }
        Some(_) => {
            let total = clock.intervals_between(property.created, head);
            let ic = total.min(icm as u64);
            let ac = (total - ic).min(acm as u64);
            (ic as u32, ac as u32)
        }
    }
}

/// Compare stored counters and valuations against their recomputation
pub fn reconcile(state: &ChainState) -> Result<Vec<Finding>> {
    let clock = IntervalClock::chain();
    let head = state.head_block_time;
    let mut findings = Vec::new();

    for record in state.properties.iter() {
        let property = &record.data;
        let expected = expected_counters(property, head, &clock);
        let stored = (property.initial_counter, property.approval_counter);
        if expected != stored {
            findings.push(Finding::CounterDrift {
                claim_id: property.claim_id,
                expected,
                stored,
            });
        }
    }

    let symbols: BTreeSet<&str> = state
        .properties
        .iter()
        .map(|r| r.data.backing_asset())
        .collect();
    for symbol in symbols {
        let expected = valuation_of(state.properties_of(symbol), symbol)?;
        let stored = state
            .limitation(symbol)
            .map(|r| r.cumulative_valuation)
            .unwrap_or(0);
        if expected != stored as u128 {
            findings.push(Finding::ValuationDrift {
                symbol: symbol.to_string(),
                expected,
                stored,
            });
        }
    }

    for finding in &findings {
        log::warn!("Reconciliation at block {}: {}", state.head_block_num, finding);
    }
    Ok(findings)
}

/// Runs [`reconcile`] against a shared snapshot of the head state
pub struct ReconcileJob {
    snapshot: Arc<RwLock<ChainState>>,
    period: Duration,
}

impl ReconcileJob {
    pub fn new(snapshot: Arc<RwLock<ChainState>>, period: Duration) -> Self {
        Self { snapshot, period }
    }

    pub async fn run_once(&self) -> Result<Vec<Finding>> {
        let state = self.snapshot.read().await;
        let findings = reconcile(&state)?;
        if findings.is_empty() {
            log::debug!(
                "Reconciliation at block {} found no divergence",
                state.head_block_num
            );
        }
        Ok(findings)
    }

    /// Reconcile every `period` until the task is dropped
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.period);
        loop {
            interval.tick().await;
            if let Err(e) = self.run_once().await {
                log::error!("Reconciliation failed: {}", e);
            }
        }
    }
}
