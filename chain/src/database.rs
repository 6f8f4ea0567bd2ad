//! Block application pipeline
//!
//! Blocks are applied strictly in order. Within a block: advance head
//! time, apply transactions in order, tick every property, then overwrite
//! the valuation of every symbol that has properties. A block either
//! applies completely or leaves the state untouched.
//!
//! Candidate transactions are applied to a separate pending state on top
//! of the head block, so reads see them before they are included.

use crate::api::ChainApi;
use crate::block::Block;
use crate::error::{ChainError, Result};
use crate::genesis::Genesis;
use crate::state::ChainState;
use crate::transaction::Transaction;
use meta_backing::{cumulative_valuations, ScheduleCalculator, TickOutcome};
use meta_core::{ChainDb, ObjectId, Timestamp};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// What applying a block changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockReport {
    pub block_num: u64,
    pub block_id: String,
    pub transactions: usize,
    /// Claims that matured in this block
    pub matured: Vec<u32>,
    /// Claims that expired unapproved in this block
    pub expired: Vec<u32>,
    /// Valuations written by the aggregation pass
    pub valuations: BTreeMap<String, u64>,
}

pub struct Database {
    head: ChainState,
    pending: ChainState,
    pending_txs: Vec<Transaction>,
    storage: Option<ChainDb>,
}

impl Database {
    /// In-memory chain starting at genesis
    pub fn new(genesis: &Genesis) -> Result<Self> {
        let head = ChainState::from_genesis(genesis)?;
        Ok(Self {
            pending: head.clone(),
            head,
            pending_txs: Vec::new(),
            storage: None,
        })
    }

    /// Chain persisted in a sled database at `path`. Resumes from the stored
    /// snapshot if there is one.
    pub fn open<P: AsRef<Path>>(genesis: &Genesis, path: P) -> Result<Self> {
        let storage = ChainDb::open(path)?;
        let head = match storage.load_snapshot::<ChainState>()? {
            Some(state) => {
                log::info!(
                    "Resuming from snapshot at block {} ({})",
                    state.head_block_num,
                    state.head_block_time
                );
                state
            }
            None => {
                let state = ChainState::from_genesis(genesis)?;
                storage.save_snapshot(&state)?;
                state
            }
        };

        Ok(Self {
            pending: head.clone(),
            head,
            pending_txs: Vec::new(),
            storage: Some(storage),
        })
    }

    /// Override the max feed age of a resumed or fresh chain. Applies to
    /// the head and pending states and is saved with the next snapshot.
    pub fn set_max_feed_age(&mut self, secs: i64) -> Result<()> {
        if secs <= 0 {
            return Err(ChainError::InvalidOperation(format!(
                "max feed age must be positive, got {}",
                secs
            )));
        }
        if self.head.params.max_feed_age_secs != secs {
            log::info!(
                "Max feed age set to {}s (was {}s)",
                secs,
                self.head.params.max_feed_age_secs
            );
        }
        self.head.params.max_feed_age_secs = secs;
        self.pending.params.max_feed_age_secs = secs;
        Ok(())
    }

    /// State as of the last applied block
    pub fn head_state(&self) -> &ChainState {
        &self.head
    }

    /// Head state plus pending transactions
    pub fn pending_state(&self) -> &ChainState {
        &self.pending
    }

    /// Read API over the pending state
    pub fn api(&self) -> ChainApi<'_> {
        ChainApi::new(&self.pending)
    }

    pub fn head_block_num(&self) -> u64 {
        self.head.head_block_num
    }

    pub fn head_block_time(&self) -> Timestamp {
        self.head.head_block_time
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.pending_txs
    }

    /// The block that would follow the head with the given contents
    pub fn next_block(&self, timestamp: Timestamp, transactions: Vec<Transaction>) -> Block {
        Block::new(
            self.head.head_block_num + 1,
            timestamp,
            self.head.head_block_id.clone(),
            transactions,
        )
    }

    /// Validate and apply a candidate transaction to the pending state
    pub fn push_transaction(&mut self, tx: Transaction) -> Result<Vec<Option<ObjectId>>> {
        let mut scratch = self.pending.clone();
        let results = tx.apply(&mut scratch)?;
        self.pending = scratch;
        log::debug!("Accepted pending transaction {}", tx.id());
        self.pending_txs.push(tx);
        Ok(results)
    }

    pub fn apply_block(&mut self, block: &Block) -> Result<BlockReport> {
        let mut next = self.head.clone();
        let report = apply_block_to(&mut next, block)?;

        if let Some(storage) = &self.storage {
            storage.save_block(block.block_num, block)?;
            storage.save_snapshot(&next)?;
        }
        self.head = next;
        self.rebuild_pending(block);

        log::info!(
            "Applied block {} at {} with {} transactions",
            report.block_num,
            block.timestamp,
            report.transactions
        );
        Ok(report)
    }

    /// Apply a sequence of blocks, stopping at the first failure
    pub fn replay<I>(&mut self, blocks: I) -> Result<Vec<BlockReport>>
    where
        I: IntoIterator<Item = Block>,
    {
        blocks
            .into_iter()
            .map(|block| self.apply_block(&block))
            .collect()
    }

    /// Blocks stored so far, in height order
    pub fn stored_blocks(&self) -> Result<Vec<Block>> {
        match &self.storage {
            Some(storage) => Ok(storage.load_all_blocks()?),
            None => Ok(Vec::new()),
        }
    }

    /// Re-apply the pending transactions the block did not include.
    /// Ones that no longer apply are dropped. Identical transactions are
    /// matched by count, so each included copy consumes one pending copy.
    fn rebuild_pending(&mut self, block: &Block) {
        let mut included: HashMap<String, usize> = HashMap::new();
        for tx in &block.transactions {
            *included.entry(tx.id()).or_insert(0) += 1;
        }
        let previous = std::mem::take(&mut self.pending_txs);
        self.pending = self.head.clone();

        for tx in previous {
            if let Some(count) = included.get_mut(&tx.id()).filter(|c| **c > 0) {
                *count -= 1;
                continue;
            }
            let mut scratch = self.pending.clone();
            match tx.apply(&mut scratch) {
                Ok(_) => {
                    self.pending = scratch;
                    self.pending_txs.push(tx);
                }
                Err(e) => log::debug!("Dropping pending transaction {}: {}", tx.id(), e),
            }
        }
    }
}

/// Apply `block` to `state` in place. On error `state` is partially
/// modified and must be discarded.
pub fn apply_block_to(state: &mut ChainState, block: &Block) -> Result<BlockReport> {
    let expected = state.head_block_num + 1;
    if block.block_num != expected {
        return Err(ChainError::InvalidBlock(format!(
            "expected block {}, got {}",
            expected, block.block_num
        )));
    }
    if block.timestamp <= state.head_block_time {
        return Err(ChainError::InvalidBlock(format!(
            "timestamp {} is not after head time {}",
            block.timestamp, state.head_block_time
        )));
    }
    if block.previous != state.head_block_id {
        return Err(ChainError::InvalidBlock(format!(
            "block {} does not build on head {}",
            block.block_num, state.head_block_id
        )));
    }

    let block_id = block.id();
    state.head_block_num = block.block_num;
    state.head_block_time = block.timestamp;
    state.head_block_id = block_id.clone();

    for tx in &block.transactions {
        tx.apply(state)?;
    }

    let (matured, expired) = tick_properties(state)?;
    let valuations = update_valuations(state)?;

    Ok(BlockReport {
        block_num: block.block_num,
        block_id,
        transactions: block.transactions.len(),
        matured,
        expired,
        valuations,
    })
}

fn tick_properties(state: &mut ChainState) -> Result<(Vec<u32>, Vec<u32>)> {
    let calc = ScheduleCalculator::default();
    let head = state.head_block_time;
    let mut matured = Vec::new();
    let mut expired = Vec::new();

    for id in state.properties.ids() {
        let Some(record) = state.properties.get(id) else {
            continue;
        };
        let mut ticked = record.data.clone();
        let outcome = ticked.tick(head, &calc);
        let claim_id = ticked.claim_id;
        // records only change revision when the tick moved them
        if ticked != record.data {
            state.properties.modify(id, |p| *p = ticked)?;
        }
        match outcome {
            TickOutcome::Matured => {
                log::info!("Property {} matured at {}", claim_id, head);
                matured.push(claim_id);
            }
            TickOutcome::Expired => {
                log::info!("Property {} expired unapproved at {}", claim_id, head);
                expired.push(claim_id);
            }
            _ => {}
        }
    }
    Ok((matured, expired))
}

fn update_valuations(state: &mut ChainState) -> Result<BTreeMap<String, u64>> {
    let sums = cumulative_valuations(state.properties.iter().map(|r| &r.data))?;
    let mut written = BTreeMap::new();

    for (symbol, value) in sums {
        let (id, stored) = state
            .limitation(&symbol)
            .map(|r| (r.id, r.cumulative_valuation))
            .ok_or_else(|| {
                ChainError::Invariant(format!(
                    "properties back {} but it has no asset limitation",
                    symbol
                ))
            })?;
        if stored as u128 != value {
            state.limitations.modify(id, |l| l.set_valuation(value))??;
        }
        log::debug!("Cumulative valuation of {} is {}", symbol, value);
        written.insert(symbol, value as u64);
    }
    Ok(written)
}
