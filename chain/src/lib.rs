//! META1 Chain
//!
//! Operations, transactions and blocks over the backing, oracle and market
//! rules, plus the block application pipeline that ties them together.

pub mod api;
pub mod block;
pub mod database;
pub mod error;
pub mod genesis;
pub mod operations;
pub mod reconcile;
pub mod state;
pub mod transaction;

pub use api::{ChainApi, PropertyView};
pub use block::Block;
pub use database::{apply_block_to, BlockReport, Database};
pub use error::{ChainError, Result};
pub use genesis::{ChainParameters, Genesis, GenesisAsset};
pub use operations::{
    ApproveProperty, CreateAssetLimitation, CreateLimitOrder, CreateProperty, DeleteProperty,
    Evaluate, Operation, PublishAssetPrice, UpdateAssetLimitation, UpdateProperty,
};
pub use reconcile::{expected_counters, reconcile, Finding, ReconcileJob};
pub use state::{ChainState, GENESIS_BLOCK_ID};
pub use transaction::Transaction;
